//! Backing connection seam
//!
//! The server executes real commands through these traits rather than a
//! concrete store, so any command-execution collaborator can be plugged
//! in. A connection is acquired fresh per request from the factory and
//! closed unconditionally when the request finishes; pooling, timeouts and
//! retries are the factory's business, not the dispatcher's.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// An error returned by the backing store for a command.
///
/// The message is passed through verbatim to callers; by convention it
/// starts with an upper-case kind token such as `ERR` or `WRONGTYPE`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct StoreError(pub String);

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A single connection to the backing store.
#[async_trait]
pub trait Conn: Send {
    /// Send a command to the store and return the received reply.
    async fn execute(&mut self, cmd: &str, args: &[Value]) -> Result<Value, StoreError>;

    /// Close the connection.
    async fn close(&mut self) -> crate::Result<()>;
}

/// Yields a fresh backing connection per request.
#[async_trait]
pub trait ConnFactory: Send + Sync {
    async fn get_conn(&self) -> Box<dyn Conn>;
}
