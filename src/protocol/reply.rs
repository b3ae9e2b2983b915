//! Reply definitions
//!
//! The shared shape of a command reply: either a raw successful result or
//! the backing store's error text. A batch of commands produces one reply
//! per command, positionally aligned with the batch that produced it.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// One entry of a reply batch.
///
/// The successful result is kept as raw JSON until a caller supplies a
/// destination type to decode it into.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reply {
    /// Raw backing-store error text; empty on success.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,

    /// Raw successful result, absent when the command failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Box<RawValue>>,
}

impl Reply {
    /// Whether this reply carries a backing-store error.
    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }

    /// Decode the raw result into a typed value.
    ///
    /// Returns `Ok(None)` when the reply has no result payload.
    pub fn decode<T: DeserializeOwned>(&self) -> serde_json::Result<Option<T>> {
        match &self.result {
            Some(raw) => serde_json::from_str(raw.get()).map(Some),
            None => Ok(None),
        }
    }
}
