//! Error types for restkv
//!
//! Provides a unified error type for all operations, plus the typed
//! command error returned when the backing store rejects a command.

use thiserror::Error;

/// Result type alias using RestError
pub type Result<T> = std::result::Result<T, RestError>;

/// Unified error type for restkv operations
#[derive(Debug, Error)]
pub enum RestError {
    // -------------------------------------------------------------------------
    // I/O and Transport Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-200 response whose body did not carry a JSON error envelope.
    #[error("[{status}]: {body}")]
    Transport { status: u16, body: String },

    // -------------------------------------------------------------------------
    // Client Protocol Errors
    // -------------------------------------------------------------------------
    #[error("empty command")]
    EmptyCommand,

    #[error("no command to execute")]
    NoCommand,

    #[error("too many destination values")]
    TooManyDestinations,

    // -------------------------------------------------------------------------
    // Command Errors
    // -------------------------------------------------------------------------
    #[error(transparent)]
    Command(#[from] CommandError),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

/// An error returned by the backing store for a specific command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CommandError {
    /// Full error message, including its kind if present.
    pub message: String,

    /// First whitespace-delimited token of the message, by convention an
    /// upper-case classifier such as `ERR` or `WRONGTYPE`. Empty when the
    /// message has no space.
    pub kind: String,

    /// Zero-based position of the failing command within the transmitted
    /// batch; -1 when the error is not attributable to one command.
    pub pipeline_index: i64,
}

impl CommandError {
    /// Build a command error, deriving the kind from the message.
    pub fn new(message: impl Into<String>, pipeline_index: i64) -> Self {
        let message = message.into();
        let kind = match message.split_once(' ') {
            Some((kind, _)) => kind.to_string(),
            None => String::new(),
        };
        Self {
            message,
            kind,
            pipeline_index,
        }
    }
}
