//! # restkv
//!
//! A REST bridge for Redis-compatible key-value stores, with:
//! - An HTTP server that decodes commands from a URL path, JSON body or
//!   query string and executes them against a backing connection
//! - A client that queues wire-protocol commands and executes them over
//!   the REST API, singly or as a non-atomic pipeline
//! - Ephemeral bearer-token issuance via the `ACL RESTTOKEN` command
//! - An in-memory backing store for local serving and tests
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────┐  ["SET","a","1"]   ┌──────────────────────────────┐
//! │  REST Client │ ─────────────────▶ │          REST Server         │
//! │  (pipeline)  │ ◀───────────────── │  auth → parse → dispatch     │
//! └──────────────┘  {"result":"OK"}   └──────────────┬───────────────┘
//!                                                    │ Do(cmd, args)
//!                                                    ▼
//!                                     ┌──────────────────────────────┐
//!                                     │       Backing Store          │
//!                                     │  (fresh conn per request)    │
//!                                     └──────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod client;
pub mod conn;
pub mod protocol;
pub mod server;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use client::Client;
pub use config::Config;
pub use error::{CommandError, RestError, Result};
pub use server::RestServer;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of restkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
