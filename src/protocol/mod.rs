//! Protocol Module
//!
//! The shared wire contract between the REST server and the REST client.
//!
//! ## Wire Format (JSON, UTF-8)
//!
//! ### Requests
//! ```text
//! single command:  ["<CMD>", arg1, arg2, ...]          POST <base>
//! pipeline:        [["<CMD>", ...], ["<CMD>", ...]]    POST <base>/pipeline
//! ```
//!
//! ### Replies
//! ```text
//! success:  { "result": <any> }        HTTP 200
//! error:    { "error": "<message>" }   HTTP 4xx/5xx
//! pipeline: positional array of the two shapes above, HTTP 200
//! ```
//!
//! Arguments are encoded as strings or numbers; see [`Arg`] for the exact
//! mapping of each supported input type.

mod args;
mod reply;

pub use args::{Arg, CommandArg};
pub use reply::Reply;
