//! # tandem-rpc
//!
//! Newline-delimited JSON protocol around a
//! [`TranslationSession`](tandem_session::TranslationSession).
//!
//! - [`types`]: wire requests and responses
//! - [`server`]: the `Initializing → Ready → Serving → Terminated` loop
//!
//! Exactly one response line is written per request line, in order. Logging
//! never touches the response stream.

#![deny(unsafe_code)]

pub mod errors;
pub mod server;
pub mod types;

pub use errors::{ProtocolError, Result};
pub use server::{ExitReason, InitFailure, ProtocolServer, ServerState};
pub use types::{Rejection, Request, Response, Status, decode_line};
