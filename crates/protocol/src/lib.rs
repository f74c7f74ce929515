//! Wire types for the Smaart v3 remote control API.
//!
//! The API is a single WebSocket at `ws://<host>:<port>/api/v3/` carrying one
//! JSON object per text frame. This crate only describes those objects:
//!
//! - [`CommandRequest`] - outbound `get`/`set`/`issueCommand`/`capture` requests
//! - [`decode`] - typed decode step for inbound frames, yielding [`Decoded`]
//! - [`errors`] - the server error identifiers and how each one is classified
//! - [`Status`] - the connection status vocabulary reported to the host surface
//!
//! Nothing here performs I/O; the session plumbing lives in `smaart-runtime`.

pub mod command;
pub mod commands;
pub mod endpoint;
pub mod errors;
pub mod inbound;
pub mod status;

pub use command::{Action, CommandRequest, Property, Selector, Target};
pub use endpoint::{API_PATH, Endpoint};
pub use errors::{ErrorDescriptor, LogLevel};
pub use inbound::{Decoded, InboundMessage, Response, decode};
pub use status::Status;

/// Sequence number reserved for the handshake `get` sent right after the socket opens.
pub const HANDSHAKE_SEQUENCE: u32 = 1;
