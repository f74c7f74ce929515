//! Session runtime for the Smaart v3 remote control API.
//!
//! A session keeps one WebSocket to a Smaart server alive: it connects,
//! answers the server's password challenge, reconnects after unexpected drops,
//! and reports connection health as a [`Status`](smaart_protocol::Status)
//! through a [`StatusSink`].
//!
//! Outbound commands go through a [`CommandQueue`] that sends one frame at a
//! time with a minimum spacing, and probes the server when the link goes quiet.
//!
//! ```ignore
//! let (tx, rx) = tokio::sync::watch::channel(StatusReport::default());
//! let session = SessionHandle::spawn(Arc::new(WebSocketConnector), Arc::new(tx), SessionOptions::default());
//! session.connect(ConnectParams::new("10.0.0.5", "26000", None)).await?;
//! session.send(smaart_protocol::commands::reset_average())?;
//! ```

pub mod connection;
pub mod error;
pub mod queue;
pub mod sequence;
pub mod status;
pub mod timer;
pub mod transport;

pub use connection::{ConnectParams, SessionHandle, SessionOptions, SessionSnapshot, SessionState};
pub use error::{Error, Result};
pub use queue::{CommandQueue, Delivery, Dispatch, Ticket};
pub use sequence::SequenceAllocator;
pub use status::{StatusReport, StatusSink, StatusTracker};
pub use transport::{Connector, TransportEvent, WebSocketConnector};
