//! Message transport to the Smaart server.
//!
//! A [`Connector`] opens one transport per connection attempt. The transport
//! runs on its own task and reports everything that happens to it as a
//! [`TransportEvent`] through the [`EventSink`] it was given: `Open`, `Error`,
//! `Close`, and inbound text `Message`s, in the order they occur. The session
//! consumes those events from a single channel.
//!
//! Outbound traffic goes through [`TransportSender`], which only accepts text
//! while the transport is open.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tokio::sync::mpsc;

#[cfg(any(test, feature = "testing"))]
pub mod mock;
mod websocket;

pub use websocket::WebSocketConnector;

/// Something that happened to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
	Open,
	Error(String),
	Close { code: Option<u16>, reason: String },
	Message(String),
}

/// Lifecycle of a transport, mirroring the WebSocket `readyState` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReadyState {
	Connecting = 0,
	Open = 1,
	Closing = 2,
	Closed = 3,
}

impl ReadyState {
	fn from_u8(value: u8) -> Self {
		match value {
			0 => ReadyState::Connecting,
			1 => ReadyState::Open,
			2 => ReadyState::Closing,
			_ => ReadyState::Closed,
		}
	}
}

/// Shared cell holding a transport's [`ReadyState`].
#[derive(Debug, Clone)]
pub struct ReadyCell(Arc<AtomicU8>);

impl ReadyCell {
	pub fn new() -> Self {
		Self(Arc::new(AtomicU8::new(ReadyState::Connecting as u8)))
	}

	pub fn get(&self) -> ReadyState {
		ReadyState::from_u8(self.0.load(Ordering::Acquire))
	}

	pub fn set(&self, state: ReadyState) {
		self.0.store(state as u8, Ordering::Release);
	}

	/// Moves from `from` to `to` only if the cell still holds `from`.
	pub fn transition(&self, from: ReadyState, to: ReadyState) -> bool {
		self.0
			.compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
			.is_ok()
	}
}

impl Default for ReadyCell {
	fn default() -> Self {
		Self::new()
	}
}

/// Frames handed to the transport task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
	Text(String),
	/// Graceful close (normal closure, code 1000).
	Close,
}

/// Where a transport reports its events. Each sink is stamped with the
/// generation of the connection attempt that created it, so the session can
/// ignore stragglers from a transport it already replaced.
#[derive(Debug, Clone)]
pub struct EventSink {
	generation: u64,
	tx: mpsc::UnboundedSender<(u64, TransportEvent)>,
}

impl EventSink {
	pub fn new(generation: u64, tx: mpsc::UnboundedSender<(u64, TransportEvent)>) -> Self {
		Self { generation, tx }
	}

	pub fn generation(&self) -> u64 {
		self.generation
	}

	/// Returns false once the session has gone away.
	pub fn emit(&self, event: TransportEvent) -> bool {
		self.tx.send((self.generation, event)).is_ok()
	}
}

/// Cloneable write half of a transport.
#[derive(Debug, Clone)]
pub struct TransportSender {
	outbound: mpsc::UnboundedSender<Outbound>,
	ready: ReadyCell,
}

impl TransportSender {
	/// Queues a text frame. Refused unless the transport is open.
	pub fn send_text(&self, text: String) -> bool {
		self.ready.get() == ReadyState::Open && self.outbound.send(Outbound::Text(text)).is_ok()
	}

	pub fn ready_state(&self) -> ReadyState {
		self.ready.get()
	}
}

/// Owned handle to one live transport.
///
/// Dropping the handle does not stop the transport task; call
/// [`TransportHandle::close`] first.
#[derive(Debug)]
pub struct TransportHandle {
	outbound: mpsc::UnboundedSender<Outbound>,
	ready: ReadyCell,
}

impl TransportHandle {
	pub fn new(outbound: mpsc::UnboundedSender<Outbound>, ready: ReadyCell) -> Self {
		Self { outbound, ready }
	}

	pub fn sender(&self) -> TransportSender {
		TransportSender {
			outbound: self.outbound.clone(),
			ready: self.ready.clone(),
		}
	}

	pub fn ready_state(&self) -> ReadyState {
		self.ready.get()
	}

	/// Asks the transport to close gracefully if it is open or still connecting.
	/// Returns whether a close was requested.
	pub fn close(&self) -> bool {
		match self.ready.get() {
			ReadyState::Connecting | ReadyState::Open => {
				self.ready.set(ReadyState::Closing);
				let _ = self.outbound.send(Outbound::Close);
				true
			}
			ReadyState::Closing | ReadyState::Closed => false,
		}
	}
}

/// Opens transports. Implemented by [`WebSocketConnector`] and by the
/// in-memory connector used in tests.
pub trait Connector: Send + Sync + 'static {
	/// Starts connecting to `url` and returns immediately. Progress is reported
	/// through `events`, beginning with `Open` or `Error`.
	fn open(&self, url: &str, events: EventSink) -> TransportHandle;
}
