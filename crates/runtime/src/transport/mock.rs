//! In-memory connector for exercising the session without a network.
//!
//! Every [`Connector::open`] call produces a [`MockTransport`] on the channel
//! returned by [`MockConnector::new`]. Tests drive the transport's side of the
//! conversation (`open`, `error`, `close`, `message`) and read what the
//! session sent with [`MockTransport::next_frame`].

use serde::Deserialize;
use serde_json::Value;
use smaart_protocol::CommandRequest;
use tokio::sync::mpsc;

use super::{Connector, EventSink, Outbound, ReadyCell, ReadyState, TransportEvent, TransportHandle};

#[derive(Debug, Clone)]
pub struct MockConnector {
	opened: mpsc::UnboundedSender<MockTransport>,
}

impl MockConnector {
	pub fn new() -> (Self, mpsc::UnboundedReceiver<MockTransport>) {
		let (opened, rx) = mpsc::unbounded_channel();
		(Self { opened }, rx)
	}
}

impl Connector for MockConnector {
	fn open(&self, url: &str, events: EventSink) -> TransportHandle {
		let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
		let ready = ReadyCell::new();

		let _ = self.opened.send(MockTransport {
			url: url.to_string(),
			events,
			outbound: outbound_rx,
			ready: ready.clone(),
			close_requested: false,
		});

		TransportHandle::new(outbound_tx, ready)
	}
}

/// The far end of one mock connection.
#[derive(Debug)]
pub struct MockTransport {
	pub url: String,
	events: EventSink,
	outbound: mpsc::UnboundedReceiver<Outbound>,
	ready: ReadyCell,
	close_requested: bool,
}

impl MockTransport {
	pub fn generation(&self) -> u64 {
		self.events.generation()
	}

	pub fn ready_state(&self) -> ReadyState {
		self.ready.get()
	}

	/// Completes the handshake.
	pub fn open(&self) {
		if self.ready.transition(ReadyState::Connecting, ReadyState::Open) {
			self.events.emit(TransportEvent::Open);
		}
	}

	pub fn error(&self, detail: &str) {
		self.events.emit(TransportEvent::Error(detail.to_string()));
	}

	/// Simulates the connection dropping (or finishing a requested close).
	pub fn close(&self, code: Option<u16>, reason: &str) {
		self.ready.set(ReadyState::Closed);
		self.events.emit(TransportEvent::Close {
			code,
			reason: reason.to_string(),
		});
	}

	/// Delivers a text frame to the session.
	pub fn message(&self, text: &str) {
		self.events.emit(TransportEvent::Message(text.to_string()));
	}

	pub fn message_json(&self, value: Value) {
		self.message(&value.to_string());
	}

	/// Waits for the next text frame the session sent, parsed as JSON.
	/// Returns `None` once the session dropped its end.
	pub async fn next_frame(&mut self) -> Option<Value> {
		loop {
			match self.outbound.recv().await? {
				Outbound::Text(text) => return Some(serde_json::from_str(&text).expect("session sent invalid JSON")),
				Outbound::Close => self.close_requested = true,
			}
		}
	}

	/// Waits for the next frame that is not a keep-alive probe.
	pub async fn next_command(&mut self) -> Option<Value> {
		loop {
			let frame = self.next_frame().await?;
			if !is_probe(&frame) {
				return Some(frame);
			}
		}
	}

	/// Frames already sent, without waiting.
	pub fn drain_frames(&mut self) -> Vec<Value> {
		let mut frames = Vec::new();
		while let Ok(outbound) = self.outbound.try_recv() {
			match outbound {
				Outbound::Text(text) => frames.push(serde_json::from_str(&text).expect("session sent invalid JSON")),
				Outbound::Close => self.close_requested = true,
			}
		}
		frames
	}

	/// Whether the session asked for a graceful close.
	pub fn close_requested(&mut self) -> bool {
		self.drain_frames();
		self.close_requested
	}
}

/// Whether `frame` decodes to the keep-alive request (see [`CommandRequest::is_probe`]).
pub fn is_probe(frame: &Value) -> bool {
	CommandRequest::deserialize(frame).is_ok_and(|request| request.is_probe())
}
