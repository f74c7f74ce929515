//! WebSocket transport over `tokio-tungstenite`.

use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::{Connector, EventSink, Outbound, ReadyCell, ReadyState, TransportEvent, TransportHandle};
use crate::error::Result;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long a locally initiated close waits for the server's close frame.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Opens plain `ws://` connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl Connector for WebSocketConnector {
	fn open(&self, url: &str, events: EventSink) -> TransportHandle {
		let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
		let ready = ReadyCell::new();

		tokio::spawn(drive(url.to_string(), events, outbound_rx, ready.clone()));

		TransportHandle::new(outbound_tx, ready)
	}
}

async fn handshake(url: &str) -> Result<WsStream> {
	let (stream, response) = connect_async(url).await?;
	tracing::debug!(url, status = %response.status(), "websocket handshake complete");
	Ok(stream)
}

async fn drive(url: String, events: EventSink, mut outbound: mpsc::UnboundedReceiver<Outbound>, ready: ReadyCell) {
	let stream = match handshake(&url).await {
		Ok(stream) => stream,
		Err(err) => {
			ready.set(ReadyState::Closed);
			events.emit(TransportEvent::Error(err.to_string()));
			events.emit(TransportEvent::Close {
				code: None,
				reason: "connection failed".to_string(),
			});
			return;
		}
	};

	let (mut sink, mut stream) = stream.split();

	let close_deadline = tokio::time::sleep(CLOSE_GRACE);
	tokio::pin!(close_deadline);

	// A close requested while the handshake was in flight leaves the cell at
	// `Closing`; honour it instead of reporting the socket as open.
	let mut close_sent = false;
	if ready.transition(ReadyState::Connecting, ReadyState::Open) {
		events.emit(TransportEvent::Open);
	} else {
		send_close(&mut sink).await;
		close_sent = true;
		close_deadline.as_mut().reset(Instant::now() + CLOSE_GRACE);
	}

	let (code, reason) = loop {
		tokio::select! {
			frame = stream.next() => match frame {
				Some(Ok(Message::Text(text))) => {
					events.emit(TransportEvent::Message(text));
				}
				Some(Ok(Message::Close(frame))) => break close_details(frame),
				Some(Ok(_)) => {}
				Some(Err(err)) => {
					events.emit(TransportEvent::Error(err.to_string()));
					break (None, "connection lost".to_string());
				}
				None => break (None, "connection lost".to_string()),
			},
			message = outbound.recv(), if !close_sent => match message {
				Some(Outbound::Text(text)) => {
					tracing::debug!(frame = %text, "send");
					if let Err(err) = sink.send(Message::Text(text)).await {
						events.emit(TransportEvent::Error(err.to_string()));
						break (None, "connection lost".to_string());
					}
				}
				Some(Outbound::Close) | None => {
					ready.set(ReadyState::Closing);
					send_close(&mut sink).await;
					close_sent = true;
					close_deadline.as_mut().reset(Instant::now() + CLOSE_GRACE);
				}
			},
			_ = &mut close_deadline, if close_sent => {
				break (Some(u16::from(CloseCode::Normal)), "closed by client".to_string());
			}
		}
	};

	let _ = sink.close().await;
	ready.set(ReadyState::Closed);
	events.emit(TransportEvent::Close { code, reason });
}

async fn send_close(sink: &mut SplitSink<WsStream, Message>) {
	let frame = CloseFrame {
		code: CloseCode::Normal,
		reason: "".into(),
	};
	if let Err(err) = sink.send(Message::Close(Some(frame))).await {
		tracing::debug!(error = %err, "close frame not sent");
	}
}

fn close_details(frame: Option<CloseFrame<'static>>) -> (Option<u16>, String) {
	match frame {
		Some(frame) => (Some(u16::from(frame.code)), frame.reason.into_owned()),
		None => (None, String::new()),
	}
}
