//! Inbound frame decoding.
//!
//! Every server frame is expected to be an object with a `response` member.
//! [`decode`] never fails: a frame that is not valid JSON, or that lacks
//! `response`, comes back as [`Decoded::Malformed`] with the raw text and cause.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A parsed server frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
	/// Echo of the request's sequence number; absent for unsolicited pushes.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sequence_number: Option<u32>,
	pub response: Response,
}

/// The `response` member of a server frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub authentication_required: Option<bool>,
	/// Remaining payload fields (property values, measurement lists, ...).
	#[serde(flatten)]
	pub rest: Map<String, Value>,
}

impl InboundMessage {
	/// True when this is the handshake reply and the server asks for a password.
	pub fn requests_authentication(&self) -> bool {
		self.sequence_number == Some(crate::HANDSHAKE_SEQUENCE) && self.response.authentication_required == Some(true)
	}
}

/// Outcome of decoding one text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
	Parsed(InboundMessage),
	Malformed { raw: String, cause: String },
}

pub fn decode(raw: &str) -> Decoded {
	match serde_json::from_str::<InboundMessage>(raw) {
		Ok(message) => Decoded::Parsed(message),
		Err(err) => Decoded::Malformed {
			raw: raw.to_string(),
			cause: err.to_string(),
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn decodes_handshake_reply() {
		let Decoded::Parsed(message) = decode(r#"{"sequenceNumber":1,"response":{"authenticationRequired":true}}"#) else {
			panic!("expected parsed frame");
		};
		assert!(message.requests_authentication());
		assert_eq!(message.response.error, None);
	}

	#[test]
	fn authentication_only_counts_on_handshake_sequence() {
		let Decoded::Parsed(message) = decode(r#"{"sequenceNumber":4,"response":{"authenticationRequired":true}}"#) else {
			panic!("expected parsed frame");
		};
		assert!(!message.requests_authentication());
	}

	#[test]
	fn unsolicited_error_has_no_sequence() {
		let Decoded::Parsed(message) = decode(r#"{"response":{"error":"incorect password"}}"#) else {
			panic!("expected parsed frame");
		};
		assert_eq!(message.sequence_number, None);
		assert_eq!(message.response.error.as_deref(), Some("incorect password"));
	}

	#[test]
	fn keeps_extra_response_fields() {
		let Decoded::Parsed(message) = decode(r#"{"sequenceNumber":9,"response":{"activeTab":"RTA","tabs":["RTA","TF"]}}"#) else {
			panic!("expected parsed frame");
		};
		assert_eq!(message.response.rest["activeTab"], "RTA");
	}

	#[test]
	fn invalid_json_is_malformed() {
		match decode("{not json") {
			Decoded::Malformed { raw, cause } => {
				assert_eq!(raw, "{not json");
				assert!(!cause.is_empty());
			}
			other => panic!("expected malformed, got {other:?}"),
		}
	}

	#[test]
	fn missing_response_is_malformed() {
		assert!(matches!(decode(r#"{"sequenceNumber":3}"#), Decoded::Malformed { .. }));
	}
}
