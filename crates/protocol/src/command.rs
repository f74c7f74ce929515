//! Outbound request shape.
//!
//! ```json
//! {
//!   "sequenceNumber": 12,
//!   "action": "set",
//!   "target": { "tabName": "Main", "measurementName": "allMeasurements" },
//!   "properties": [ { "active": true } ]
//! }
//! ```

use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Verb of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
	Get,
	Set,
	IssueCommand,
	Capture,
}

/// What a request is addressed to.
///
/// Smaart accepts either a bare object name (`"signalGenerator"`, `"tabs"`) or a
/// structured selector naming a tab, a measurement, or a trace file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Target {
	Name(String),
	Selector(Selector),
}

impl Target {
	pub fn name(name: impl Into<String>) -> Self {
		Target::Name(name.into())
	}
}

impl From<Selector> for Target {
	fn from(selector: Selector) -> Self {
		Target::Selector(selector)
	}
}

/// Structured target selector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selector {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tab_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub measurement_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub trace_file_path: Option<String>,
}

impl Selector {
	pub fn measurement(name: impl Into<String>) -> Self {
		Self {
			measurement_name: Some(name.into()),
			..Default::default()
		}
	}

	pub fn tab(mut self, name: impl Into<String>) -> Self {
		self.tab_name = Some(name.into());
		self
	}

	pub fn trace_file(path: impl Into<String>) -> Self {
		Self {
			trace_file_path: Some(path.into()),
			..Default::default()
		}
	}
}

/// A single `{ key: value }` assignment.
///
/// The API expects `properties` as a list of one-entry objects rather than a
/// single object, so order is preserved and keys may repeat.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
	pub key: String,
	pub value: Value,
}

impl Property {
	pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
		Self {
			key: key.into(),
			value: value.into(),
		}
	}
}

impl Serialize for Property {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut map = serializer.serialize_map(Some(1))?;
		map.serialize_entry(&self.key, &self.value)?;
		map.end()
	}
}

impl<'de> Deserialize<'de> for Property {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		struct PropertyVisitor;

		impl<'de> Visitor<'de> for PropertyVisitor {
			type Value = Property;

			fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
				f.write_str("an object with exactly one key")
			}

			fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Property, A::Error> {
				let (key, value) = map
					.next_entry::<String, Value>()?
					.ok_or_else(|| de::Error::invalid_length(0, &self))?;
				if map.next_key::<String>()?.is_some() {
					return Err(de::Error::invalid_length(2, &self));
				}
				Ok(Property { key, value })
			}
		}

		deserializer.deserialize_map(PropertyVisitor)
	}
}

/// One outbound request.
///
/// `sequence_number` is normally left empty and filled in by the command queue
/// at enqueue time. Only the handshake carries a fixed number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRequest {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sequence_number: Option<u32>,
	pub action: Action,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub target: Option<Target>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub properties: Vec<Property>,
}

impl CommandRequest {
	pub fn new(action: Action) -> Self {
		Self {
			sequence_number: None,
			action,
			target: None,
			properties: Vec::new(),
		}
	}

	pub fn get() -> Self {
		Self::new(Action::Get)
	}

	pub fn set() -> Self {
		Self::new(Action::Set)
	}

	pub fn with_sequence(mut self, sequence: u32) -> Self {
		self.sequence_number = Some(sequence);
		self
	}

	pub fn with_target(mut self, target: impl Into<Target>) -> Self {
		self.target = Some(target.into());
		self
	}

	pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.properties.push(Property::new(key, value));
		self
	}

	/// True for the bare `{ "action": "get" }` shape used as a keep-alive probe.
	pub fn is_probe(&self) -> bool {
		self.sequence_number.is_none() && self.action == Action::Get && self.target.is_none() && self.properties.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn structured_target_omits_missing_fields() {
		let request = CommandRequest::set()
			.with_sequence(7)
			.with_target(Selector::measurement("allMeasurements").tab("Main"))
			.with_property("active", true);

		assert_eq!(
			serde_json::to_value(&request).unwrap(),
			json!({
				"sequenceNumber": 7,
				"action": "set",
				"target": { "tabName": "Main", "measurementName": "allMeasurements" },
				"properties": [ { "active": true } ]
			})
		);
	}

	#[test]
	fn bare_get_serializes_without_optional_fields() {
		let value = serde_json::to_value(CommandRequest::get()).unwrap();
		assert_eq!(value, json!({ "action": "get" }));
		assert!(CommandRequest::get().is_probe());
		assert!(!CommandRequest::get().with_sequence(1).is_probe());
	}

	#[test]
	fn issue_command_action_is_camel_case() {
		let value = serde_json::to_value(CommandRequest::new(Action::IssueCommand).with_property("keypress", "P")).unwrap();
		assert_eq!(value["action"], "issueCommand");
		assert_eq!(value["properties"][0]["keypress"], "P");
	}

	#[test]
	fn property_rejects_multi_key_objects() {
		let err = serde_json::from_value::<Property>(json!({ "a": 1, "b": 2 }));
		assert!(err.is_err());
		let ok: Property = serde_json::from_value(json!({ "gain": -12.5 })).unwrap();
		assert_eq!(ok.key, "gain");
		assert_eq!(ok.value, json!(-12.5));
	}

	#[test]
	fn name_target_parses_as_string() {
		let request: CommandRequest =
			serde_json::from_value(json!({ "action": "set", "target": "tabs", "properties": [ { "activeTab": "Live" } ] })).unwrap();
		assert_eq!(request.target, Some(Target::name("tabs")));
		assert_eq!(request.sequence_number, None);
	}
}
