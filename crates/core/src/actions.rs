//! User-triggerable actions.
//!
//! Each [`UserAction`] maps onto one of the typed command methods on
//! [`Smaart`]. Most of them are Smaart keyboard shortcuts sent through
//! `issueCommand`; [`UserAction::keypress`] gives the exact chord.
//!
//! Option enums parse from the short names a user would type (`in`, `up`,
//! `spectrum`, ...) as well as from the raw key they stand for (`+`, `S`, ...).

use std::fmt;
use std::str::FromStr;

use smaart_runtime::Ticket;

use crate::client::Smaart;
use crate::error::{Error, Result};

/// Lowest generator level the action accepts, in dB FS.
pub const MIN_GENERATOR_LEVEL: f64 = -200.0;
/// Highest generator level the action accepts, in dB FS.
pub const MAX_GENERATOR_LEVEL: f64 = 0.0;

/// Checks a generator level against the range the action accepts.
pub fn generator_level(level: f64) -> Result<f64> {
	if (MIN_GENERATOR_LEVEL..=MAX_GENERATOR_LEVEL).contains(&level) {
		Ok(level)
	} else {
		Err(Error::invalid("generator level (dB FS, -200 to 0)", level.to_string()))
	}
}

macro_rules! choice {
	(
		$(#[$meta:meta])*
		$name:ident, $option:literal {
			$($variant:ident => $key:literal, [$($alias:literal),+]),+ $(,)?
		}
	) => {
		$(#[$meta])*
		#[derive(Debug, Clone, Copy, PartialEq, Eq)]
		pub enum $name {
			$($variant),+
		}

		impl $name {
			pub const ALL: &[$name] = &[$($name::$variant),+];

			/// The key (or key fragment) sent to Smaart.
			pub fn key(self) -> &'static str {
				match self {
					$($name::$variant => $key),+
				}
			}

			/// The user-facing name.
			pub fn name(self) -> &'static str {
				match self {
					$($name::$variant => [$($alias),+][0]),+
				}
			}
		}

		impl FromStr for $name {
			type Err = Error;

			fn from_str(s: &str) -> Result<Self> {
				let wanted = s.trim();
				$(
					if wanted == $key || [$($alias),+].iter().any(|alias| alias.eq_ignore_ascii_case(wanted)) {
						return Ok($name::$variant);
					}
				)+
				Err(Error::invalid($option, s))
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(self.name())
			}
		}
	};
}

choice! {
	/// Zoom in or out.
	ZoomDirection, "zoom direction" {
		In => "+", ["in"],
		Out => "-", ["out"],
	}
}

choice! {
	ArrowDirection, "arrow direction" {
		Up => "up", ["up"],
		Down => "down", ["down"],
		Left => "left", ["left"],
		Right => "right", ["right"],
	}
}

choice! {
	VerticalDirection, "direction" {
		Up => "up", ["up"],
		Down => "down", ["down"],
	}
}

choice! {
	HorizontalDirection, "direction" {
		Left => "left", ["left"],
		Right => "right", ["right"],
	}
}

choice! {
	/// Which way to step through overlapping traces.
	ZOrder, "z order direction" {
		Forward => "Z", ["forward"],
		Backward => "shift + Z", ["backward", "back"],
	}
}

choice! {
	ZoomPreset, "zoom preset" {
		Default => "5", ["default"],
		Zoom1 => "1", ["zoom-1", "zoom1"],
		Zoom2 => "2", ["zoom-2", "zoom2"],
		Zoom3 => "3", ["zoom-3", "zoom3"],
		Zoom4 => "4", ["zoom-4", "zoom4"],
	}
}

choice! {
	ViewPreset, "view preset" {
		Spectrum => "S", ["spectrum"],
		Transfer => "T", ["transfer"],
		User1 => "1", ["user-1", "user1"],
		User2 => "2", ["user-2", "user2"],
		User3 => "3", ["user-3", "user3"],
		User4 => "4", ["user-4", "user4"],
		User5 => "5", ["user-5", "user5"],
		User6 => "6", ["user-6", "user6"],
		User7 => "7", ["user-7", "user7"],
		User8 => "8", ["user-8", "user8"],
		User9 => "9", ["user-9", "user9"],
		MultiSpectrum => "0", ["multi-spectrum", "multispectrum"],
	}
}

choice! {
	/// Toolbar rows that can be shown or hidden.
	Bar, "bar" {
		Control => "O", ["control"],
		Command => "U", ["command"],
		Data => "B", ["data"],
	}
}

/// Everything a user can trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum UserAction {
	ResetAverage,
	SelectTab { name: String },
	StartMeasurements { tab: String },
	GeneratorOn,
	GeneratorOff,
	/// Level in dB FS, see [`generator_level`].
	GeneratorLevel(f64),
	TrackingOn,
	TrackingOff,
	CaptureTrace { name: String },
	RenameTrace { name: String, path: String },
	/// Any key chord, sent as is.
	IssueCommand { keypress: String },
	Shortcut(Shortcut),
}

impl UserAction {
	pub fn label(&self) -> &'static str {
		match self {
			UserAction::ResetAverage => "Reset Average",
			UserAction::SelectTab { .. } => "Select Tab By Name",
			UserAction::StartMeasurements { .. } => "Start Measurements By Tab Name",
			UserAction::GeneratorOn => "Start signal generator",
			UserAction::GeneratorOff => "Stop signal generator",
			UserAction::GeneratorLevel(_) => "Set Generator Level",
			UserAction::TrackingOn => "Start delay tracking for current tab",
			UserAction::TrackingOff => "Stop delay tracking for current tab",
			UserAction::CaptureTrace { .. } => "Capture Current Trace",
			UserAction::RenameTrace { .. } => "Rename Trace",
			UserAction::IssueCommand { .. } => "Issue Key Command",
			UserAction::Shortcut(shortcut) => shortcut.label(),
		}
	}

	/// The key chord for key press actions; `None` for the ones with their own command.
	pub fn keypress(&self) -> Option<String> {
		match self {
			UserAction::Shortcut(shortcut) => Some(shortcut.keypress()),
			UserAction::IssueCommand { keypress } => Some(keypress.clone()),
			_ => None,
		}
	}

	/// Queues the action on `client`.
	pub fn dispatch(&self, client: &Smaart) -> Result<Ticket> {
		match self {
			UserAction::ResetAverage => client.reset_avg(),
			UserAction::SelectTab { name } => client.select_tab(name),
			UserAction::StartMeasurements { tab } => client.start_all_measurements(tab),
			UserAction::GeneratorOn => client.generator_state(true),
			UserAction::GeneratorOff => client.generator_state(false),
			UserAction::GeneratorLevel(level) => client.set_generator_level(generator_level(*level)?),
			UserAction::TrackingOn => client.tracking_state(true),
			UserAction::TrackingOff => client.tracking_state(false),
			UserAction::CaptureTrace { name } => client.capture_trace(name),
			UserAction::RenameTrace { name, path } => client.rename_trace(name, path),
			UserAction::IssueCommand { keypress } => client.issue_command(keypress),
			UserAction::Shortcut(shortcut) => client.issue_command(&shortcut.keypress()),
		}
	}
}

impl From<Shortcut> for UserAction {
	fn from(shortcut: Shortcut) -> Self {
		UserAction::Shortcut(shortcut)
	}
}

impl fmt::Display for UserAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

/// Actions that are Smaart keyboard shortcuts, sent through `issueCommand`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
	ZoomX(ZoomDirection),
	ZoomY(ZoomDirection),
	ZoomXY(ZoomDirection),
	ZoomPreset(ZoomPreset),
	ArrowKey(ArrowDirection),
	CycleZOrder(ZOrder),
	HideTrace,
	HideAllTraces,
	TogglePeakHold,
	ToggleInputMeters,
	ToggleInputMeterOrientation,
	ToggleSplHistory,
	ToggleMeters,
	ViewPreset(ViewPreset),
	TraceYOffset(VerticalDirection),
	ClearTopTraceOffset,
	ClearAllOffsets,
	ToggleBar(Bar),
	LockCursorToPeak,
	ClearLockedCursor,
	MoveLockedCursor(HorizontalDirection),
	CyclePlot,
}

impl Shortcut {
	pub fn label(self) -> &'static str {
		match self {
			Shortcut::ZoomX(_) => "Zoom X Axis",
			Shortcut::ZoomY(_) => "Zoom Y Axis",
			Shortcut::ZoomXY(_) => "Zoom X & Y Axis",
			Shortcut::ZoomPreset(_) => "Set Zoom Preset",
			Shortcut::ArrowKey(_) => "Send Arrow Keys",
			Shortcut::CycleZOrder(_) => "Cycle Z Order",
			Shortcut::HideTrace => "Hide Trace",
			Shortcut::HideAllTraces => "Hide All Traces",
			Shortcut::TogglePeakHold => "Toggle Peak Hold",
			Shortcut::ToggleInputMeters => "Toggle Input Meters",
			Shortcut::ToggleInputMeterOrientation => "Toggle Input Meter Orientation",
			Shortcut::ToggleSplHistory => "Toggle SPL History",
			Shortcut::ToggleMeters => "Toggle SPL Meters",
			Shortcut::ViewPreset(_) => "Select View Preset",
			Shortcut::TraceYOffset(_) => "Trace Y Offset",
			Shortcut::ClearTopTraceOffset => "Clear Top Trace Y Offset",
			Shortcut::ClearAllOffsets => "Clear All Y Offsets",
			Shortcut::ToggleBar(_) => "Toggle Bar",
			Shortcut::LockCursorToPeak => "Lock Cursor To Peak",
			Shortcut::ClearLockedCursor => "Clear Locked Cursor",
			Shortcut::MoveLockedCursor(_) => "Move Locked Cursor",
			Shortcut::CyclePlot => "Cycle Preferred Plot",
		}
	}

	/// The chord as Smaart expects it in `keypress`.
	pub fn keypress(self) -> String {
		match self {
			Shortcut::ZoomX(direction) => format!("option + command{}", direction.key()),
			Shortcut::ZoomY(direction) => direction.key().to_string(),
			Shortcut::ZoomXY(direction) => format!("command{}", direction.key()),
			Shortcut::ZoomPreset(preset) => format!("option + {}", preset.key()),
			Shortcut::ArrowKey(direction) => format!("cursor {}", direction.key()),
			Shortcut::CycleZOrder(order) => order.key().to_string(),
			Shortcut::HideTrace => "H".to_string(),
			Shortcut::HideAllTraces => "shift + command + H".to_string(),
			Shortcut::TogglePeakHold => "P".to_string(),
			Shortcut::ToggleInputMeters => "shift + E".to_string(),
			Shortcut::ToggleInputMeterOrientation => "shift + option + E".to_string(),
			Shortcut::ToggleSplHistory => "option + H".to_string(),
			Shortcut::ToggleMeters => "E".to_string(),
			Shortcut::ViewPreset(preset) => preset.key().to_string(),
			Shortcut::TraceYOffset(direction) => format!("command + cursor {}", direction.key()),
			Shortcut::ClearTopTraceOffset => "Y".to_string(),
			Shortcut::ClearAllOffsets => "command + Y".to_string(),
			Shortcut::ToggleBar(bar) => bar.key().to_string(),
			Shortcut::LockCursorToPeak => "command + P".to_string(),
			Shortcut::ClearLockedCursor => "command + X".to_string(),
			Shortcut::MoveLockedCursor(direction) => format!("command + cursor {}", direction.key()),
			Shortcut::CyclePlot => "M".to_string(),
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use smaart_runtime::SessionOptions;
	use smaart_runtime::transport::mock::MockConnector;

	use super::*;
	use crate::config::SessionConfig;

	#[test]
	fn shortcut_chords() {
		let cases = [
			(Shortcut::ZoomX(ZoomDirection::In), "option + command+"),
			(Shortcut::ZoomY(ZoomDirection::Out), "-"),
			(Shortcut::ZoomXY(ZoomDirection::Out), "command-"),
			(Shortcut::ZoomPreset(ZoomPreset::Default), "option + 5"),
			(Shortcut::ArrowKey(ArrowDirection::Left), "cursor left"),
			(Shortcut::CycleZOrder(ZOrder::Backward), "shift + Z"),
			(Shortcut::HideAllTraces, "shift + command + H"),
			(Shortcut::ToggleInputMeterOrientation, "shift + option + E"),
			(Shortcut::ViewPreset(ViewPreset::MultiSpectrum), "0"),
			(Shortcut::TraceYOffset(VerticalDirection::Up), "command + cursor up"),
			(Shortcut::ToggleBar(Bar::Command), "U"),
			(Shortcut::MoveLockedCursor(HorizontalDirection::Right), "command + cursor right"),
			(Shortcut::CyclePlot, "M"),
		];

		for (shortcut, chord) in cases {
			assert_eq!(shortcut.keypress(), chord, "{}", shortcut.label());
			assert_eq!(UserAction::from(shortcut).keypress().as_deref(), Some(chord));
		}
	}

	#[test]
	fn typed_actions_have_no_chord() {
		assert_eq!(UserAction::ResetAverage.keypress(), None);
		assert_eq!(UserAction::GeneratorLevel(-6.0).keypress(), None);
		assert_eq!(
			UserAction::RenameTrace {
				name: "a".into(),
				path: "b".into()
			}
			.keypress(),
			None
		);
	}

	#[test]
	fn options_parse_from_names_and_keys() {
		assert_eq!("in".parse::<ZoomDirection>().unwrap(), ZoomDirection::In);
		assert_eq!("-".parse::<ZoomDirection>().unwrap(), ZoomDirection::Out);
		assert_eq!("Spectrum".parse::<ViewPreset>().unwrap(), ViewPreset::Spectrum);
		assert_eq!("7".parse::<ViewPreset>().unwrap(), ViewPreset::User7);
		assert_eq!("user-7".parse::<ViewPreset>().unwrap(), ViewPreset::User7);
		assert_eq!("back".parse::<ZOrder>().unwrap(), ZOrder::Backward);
		assert_eq!("5".parse::<ZoomPreset>().unwrap(), ZoomPreset::Default);

		let err = "sideways".parse::<VerticalDirection>().unwrap_err();
		assert_eq!(err.to_string(), "invalid direction: sideways");
	}

	#[test]
	fn every_choice_round_trips_through_its_name() {
		for preset in ViewPreset::ALL {
			assert_eq!(preset.name().parse::<ViewPreset>().unwrap(), *preset);
		}
		for bar in Bar::ALL {
			assert_eq!(bar.to_string().parse::<Bar>().unwrap(), *bar);
		}
	}

	#[test]
	fn generator_level_range() {
		assert_eq!(generator_level(0.0).unwrap(), 0.0);
		assert_eq!(generator_level(-200.0).unwrap(), -200.0);
		assert!(generator_level(0.5).is_err());
		assert!(generator_level(-200.1).is_err());
		assert!(generator_level(f64::NAN).is_err());
	}

	#[tokio::test(start_paused = true)]
	async fn dispatch_routes_through_the_client() {
		let (connector, mut transports) = MockConnector::new();
		let client = Smaart::with_connector(Arc::new(connector), SessionOptions::default());
		client.init(&SessionConfig::new("10.0.0.5", "26000")).await.unwrap();
		let mut transport = transports.recv().await.unwrap();
		transport.open();
		transport.next_command().await.unwrap();

		UserAction::Shortcut(Shortcut::TogglePeakHold).dispatch(&client).unwrap();
		UserAction::GeneratorOn.dispatch(&client).unwrap();
		UserAction::CaptureTrace { name: "Ref 1".into() }.dispatch(&client).unwrap().delivered().await;

		let keypress = transport.next_command().await.unwrap();
		assert_eq!(keypress["action"], "issueCommand");
		assert_eq!(keypress["properties"][0]["keypress"], "P");

		let generator = transport.next_command().await.unwrap();
		assert_eq!(generator["target"], "signalGenerator");
		assert_eq!(generator["properties"][0]["active"], true);

		let capture = transport.next_command().await.unwrap();
		assert_eq!(capture["action"], "capture");
		assert_eq!(capture["properties"][0]["name"], "Ref 1");
	}

	#[tokio::test(start_paused = true)]
	async fn out_of_range_level_is_refused_before_queueing() {
		let (connector, _transports) = MockConnector::new();
		let client = Smaart::with_connector(Arc::new(connector), SessionOptions::default());

		let err = UserAction::GeneratorLevel(6.0).dispatch(&client).unwrap_err();
		assert!(matches!(err, Error::InvalidOption { .. }));
	}
}
