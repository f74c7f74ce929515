
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use smaart::SessionConfig;
use smaart::actions::{
	self, ArrowDirection, Bar, HorizontalDirection, Shortcut, UserAction, VerticalDirection, ViewPreset, ZOrder, ZoomDirection, ZoomPreset,
};

use crate::styles::cli_styles;

/// Remote control for Smaart v3.
#[derive(Parser, Debug)]
#[command(name = "smaart")]
#[command(about = "Drive a Smaart v3 measurement session over its WebSocket API")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	#[command(flatten)]
	pub connection: ConnectionArgs,

	#[command(subcommand)]
	pub command: Commands,
}

/// Connection settings. Flags override the config file field by field.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
	/// Config file (default: $XDG_CONFIG_HOME/smaart/config.json)
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Smaart host name or IP address
	#[arg(long, global = true, value_name = "HOST")]
	pub host: Option<String>,

	/// Smaart API port
	#[arg(long, global = true, value_name = "PORT")]
	pub port: Option<String>,

	/// API password (leave unset if authentication is off)
	#[arg(long, global = true, value_name = "PASSWORD", env = "SMAART_PASSWORD", hide_env_values = true)]
	pub password: Option<String>,
}

impl ConnectionArgs {
	pub fn config_path(&self) -> PathBuf {
		self.config.clone().unwrap_or_else(SessionConfig::default_path)
	}

	pub fn overrides(&self) -> SessionConfig {
		SessionConfig {
			host: self.host.clone(),
			port: self.port.clone(),
			password: self.password.clone(),
		}
	}
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Run one action and exit once it has been sent.
	Action {
		#[command(subcommand)]
		action: ActionCommand,

		/// Seconds to wait for the session to come up
		#[arg(long, value_name = "SECS", default_value_t = 10)]
		timeout: u64,
	},
	/// Stay connected and print every status change until Ctrl-C.
	Watch,
	/// Connect, print the first settled status, and exit.
	Probe {
		/// Seconds to wait for a status other than connecting
		#[arg(long, value_name = "SECS", default_value_t = 10)]
		timeout: u64,
	},
	/// Show or store connection settings.
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
	/// Print the effective settings (password hidden).
	Show,
	/// Write the effective settings to the config file.
	Save,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ActionCommand {
	/// Reset the running average of the active measurements
	ResetAverage,
	/// Make a tab active
	SelectTab { name: String },
	/// Start every measurement in a tab
	StartMeasurements { tab: String },
	/// Start the signal generator
	GeneratorOn,
	/// Stop the signal generator
	GeneratorOff,
	/// Set the signal generator level
	GeneratorLevel {
		/// Level in dB FS, -200 to 0
		#[arg(allow_hyphen_values = true, value_parser = parse_level)]
		level: f64,
	},
	/// Start delay tracking for the current tab
	TrackingOn,
	/// Stop delay tracking for the current tab
	TrackingOff,
	/// Zoom the X axis (in, out)
	ZoomX { direction: ZoomDirection },
	/// Zoom the Y axis (in, out)
	ZoomY { direction: ZoomDirection },
	/// Zoom both axes (in, out)
	ZoomXy { direction: ZoomDirection },
	/// Recall a zoom preset (default, zoom-1 .. zoom-4)
	ZoomPreset { preset: ZoomPreset },
	/// Send an arrow key (up, down, left, right)
	Arrow { direction: ArrowDirection },
	/// Cycle the trace z order (forward, backward)
	CycleZOrder { direction: ZOrder },
	/// Hide the top trace
	HideTrace,
	/// Hide all traces
	HideAllTraces,
	/// Toggle peak hold
	TogglePeakHold,
	/// Toggle the input meters
	ToggleInputMeters,
	/// Toggle input meter orientation
	ToggleInputMeterOrientation,
	/// Toggle SPL history
	ToggleSplHistory,
	/// Toggle SPL meters
	ToggleMeters,
	/// Select a view preset (spectrum, transfer, user-1 .. user-9, multi-spectrum)
	ViewPreset { preset: ViewPreset },
	/// Move the top trace's Y offset (up, down)
	TraceYOffset { direction: VerticalDirection },
	/// Clear the top trace's Y offset
	ClearTopTraceOffset,
	/// Clear every trace's Y offset
	ClearAllOffsets,
	/// Toggle a bar (control, command, data)
	ToggleBar { bar: Bar },
	/// Lock the cursor to the peak
	LockCursorToPeak,
	/// Clear the locked cursor
	ClearLockedCursor,
	/// Move the locked cursor (left, right)
	MoveLockedCursor { direction: HorizontalDirection },
	/// Cycle the preferred plot
	CyclePlot,
	/// Capture the current trace under a name
	CaptureTrace { name: String },
	/// Rename a stored trace
	RenameTrace {
		/// New trace name
		name: String,
		/// Full path of the trace file
		path: String,
	},
	/// Send any key chord, e.g. "shift + E"
	Key { keypress: String },
}

fn parse_level(value: &str) -> Result<f64, String> {
	let level: f64 = value.parse().map_err(|_| format!("not a number: {value}"))?;
	actions::generator_level(level).map_err(|err| err.to_string())
}

impl From<ActionCommand> for UserAction {
	fn from(command: ActionCommand) -> Self {
		match command {
			ActionCommand::ResetAverage => UserAction::ResetAverage,
			ActionCommand::SelectTab { name } => UserAction::SelectTab { name },
			ActionCommand::StartMeasurements { tab } => UserAction::StartMeasurements { tab },
			ActionCommand::GeneratorOn => UserAction::GeneratorOn,
			ActionCommand::GeneratorOff => UserAction::GeneratorOff,
			ActionCommand::GeneratorLevel { level } => UserAction::GeneratorLevel(level),
			ActionCommand::TrackingOn => UserAction::TrackingOn,
			ActionCommand::TrackingOff => UserAction::TrackingOff,
			ActionCommand::CaptureTrace { name } => UserAction::CaptureTrace { name },
			ActionCommand::RenameTrace { name, path } => UserAction::RenameTrace { name, path },
			ActionCommand::Key { keypress } => UserAction::IssueCommand { keypress },
			ActionCommand::ZoomX { direction } => Shortcut::ZoomX(direction).into(),
			ActionCommand::ZoomY { direction } => Shortcut::ZoomY(direction).into(),
			ActionCommand::ZoomXy { direction } => Shortcut::ZoomXY(direction).into(),
			ActionCommand::ZoomPreset { preset } => Shortcut::ZoomPreset(preset).into(),
			ActionCommand::Arrow { direction } => Shortcut::ArrowKey(direction).into(),
			ActionCommand::CycleZOrder { direction } => Shortcut::CycleZOrder(direction).into(),
			ActionCommand::HideTrace => Shortcut::HideTrace.into(),
			ActionCommand::HideAllTraces => Shortcut::HideAllTraces.into(),
			ActionCommand::TogglePeakHold => Shortcut::TogglePeakHold.into(),
			ActionCommand::ToggleInputMeters => Shortcut::ToggleInputMeters.into(),
			ActionCommand::ToggleInputMeterOrientation => Shortcut::ToggleInputMeterOrientation.into(),
			ActionCommand::ToggleSplHistory => Shortcut::ToggleSplHistory.into(),
			ActionCommand::ToggleMeters => Shortcut::ToggleMeters.into(),
			ActionCommand::ViewPreset { preset } => Shortcut::ViewPreset(preset).into(),
			ActionCommand::TraceYOffset { direction } => Shortcut::TraceYOffset(direction).into(),
			ActionCommand::ClearTopTraceOffset => Shortcut::ClearTopTraceOffset.into(),
			ActionCommand::ClearAllOffsets => Shortcut::ClearAllOffsets.into(),
			ActionCommand::ToggleBar { bar } => Shortcut::ToggleBar(bar).into(),
			ActionCommand::LockCursorToPeak => Shortcut::LockCursorToPeak.into(),
			ActionCommand::ClearLockedCursor => Shortcut::ClearLockedCursor.into(),
			ActionCommand::MoveLockedCursor { direction } => Shortcut::MoveLockedCursor(direction).into(),
			ActionCommand::CyclePlot => Shortcut::CyclePlot.into(),
		}
	}
}
