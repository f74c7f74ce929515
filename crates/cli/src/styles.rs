//! Terminal colours: cargo-like help output and status lines.

use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use colored::{ColoredString, Colorize};
use smaart::{Status, StatusReport};

/// Help and usage-error styling, close to cargo's.
///
/// - Section headers and the usage line: green, bold
/// - Subcommand and flag names, `<HOST>`/`<PORT>` placeholders, accepted values
///   such as `in`/`out`: cyan
/// - Rejected values (an unknown view preset, a level above 0 dB FS): red, bold
/// - The `error:` prefix: red, bold, matching [`status_line`] failures
pub fn cli_styles() -> Styles {
	let accent = AnsiColor::Cyan.on_default();
	let failure = AnsiColor::Red.on_default().bold();

	Styles::styled()
		.header(AnsiColor::Green.on_default().bold())
		.usage(AnsiColor::Green.on_default().bold())
		.literal(accent)
		.placeholder(accent)
		.valid(accent)
		.invalid(failure)
		.error(failure)
}

/// Status name coloured by severity.
pub fn paint_status(status: Status) -> ColoredString {
	let name = status.as_str();
	match status {
		Status::Ok => name.green().bold(),
		Status::Connecting | Status::Disconnected => name.cyan(),
		Status::UnknownWarning => name.yellow().bold(),
		Status::ConnectionFailure | Status::AuthenticationFailure | Status::UnknownError | Status::BadConfig => name.red().bold(),
	}
}

/// `status` or `status: message`.
pub fn status_line(report: &StatusReport) -> String {
	match &report.message {
		Some(message) => format!("{}: {}", paint_status(report.status), message),
		None => paint_status(report.status).to_string(),
	}
}
