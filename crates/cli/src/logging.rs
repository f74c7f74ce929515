use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Installs the stderr subscriber. `RUST_LOG` wins over `verbosity` when set.
pub fn init_logging(verbosity: u8) {
	// 0 = warnings and errors (server error table, connection loss)
	// 1 (-v) = session lifecycle; socket library stays at warn
	// 2+ (-vv) = every frame sent and received, handshake details from tungstenite
	let filter = match verbosity {
		0 => "warn",
		1 => "info,tungstenite=warn,tokio_tungstenite=warn",
		_ => "debug,smaart_runtime::queue=trace",
	};

	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(stderr)
		.with_ansi(std::io::stderr().is_terminal())
		.with_target(verbosity > 1)
		.without_time()
		.compact()
		.init();
}
