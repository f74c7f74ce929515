mod cli;
mod commands;
mod logging;
mod styles;

use clap::Parser;
use colored::Colorize;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	if let Err(err) = commands::run(cli).await {
		tracing::debug!(error = ?err, "command failed");
		eprintln!("{} {err:#}", "error:".red().bold());
		std::process::exit(1);
	}
}
