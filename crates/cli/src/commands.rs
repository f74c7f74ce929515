use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use smaart::actions::UserAction;
use smaart::{Delivery, SessionConfig, SessionOptions, Smaart, Status};
use tracing::{debug, info};

use crate::cli::{Cli, Commands, ConfigAction};
use crate::styles::status_line;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub async fn run(cli: Cli) -> Result<()> {
	let path = cli.connection.config_path();
	let mut config = SessionConfig::load(&path).with_context(|| format!("failed to load {}", path.display()))?;
	config.merge(&cli.connection.overrides());
	debug!(?config, path = %path.display(), "effective settings");

	match cli.command {
		Commands::Action { action, timeout } => run_action(&config, action.into(), Duration::from_secs(timeout)).await,
		Commands::Watch => watch(&config).await,
		Commands::Probe { timeout } => probe(&config, Duration::from_secs(timeout)).await,
		Commands::Config { action } => config_command(action, &config, &path),
	}
}

async fn run_action(config: &SessionConfig, action: UserAction, timeout: Duration) -> Result<()> {
	ensure_complete(config)?;
	let client = Smaart::new(SessionOptions::default());
	client.init(config).await?;

	let outcome = send_action(&client, &action, timeout).await;
	client.shutdown().await?;
	outcome
}

async fn send_action(client: &Smaart, action: &UserAction, timeout: Duration) -> Result<()> {
	wait_ready(client, timeout).await?;

	let ticket = action.dispatch(client).with_context(|| format!("{action} failed"))?;
	match ticket.delivered().await {
		Delivery::Sent => {
			info!(action = action.label(), "sent");
			Ok(())
		}
		Delivery::NotConnected => bail!("{action}: connection to Smaart dropped before the command went out"),
		Delivery::Discarded => bail!("{action}: command was discarded"),
	}
}

async fn watch(config: &SessionConfig) -> Result<()> {
	let client = Smaart::new(SessionOptions::default());
	let mut status = client.status();
	client.init(config).await?;

	println!("{}", status_line(&status.borrow_and_update()));
	loop {
		tokio::select! {
			changed = status.changed() => {
				if changed.is_err() {
					break;
				}
				println!("{}", status_line(&status.borrow_and_update()));
			}
			_ = tokio::signal::ctrl_c() => break,
		}
	}

	client.shutdown().await?;
	Ok(())
}

async fn probe(config: &SessionConfig, timeout: Duration) -> Result<()> {
	ensure_complete(config)?;
	let client = Smaart::new(SessionOptions::default());
	client.init(config).await?;

	let outcome = wait_ready(&client, timeout).await;
	let report = client.status().borrow().clone();
	client.shutdown().await?;

	outcome?;
	println!("{}", status_line(&report));
	if !report.status.is_healthy() {
		bail!("Smaart reported {}", report.status.as_str());
	}
	Ok(())
}

fn config_command(action: ConfigAction, config: &SessionConfig, path: &Path) -> Result<()> {
	match action {
		ConfigAction::Show => {
			let mut shown = config.clone();
			if shown.password.is_some() {
				shown.password = Some("<redacted>".into());
			}
			println!("{}", serde_json::to_string_pretty(&shown)?);
		}
		ConfigAction::Save => {
			config.save(path).with_context(|| format!("failed to write {}", path.display()))?;
			println!("saved {}", path.display());
		}
	}
	Ok(())
}

fn ensure_complete(config: &SessionConfig) -> Result<()> {
	if !config.is_complete() {
		bail!("host and port required (pass --host/--port or run `smaart config save`)");
	}
	Ok(())
}

/// Waits until the first exchange with the server finished, bailing out early
/// on a status that means it won't.
async fn wait_ready(client: &Smaart, timeout: Duration) -> Result<()> {
	tokio::time::timeout(timeout, until_ready(client))
		.await
		.with_context(|| format!("Smaart did not answer within {}s", timeout.as_secs()))?
}

async fn until_ready(client: &Smaart) -> Result<()> {
	let mut status = client.status();
	loop {
		if client.snapshot().await?.handshake_complete {
			return Ok(());
		}

		let report = status.borrow_and_update().clone();
		if is_failure(report.status) {
			bail!("{}", status_line(&report));
		}

		tokio::select! {
			_ = status.changed() => {}
			_ = tokio::time::sleep(POLL_INTERVAL) => {}
		}
	}
}

fn is_failure(status: Status) -> bool {
	!status.is_healthy() && !matches!(status, Status::Connecting | Status::Disconnected)
}

#[cfg(test)]
mod tests {
	use std::fs;

	use clap::Parser;
	use tempfile::TempDir;

	use super::*;

	#[test]
	fn only_settled_problems_count_as_failure() {
		assert!(is_failure(Status::AuthenticationFailure));
		assert!(is_failure(Status::BadConfig));
		assert!(is_failure(Status::ConnectionFailure));
		assert!(!is_failure(Status::Connecting));
		assert!(!is_failure(Status::UnknownWarning));
	}

	#[tokio::test]
	async fn config_save_merges_flags_into_the_file() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join("config.json");
		fs::write(&path, r#"{"host":"10.0.0.5","port":"26000"}"#).unwrap();

		let path_arg = path.to_str().unwrap();
		let cli = Cli::try_parse_from(["smaart", "--config", path_arg, "config", "save", "--port", "26001"]).unwrap();
		run(cli).await.unwrap();

		let saved = SessionConfig::load(&path).unwrap();
		assert_eq!(saved.host.as_deref(), Some("10.0.0.5"));
		assert_eq!(saved.port.as_deref(), Some("26001"));
	}

	#[tokio::test]
	async fn actions_need_host_and_port() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join("missing.json");

		let cli = Cli::try_parse_from(["smaart", "--config", path.to_str().unwrap(), "action", "reset-average"]).unwrap();
		let err = run(cli).await.unwrap_err();
		assert!(err.to_string().contains("host and port required"));
	}

	#[tokio::test]
	async fn broken_config_file_is_reported() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join("config.json");
		fs::write(&path, "not json").unwrap();

		let cli = Cli::try_parse_from(["smaart", "--config", path.to_str().unwrap(), "config", "show"]).unwrap();
		let err = run(cli).await.unwrap_err();
		assert!(err.to_string().contains("failed to load"));
	}
}
