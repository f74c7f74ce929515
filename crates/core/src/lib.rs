//! Client for the Rational Acoustics Smaart v3 remote control API.
//!
//! [`Smaart`] owns one session to a Smaart server (`ws://<host>:<port>/api/v3/`).
//! Give it a [`SessionConfig`] and it connects, answers the password challenge,
//! and reconnects on its own after the link drops. Commands are fire-and-forget:
//! they are queued, sent one at a time, and their effect is observed through
//! [`Smaart::status`].
//!
//! ```ignore
//! let smaart = Smaart::new(SessionOptions::default());
//! smaart.init(&SessionConfig::new("10.0.0.5", "26000")).await?;
//! smaart.select_tab("Main")?;
//! smaart.reset_avg()?.delivered().await;
//! ```
//!
//! [`actions`] lists the user-facing actions (including the keyboard
//! shortcuts) on top of the typed command methods.

pub mod actions;
mod client;
pub mod config;
pub mod error;

pub use client::Smaart;
pub use config::SessionConfig;
pub use error::{Error, Result};
pub use smaart_protocol::Status;
pub use smaart_runtime::{Delivery, SessionOptions, SessionSnapshot, SessionState, StatusReport, Ticket};
