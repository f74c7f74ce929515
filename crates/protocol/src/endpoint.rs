use std::fmt;

/// Fixed path of the v3 remote control socket.
pub const API_PATH: &str = "/api/v3/";

/// A validated `host:port` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
	pub host: String,
	pub port: u16,
}

impl Endpoint {
	/// Validates presence only: a non-blank host and a port that parses as a
	/// non-zero `u16`. Hostname/IP syntax is left to the resolver.
	pub fn parse(host: &str, port: &str) -> Option<Self> {
		let host = host.trim();
		if host.is_empty() {
			return None;
		}
		let port = port.trim().parse::<u16>().ok().filter(|p| *p != 0)?;
		Some(Self {
			host: host.to_string(),
			port,
		})
	}

	pub fn url(&self) -> String {
		format!("ws://{}:{}{}", self.host, self.port, API_PATH)
	}
}

impl fmt::Display for Endpoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.host, self.port)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn url_appends_api_path() {
		let endpoint = Endpoint::parse("10.0.0.5", "26000").unwrap();
		assert_eq!(endpoint.url(), "ws://10.0.0.5:26000/api/v3/");
	}

	#[test]
	fn rejects_missing_host_or_port() {
		assert!(Endpoint::parse("", "26000").is_none());
		assert!(Endpoint::parse("   ", "26000").is_none());
		assert!(Endpoint::parse("smaart.local", "").is_none());
		assert!(Endpoint::parse("smaart.local", "0").is_none());
		assert!(Endpoint::parse("smaart.local", "70000").is_none());
		assert!(Endpoint::parse("smaart.local", "port").is_none());
	}

	#[test]
	fn trims_whitespace() {
		let endpoint = Endpoint::parse(" smaart.local ", " 26000 ").unwrap();
		assert_eq!(endpoint.to_string(), "smaart.local:26000");
	}
}
