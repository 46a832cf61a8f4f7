//! Configuration for the control connection.
//!
//! This module provides the target address, the authentication secret and
//! the timeouts used when connecting to and talking with the control port.

use crate::error::{ControlError, Result};
use std::fmt;
use std::time::Duration;

/// Default control port host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default control port.
pub const DEFAULT_PORT: u16 = 9051;

/// Default upper bound on a single reply line, terminator included.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// Environment variable overriding the host in [`ControlConfig::from_env`].
pub const ENV_HOST: &str = "TOR_CONTROL_HOST";
/// Environment variable overriding the port in [`ControlConfig::from_env`].
pub const ENV_PORT: &str = "TOR_CONTROL_PORT";
/// Environment variable overriding the password in [`ControlConfig::from_env`].
pub const ENV_PASSWORD: &str = "TOR_CONTROL_PASSWORD";

/// Configuration for connecting to the control port.
#[derive(Clone)]
pub struct ControlConfig {
    /// Host name or address of the daemon.
    pub host: String,
    /// Control port.
    pub port: u16,
    /// Secret presented in the AUTHENTICATE handshake.
    pub password: String,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// How long to wait for a reply line. `None` waits indefinitely.
    pub read_timeout: Option<Duration>,
    /// Write timeout for commands.
    pub write_timeout: Duration,
    /// Longest reply line accepted before the framing is considered broken.
    pub max_line_length: usize,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            password: String::new(),
            connect_timeout: Duration::from_secs(30),
            read_timeout: Some(Duration::from_secs(60)),
            write_timeout: Duration::from_secs(30),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

impl ControlConfig {
    /// Create a configuration for `host:port` authenticating with `password`.
    pub fn new(host: impl Into<String>, port: u16, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            password: password.into(),
            ..Self::default()
        }
    }

    /// Build a configuration from the defaults, overridden by
    /// `TOR_CONTROL_HOST`, `TOR_CONTROL_PORT` and `TOR_CONTROL_PASSWORD`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(host) = lookup(ENV_HOST).filter(|h| !h.is_empty()) {
            config.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            config.port = port.trim().parse().map_err(|e| {
                ControlError::Configuration(format!("Invalid {} '{}': {}", ENV_PORT, port, e))
            })?;
        }
        if let Some(password) = lookup(ENV_PASSWORD) {
            config.password = password;
        }

        Ok(config)
    }

    /// Set the host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the authentication secret.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the reply timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Wait for replies indefinitely.
    pub fn no_read_timeout(mut self) -> Self {
        self.read_timeout = None;
        self
    }

    /// Set the write timeout.
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set the longest accepted reply line.
    pub fn max_line_length(mut self, limit: usize) -> Self {
        self.max_line_length = limit;
        self
    }

    /// The `host:port` string dialed by `connect`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for ControlConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &"<redacted>")
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("write_timeout", &self.write_timeout)
            .field("max_line_length", &self.max_line_length)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ControlConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 9051);
        assert!(config.password.is_empty());
        assert_eq!(config.address(), "localhost:9051");
        assert_eq!(config.read_timeout, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_config_builder() {
        let config = ControlConfig::new("127.0.0.1", 9151, "secret")
            .connect_timeout(Duration::from_secs(10))
            .no_read_timeout()
            .max_line_length(512);

        assert_eq!(config.address(), "127.0.0.1:9151");
        assert_eq!(config.password, "secret");
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.read_timeout, None);
        assert_eq!(config.max_line_length, 512);
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = ControlConfig::default().password("hunter2");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_from_env_defaults() {
        let config = ControlConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.address(), "localhost:9051");
        assert!(config.password.is_empty());
    }

    #[test]
    fn test_from_env_overrides() {
        let config = ControlConfig::from_lookup(lookup(&[
            (ENV_HOST, "10.0.0.2"),
            (ENV_PORT, "9151"),
            (ENV_PASSWORD, "s3cret"),
        ]))
        .unwrap();
        assert_eq!(config.address(), "10.0.0.2:9151");
        assert_eq!(config.password, "s3cret");
    }

    #[test]
    fn test_from_env_invalid_port() {
        let result = ControlConfig::from_lookup(lookup(&[(ENV_PORT, "ninety")]));
        assert!(matches!(result, Err(ControlError::Configuration(_))));
    }
}
