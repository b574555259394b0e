use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8765;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("FEED_PORT must be a port number, got {value:?}")]
    InvalidPort {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("FEED_HOST must be an IP address, got {0:?}")]
    InvalidHost(String),
}

/// Runtime configuration, read from `FEED_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub host: String,
    pub port: u16,
    /// Overrides the settings database location; the shell picks a
    /// per-user default when unset.
    pub settings_path: Option<PathBuf>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            settings_path: None,
        }
    }
}

impl FeedConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("FEED_HOST").unwrap_or_else(|| DEFAULT_HOST.into());
        let port = match lookup("FEED_PORT") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|source| ConfigError::InvalidPort { value, source })?,
            None => DEFAULT_PORT,
        };
        let settings_path = lookup("FEED_SETTINGS_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let config = Self {
            host,
            port,
            settings_path,
        };
        config.listen_addr()?;
        Ok(config)
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .host
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.host.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
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
    fn defaults_bind_all_interfaces() {
        let config = FeedConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, FeedConfig::default());
        assert_eq!(config.listen_addr().unwrap().to_string(), "0.0.0.0:8765");
    }

    #[test]
    fn overrides_are_applied() {
        let config = FeedConfig::from_lookup(lookup(&[
            ("FEED_HOST", "127.0.0.1"),
            ("FEED_PORT", "9000"),
            ("FEED_SETTINGS_PATH", "/tmp/feed/settings.db"),
        ]))
        .unwrap();
        assert_eq!(config.listen_addr().unwrap().to_string(), "127.0.0.1:9000");
        assert_eq!(
            config.settings_path,
            Some(PathBuf::from("/tmp/feed/settings.db"))
        );
    }

    #[test]
    fn bad_values_are_rejected() {
        let err = FeedConfig::from_lookup(lookup(&[("FEED_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort { .. }));

        let err = FeedConfig::from_lookup(lookup(&[("FEED_HOST", "localhost")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHost(_)));
    }
}
