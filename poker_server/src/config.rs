use chrono::Duration;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DISCONNECT_GRACE_MINUTES: i64 = 10;
pub const IDLE_TIMEOUT_MINUTES: i64 = 30;
pub const CLEANUP_INTERVAL_SECS: u64 = 60;
pub const EVENT_CHANNEL_CAPACITY: usize = 100;
pub const RULES_DIR: &str = "rules";

/// Missing keys in a config file fall back to the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub disconnect_grace_minutes: i64,
    pub idle_timeout_minutes: i64,
    pub cleanup_interval_secs: u64,
    pub event_channel_capacity: usize,
    pub rules_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            disconnect_grace_minutes: DISCONNECT_GRACE_MINUTES,
            idle_timeout_minutes: IDLE_TIMEOUT_MINUTES,
            cleanup_interval_secs: CLEANUP_INTERVAL_SECS,
            event_channel_capacity: EVENT_CHANNEL_CAPACITY,
            rules_dir: PathBuf::from(RULES_DIR),
        }
    }
}

impl ServerConfig {
    pub fn disconnect_grace(&self) -> Duration {
        Duration::minutes(self.disconnect_grace_minutes)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&json)?)
    }

    /// Starts from the file named by `POKER_CONFIG` (if any), then applies
    /// `POKER_RULES_DIR` and `POKER_IDLE_TIMEOUT_MINUTES` when set.
    pub fn from_env() -> Self {
        let mut config = match std::env::var("POKER_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path)).unwrap_or_else(|e| {
                warn!("Ignoring config file {}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        };
        if let Ok(dir) = std::env::var("POKER_RULES_DIR") {
            config.rules_dir = PathBuf::from(dir);
        }
        if let Some(minutes) = std::env::var("POKER_IDLE_TIMEOUT_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|m| *m > 0)
        {
            config.idle_timeout_minutes = minutes;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.disconnect_grace(), Duration::minutes(10));
        assert_eq!(config.idle_timeout_minutes, 30);
        assert_eq!(config.rules_dir, PathBuf::from("rules"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            ServerConfig::from_json(r#"{"idle_timeout_minutes": 5, "rules_dir": "/srv/rules"}"#)
                .unwrap();
        assert_eq!(config.idle_timeout_minutes, 5);
        assert_eq!(config.rules_dir, PathBuf::from("/srv/rules"));
        assert_eq!(config.disconnect_grace_minutes, 10);
        assert_eq!(config.event_channel_capacity, 100);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(ServerConfig::from_json(r#"{"idle_timeout_minutes": "soon"}"#).is_err());
    }
}
