use std::time::Duration;

use serde::{Deserialize, Serialize};
use wheel_core::{KEEPALIVE_SECS, MOCK_ENTRIES, SPIN_DURATION_MS, STALE_AFTER_MS};

use crate::distributor::MIN_VIEWER_QUEUE;
use crate::error::ConfigError;

/// How viewers receive state updates
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Long-lived event stream, server pushes every change
    #[default]
    Push,
    /// Clients query the current state on an interval
    Pull,
}

impl std::str::FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "push" | "sse" => Ok(Transport::Push),
            "pull" | "poll" => Ok(Transport::Pull),
            _ => Err(format!(
                "Invalid transport: '{}'. Must be 'push' or 'pull'",
                s
            )),
        }
    }
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Push => write!(f, "push"),
            Transport::Pull => write!(f, "pull"),
        }
    }
}

/// Runtime settings for the wheel service
#[derive(Debug, Clone)]
pub struct WheelConfig {
    pub bind_address: String,
    pub transport: Transport,
    /// Time from spin start to winner selection
    pub spin_duration: Duration,
    /// Quiet period after which the state is forced back to idle
    pub stale_after: Duration,
    pub keepalive: Duration,
    /// Per-viewer queue depth; a viewer with a full queue is dropped
    pub viewer_queue_capacity: usize,
    pub entries: Vec<String>,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            transport: Transport::default(),
            spin_duration: Duration::from_millis(SPIN_DURATION_MS),
            stale_after: Duration::from_millis(STALE_AFTER_MS),
            keepalive: Duration::from_secs(KEEPALIVE_SECS),
            viewer_queue_capacity: 16,
            entries: MOCK_ENTRIES.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl WheelConfig {
    /// Load settings from `WHEEL_*` environment variables, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`WheelConfig::from_env`] with an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("WHEEL_BIND_ADDRESS") {
            config.bind_address = addr;
        }
        if let Some(raw) = lookup("WHEEL_TRANSPORT") {
            config.transport = raw.parse().map_err(|reason| ConfigError::Invalid {
                key: "WHEEL_TRANSPORT",
                value: raw.clone(),
                reason,
            })?;
        }
        if let Some(raw) = lookup("WHEEL_SPIN_DURATION_MS") {
            config.spin_duration = Duration::from_millis(parse_num("WHEEL_SPIN_DURATION_MS", &raw)?);
        }
        if let Some(raw) = lookup("WHEEL_STALE_AFTER_MS") {
            config.stale_after = Duration::from_millis(parse_num("WHEEL_STALE_AFTER_MS", &raw)?);
        }
        if let Some(raw) = lookup("WHEEL_KEEPALIVE_SECS") {
            config.keepalive = Duration::from_secs(parse_num("WHEEL_KEEPALIVE_SECS", &raw)?);
        }
        if let Some(raw) = lookup("WHEEL_VIEWER_QUEUE") {
            config.viewer_queue_capacity = parse_num("WHEEL_VIEWER_QUEUE", &raw)? as usize;
        }
        if let Some(raw) = lookup("WHEEL_ENTRIES") {
            config.entries = parse_entries(&raw);
        }

        config.validate()?;

        if config.stale_after <= config.spin_duration {
            tracing::warn!(
                "Stale window ({:?}) does not exceed spin duration ({:?}); spins may be reset mid-flight",
                config.stale_after,
                config.spin_duration
            );
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entries.is_empty() {
            return Err(ConfigError::NoEntries);
        }
        if self.spin_duration.is_zero() {
            return Err(ConfigError::Zero("spin duration"));
        }
        if self.stale_after.is_zero() {
            return Err(ConfigError::Zero("stale window"));
        }
        if self.keepalive.is_zero() {
            return Err(ConfigError::Zero("keepalive interval"));
        }
        if self.viewer_queue_capacity < MIN_VIEWER_QUEUE {
            return Err(ConfigError::TooSmall {
                what: "viewer queue capacity",
                min: MIN_VIEWER_QUEUE,
            });
        }
        Ok(())
    }
}

/// Split a comma-separated entry list, dropping blanks
pub fn parse_entries(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_num(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = WheelConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.transport, Transport::Push);
        assert_eq!(config.spin_duration, Duration::from_millis(5000));
        assert_eq!(config.stale_after, Duration::from_secs(10));
        assert_eq!(config.keepalive, Duration::from_secs(15));
        assert_eq!(config.entries.len(), 8);
    }

    #[test]
    fn test_env_overrides() {
        let config = WheelConfig::from_lookup(lookup(&[
            ("WHEEL_TRANSPORT", "Poll"),
            ("WHEEL_SPIN_DURATION_MS", "2500"),
            ("WHEEL_ENTRIES", " Ann , Bo,, Cy "),
            ("WHEEL_VIEWER_QUEUE", "4"),
        ]))
        .unwrap();
        assert_eq!(config.transport, Transport::Pull);
        assert_eq!(config.spin_duration, Duration::from_millis(2500));
        assert_eq!(config.entries, vec!["Ann", "Bo", "Cy"]);
        assert_eq!(config.viewer_queue_capacity, 4);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = WheelConfig::from_lookup(lookup(&[("WHEEL_TRANSPORT", "carrier-pigeon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "WHEEL_TRANSPORT", .. }));

        let err = WheelConfig::from_lookup(lookup(&[("WHEEL_STALE_AFTER_MS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "WHEEL_STALE_AFTER_MS", .. }));

        let err = WheelConfig::from_lookup(lookup(&[("WHEEL_ENTRIES", " , ")])).unwrap_err();
        assert_eq!(err, ConfigError::NoEntries);

        let err = WheelConfig::from_lookup(lookup(&[("WHEEL_KEEPALIVE_SECS", "0")])).unwrap_err();
        assert_eq!(err, ConfigError::Zero("keepalive interval"));

        // One slot would be taken by the first frame, leaving no room for updates.
        for raw in ["0", "1"] {
            let err = WheelConfig::from_lookup(lookup(&[("WHEEL_VIEWER_QUEUE", raw)])).unwrap_err();
            assert_eq!(
                err,
                ConfigError::TooSmall {
                    what: "viewer queue capacity",
                    min: 2
                }
            );
        }
        let config = WheelConfig::from_lookup(lookup(&[("WHEEL_VIEWER_QUEUE", "2")])).unwrap();
        assert_eq!(config.viewer_queue_capacity, 2);
    }

    #[test]
    fn test_transport_display_round_trips() {
        assert_eq!(Transport::default(), Transport::Push);
        assert_eq!(Transport::Push.to_string(), "push");
        assert_eq!("SSE".parse::<Transport>(), Ok(Transport::Push));
        assert_eq!("pull".parse::<Transport>(), Ok(Transport::Pull));
    }
}
