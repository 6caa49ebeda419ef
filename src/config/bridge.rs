//! Bridge configuration structures.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunable parameters for queue polling, metadata lookups, and shutdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Long-poll wait in seconds for receive calls.
    pub wait_time_secs: u64,
    /// Visibility timeout in seconds applied to received messages. Kept short
    /// so an undelivered message becomes receivable again quickly if this
    /// process stalls.
    pub visibility_timeout_secs: u64,
    /// Request timeout in seconds for instance-metadata calls.
    pub metadata_timeout_secs: u64,
    /// Bounded wait in seconds when joining each poller thread on shutdown.
    pub join_timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            wait_time_secs: 20,
            visibility_timeout_secs: 1,
            metadata_timeout_secs: 10,
            join_timeout_secs: 2,
        }
    }
}

impl BridgeConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the long-poll wait in seconds.
    #[must_use]
    pub fn with_wait_time_secs(mut self, secs: u64) -> Self {
        self.wait_time_secs = secs;
        self
    }

    /// Set the visibility timeout in seconds.
    #[must_use]
    pub fn with_visibility_timeout_secs(mut self, secs: u64) -> Self {
        self.visibility_timeout_secs = secs;
        self
    }

    /// Set the metadata request timeout in seconds.
    #[must_use]
    pub fn with_metadata_timeout_secs(mut self, secs: u64) -> Self {
        self.metadata_timeout_secs = secs;
        self
    }

    /// Set the per-poller join timeout in seconds used during shutdown.
    #[must_use]
    pub fn with_join_timeout_secs(mut self, secs: u64) -> Self {
        self.join_timeout_secs = secs;
        self
    }

    /// Long-poll wait as a duration.
    #[must_use]
    pub fn wait_time(&self) -> Duration {
        Duration::from_secs(self.wait_time_secs)
    }

    /// Visibility timeout as a duration.
    #[must_use]
    pub fn visibility_timeout(&self) -> Duration {
        Duration::from_secs(self.visibility_timeout_secs)
    }

    /// Metadata request timeout as a duration.
    #[must_use]
    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout_secs)
    }

    /// Shutdown join timeout as a duration.
    #[must_use]
    pub fn join_timeout(&self) -> Duration {
        Duration::from_secs(self.join_timeout_secs)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.wait_time_secs > 20 {
            return Err("wait_time_secs must not exceed 20 (SQS long-poll maximum)".into());
        }
        if self.visibility_timeout_secs == 0 {
            return Err("visibility_timeout_secs must be greater than 0".into());
        }
        if self.metadata_timeout_secs == 0 {
            return Err("metadata_timeout_secs must be greater than 0".into());
        }
        if self.join_timeout_secs == 0 {
            return Err("join_timeout_secs must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse a configuration from a JSON string and validate it.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation error description.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load a configuration from the environment, reading a local `.env` file
    /// first if one is present. Unset variables keep their defaults.
    ///
    /// Recognized variables: `SQS_BRIDGE_WAIT_TIME_SECS`,
    /// `SQS_BRIDGE_VISIBILITY_TIMEOUT_SECS`, `SQS_BRIDGE_METADATA_TIMEOUT_SECS`,
    /// `SQS_BRIDGE_JOIN_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns a description of the first unparsable or invalid value.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup. Missing keys
    /// keep their defaults.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let mut cfg = Self::default();
        if let Some(v) = parse_u64("SQS_BRIDGE_WAIT_TIME_SECS", &lookup)? {
            cfg.wait_time_secs = v;
        }
        if let Some(v) = parse_u64("SQS_BRIDGE_VISIBILITY_TIMEOUT_SECS", &lookup)? {
            cfg.visibility_timeout_secs = v;
        }
        if let Some(v) = parse_u64("SQS_BRIDGE_METADATA_TIMEOUT_SECS", &lookup)? {
            cfg.metadata_timeout_secs = v;
        }
        if let Some(v) = parse_u64("SQS_BRIDGE_JOIN_TIMEOUT_SECS", &lookup)? {
            cfg.join_timeout_secs = v;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_u64(
    key: &str,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<Option<u64>, String> {
    match lookup(key) {
        Some(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|e| format!("{key}: {e}")),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.wait_time_secs, 20);
        assert_eq!(cfg.visibility_timeout_secs, 1);
        assert_eq!(cfg.metadata_timeout_secs, 10);
        assert_eq!(cfg.join_timeout_secs, 2);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let cfg = BridgeConfig::new()
            .with_wait_time_secs(5)
            .with_visibility_timeout_secs(3)
            .with_metadata_timeout_secs(1)
            .with_join_timeout_secs(4);
        assert_eq!(cfg.wait_time(), Duration::from_secs(5));
        assert_eq!(cfg.visibility_timeout(), Duration::from_secs(3));
        assert_eq!(cfg.metadata_timeout(), Duration::from_secs(1));
        assert_eq!(cfg.join_timeout(), Duration::from_secs(4));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let cfg = BridgeConfig::new().with_wait_time_secs(21);
        assert!(cfg.validate().is_err());

        let cfg = BridgeConfig::new().with_visibility_timeout_secs(0);
        assert!(cfg.validate().is_err());

        let cfg = BridgeConfig::new().with_join_timeout_secs(0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_from_json_str() {
        let cfg = BridgeConfig::from_json_str(r#"{"wait_time_secs": 10}"#).unwrap();
        assert_eq!(cfg.wait_time_secs, 10);
        // Unspecified fields keep their defaults.
        assert_eq!(cfg.visibility_timeout_secs, 1);

        let err = BridgeConfig::from_json_str(r#"{"wait_time_secs": 99}"#).unwrap_err();
        assert!(err.contains("wait_time_secs"));
    }

    #[test]
    fn test_from_lookup_overrides_and_defaults() {
        let cfg = BridgeConfig::from_lookup(|key| {
            (key == "SQS_BRIDGE_WAIT_TIME_SECS").then(|| "7".to_string())
        })
        .unwrap();
        assert_eq!(cfg.wait_time_secs, 7);
        // Keys the lookup does not know keep their defaults.
        assert_eq!(cfg.visibility_timeout_secs, 1);
    }

    #[test]
    fn test_from_lookup_rejects_unparsable_values() {
        let err = BridgeConfig::from_lookup(|key| {
            (key == "SQS_BRIDGE_JOIN_TIMEOUT_SECS").then(|| "soon".to_string())
        })
        .unwrap_err();
        assert!(err.contains("SQS_BRIDGE_JOIN_TIMEOUT_SECS"));
    }
}
