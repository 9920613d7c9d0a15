//! Routing Configuration
//!
//! `RoutingOptions` is the loose form handed in by the embedding application
//! (every field optional, unknown fields ignored). `RoutingOptions::validate`
//! turns it into the immutable `RoutingConfig` the runtime works from.

use core::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::ValidationError;

// ----------------------------------------------------------------------------
// Defaults and Limits
// ----------------------------------------------------------------------------

pub const DEFAULT_PROBE_INTERVAL_MS: u64 = 5000;
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 3000;
pub const MIN_PROBE_INTERVAL_MS: u64 = 1000;
pub const MIN_PROBE_TIMEOUT_MS: u64 = 500;

// ----------------------------------------------------------------------------
// Routing Options
// ----------------------------------------------------------------------------

/// Unvalidated routing configuration as supplied by the caller.
///
/// Field names are accepted in camelCase, snake_case, or the legacy names
/// used by older embedders (`localServerHealth`, `whiteList`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoutingOptions {
    /// Health endpoint of the local server
    #[serde(
        alias = "probe_url",
        alias = "localServerHealth",
        skip_serializing_if = "Option::is_none"
    )]
    pub probe_url: Option<String>,
    /// Time between scheduled probes, in milliseconds
    #[serde(
        alias = "probe_interval_ms",
        alias = "healthCheckInterval",
        skip_serializing_if = "Option::is_none"
    )]
    pub probe_interval_ms: Option<u64>,
    /// Deadline for a single probe, in milliseconds
    #[serde(
        alias = "probe_timeout_ms",
        alias = "healthCheckTimeout",
        skip_serializing_if = "Option::is_none"
    )]
    pub probe_timeout_ms: Option<u64>,
    /// Domains routed to the local server while it is alive
    #[serde(
        alias = "allow_list",
        alias = "whiteList",
        skip_serializing_if = "Option::is_none"
    )]
    pub allow_list: Option<Vec<String>>,
    /// Domains never routed to the local server
    #[serde(
        alias = "deny_list",
        alias = "blackList",
        skip_serializing_if = "Option::is_none"
    )]
    pub deny_list: Option<Vec<String>>,
    /// Whether the host should prefer the local server when both are usable
    #[serde(
        alias = "prefer_local",
        alias = "isLocalServerFirst",
        skip_serializing_if = "Option::is_none"
    )]
    pub prefer_local: Option<bool>,
    /// Whether the runtime emits log output
    #[serde(
        alias = "logging_enabled",
        alias = "enableLog",
        skip_serializing_if = "Option::is_none"
    )]
    pub logging_enabled: Option<bool>,
}

impl RoutingOptions {
    /// Create options probing the given health endpoint, everything else default
    pub fn new<T: Into<String>>(probe_url: T) -> Self {
        Self {
            probe_url: Some(probe_url.into()),
            ..Self::default()
        }
    }

    /// Parse options from an arbitrary JSON object
    pub fn from_value(value: serde_json::Value) -> Result<Self, ValidationError> {
        serde_json::from_value(value).map_err(|e| ValidationError::Malformed {
            reason: e.to_string(),
        })
    }

    pub fn probe_interval_ms(mut self, interval_ms: u64) -> Self {
        self.probe_interval_ms = Some(interval_ms);
        self
    }

    pub fn probe_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.probe_timeout_ms = Some(timeout_ms);
        self
    }

    pub fn allow_list<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_list = Some(domains.into_iter().map(Into::into).collect());
        self
    }

    pub fn deny_list<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deny_list = Some(domains.into_iter().map(Into::into).collect());
        self
    }

    pub fn prefer_local(mut self, prefer_local: bool) -> Self {
        self.prefer_local = Some(prefer_local);
        self
    }

    pub fn logging_enabled(mut self, enabled: bool) -> Self {
        self.logging_enabled = Some(enabled);
        self
    }

    /// Apply defaults and check every constraint
    pub fn validate(self) -> Result<RoutingConfig, ValidationError> {
        let probe_url = match self.probe_url {
            Some(url) if !url.is_empty() => url,
            _ => return Err(ValidationError::MissingProbeUrl),
        };

        let interval_ms = self.probe_interval_ms.unwrap_or(DEFAULT_PROBE_INTERVAL_MS);
        if interval_ms < MIN_PROBE_INTERVAL_MS {
            return Err(ValidationError::IntervalTooShort {
                value: interval_ms,
                min: MIN_PROBE_INTERVAL_MS,
            });
        }

        let timeout_ms = self.probe_timeout_ms.unwrap_or(DEFAULT_PROBE_TIMEOUT_MS);
        if timeout_ms < MIN_PROBE_TIMEOUT_MS {
            return Err(ValidationError::TimeoutTooShort {
                value: timeout_ms,
                min: MIN_PROBE_TIMEOUT_MS,
            });
        }

        if timeout_ms >= interval_ms {
            warn!(
                interval_ms,
                timeout_ms, "probe timeout is not shorter than the probe interval; ticks may be skipped"
            );
        }

        Ok(RoutingConfig {
            probe_url,
            probe_interval: Duration::from_millis(interval_ms),
            probe_timeout: Duration::from_millis(timeout_ms),
            allow_list: self.allow_list.unwrap_or_default(),
            deny_list: self.deny_list.unwrap_or_default(),
            prefer_local: self.prefer_local.unwrap_or(false),
            logging_enabled: self.logging_enabled.unwrap_or(true),
        })
    }
}

// ----------------------------------------------------------------------------
// Routing Configuration
// ----------------------------------------------------------------------------

/// Validated routing configuration.
///
/// Only `allow_list` and `deny_list` change after init, through the
/// controller's update calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingConfig {
    pub probe_url: String,
    pub probe_interval: Duration,
    pub probe_timeout: Duration,
    pub allow_list: Vec<String>,
    pub deny_list: Vec<String>,
    pub prefer_local: bool,
    pub logging_enabled: bool,
}

impl RoutingConfig {
    /// Loose form of this configuration, e.g. for writing it back to a file
    pub fn to_options(&self) -> RoutingOptions {
        RoutingOptions {
            probe_url: Some(self.probe_url.clone()),
            probe_interval_ms: Some(self.probe_interval.as_millis() as u64),
            probe_timeout_ms: Some(self.probe_timeout.as_millis() as u64),
            allow_list: Some(self.allow_list.clone()),
            deny_list: Some(self.deny_list.clone()),
            prefer_local: Some(self.prefer_local),
            logging_enabled: Some(self.logging_enabled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_applied() {
        let config = RoutingOptions::new("http://127.0.0.1:8080/health")
            .validate()
            .unwrap();

        assert_eq!(config.probe_interval, Duration::from_millis(5000));
        assert_eq!(config.probe_timeout, Duration::from_millis(3000));
        assert!(config.allow_list.is_empty());
        assert!(config.deny_list.is_empty());
        assert!(!config.prefer_local);
        assert!(config.logging_enabled);
    }

    #[test]
    fn test_missing_or_empty_probe_url() {
        assert_eq!(
            RoutingOptions::default().validate(),
            Err(ValidationError::MissingProbeUrl)
        );
        assert_eq!(
            RoutingOptions::new("").validate(),
            Err(ValidationError::MissingProbeUrl)
        );
    }

    #[test]
    fn test_interval_and_timeout_floors() {
        let err = RoutingOptions::new("x")
            .probe_interval_ms(500)
            .validate()
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::IntervalTooShort {
                value: 500,
                min: 1000
            }
        );

        let err = RoutingOptions::new("x")
            .probe_timeout_ms(499)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ValidationError::TimeoutTooShort { .. }));

        // Boundaries are inclusive
        assert!(RoutingOptions::new("x")
            .probe_interval_ms(1000)
            .probe_timeout_ms(500)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_timeout_longer_than_interval_is_accepted() {
        let config = RoutingOptions::new("x")
            .probe_interval_ms(1000)
            .probe_timeout_ms(2000)
            .validate()
            .unwrap();
        assert_eq!(config.probe_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_from_value_accepts_all_naming_styles() {
        let camel = RoutingOptions::from_value(json!({
            "probeUrl": "http://a/health",
            "probeIntervalMs": 2000,
            "allowList": ["a.com"],
            "preferLocal": true
        }))
        .unwrap();
        let legacy = RoutingOptions::from_value(json!({
            "localServerHealth": "http://a/health",
            "healthCheckInterval": 2000,
            "whiteList": ["a.com"],
            "isLocalServerFirst": true
        }))
        .unwrap();
        let snake = RoutingOptions::from_value(json!({
            "probe_url": "http://a/health",
            "probe_interval_ms": 2000,
            "allow_list": ["a.com"],
            "prefer_local": true
        }))
        .unwrap();

        assert_eq!(camel, legacy);
        assert_eq!(camel, snake);
    }

    #[test]
    fn test_from_value_ignores_unknown_fields() {
        let options = RoutingOptions::from_value(json!({
            "probeUrl": "http://a/health",
            "somethingElse": {"nested": true}
        }))
        .unwrap();
        assert_eq!(options.probe_url.as_deref(), Some("http://a/health"));
    }

    #[test]
    fn test_from_value_rejects_non_sequence_lists() {
        let err = RoutingOptions::from_value(json!({
            "probeUrl": "http://a/health",
            "denyList": "b.com"
        }))
        .unwrap_err();
        assert!(matches!(err, ValidationError::Malformed { .. }));
    }

    #[test]
    fn test_to_options_round_trips_through_validate() {
        let config = RoutingOptions::new("http://a/health")
            .allow_list(["a.com"])
            .deny_list(["b.com"])
            .prefer_local(true)
            .logging_enabled(false)
            .validate()
            .unwrap();

        assert_eq!(config.to_options().validate().unwrap(), config);
    }
}
