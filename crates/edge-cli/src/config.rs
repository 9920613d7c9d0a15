//! Edge Watch Configuration
//!
//! Layered configuration loading with figment, lowest priority first:
//! - built-in defaults
//! - configuration file (`edge.toml`, or the `--config` path)
//! - environment variables (`EDGE_*`, nested keys separated by `__`)
//! - command line flags

use std::path::Path;

use edge_core::config::{DEFAULT_PROBE_INTERVAL_MS, DEFAULT_PROBE_TIMEOUT_MS};
use edge_core::RoutingOptions;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

/// File looked up in the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "edge.toml";

/// Prefix for environment overrides, e.g. `EDGE_PROBE__URL`
pub const ENV_PREFIX: &str = "EDGE_";

// ----------------------------------------------------------------------------
// Watch Configuration
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub probe: ProbeSection,
    pub routing: RoutingSection,
    pub output: OutputSection,
}

/// Health endpoint and schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSection {
    pub url: Option<String>,
    pub interval_ms: u64,
    pub timeout_ms: u64,
}

/// Domain lists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingSection {
    pub allow: Vec<String>,
    pub deny: Vec<String>,
    pub prefer_local: bool,
}

/// Output and logging behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub verbose: bool,
    /// Runtime logging; events are printed either way
    pub runtime_logs: bool,
    pub pretty_json: bool,
}

impl Default for ProbeSection {
    fn default() -> Self {
        Self {
            url: None,
            interval_ms: DEFAULT_PROBE_INTERVAL_MS,
            timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
        }
    }
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            verbose: false,
            runtime_logs: true,
            pretty_json: false,
        }
    }
}

// ----------------------------------------------------------------------------
// Configuration Loading Logic
// ----------------------------------------------------------------------------

impl WatchConfig {
    /// Load configuration with every layer applied
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let file = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_FILE);
        if cli.config.is_some() && !Path::new(file).exists() {
            return Err(ConfigError::Loading(format!(
                "Configuration file not found: {}",
                file
            )));
        }

        let figment = Self::figment(file);
        Self::extract(Self::apply_overrides(figment, cli))
    }

    /// Defaults, file and environment, without command line overrides
    pub fn figment<P: AsRef<Path>>(file: P) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(file.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn apply_overrides(mut figment: Figment, cli: &Cli) -> Figment {
        if let Some(url) = &cli.probe_url {
            figment = figment.merge(("probe.url", url.clone()));
        }
        if let Some(interval) = cli.interval_ms {
            figment = figment.merge(("probe.interval_ms", interval));
        }
        if let Some(timeout) = cli.timeout_ms {
            figment = figment.merge(("probe.timeout_ms", timeout));
        }
        if !cli.allow.is_empty() {
            figment = figment.merge(("routing.allow", cli.allow.clone()));
        }
        if !cli.deny.is_empty() {
            figment = figment.merge(("routing.deny", cli.deny.clone()));
        }
        if cli.prefer_local {
            figment = figment.merge(("routing.prefer_local", true));
        }
        if cli.verbose {
            figment = figment.merge(("output.verbose", true));
        }
        figment
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        figment
            .extract()
            .map_err(|e| ConfigError::Loading(format!("Failed to load configuration: {}", e)))
    }

    /// Routing options handed to the controller. Validation happens at init.
    pub fn routing_options(&self) -> RoutingOptions {
        RoutingOptions {
            probe_url: self.probe.url.clone(),
            ..RoutingOptions::default()
        }
        .probe_interval_ms(self.probe.interval_ms)
        .probe_timeout_ms(self.probe.timeout_ms)
        .allow_list(self.routing.allow.iter().cloned())
        .deny_list(self.routing.deny.iter().cloned())
        .prefer_local(self.routing.prefer_local)
        .logging_enabled(self.output.runtime_logs)
    }

    /// Example configuration file content
    pub fn example_config() -> String {
        let example = WatchConfig {
            probe: ProbeSection {
                url: Some("http://127.0.0.1:3000/health".to_string()),
                ..ProbeSection::default()
            },
            routing: RoutingSection {
                allow: vec!["app.example.com".to_string()],
                deny: vec!["auth.example.com".to_string()],
                prefer_local: false,
            },
            output: OutputSection::default(),
        };

        toml::to_string_pretty(&example)
            .unwrap_or_else(|_| "# Failed to generate example config".to_string())
    }
}

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration loading error: {0}")]
    Loading(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use figment::Jail;

    #[test]
    fn test_defaults_match_runtime_defaults() {
        let config = WatchConfig::default();
        assert_eq!(config.probe.interval_ms, 5000);
        assert_eq!(config.probe.timeout_ms, 3000);
        assert!(config.probe.url.is_none());
        assert!(config.output.runtime_logs);
    }

    #[test]
    fn test_layers_apply_in_priority_order() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "edge.toml",
                r#"
                [probe]
                url = "http://127.0.0.1:3000/health"
                interval_ms = 2000

                [routing]
                allow = ["a.com"]
                deny = ["b.com"]
                "#,
            )?;
            jail.set_env("EDGE_PROBE__INTERVAL_MS", "4000");

            let cli = Cli::parse_from(["edge-watch", "--deny", "d.com"]);
            let config = WatchConfig::load(&cli).map_err(|e| e.to_string())?;

            assert_eq!(config.probe.url.as_deref(), Some("http://127.0.0.1:3000/health"));
            // Environment beats the file, flags beat both
            assert_eq!(config.probe.interval_ms, 4000);
            assert_eq!(config.routing.allow, vec!["a.com"]);
            assert_eq!(config.routing.deny, vec!["d.com"]);
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        Jail::expect_with(|_jail| {
            let cli = Cli::parse_from(["edge-watch", "--config", "absent.toml"]);
            assert!(WatchConfig::load(&cli).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_routing_options_validate() {
        let mut config = WatchConfig::default();
        config.probe.url = Some("http://127.0.0.1:3000/health".to_string());
        config.routing.allow = vec!["a.com".to_string()];

        let routing = config.routing_options().validate().unwrap();
        assert_eq!(routing.allow_list, vec!["a.com".to_string()]);
        assert!(routing.logging_enabled);
    }

    #[test]
    fn test_missing_url_fails_validation() {
        let config = WatchConfig::default();
        assert!(config.routing_options().validate().is_err());
    }

    #[test]
    fn test_example_config_round_trips() {
        let example = WatchConfig::example_config();
        assert!(example.contains("[probe]"));
        assert!(example.contains("[routing]"));

        let parsed: WatchConfig = toml::from_str(&example).unwrap();
        assert_eq!(parsed.routing.allow, vec!["app.example.com"]);
    }
}
