//! Configuration for provisioning service module

use crate::contract::{OptionsInput, OptionsRecord};
use crate::domain::validation;
use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Provisioning service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Values presented on the first render of each form
    #[serde(default)]
    pub form_defaults: FormDefaults,

    /// Options assigned to every newly committed record
    #[serde(default)]
    pub default_options: DefaultOptions,

    /// Maximum number of provisioning flows open at once
    #[serde(default = "default_max_open_flows")]
    pub max_open_flows: usize,

    /// Idle time after which an open flow is evicted
    #[serde(default = "default_flow_idle_timeout", with = "humantime_serde")]
    pub flow_idle_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            form_defaults: FormDefaults::default(),
            default_options: DefaultOptions::default(),
            max_open_flows: default_max_open_flows(),
            flow_idle_timeout: default_flow_idle_timeout(),
        }
    }
}

impl Config {
    /// Load from an optional YAML file, then apply `PROVISIONING_` environment overrides
    ///
    /// Nested keys use a double underscore, e.g. `PROVISIONING_DEFAULT_OPTIONS__LOG_LEVEL=debug`.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let cfg = figment
            .merge(Env::prefixed("PROVISIONING_").split("__"))
            .extract()?;
        Ok(cfg)
    }
}

/// First-render defaults of the endpoint-entry and broker-configuration forms
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormDefaults {
    pub directory_host: String,
    pub directory_port: u16,
    pub directory_api_key: String,
    pub broker_host: String,
    pub broker_port: u16,
    pub broker_username: String,
    pub broker_password: String,
    pub discovery_prefix: String,
    pub vendor_prefix: String,
}

impl Default for FormDefaults {
    fn default() -> Self {
        Self {
            directory_host: "localhost".to_owned(),
            directory_port: 8080,
            directory_api_key: String::new(),
            broker_host: "localhost".to_owned(),
            broker_port: 1883,
            broker_username: String::new(),
            broker_password: String::new(),
            discovery_prefix: "homeassistant".to_owned(),
            vendor_prefix: String::new(),
        }
    }
}

/// Options written at commit time
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultOptions {
    pub start_delay: u32,
    pub restore_age_window: u32,
    pub debug_payload_logging: bool,
    /// One of debug, info, warning, error
    pub log_level: String,
    pub online_poll_interval_per_device: u32,
    pub expire_after: bool,
}

impl Default for DefaultOptions {
    fn default() -> Self {
        let options = OptionsRecord::default();
        Self {
            start_delay: options.start_delay,
            restore_age_window: options.restore_age_window,
            debug_payload_logging: options.debug_payload_logging,
            log_level: options.log_level.as_str().to_owned(),
            online_poll_interval_per_device: options.online_poll_interval_per_device,
            expire_after: options.expire_after,
        }
    }
}

impl DefaultOptions {
    /// Build the options record under the same rules as the `init` form
    pub fn to_record(&self) -> anyhow::Result<OptionsRecord> {
        let input = OptionsInput {
            start_delay: i64::from(self.start_delay),
            restore_age_window: i64::from(self.restore_age_window),
            debug_payload_logging: self.debug_payload_logging,
            log_level: self.log_level.clone(),
            online_poll_interval_per_device: i64::from(self.online_poll_interval_per_device),
            expire_after: self.expire_after,
        };
        validation::validate_options(&input).map_err(|errors| {
            let invalid: Vec<String> = errors
                .iter()
                .map(|(field, error)| format!("default_options.{}: {}", field, error.as_code()))
                .collect();
            anyhow::anyhow!("invalid default options: {}", invalid.join(", "))
        })
    }
}

fn default_max_open_flows() -> usize {
    64
}

fn default_flow_idle_timeout() -> Duration {
    Duration::from_secs(10 * 60)
}
