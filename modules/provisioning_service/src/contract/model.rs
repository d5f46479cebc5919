//! Contract models for provisioning service
//!
//! These models are transport-agnostic and used for inter-module communication.
//! NO serde derives - these are pure domain models.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// Directory service instance the tenants and applications are listed from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEndpoint {
    /// Directory API host name or address
    pub host: String,
    /// Directory API port
    pub port: u16,
    /// API key used to authenticate against the directory
    pub api_key: String,
}

/// Top-level organizational scope within the directory service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tenant {
    /// Display name shown in the selection list
    pub name: String,
    /// Opaque service-assigned identifier
    pub id: String,
}

/// Application scoped to a tenant, the final selection target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    /// Display name shown in the selection list
    pub name: String,
    /// Opaque service-assigned identifier
    pub id: String,
}

/// Message broker the configuration delivers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerEndpoint {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Topic prefix used for discovery messages
    pub discovery_prefix: String,
    /// Topic prefix used by the directory vendor's own messages (may be empty)
    pub vendor_prefix: String,
}

/// Deterministic identity of a configuration, used as its unique key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Length of the hex rendering
    pub const LEN: usize = 32;

    /// Wrap an already computed hex digest
    ///
    /// Returns `None` when the value is not a lowercase hex string of [`Self::LEN`] characters.
    pub fn parse(value: &str) -> Option<Self> {
        let valid = value.len() == Self::LEN
            && value
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        valid.then(|| Self(value.to_string()))
    }

    pub(crate) fn from_digest(digest: u128) -> Self {
        Self(format!("{:032x}", digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Log level applied to the running configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub const ALL: [LogLevel; 4] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warning,
        LogLevel::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| format!("unknown log level '{}'", s))
    }
}

/// Runtime options of a configuration, editable independently of its identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionsRecord {
    /// Seconds to wait before activation
    pub start_delay: u32,
    /// Seconds a restored state may be stale before it is discarded
    pub restore_age_window: u32,
    /// Verbose payload tracing
    pub debug_payload_logging: bool,
    pub log_level: LogLevel,
    /// Seconds between per-device online polls (0 disables polling)
    pub online_poll_interval_per_device: u32,
    /// Whether entities expire when updates stop
    pub expire_after: bool,
}

impl Default for OptionsRecord {
    fn default() -> Self {
        Self {
            start_delay: 2,
            restore_age_window: 4,
            debug_payload_logging: false,
            log_level: LogLevel::Info,
            online_poll_interval_per_device: 0,
            expire_after: false,
        }
    }
}

/// Persisted result of a successful provisioning session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationRecord {
    /// Unique key, computed at commit time and never changed afterwards
    pub fingerprint: Fingerprint,
    pub directory: DirectoryEndpoint,
    pub tenant_id: String,
    pub application_id: String,
    pub broker: BrokerEndpoint,
    pub options: OptionsRecord,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}
