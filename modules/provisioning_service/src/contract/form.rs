//! Interactive surface of the provisioning flows
//!
//! Each step is described by a [`StepForm`]: the typed fields it accepts, their
//! defaults and an error slot keyed by field name. Inputs arrive unvalidated
//! and are checked at the step boundary.

use super::error::FieldError;
use super::model::{ConfigurationRecord, Fingerprint};
use std::collections::BTreeMap;
use std::fmt;

/// Field names shared by forms, inputs and error slots
pub mod fields {
    pub const DIRECTORY_HOST: &str = "directory_host";
    pub const DIRECTORY_PORT: &str = "directory_port";
    pub const DIRECTORY_API_KEY: &str = "directory_api_key";
    pub const TENANT: &str = "tenant";
    pub const APPLICATION: &str = "application";
    pub const BROKER_HOST: &str = "broker_host";
    pub const BROKER_PORT: &str = "broker_port";
    pub const BROKER_USERNAME: &str = "broker_username";
    pub const BROKER_PASSWORD: &str = "broker_password";
    pub const DISCOVERY_PREFIX: &str = "discovery_prefix";
    pub const VENDOR_PREFIX: &str = "vendor_prefix";
    pub const START_DELAY: &str = "start_delay";
    pub const RESTORE_AGE_WINDOW: &str = "restore_age_window";
    pub const DEBUG_PAYLOAD_LOGGING: &str = "debug_payload_logging";
    pub const LOG_LEVEL: &str = "log_level";
    pub const ONLINE_POLL_INTERVAL_PER_DEVICE: &str = "online_poll_interval_per_device";
    pub const EXPIRE_AFTER: &str = "expire_after";
    /// Form-wide error slot not tied to a single field
    pub const BASE: &str = "base";
}

/// Step identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepId {
    EndpointEntry,
    TenantSelection,
    ApplicationSelection,
    BrokerConfiguration,
    /// Single step of the reconfiguration flow
    Init,
}

impl StepId {
    pub fn as_str(self) -> &'static str {
        match self {
            StepId::EndpointEntry => "endpoint-entry",
            StepId::TenantSelection => "tenant-selection",
            StepId::ApplicationSelection => "application-selection",
            StepId::BrokerConfiguration => "broker-configuration",
            StepId::Init => "init",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field type and its syntactic constraints
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text { min_len: usize },
    Secret,
    Integer { min: i64, max: i64 },
    Boolean,
    /// Closed choice among the listed values
    Select { options: Vec<String> },
}

/// Value presented as a field default
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<FieldValue>,
}

/// A step waiting for input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepForm {
    pub step_id: StepId,
    pub fields: Vec<FormField>,
    /// Field name -> error condition
    pub errors: BTreeMap<String, FieldError>,
}

impl StepForm {
    pub fn error_for(&self, field: &str) -> Option<&FieldError> {
        self.errors.get(field)
    }

    pub fn default_for(&self, field: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|f| f.name == field)
            .and_then(|f| f.default.as_ref())
    }
}

/// Directory endpoint fields as submitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointInput {
    pub host: String,
    pub port: i64,
    pub api_key: String,
}

/// Broker fields as submitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerInput {
    pub host: String,
    pub port: i64,
    pub username: String,
    /// Absent means no password on broker-configuration and the stored
    /// password on `init`
    pub password: Option<String>,
    pub discovery_prefix: String,
    /// Optional; absent means empty prefix
    pub vendor_prefix: Option<String>,
}

/// Option fields as submitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionsInput {
    pub start_delay: i64,
    pub restore_age_window: i64,
    pub debug_payload_logging: bool,
    pub log_level: String,
    pub online_poll_interval_per_device: i64,
    pub expire_after: bool,
}

/// Input for one provisioning step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepInput {
    Endpoint(EndpointInput),
    Tenant { tenant: String },
    Application { application: String },
    Broker(BrokerInput),
}

impl StepInput {
    /// Step this input belongs to
    pub fn step_id(&self) -> StepId {
        match self {
            StepInput::Endpoint(_) => StepId::EndpointEntry,
            StepInput::Tenant { .. } => StepId::TenantSelection,
            StepInput::Application { .. } => StepId::ApplicationSelection,
            StepInput::Broker(_) => StepId::BrokerConfiguration,
        }
    }
}

/// Input for the reconfiguration `init` step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconfigureInput {
    pub broker: BrokerInput,
    pub options: OptionsInput,
}

/// Terminal, non-retryable reasons a flow ends without a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// A stored record already carries this fingerprint
    AlreadyConfigured { fingerprint: Fingerprint },
}

impl AbortReason {
    pub fn as_code(&self) -> &'static str {
        match self {
            AbortReason::AlreadyConfigured { .. } => "already_configured",
        }
    }
}

/// Outcome of a provisioning step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowResult {
    /// The flow waits on this form (possibly with errors attached)
    ShowForm(StepForm),
    /// Terminal success
    Created(ConfigurationRecord),
    /// Terminal abort; the session was discarded
    Aborted(AbortReason),
}

impl FlowResult {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, FlowResult::ShowForm(_))
    }
}

/// Outcome of a reconfiguration submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconfigureResult {
    /// Nothing was saved; the form carries the errors
    ShowForm(StepForm),
    Updated(ConfigurationRecord),
    Aborted(AbortReason),
}
