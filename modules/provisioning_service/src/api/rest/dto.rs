//! REST DTOs with serde derives for HTTP API

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

// ===== Record DTOs =====

/// Configuration record response DTO
///
/// Credentials (directory API key, broker password) are never returned.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecordDto {
    /// Record key
    #[schema(example = "4f2a9c1e0b7d4e3f8a6b5c4d3e2f1a0b")]
    pub fingerprint: String,

    #[schema(example = "chirpstack.local")]
    pub directory_host: String,
    pub directory_port: u16,

    pub tenant_id: String,
    pub application_id: String,

    #[schema(example = "mqtt.local")]
    pub broker_host: String,
    pub broker_port: u16,
    pub broker_username: String,

    #[schema(example = "homeassistant")]
    pub discovery_prefix: String,
    pub vendor_prefix: String,

    pub options: OptionsDto,

    /// Creation timestamp
    pub created_at: chrono::DateTime<chrono::Utc>,

    /// Last update timestamp
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Record options DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OptionsDto {
    /// Seconds
    pub start_delay: u32,
    /// Seconds
    pub restore_age_window: u32,
    pub debug_payload_logging: bool,
    #[schema(example = "info")]
    pub log_level: String,
    /// Seconds, 0 disables polling
    pub online_poll_interval_per_device: u32,
    pub expire_after: bool,
}

/// List of records
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecordsListResponse {
    pub items: Vec<RecordDto>,
    pub total: usize,
}

// ===== Form DTOs =====

/// A step waiting for input
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FormDto {
    #[schema(example = "endpoint-entry")]
    pub step_id: String,
    pub fields: Vec<FormFieldDto>,
    /// Field name (or `base`) -> error code
    pub errors: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FormFieldDto {
    pub name: String,
    /// text, secret, integer, boolean or select
    pub kind: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_len: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// Omitted for secret fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

// ===== Flow DTOs =====

/// Outcome of a provisioning step
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FlowOutcomeDto {
    Form { form: FormDto },
    Created { record: RecordDto },
    Aborted { reason: String, fingerprint: String },
}

/// Newly started flow
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StartFlowResponse {
    pub flow_id: Uuid,
    pub result: FlowOutcomeDto,
}

/// Step submission, tagged with the step it is meant for
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(tag = "step_id")]
pub enum SubmitStepRequest {
    #[serde(rename = "endpoint-entry")]
    EndpointEntry {
        directory_host: String,
        directory_port: i64,
        directory_api_key: String,
    },
    #[serde(rename = "tenant-selection")]
    TenantSelection { tenant: String },
    #[serde(rename = "application-selection")]
    ApplicationSelection { application: String },
    #[serde(rename = "broker-configuration")]
    BrokerConfiguration(BrokerFieldsDto),
}

/// Broker fields of broker-configuration and `init`
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BrokerFieldsDto {
    pub broker_host: String,
    pub broker_port: i64,
    pub broker_username: String,
    /// Omitted on `init` to keep the stored password
    #[serde(default)]
    pub broker_password: Option<String>,
    pub discovery_prefix: String,
    #[serde(default)]
    pub vendor_prefix: Option<String>,
}

// ===== Reconfiguration DTOs =====

/// `init` submission: broker fields and options
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReconfigureRequest {
    #[serde(flatten)]
    pub broker: BrokerFieldsDto,
    pub start_delay: i64,
    pub restore_age_window: i64,
    pub debug_payload_logging: bool,
    pub log_level: String,
    pub online_poll_interval_per_device: i64,
    pub expire_after: bool,
}

/// Outcome of a reconfiguration
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReconfigureOutcomeDto {
    Form { form: FormDto },
    Updated { record: RecordDto },
    Aborted { reason: String, fingerprint: String },
}
