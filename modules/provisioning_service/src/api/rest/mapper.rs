//! Mapper implementations for converting between DTOs and contract models
//!
//! This module contains all From/Into implementations for bidirectional
//! conversion between REST DTOs and transport-agnostic contract models.

use super::dto::*;
use crate::contract;

// ===== Record conversions =====

impl From<contract::ConfigurationRecord> for RecordDto {
    fn from(record: contract::ConfigurationRecord) -> Self {
        Self {
            fingerprint: record.fingerprint.to_string(),
            directory_host: record.directory.host,
            directory_port: record.directory.port,
            tenant_id: record.tenant_id,
            application_id: record.application_id,
            broker_host: record.broker.host,
            broker_port: record.broker.port,
            broker_username: record.broker.username,
            discovery_prefix: record.broker.discovery_prefix,
            vendor_prefix: record.broker.vendor_prefix,
            options: record.options.into(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl From<contract::OptionsRecord> for OptionsDto {
    fn from(options: contract::OptionsRecord) -> Self {
        Self {
            start_delay: options.start_delay,
            restore_age_window: options.restore_age_window,
            debug_payload_logging: options.debug_payload_logging,
            log_level: options.log_level.to_string(),
            online_poll_interval_per_device: options.online_poll_interval_per_device,
            expire_after: options.expire_after,
        }
    }
}

// ===== Form conversions =====

impl From<contract::StepForm> for FormDto {
    fn from(form: contract::StepForm) -> Self {
        Self {
            step_id: form.step_id.to_string(),
            fields: form.fields.into_iter().map(Into::into).collect(),
            errors: form
                .errors
                .into_iter()
                .map(|(field, error)| (field, error.as_code().to_string()))
                .collect(),
        }
    }
}

impl From<contract::FormField> for FormFieldDto {
    fn from(field: contract::FormField) -> Self {
        use contract::FieldKind;

        let mut dto = Self {
            name: field.name.to_string(),
            kind: String::new(),
            required: field.required,
            min_len: None,
            min: None,
            max: None,
            options: None,
            default: field.default.map(field_value_json),
        };

        match field.kind {
            FieldKind::Text { min_len } => {
                dto.kind = "text".into();
                dto.min_len = Some(min_len);
            }
            FieldKind::Secret => {
                dto.kind = "secret".into();
                dto.default = None;
            }
            FieldKind::Integer { min, max } => {
                dto.kind = "integer".into();
                dto.min = Some(min);
                dto.max = Some(max);
            }
            FieldKind::Boolean => dto.kind = "boolean".into(),
            FieldKind::Select { options } => {
                dto.kind = "select".into();
                dto.options = Some(options);
            }
        }
        dto
    }
}

fn field_value_json(value: contract::FieldValue) -> serde_json::Value {
    match value {
        contract::FieldValue::Text(text) => text.into(),
        contract::FieldValue::Integer(number) => number.into(),
        contract::FieldValue::Boolean(flag) => flag.into(),
    }
}

// ===== Flow conversions =====

impl From<contract::FlowResult> for FlowOutcomeDto {
    fn from(result: contract::FlowResult) -> Self {
        match result {
            contract::FlowResult::ShowForm(form) => FlowOutcomeDto::Form { form: form.into() },
            contract::FlowResult::Created(record) => FlowOutcomeDto::Created {
                record: record.into(),
            },
            contract::FlowResult::Aborted(reason) => {
                let (reason, fingerprint) = abort_parts(reason);
                FlowOutcomeDto::Aborted {
                    reason,
                    fingerprint,
                }
            }
        }
    }
}

impl From<contract::ReconfigureResult> for ReconfigureOutcomeDto {
    fn from(result: contract::ReconfigureResult) -> Self {
        match result {
            contract::ReconfigureResult::ShowForm(form) => {
                ReconfigureOutcomeDto::Form { form: form.into() }
            }
            contract::ReconfigureResult::Updated(record) => ReconfigureOutcomeDto::Updated {
                record: record.into(),
            },
            contract::ReconfigureResult::Aborted(reason) => {
                let (reason, fingerprint) = abort_parts(reason);
                ReconfigureOutcomeDto::Aborted {
                    reason,
                    fingerprint,
                }
            }
        }
    }
}

fn abort_parts(reason: contract::AbortReason) -> (String, String) {
    let code = reason.as_code().to_string();
    match reason {
        contract::AbortReason::AlreadyConfigured { fingerprint } => (code, fingerprint.to_string()),
    }
}

impl From<SubmitStepRequest> for contract::StepInput {
    fn from(req: SubmitStepRequest) -> Self {
        match req {
            SubmitStepRequest::EndpointEntry {
                directory_host,
                directory_port,
                directory_api_key,
            } => contract::StepInput::Endpoint(contract::EndpointInput {
                host: directory_host,
                port: directory_port,
                api_key: directory_api_key,
            }),
            SubmitStepRequest::TenantSelection { tenant } => contract::StepInput::Tenant { tenant },
            SubmitStepRequest::ApplicationSelection { application } => {
                contract::StepInput::Application { application }
            }
            SubmitStepRequest::BrokerConfiguration(broker) => {
                contract::StepInput::Broker(broker.into())
            }
        }
    }
}

impl From<BrokerFieldsDto> for contract::BrokerInput {
    fn from(dto: BrokerFieldsDto) -> Self {
        Self {
            host: dto.broker_host,
            port: dto.broker_port,
            username: dto.broker_username,
            password: dto.broker_password,
            discovery_prefix: dto.discovery_prefix,
            vendor_prefix: dto.vendor_prefix,
        }
    }
}

impl From<ReconfigureRequest> for contract::ReconfigureInput {
    fn from(req: ReconfigureRequest) -> Self {
        Self {
            broker: req.broker.into(),
            options: contract::OptionsInput {
                start_delay: req.start_delay,
                restore_age_window: req.restore_age_window,
                debug_payload_logging: req.debug_payload_logging,
                log_level: req.log_level,
                online_poll_interval_per_device: req.online_poll_interval_per_device,
                expire_after: req.expire_after,
            },
        }
    }
}
