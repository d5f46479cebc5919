//! Entity to model mappers
//!
//! Conversions between SeaORM entities and contract models

use super::entity;
use crate::contract::{
    BrokerEndpoint, ConfigurationRecord, DirectoryEndpoint, Fingerprint, LogLevel, OptionsRecord,
};
use anyhow::{anyhow, Context};

// ===== Record Conversions =====

impl TryFrom<entity::Model> for ConfigurationRecord {
    type Error = anyhow::Error;

    fn try_from(entity: entity::Model) -> Result<Self, Self::Error> {
        let fingerprint = Fingerprint::parse(&entity.fingerprint)
            .ok_or_else(|| anyhow!("malformed fingerprint '{}'", entity.fingerprint))?;
        let options: OptionsJson = serde_json::from_value(entity.options)
            .with_context(|| format!("malformed options of record {}", fingerprint))?;

        Ok(Self {
            directory: DirectoryEndpoint {
                host: entity.directory_host,
                port: u16::try_from(entity.directory_port).context("directory port")?,
                api_key: entity.directory_api_key,
            },
            tenant_id: entity.tenant_id,
            application_id: entity.application_id,
            broker: BrokerEndpoint {
                host: entity.broker_host,
                port: u16::try_from(entity.broker_port).context("broker port")?,
                username: entity.broker_username,
                password: entity.broker_password,
                discovery_prefix: entity.discovery_prefix,
                vendor_prefix: entity.vendor_prefix,
            },
            options: options.try_into()?,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
            fingerprint,
        })
    }
}

impl TryFrom<&ConfigurationRecord> for entity::ActiveModel {
    type Error = anyhow::Error;

    fn try_from(model: &ConfigurationRecord) -> Result<Self, Self::Error> {
        use sea_orm::ActiveValue::*;

        let options = serde_json::to_value(OptionsJson::from(&model.options))?;

        Ok(Self {
            fingerprint: Set(model.fingerprint.as_str().to_owned()),
            directory_host: Set(model.directory.host.clone()),
            directory_port: Set(i32::from(model.directory.port)),
            directory_api_key: Set(model.directory.api_key.clone()),
            tenant_id: Set(model.tenant_id.clone()),
            application_id: Set(model.application_id.clone()),
            broker_host: Set(model.broker.host.clone()),
            broker_port: Set(i32::from(model.broker.port)),
            broker_username: Set(model.broker.username.clone()),
            broker_password: Set(model.broker.password.clone()),
            discovery_prefix: Set(model.broker.discovery_prefix.clone()),
            vendor_prefix: Set(model.broker.vendor_prefix.clone()),
            options: Set(options),
            created_at: Set(model.created_at),
            updated_at: Set(model.updated_at),
        })
    }
}

// ===== JSON Serialization Helpers =====

/// JSON representation of record options for database storage
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct OptionsJson {
    start_delay: u32,
    restore_age_window: u32,
    debug_payload_logging: bool,
    log_level: String,
    online_poll_interval_per_device: u32,
    expire_after: bool,
}

impl TryFrom<OptionsJson> for OptionsRecord {
    type Error = anyhow::Error;

    fn try_from(json: OptionsJson) -> Result<Self, Self::Error> {
        Ok(Self {
            start_delay: json.start_delay,
            restore_age_window: json.restore_age_window,
            debug_payload_logging: json.debug_payload_logging,
            log_level: json.log_level.parse::<LogLevel>().map_err(|e| anyhow!(e))?,
            online_poll_interval_per_device: json.online_poll_interval_per_device,
            expire_after: json.expire_after,
        })
    }
}

impl From<&OptionsRecord> for OptionsJson {
    fn from(options: &OptionsRecord) -> Self {
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
