//! Field-level syntax validation of submitted step input
//!
//! Every failing field is reported at once so the re-presented form shows all
//! problems together.

use crate::contract::{
    fields, BrokerEndpoint, BrokerInput, DirectoryEndpoint, EndpointInput, FieldError, LogLevel,
    OptionsInput, OptionsRecord,
};
use std::collections::BTreeMap;

/// Field name -> error, as attached to a form
pub type FieldErrors = BTreeMap<String, FieldError>;

/// Syntactic limits shared by validation and form rendering
pub mod limits {
    pub const HOST_MIN_LEN: usize = 3;
    pub const API_KEY_MIN_LEN: usize = 10;
    pub const USERNAME_MIN_LEN: usize = 1;
    pub const DISCOVERY_PREFIX_MIN_LEN: usize = 1;
    pub const PORT_MAX: i64 = 0xffff;
    pub const START_DELAY_MAX: i64 = 60;
    pub const RESTORE_AGE_MAX: i64 = 60;
    pub const POLL_INTERVAL_MAX: i64 = 3600;
}

/// Validate the endpoint-entry fields
pub fn validate_endpoint(input: &EndpointInput) -> Result<DirectoryEndpoint, FieldErrors> {
    let mut errors = FieldErrors::new();
    check_min_len(&mut errors, fields::DIRECTORY_HOST, &input.host, limits::HOST_MIN_LEN);
    let port = check_range(&mut errors, fields::DIRECTORY_PORT, input.port, limits::PORT_MAX);
    check_min_len(
        &mut errors,
        fields::DIRECTORY_API_KEY,
        &input.api_key,
        limits::API_KEY_MIN_LEN,
    );

    match port {
        Some(port) if errors.is_empty() => Ok(DirectoryEndpoint {
            host: input.host.clone(),
            port: port as u16,
            api_key: input.api_key.clone(),
        }),
        _ => Err(errors),
    }
}

/// Validate the broker fields of broker-configuration and `init`
pub fn validate_broker(input: &BrokerInput) -> Result<BrokerEndpoint, FieldErrors> {
    let mut errors = FieldErrors::new();
    check_min_len(&mut errors, fields::BROKER_HOST, &input.host, limits::HOST_MIN_LEN);
    let port = check_range(&mut errors, fields::BROKER_PORT, input.port, limits::PORT_MAX);
    check_min_len(
        &mut errors,
        fields::BROKER_USERNAME,
        &input.username,
        limits::USERNAME_MIN_LEN,
    );
    check_min_len(
        &mut errors,
        fields::DISCOVERY_PREFIX,
        &input.discovery_prefix,
        limits::DISCOVERY_PREFIX_MIN_LEN,
    );

    match port {
        Some(port) if errors.is_empty() => Ok(BrokerEndpoint {
            host: input.host.clone(),
            port: port as u16,
            username: input.username.clone(),
            password: input.password.clone().unwrap_or_default(),
            discovery_prefix: input.discovery_prefix.clone(),
            vendor_prefix: input.vendor_prefix.clone().unwrap_or_default(),
        }),
        _ => Err(errors),
    }
}

/// Validate the option fields of the `init` step
pub fn validate_options(input: &OptionsInput) -> Result<OptionsRecord, FieldErrors> {
    let mut errors = FieldErrors::new();
    let start_delay = check_range(
        &mut errors,
        fields::START_DELAY,
        input.start_delay,
        limits::START_DELAY_MAX,
    );
    let restore_age_window = check_range(
        &mut errors,
        fields::RESTORE_AGE_WINDOW,
        input.restore_age_window,
        limits::RESTORE_AGE_MAX,
    );
    let poll_interval = check_range(
        &mut errors,
        fields::ONLINE_POLL_INTERVAL_PER_DEVICE,
        input.online_poll_interval_per_device,
        limits::POLL_INTERVAL_MAX,
    );
    let log_level = match input.log_level.parse::<LogLevel>() {
        Ok(level) => Some(level),
        Err(_) => {
            errors.insert(fields::LOG_LEVEL.to_string(), FieldError::InvalidChoice);
            None
        }
    };

    match (start_delay, restore_age_window, poll_interval, log_level) {
        (Some(start_delay), Some(restore_age_window), Some(poll_interval), Some(log_level)) => {
            Ok(OptionsRecord {
                start_delay: start_delay as u32,
                restore_age_window: restore_age_window as u32,
                debug_payload_logging: input.debug_payload_logging,
                log_level,
                online_poll_interval_per_device: poll_interval as u32,
                expire_after: input.expire_after,
            })
        }
        _ => Err(errors),
    }
}

fn check_min_len(errors: &mut FieldErrors, field: &str, value: &str, min: usize) {
    if value.chars().count() < min {
        errors.insert(field.to_string(), FieldError::TooShort { min });
    }
}

/// Range check against `0..=max`; returns the value when it fits
fn check_range(errors: &mut FieldErrors, field: &str, value: i64, max: i64) -> Option<i64> {
    if (0..=max).contains(&value) {
        Some(value)
    } else {
        errors.insert(field.to_string(), FieldError::OutOfRange { min: 0, max });
        None
    }
}
