//! Form rendering for every step
//!
//! Defaults come from the last submitted values when a step is re-presented,
//! otherwise from the configured first-render defaults (or the stored record
//! for the `init` step).

use super::session::Choices;
use super::validation::{limits, FieldErrors};
use crate::config::FormDefaults;
use crate::contract::{
    fields, BrokerInput, ConfigurationRecord, EndpointInput, FieldKind, FieldValue, FormField,
    LogLevel, OptionsInput, StepForm, StepId,
};

fn text(name: &'static str, min_len: usize, default: &str) -> FormField {
    FormField {
        name,
        kind: FieldKind::Text { min_len },
        required: true,
        default: Some(FieldValue::Text(default.to_owned())),
    }
}

fn secret(name: &'static str, default: &str) -> FormField {
    FormField {
        name,
        kind: FieldKind::Secret,
        required: true,
        default: Some(FieldValue::Text(default.to_owned())),
    }
}

fn integer(name: &'static str, max: i64, default: i64) -> FormField {
    FormField {
        name,
        kind: FieldKind::Integer { min: 0, max },
        required: true,
        default: Some(FieldValue::Integer(default)),
    }
}

fn boolean(name: &'static str, default: bool) -> FormField {
    FormField {
        name,
        kind: FieldKind::Boolean,
        required: true,
        default: Some(FieldValue::Boolean(default)),
    }
}

fn select(name: &'static str, options: Vec<String>, default: Option<String>) -> FormField {
    FormField {
        name,
        kind: FieldKind::Select { options },
        required: true,
        default: default.map(FieldValue::Text),
    }
}

pub fn endpoint_form(
    defaults: &FormDefaults,
    last: Option<&EndpointInput>,
    errors: FieldErrors,
) -> StepForm {
    let (host, port, api_key) = match last {
        Some(input) => (input.host.as_str(), input.port, input.api_key.as_str()),
        None => (
            defaults.directory_host.as_str(),
            i64::from(defaults.directory_port),
            defaults.directory_api_key.as_str(),
        ),
    };

    StepForm {
        step_id: StepId::EndpointEntry,
        fields: vec![
            text(fields::DIRECTORY_HOST, limits::HOST_MIN_LEN, host),
            integer(fields::DIRECTORY_PORT, limits::PORT_MAX, port),
            FormField {
                kind: FieldKind::Text {
                    min_len: limits::API_KEY_MIN_LEN,
                },
                ..secret(fields::DIRECTORY_API_KEY, api_key)
            },
        ],
        errors,
    }
}

/// Tenant selection; `selected` is kept as the default when it is one of the choices
pub fn tenant_form(tenants: &Choices, selected: Option<&str>, errors: FieldErrors) -> StepForm {
    StepForm {
        step_id: StepId::TenantSelection,
        fields: vec![choice(fields::TENANT, tenants, selected)],
        errors,
    }
}

pub fn application_form(
    applications: &Choices,
    selected: Option<&str>,
    errors: FieldErrors,
) -> StepForm {
    StepForm {
        step_id: StepId::ApplicationSelection,
        fields: vec![choice(fields::APPLICATION, applications, selected)],
        errors,
    }
}

fn choice(name: &'static str, choices: &Choices, selected: Option<&str>) -> FormField {
    let default = selected
        .filter(|label| choices.contains_key(*label))
        .map(str::to_owned);
    select(name, choices.keys().cloned().collect(), default)
}

pub fn broker_form(
    defaults: &FormDefaults,
    last: Option<&BrokerInput>,
    errors: FieldErrors,
) -> StepForm {
    let values = match last {
        Some(input) => input.clone(),
        None => BrokerInput {
            host: defaults.broker_host.clone(),
            port: i64::from(defaults.broker_port),
            username: defaults.broker_username.clone(),
            password: Some(defaults.broker_password.clone()),
            discovery_prefix: defaults.discovery_prefix.clone(),
            vendor_prefix: Some(defaults.vendor_prefix.clone()),
        },
    };

    StepForm {
        step_id: StepId::BrokerConfiguration,
        fields: broker_fields(&values),
        errors,
    }
}

/// The `init` form: broker fields and options of a stored record
pub fn init_form(
    record: &ConfigurationRecord,
    last: Option<(&BrokerInput, &OptionsInput)>,
    errors: FieldErrors,
) -> StepForm {
    let (broker, options) = match last {
        Some((broker, options)) => (broker.clone(), options.clone()),
        None => (broker_input_of(record), options_input_of(record)),
    };

    let mut form_fields = broker_fields(&broker);
    form_fields.extend([
        integer(fields::START_DELAY, limits::START_DELAY_MAX, options.start_delay),
        integer(
            fields::RESTORE_AGE_WINDOW,
            limits::RESTORE_AGE_MAX,
            options.restore_age_window,
        ),
        boolean(fields::DEBUG_PAYLOAD_LOGGING, options.debug_payload_logging),
        select(
            fields::LOG_LEVEL,
            LogLevel::ALL.iter().map(|l| l.as_str().to_owned()).collect(),
            Some(options.log_level),
        ),
        integer(
            fields::ONLINE_POLL_INTERVAL_PER_DEVICE,
            limits::POLL_INTERVAL_MAX,
            options.online_poll_interval_per_device,
        ),
        boolean(fields::EXPIRE_AFTER, options.expire_after),
    ]);

    StepForm {
        step_id: StepId::Init,
        fields: form_fields,
        errors,
    }
}

fn broker_fields(values: &BrokerInput) -> Vec<FormField> {
    vec![
        text(fields::BROKER_HOST, limits::HOST_MIN_LEN, &values.host),
        integer(fields::BROKER_PORT, limits::PORT_MAX, values.port),
        text(fields::BROKER_USERNAME, limits::USERNAME_MIN_LEN, &values.username),
        secret(
            fields::BROKER_PASSWORD,
            values.password.as_deref().unwrap_or_default(),
        ),
        text(
            fields::DISCOVERY_PREFIX,
            limits::DISCOVERY_PREFIX_MIN_LEN,
            &values.discovery_prefix,
        ),
        FormField {
            required: false,
            ..text(
                fields::VENDOR_PREFIX,
                0,
                values.vendor_prefix.as_deref().unwrap_or_default(),
            )
        },
    ]
}

fn broker_input_of(record: &ConfigurationRecord) -> BrokerInput {
    BrokerInput {
        host: record.broker.host.clone(),
        port: i64::from(record.broker.port),
        username: record.broker.username.clone(),
        password: Some(record.broker.password.clone()),
        discovery_prefix: record.broker.discovery_prefix.clone(),
        vendor_prefix: Some(record.broker.vendor_prefix.clone()),
    }
}

fn options_input_of(record: &ConfigurationRecord) -> OptionsInput {
    let options = &record.options;
    OptionsInput {
        start_delay: i64::from(options.start_delay),
        restore_age_window: i64::from(options.restore_age_window),
        debug_payload_logging: options.debug_payload_logging,
        log_level: options.log_level.as_str().to_owned(),
        online_poll_interval_per_device: i64::from(options.online_poll_interval_per_device),
        expire_after: options.expire_after,
    }
}
