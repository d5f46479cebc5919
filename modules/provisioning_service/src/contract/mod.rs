//! Contract layer - public API for inter-module communication
//!
//! This layer contains transport-agnostic models and the native client trait.
//! NO serde derives on models - these are pure domain types.

pub mod client;
pub mod error;
pub mod form;
pub mod model;

pub use client::{FlowHandle, ProvisioningApi};
pub use error::{FieldError, ProvisioningError};
pub use form::{
    fields, AbortReason, BrokerInput, EndpointInput, FieldKind, FieldValue, FlowResult,
    FormField, OptionsInput, ReconfigureInput, ReconfigureResult, StepForm, StepId, StepInput,
};
pub use model::{
    Application, BrokerEndpoint, ConfigurationRecord, DirectoryEndpoint, Fingerprint, LogLevel,
    OptionsRecord, Tenant,
};
