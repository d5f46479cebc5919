//! Provisioning Service Module
//!
//! Guided provisioning of directory-to-broker bridge configurations. An
//! operator walks a multi-step flow (directory endpoint, tenant, application,
//! broker); every accepted configuration is stored once under its
//! fingerprint and can later have its broker and options reconfigured.

// Public exports
pub mod contract;
pub use contract::{
    client::ProvisioningApi, error::ProvisioningError, ConfigurationRecord, Fingerprint,
    FlowResult, StepForm, StepInput,
};

pub mod module;
pub use module::ProvisioningServiceModule;

// Internal modules (hidden from public API)
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
