//! Contract error types for provisioning service
//!
//! These errors are transport-agnostic and used for inter-module communication.

use std::fmt;
use uuid::Uuid;

/// Provisioning service errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProvisioningError {
    /// No open flow with this id (finished, abandoned or evicted)
    #[error("provisioning flow not found: {flow_id}")]
    FlowNotFound { flow_id: Uuid },

    /// Another step of the same flow is still running
    #[error("provisioning flow {flow_id} is busy with another step")]
    FlowBusy { flow_id: Uuid },

    /// Input submitted for a step the flow is not waiting on
    #[error("flow is at step '{expected}', got input for '{got}'")]
    StepMismatch {
        expected: &'static str,
        got: &'static str,
    },

    /// Open flow limit reached
    #[error("too many open provisioning flows (limit {limit})")]
    TooManyFlows { limit: usize },

    #[error("configuration record not found: {fingerprint}")]
    RecordNotFound { fingerprint: String },

    #[error("internal error")]
    Internal,
}

/// Named error conditions attached to a form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    DirectoryConnectionFailed,
    DirectoryAuthRejected,
    NoTenantsAvailable,
    NoApplicationsAvailable,
    BrokerConnectionFailed,
    BrokerAuthRejected,
    /// Text shorter than the field allows
    TooShort { min: usize },
    /// Integer outside the field range
    OutOfRange { min: i64, max: i64 },
    /// Selection not among the offered choices
    InvalidChoice,
}

impl FieldError {
    pub fn as_code(&self) -> &'static str {
        match self {
            FieldError::DirectoryConnectionFailed => "directory_connection_failed",
            FieldError::DirectoryAuthRejected => "directory_auth_rejected",
            FieldError::NoTenantsAvailable => "no_tenants_available",
            FieldError::NoApplicationsAvailable => "no_applications_available",
            FieldError::BrokerConnectionFailed => "broker_connection_failed",
            FieldError::BrokerAuthRejected => "broker_auth_rejected",
            FieldError::TooShort { .. } => "too_short",
            FieldError::OutOfRange { .. } => "out_of_range",
            FieldError::InvalidChoice => "invalid_choice",
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::TooShort { min } => write!(f, "{} (min length {})", self.as_code(), min),
            FieldError::OutOfRange { min, max } => {
                write!(f, "{} ({}..={})", self.as_code(), min, max)
            }
            _ => f.write_str(self.as_code()),
        }
    }
}
