//! HTTP error mapping to RFC-9457 Problem Details

use crate::contract::ProvisioningError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// RFC-9457 Problem Details for HTTP API errors
#[derive(Debug, Serialize)]
pub struct Problem {
    /// A URI reference that identifies the problem type
    #[serde(rename = "type")]
    pub type_uri: String,

    /// A short, human-readable summary of the problem type
    pub title: String,

    /// The HTTP status code
    pub status: u16,

    /// A human-readable explanation specific to this occurrence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// A URI reference that identifies the specific occurrence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl Problem {
    /// Create a new Problem Details response
    pub fn new(status: StatusCode, title: impl Into<String>) -> Self {
        Self {
            type_uri: format!("https://httpstatuses.io/{}", status.as_u16()),
            title: title.into(),
            status: status.as_u16(),
            detail: None,
            instance: None,
        }
    }

    /// Add detail message
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Add instance URI
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Map domain errors to HTTP Problem Details
pub fn map_domain_error(error: ProvisioningError) -> Problem {
    match error {
        ProvisioningError::FlowNotFound { flow_id } => {
            Problem::new(StatusCode::NOT_FOUND, "Flow Not Found")
                .with_detail(error.to_string())
                .with_instance(format!("/provisioning/flows/{}", flow_id))
        }

        ProvisioningError::FlowBusy { flow_id } => Problem::new(StatusCode::CONFLICT, "Flow Busy")
            .with_detail(error.to_string())
            .with_instance(format!("/provisioning/flows/{}", flow_id)),

        ProvisioningError::StepMismatch { .. } => {
            Problem::new(StatusCode::CONFLICT, "Step Mismatch").with_detail(error.to_string())
        }

        ProvisioningError::TooManyFlows { .. } => {
            Problem::new(StatusCode::TOO_MANY_REQUESTS, "Too Many Open Flows")
                .with_detail(error.to_string())
        }

        ProvisioningError::RecordNotFound { ref fingerprint } => {
            let instance = format!("/provisioning/records/{}", fingerprint);
            Problem::new(StatusCode::NOT_FOUND, "Record Not Found")
                .with_detail(error.to_string())
                .with_instance(instance)
        }

        ProvisioningError::Internal => {
            Problem::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
                .with_detail("An unexpected error occurred")
        }
    }
}

/// Problem for a path segment that is not a well-formed fingerprint
pub fn invalid_fingerprint(raw: &str) -> Problem {
    Problem::new(StatusCode::BAD_REQUEST, "Invalid Fingerprint").with_detail(format!(
        "'{}' is not 32 lowercase hexadecimal characters",
        raw
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_status_codes() {
        let flow_id = Uuid::new_v4();
        assert_eq!(
            map_domain_error(ProvisioningError::FlowNotFound { flow_id }).status,
            404
        );
        assert_eq!(
            map_domain_error(ProvisioningError::FlowBusy { flow_id }).status,
            409
        );
        assert_eq!(
            map_domain_error(ProvisioningError::TooManyFlows { limit: 1 }).status,
            429
        );
        assert_eq!(map_domain_error(ProvisioningError::Internal).status, 500);
    }
}
