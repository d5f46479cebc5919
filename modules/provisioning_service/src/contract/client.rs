//! Native client trait for inter-module communication
//!
//! This trait defines the API that other modules use to drive provisioning flows.
//! NO HTTP - direct function calls for performance.

use super::error::ProvisioningError;
use super::form::{FlowResult, ReconfigureInput, ReconfigureResult, StepForm, StepInput};
use super::model::{ConfigurationRecord, Fingerprint};
use async_trait::async_trait;
use uuid::Uuid;

/// A freshly started flow and its first form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowHandle {
    pub flow_id: Uuid,
    pub result: FlowResult,
}

/// Provisioning service API for inter-module communication
#[async_trait]
pub trait ProvisioningApi: Send + Sync {
    // ===== Provisioning flows =====

    /// Open a new provisioning session at `endpoint-entry`
    async fn start_flow(&self) -> Result<FlowHandle, ProvisioningError>;

    /// Submit input for the step the flow is waiting on
    async fn submit_step(
        &self,
        flow_id: Uuid,
        input: StepInput,
    ) -> Result<FlowResult, ProvisioningError>;

    /// Discard an open flow and release its directory connection
    async fn abandon_flow(&self, flow_id: Uuid) -> Result<(), ProvisioningError>;

    // ===== Configuration records =====

    /// List all stored configuration records
    async fn list_records(&self) -> Result<Vec<ConfigurationRecord>, ProvisioningError>;

    /// Get a record by fingerprint
    async fn get_record(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<ConfigurationRecord, ProvisioningError>;

    /// Remove a record, freeing its fingerprint
    async fn remove_record(&self, fingerprint: &Fingerprint) -> Result<(), ProvisioningError>;

    // ===== Reconfiguration =====

    /// Render the `init` form prefilled from the stored record
    async fn reconfigure_form(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<StepForm, ProvisioningError>;

    /// Apply broker and option changes to a stored record
    async fn reconfigure(
        &self,
        fingerprint: &Fingerprint,
        input: ReconfigureInput,
    ) -> Result<ReconfigureResult, ProvisioningError>;
}
