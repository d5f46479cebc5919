//! Native client implementation - wraps domain service for in-process calls

use crate::contract::{
    ConfigurationRecord, Fingerprint, FlowHandle, FlowResult, ProvisioningApi, ProvisioningError,
    ReconfigureInput, ReconfigureResult, StepForm, StepInput,
};
use crate::domain::Service;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Native client implementation that directly calls the domain service
///
/// This client is used for in-process communication without HTTP overhead.
#[derive(Clone)]
pub struct NativeClient {
    service: Arc<Service>,
}

impl NativeClient {
    /// Create a new native client
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ProvisioningApi for NativeClient {
    async fn start_flow(&self) -> Result<FlowHandle, ProvisioningError> {
        self.service.start_flow().await
    }

    async fn submit_step(
        &self,
        flow_id: Uuid,
        input: StepInput,
    ) -> Result<FlowResult, ProvisioningError> {
        self.service.submit_step(flow_id, input).await
    }

    async fn abandon_flow(&self, flow_id: Uuid) -> Result<(), ProvisioningError> {
        self.service.abandon_flow(flow_id).await
    }

    async fn list_records(&self) -> Result<Vec<ConfigurationRecord>, ProvisioningError> {
        self.service.list_records().await
    }

    async fn get_record(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<ConfigurationRecord, ProvisioningError> {
        self.service.get_record(fingerprint).await
    }

    async fn remove_record(&self, fingerprint: &Fingerprint) -> Result<(), ProvisioningError> {
        self.service.remove_record(fingerprint).await
    }

    async fn reconfigure_form(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<StepForm, ProvisioningError> {
        self.service.reconfigure_form(fingerprint).await
    }

    async fn reconfigure(
        &self,
        fingerprint: &Fingerprint,
        input: ReconfigureInput,
    ) -> Result<ReconfigureResult, ProvisioningError> {
        self.service.reconfigure(fingerprint, input).await
    }
}
