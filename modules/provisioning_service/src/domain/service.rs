//! Domain service - open flow table, records and reconfiguration

use super::abort_policy::AbortPolicy;
use super::flow::{ProvisioningFlow, Transition};
use super::ports::{close_blocking, ConnectivityValidator, DirectoryConnector};
use super::reconfigure::ReconfigurationFlow;
use super::repository::RecordRepository;
use super::session::ProvisioningSession;
use crate::config::Config;
use crate::contract::{
    ConfigurationRecord, Fingerprint, FlowHandle, FlowResult, ProvisioningError,
    ReconfigureInput, ReconfigureResult, StepForm, StepInput,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// Entry of the open flow table
#[derive(Debug)]
enum Slot {
    /// Waiting for the next submission
    Idle(ProvisioningSession),
    /// A step is running; the session is out of the table
    Busy { since: Instant },
}

impl Slot {
    fn last_activity(&self) -> Instant {
        match self {
            Slot::Idle(session) => session.last_activity(),
            Slot::Busy { since } => *since,
        }
    }
}

/// Domain service for provisioning
pub struct Service {
    records: Arc<dyn RecordRepository>,
    policy: Arc<AbortPolicy>,
    flow: ProvisioningFlow,
    reconfiguration: ReconfigurationFlow,
    /// flow id -> slot
    flows: Mutex<HashMap<Uuid, Slot>>,
    max_open_flows: usize,
    flow_idle_timeout: Duration,
}

impl Service {
    /// Create a new service instance
    pub fn new(
        records: Arc<dyn RecordRepository>,
        connector: Arc<dyn DirectoryConnector>,
        validator: Arc<dyn ConnectivityValidator>,
        config: &Config,
    ) -> anyhow::Result<Self> {
        let policy = Arc::new(AbortPolicy::new(records.clone()));
        let flow = ProvisioningFlow::new(
            connector.clone(),
            validator.clone(),
            policy.clone(),
            config.form_defaults.clone(),
            config.default_options.to_record()?,
        );
        let reconfiguration =
            ReconfigurationFlow::new(records.clone(), connector, validator, policy.clone());

        Ok(Self {
            records,
            policy,
            flow,
            reconfiguration,
            flows: Mutex::new(HashMap::new()),
            max_open_flows: config.max_open_flows,
            flow_idle_timeout: config.flow_idle_timeout,
        })
    }

    // ===== Provisioning flows =====

    /// Open a new flow at `endpoint-entry`
    pub async fn start_flow(&self) -> Result<FlowHandle, ProvisioningError> {
        self.evict_idle_flows().await;

        let (session, form) = self.flow.start();
        let flow_id = Uuid::new_v4();
        {
            let mut flows = self.flows.lock();
            if flows.len() >= self.max_open_flows {
                tracing::warn!(limit = self.max_open_flows, "refusing to open another flow");
                return Err(ProvisioningError::TooManyFlows {
                    limit: self.max_open_flows,
                });
            }
            flows.insert(flow_id, Slot::Idle(session));
        }

        tracing::info!(%flow_id, "provisioning flow started");
        Ok(FlowHandle {
            flow_id,
            result: FlowResult::ShowForm(form),
        })
    }

    /// Run the step the flow is waiting on
    pub async fn submit_step(
        &self,
        flow_id: Uuid,
        input: StepInput,
    ) -> Result<FlowResult, ProvisioningError> {
        let session = self.checkout(flow_id)?;
        tracing::debug!(%flow_id, step = %session.step_id(), "running step");

        match self.flow.step(session, input).await {
            Ok(Transition::Continue(mut session, form)) => {
                session.touch();
                self.checkin(flow_id, session).await;
                Ok(FlowResult::ShowForm(form))
            }
            Ok(Transition::Finished(result)) => {
                self.flows.lock().remove(&flow_id);
                tracing::info!(%flow_id, "provisioning flow finished");
                Ok(result)
            }
            Err((Some(session), err)) => {
                self.checkin(flow_id, session).await;
                Err(err)
            }
            Err((None, err)) => {
                self.flows.lock().remove(&flow_id);
                tracing::warn!(%flow_id, "provisioning flow discarded: {}", err);
                Err(err)
            }
        }
    }

    /// Discard an open flow and close its directory connection
    ///
    /// Abandoning a flow with a running step discards it once the step returns.
    pub async fn abandon_flow(&self, flow_id: Uuid) -> Result<(), ProvisioningError> {
        let slot = self
            .flows
            .lock()
            .remove(&flow_id)
            .ok_or(ProvisioningError::FlowNotFound { flow_id })?;

        if let Slot::Idle(session) = slot {
            discard(vec![session]).await;
        }
        tracing::info!(%flow_id, "provisioning flow abandoned");
        Ok(())
    }

    /// Drop flows idle longer than the configured timeout
    ///
    /// Returns how many flows were evicted.
    pub async fn evict_idle_flows(&self) -> usize {
        let now = Instant::now();
        let expired = {
            let mut flows = self.flows.lock();
            let ids: Vec<Uuid> = flows
                .iter()
                .filter(|(_, slot)| {
                    now.duration_since(slot.last_activity()) >= self.flow_idle_timeout
                })
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter()
                .filter_map(|id| flows.remove(&id))
                .collect::<Vec<_>>()
        };

        let evicted = expired.len();
        if evicted > 0 {
            tracing::info!(evicted, "evicted idle provisioning flows");
            let sessions = expired
                .into_iter()
                .filter_map(|slot| match slot {
                    Slot::Idle(session) => Some(session),
                    Slot::Busy { .. } => None,
                })
                .collect();
            discard(sessions).await;
        }
        evicted
    }

    /// Evict idle flows every `period` while the service is alive
    pub fn spawn_idle_eviction(self: &Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        let service: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match service.upgrade() {
                    Some(service) => {
                        service.evict_idle_flows().await;
                    }
                    None => break,
                }
            }
        })
    }

    /// Number of open flows, running or idle
    pub fn open_flows(&self) -> usize {
        self.flows.lock().len()
    }

    /// Take the session out of the table for one step
    fn checkout(&self, flow_id: Uuid) -> Result<ProvisioningSession, ProvisioningError> {
        let mut flows = self.flows.lock();
        let slot = flows
            .get_mut(&flow_id)
            .ok_or(ProvisioningError::FlowNotFound { flow_id })?;

        match std::mem::replace(slot, Slot::Busy { since: Instant::now() }) {
            Slot::Idle(session) => Ok(session),
            busy @ Slot::Busy { .. } => {
                *slot = busy;
                Err(ProvisioningError::FlowBusy { flow_id })
            }
        }
    }

    /// Put the session back, unless the flow was abandoned or evicted meanwhile
    async fn checkin(&self, flow_id: Uuid, session: ProvisioningSession) {
        let orphan = {
            let mut flows = self.flows.lock();
            match flows.get_mut(&flow_id) {
                Some(slot) if matches!(slot, Slot::Busy { .. }) => {
                    *slot = Slot::Idle(session);
                    None
                }
                _ => Some(session),
            }
        };

        if let Some(session) = orphan {
            tracing::info!(%flow_id, "flow was abandoned during its step");
            discard(vec![session]).await;
        }
    }

    // ===== Configuration records =====

    pub async fn list_records(&self) -> Result<Vec<ConfigurationRecord>, ProvisioningError> {
        self.records.list_all().await.map_err(|e| {
            tracing::error!("failed to list records: {:#}", e);
            ProvisioningError::Internal
        })
    }

    pub async fn get_record(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<ConfigurationRecord, ProvisioningError> {
        self.records
            .find_by_fingerprint(fingerprint)
            .await
            .map_err(|e| {
                tracing::error!(%fingerprint, "failed to load record: {:#}", e);
                ProvisioningError::Internal
            })?
            .ok_or_else(|| ProvisioningError::RecordNotFound {
                fingerprint: fingerprint.to_string(),
            })
    }

    /// Remove a record so its combination can be provisioned again
    pub async fn remove_record(&self, fingerprint: &Fingerprint) -> Result<(), ProvisioningError> {
        if !self.policy.remove(fingerprint).await? {
            return Err(ProvisioningError::RecordNotFound {
                fingerprint: fingerprint.to_string(),
            });
        }
        tracing::info!(%fingerprint, "configuration record removed");
        Ok(())
    }

    // ===== Reconfiguration =====

    pub async fn reconfigure_form(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<StepForm, ProvisioningError> {
        self.reconfiguration.form(fingerprint).await
    }

    pub async fn reconfigure(
        &self,
        fingerprint: &Fingerprint,
        input: ReconfigureInput,
    ) -> Result<ReconfigureResult, ProvisioningError> {
        self.reconfiguration.submit(fingerprint, input).await
    }
}

/// Drop sessions on the blocking pool; closing a directory client may block
async fn discard(sessions: Vec<ProvisioningSession>) {
    if !sessions.iter().any(ProvisioningSession::holds_connection) {
        return;
    }
    close_blocking(sessions).await;
}
