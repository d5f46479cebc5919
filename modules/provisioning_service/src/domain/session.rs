//! In-progress provisioning session
//!
//! A session is an owned value moved through the step functions. Each state
//! carries exactly what the steps so far have established, so a later step
//! can never observe a half-filled session. Dropping a session closes its
//! directory connection.

use super::ports::DirectoryLease;
use crate::contract::{BrokerInput, DirectoryEndpoint, EndpointInput, StepId};
use indexmap::IndexMap;
use std::collections::HashMap;
use tokio::time::Instant;

/// Display label -> identifier, in the order the directory returned them
pub type Choices = IndexMap<String, String>;

/// Build choices from `(name, id)` pairs
///
/// A name shared by entries with different ids is labelled `name (id)` on
/// each of them, so no entry hides another.
pub(crate) fn choices<I>(entries: I) -> Choices
where
    I: IntoIterator<Item = (String, String)>,
{
    let entries: Vec<(String, String)> = entries.into_iter().collect();

    let mut ids_by_name: HashMap<&str, Vec<&str>> = HashMap::new();
    for (name, id) in &entries {
        let ids = ids_by_name.entry(name.as_str()).or_default();
        if !ids.contains(&id.as_str()) {
            ids.push(id.as_str());
        }
    }
    let ambiguous: Vec<String> = ids_by_name
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|(name, _)| name.to_owned())
        .collect();

    entries
        .into_iter()
        .map(|(name, id)| {
            let label = if ambiguous.contains(&name) {
                format!("{} ({})", name, id)
            } else {
                name
            };
            (label, id)
        })
        .collect()
}

#[derive(Debug)]
pub struct ProvisioningSession {
    pub(crate) state: SessionState,
    last_activity: Instant,
}

#[derive(Debug)]
pub(crate) enum SessionState {
    EndpointEntry {
        /// Last submitted values, offered again as defaults
        last: Option<EndpointInput>,
    },
    TenantSelection {
        directory: DirectoryEndpoint,
        lease: DirectoryLease,
        tenants: Choices,
    },
    ApplicationSelection {
        directory: DirectoryEndpoint,
        lease: DirectoryLease,
        tenant_id: String,
        applications: Choices,
    },
    BrokerConfiguration {
        directory: DirectoryEndpoint,
        lease: DirectoryLease,
        tenant_id: String,
        application_id: String,
        last: Option<BrokerInput>,
    },
}

impl ProvisioningSession {
    pub(crate) fn new(state: SessionState) -> Self {
        Self {
            state,
            last_activity: Instant::now(),
        }
    }

    /// Step the session is waiting on
    pub fn step_id(&self) -> StepId {
        match self.state {
            SessionState::EndpointEntry { .. } => StepId::EndpointEntry,
            SessionState::TenantSelection { .. } => StepId::TenantSelection,
            SessionState::ApplicationSelection { .. } => StepId::ApplicationSelection,
            SessionState::BrokerConfiguration { .. } => StepId::BrokerConfiguration,
        }
    }

    /// Whether a directory connection is held
    pub fn holds_connection(&self) -> bool {
        !matches!(self.state, SessionState::EndpointEntry { .. })
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    pub(crate) fn touch(&mut self) {
        self.last_activity = Instant::now();
    }
}
