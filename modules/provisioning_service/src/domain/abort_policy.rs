//! Fingerprint reservation: no two stored records may identify the same configuration
//!
//! A fingerprint is claimed by a record when it is the record's key, or when
//! it is the fingerprint of the record's current content (the two differ once
//! the broker leg of a record has been reconfigured). Every write that can
//! create or change a claim runs under one writer lock, so a check and the
//! write that follows it are never interleaved with another writer.

use super::fingerprint::{fingerprint, FingerprintInput};
use super::repository::RecordRepository;
use crate::contract::{AbortReason, ConfigurationRecord, Fingerprint, ProvisioningError};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Result of a guarded write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Stored(ConfigurationRecord),
    Rejected(AbortReason),
}

pub struct AbortPolicy {
    records: Arc<dyn RecordRepository>,
    writer: Mutex<()>,
}

impl AbortPolicy {
    pub fn new(records: Arc<dyn RecordRepository>) -> Self {
        Self {
            records,
            writer: Mutex::new(()),
        }
    }

    /// Early check before any external validation runs
    pub async fn check(
        &self,
        candidate: &Fingerprint,
    ) -> Result<Option<AbortReason>, ProvisioningError> {
        Ok(self
            .claimed_by(candidate, None)
            .await?
            .map(|_| already_configured(candidate)))
    }

    /// Insert a new record unless its fingerprint is claimed
    pub async fn commit(
        &self,
        record: ConfigurationRecord,
    ) -> Result<Admission, ProvisioningError> {
        let _writer = self.writer.lock().await;

        if self.claimed_by(&record.fingerprint, None).await?.is_some() {
            return Ok(Admission::Rejected(already_configured(&record.fingerprint)));
        }

        let stored = self.records.insert(&record).await.map_err(|e| {
            tracing::error!(fingerprint = %record.fingerprint, "failed to insert record: {:#}", e);
            ProvisioningError::Internal
        })?;
        Ok(Admission::Stored(stored))
    }

    /// Write an edited record unless its new content collides with another record
    pub async fn update(
        &self,
        record: ConfigurationRecord,
    ) -> Result<Admission, ProvisioningError> {
        let _writer = self.writer.lock().await;

        let content = content_fingerprint(&record);
        if self
            .claimed_by(&content, Some(&record.fingerprint))
            .await?
            .is_some()
        {
            return Ok(Admission::Rejected(already_configured(&content)));
        }

        let stored = self.records.update(&record).await.map_err(|e| {
            tracing::error!(fingerprint = %record.fingerprint, "failed to update record: {:#}", e);
            ProvisioningError::Internal
        })?;
        Ok(Admission::Stored(stored))
    }

    /// Remove a record, releasing its claims
    pub async fn remove(&self, fingerprint: &Fingerprint) -> Result<bool, ProvisioningError> {
        let _writer = self.writer.lock().await;
        self.records.delete(fingerprint).await.map_err(|e| {
            tracing::error!(%fingerprint, "failed to delete record: {:#}", e);
            ProvisioningError::Internal
        })
    }

    /// Key of the record claiming `candidate`, ignoring the record keyed `exclude`
    async fn claimed_by(
        &self,
        candidate: &Fingerprint,
        exclude: Option<&Fingerprint>,
    ) -> Result<Option<Fingerprint>, ProvisioningError> {
        let internal = |e: anyhow::Error| {
            tracing::error!("failed to read records: {:#}", e);
            ProvisioningError::Internal
        };

        if Some(candidate) != exclude && self.records.exists(candidate).await.map_err(internal)? {
            return Ok(Some(candidate.clone()));
        }

        let records = self.records.list_all().await.map_err(internal)?;
        Ok(records
            .into_iter()
            .filter(|r| Some(&r.fingerprint) != exclude)
            .find(|r| &content_fingerprint(r) == candidate)
            .map(|r| r.fingerprint))
    }
}

/// Fingerprint of a record's current identity fields
pub fn content_fingerprint(record: &ConfigurationRecord) -> Fingerprint {
    fingerprint(&FingerprintInput::with_broker(record, &record.broker))
}

fn already_configured(fingerprint: &Fingerprint) -> AbortReason {
    AbortReason::AlreadyConfigured {
        fingerprint: fingerprint.clone(),
    }
}
