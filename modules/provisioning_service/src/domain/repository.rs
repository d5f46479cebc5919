//! Repository traits for data access
//!
//! These traits define the interface for data access operations.
//! Implementations are in infra/storage/repositories.rs

use crate::contract::{ConfigurationRecord, Fingerprint};
use anyhow::Result;
use async_trait::async_trait;

/// Repository for configuration records, keyed by fingerprint
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Insert a new record; fails if the fingerprint is already stored
    async fn insert(&self, record: &ConfigurationRecord) -> Result<ConfigurationRecord>;

    /// Find a record by fingerprint
    async fn find_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<ConfigurationRecord>>;

    /// Check if a fingerprint is stored
    async fn exists(&self, fingerprint: &Fingerprint) -> Result<bool>;

    /// List all records
    async fn list_all(&self) -> Result<Vec<ConfigurationRecord>>;

    /// Replace broker fields and options of a stored record in one write
    async fn update(&self, record: &ConfigurationRecord) -> Result<ConfigurationRecord>;

    /// Delete a record; returns whether it existed
    async fn delete(&self, fingerprint: &Fingerprint) -> Result<bool>;
}
