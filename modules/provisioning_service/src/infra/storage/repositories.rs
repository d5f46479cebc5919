//! SeaORM repository implementations

use crate::contract::{ConfigurationRecord, Fingerprint};
use crate::domain::repository::RecordRepository;
use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder};
use std::sync::Arc;

use super::entity;

// ===== Record Repository =====

pub struct SeaOrmRecordRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmRecordRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecordRepository for SeaOrmRecordRepository {
    async fn insert(&self, record: &ConfigurationRecord) -> Result<ConfigurationRecord> {
        let active_model = entity::ActiveModel::try_from(record)?;

        let result = entity::Entity::insert(active_model)
            .exec_with_returning(&*self.db)
            .await?;

        result.try_into()
    }

    async fn find_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<ConfigurationRecord>> {
        let result = entity::Entity::find_by_id(fingerprint.as_str())
            .one(&*self.db)
            .await?;

        match result {
            Some(entity) => Ok(Some(entity.try_into()?)),
            None => Ok(None),
        }
    }

    async fn exists(&self, fingerprint: &Fingerprint) -> Result<bool> {
        let count = entity::Entity::find_by_id(fingerprint.as_str())
            .count(&*self.db)
            .await?;

        Ok(count > 0)
    }

    async fn list_all(&self) -> Result<Vec<ConfigurationRecord>> {
        let results = entity::Entity::find()
            .order_by_asc(entity::Column::CreatedAt)
            .order_by_asc(entity::Column::Fingerprint)
            .all(&*self.db)
            .await?;

        results
            .into_iter()
            .map(|e| e.try_into())
            .collect::<Result<Vec<_>>>()
    }

    async fn update(&self, record: &ConfigurationRecord) -> Result<ConfigurationRecord> {
        use sea_orm::ActiveValue::{NotSet, Set};

        // Identity columns stay as committed
        let mut active_model = entity::ActiveModel::try_from(record)?;
        active_model.directory_host = NotSet;
        active_model.directory_port = NotSet;
        active_model.directory_api_key = NotSet;
        active_model.tenant_id = NotSet;
        active_model.application_id = NotSet;
        active_model.created_at = NotSet;
        active_model.updated_at = Set(record.updated_at);

        let result = entity::Entity::update(active_model)
            .exec(&*self.db)
            .await?;

        result.try_into()
    }

    async fn delete(&self, fingerprint: &Fingerprint) -> Result<bool> {
        let result = entity::Entity::delete_by_id(fingerprint.as_str())
            .exec(&*self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }
}
