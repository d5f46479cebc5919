//! SeaORM entities for database tables

use sea_orm::entity::prelude::*;

/// Configuration records table entity
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "configuration_records")]
pub struct Model {
    /// 32 lowercase hex characters
    #[sea_orm(primary_key, auto_increment = false)]
    pub fingerprint: String,

    pub directory_host: String,
    pub directory_port: i32,
    pub directory_api_key: String,

    pub tenant_id: String,
    pub application_id: String,

    pub broker_host: String,
    pub broker_port: i32,
    pub broker_username: String,
    pub broker_password: String,
    pub discovery_prefix: String,
    pub vendor_prefix: String,

    /// Options as JSON
    pub options: Json,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
