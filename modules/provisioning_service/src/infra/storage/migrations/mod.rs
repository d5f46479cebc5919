//! Database migrations for provisioning service

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20260105_000001_create_configuration_records::Migration)]
    }
}

mod m20260105_000001_create_configuration_records {
    use super::*;

    #[derive(DeriveMigrationName)]
    pub struct Migration;

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ConfigurationRecords::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ConfigurationRecords::Fingerprint)
                                .string_len(32)
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ConfigurationRecords::DirectoryHost)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ConfigurationRecords::DirectoryPort)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ConfigurationRecords::DirectoryApiKey)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ConfigurationRecords::TenantId)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ConfigurationRecords::ApplicationId)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ConfigurationRecords::BrokerHost)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ConfigurationRecords::BrokerPort)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ConfigurationRecords::BrokerUsername)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ConfigurationRecords::BrokerPassword)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ConfigurationRecords::DiscoveryPrefix)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ConfigurationRecords::VendorPrefix)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .col(ColumnDef::new(ConfigurationRecords::Options).json().not_null())
                        .col(
                            ColumnDef::new(ConfigurationRecords::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .col(
                            ColumnDef::new(ConfigurationRecords::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_configuration_records_tenant_application")
                        .table(ConfigurationRecords::Table)
                        .col(ConfigurationRecords::TenantId)
                        .col(ConfigurationRecords::ApplicationId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ConfigurationRecords::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ConfigurationRecords {
        Table,
        Fingerprint,
        DirectoryHost,
        DirectoryPort,
        DirectoryApiKey,
        TenantId,
        ApplicationId,
        BrokerHost,
        BrokerPort,
        BrokerUsername,
        BrokerPassword,
        DiscoveryPrefix,
        VendorPrefix,
        Options,
        CreatedAt,
        UpdatedAt,
    }
}
