//! SeaORM repository against an in-memory SQLite database

use chrono::{TimeZone, Utc};
use provisioning_service::contract::*;
use provisioning_service::domain::repository::RecordRepository;
use provisioning_service::infra::storage::repositories::SeaOrmRecordRepository;
use provisioning_service::ProvisioningServiceModule;
use sea_orm::Database;
use std::sync::Arc;

async fn repository() -> SeaOrmRecordRepository {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    ProvisioningServiceModule::default()
        .migrate(&db)
        .await
        .unwrap();
    SeaOrmRecordRepository::new(Arc::new(db))
}

fn record(fingerprint: &str, broker_host: &str) -> ConfigurationRecord {
    let at = Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap();
    ConfigurationRecord {
        fingerprint: Fingerprint::parse(fingerprint).unwrap(),
        directory: DirectoryEndpoint {
            host: "chirpstack.local".into(),
            port: 8080,
            api_key: "0123456789abcdef".into(),
        },
        tenant_id: "t1".into(),
        application_id: "a1".into(),
        broker: BrokerEndpoint {
            host: broker_host.into(),
            port: 1883,
            username: "bridge".into(),
            password: "secret".into(),
            discovery_prefix: "homeassistant".into(),
            vendor_prefix: String::new(),
        },
        options: OptionsRecord::default(),
        created_at: at,
        updated_at: at,
    }
}

const FP_A: &str = "0123456789abcdef0123456789abcdef";
const FP_B: &str = "fedcba9876543210fedcba9876543210";

#[tokio::test]
async fn test_insert_find_and_list() {
    let repo = repository().await;
    let a = record(FP_A, "mqtt.local");

    assert_eq!(repo.insert(&a).await.unwrap(), a);
    assert!(repo.exists(&a.fingerprint).await.unwrap());
    assert_eq!(
        repo.find_by_fingerprint(&a.fingerprint).await.unwrap(),
        Some(a.clone())
    );

    repo.insert(&record(FP_B, "mqtt2.local")).await.unwrap();
    assert_eq!(repo.list_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_duplicate_fingerprint_is_rejected() {
    let repo = repository().await;
    repo.insert(&record(FP_A, "mqtt.local")).await.unwrap();
    assert!(repo.insert(&record(FP_A, "other.local")).await.is_err());
}

#[tokio::test]
async fn test_update_replaces_broker_and_options_only() {
    let repo = repository().await;
    let stored = repo.insert(&record(FP_A, "mqtt.local")).await.unwrap();

    let mut edited = stored.clone();
    edited.broker.host = "mqtt2.local".into();
    edited.options.log_level = LogLevel::Warning;
    edited.options.expire_after = true;
    edited.tenant_id = "ignored".into();
    edited.updated_at = Utc.with_ymd_and_hms(2026, 2, 1, 8, 30, 0).unwrap();

    let saved = repo.update(&edited).await.unwrap();
    assert_eq!(saved.broker.host, "mqtt2.local");
    assert_eq!(saved.options.log_level, LogLevel::Warning);
    assert!(saved.options.expire_after);
    assert_eq!(saved.tenant_id, "t1");
    assert_eq!(saved.created_at, stored.created_at);
    assert_eq!(saved.updated_at, edited.updated_at);
}

#[tokio::test]
async fn test_delete_reports_whether_record_existed() {
    let repo = repository().await;
    let a = repo.insert(&record(FP_A, "mqtt.local")).await.unwrap();

    assert!(repo.delete(&a.fingerprint).await.unwrap());
    assert!(!repo.delete(&a.fingerprint).await.unwrap());
    assert!(!repo.exists(&a.fingerprint).await.unwrap());
}
