//! Service tests: open flow table, connection release and record removal

mod common;

use common::*;
use provisioning_service::config::Config;
use provisioning_service::contract::*;
use provisioning_service::domain::{
    BrokerError, ConnectivityValidator, DirectoryClient, Service,
};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

fn two_tenant_directory() -> ScriptedDirectory {
    ScriptedDirectory::new(
        &[("Acme", "t1"), ("Globex", "t2")],
        &[("t1", &[("Sensors", "a1")])],
    )
}

#[tokio::test]
async fn test_abandon_releases_directory_connection() {
    print_test_header(
        "test_abandon_releases_directory_connection",
        &["Abandoning a flow that holds a directory client closes it exactly once"],
    );

    let h = Harness::new(two_tenant_directory());
    let handle = h.service.start_flow().await.unwrap();
    h.service
        .submit_step(handle.flow_id, StepInput::Endpoint(endpoint_input()))
        .await
        .unwrap();
    assert_eq!(h.directory.open_connections(), 1);

    h.service.abandon_flow(handle.flow_id).await.unwrap();
    assert_eq!(h.directory.closes(), 1);
    assert_eq!(h.directory.open_connections(), 0);
    assert_eq!(h.repo.count(), 0);

    let err = h
        .service
        .submit_step(
            handle.flow_id,
            StepInput::Tenant {
                tenant: "Acme".into(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ProvisioningError::FlowNotFound {
            flow_id: handle.flow_id
        }
    );

    let err = h.service.abandon_flow(handle.flow_id).await.unwrap_err();
    assert!(matches!(err, ProvisioningError::FlowNotFound { .. }));
}

#[tokio::test]
async fn test_step_mismatch_keeps_the_session() {
    let h = Harness::new(two_tenant_directory());
    let handle = h.service.start_flow().await.unwrap();

    let err = h
        .service
        .submit_step(handle.flow_id, StepInput::Broker(broker_input("mqtt.local")))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ProvisioningError::StepMismatch {
            expected: "endpoint-entry",
            got: "broker-configuration",
        }
    );

    let form = form_of(
        h.service
            .submit_step(handle.flow_id, StepInput::Endpoint(endpoint_input()))
            .await
            .unwrap(),
    );
    assert_eq!(form.step_id, StepId::TenantSelection);
}

#[tokio::test]
async fn test_open_flow_limit() {
    let config = Config {
        max_open_flows: 2,
        ..Config::default()
    };
    let h = Harness::with_config(single_tenant_directory(), config);

    let first = h.service.start_flow().await.unwrap();
    h.service.start_flow().await.unwrap();
    let err = h.service.start_flow().await.unwrap_err();
    assert_eq!(err, ProvisioningError::TooManyFlows { limit: 2 });

    h.service.abandon_flow(first.flow_id).await.unwrap();
    assert!(h.service.start_flow().await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_idle_flows_are_evicted() {
    print_test_header(
        "test_idle_flows_are_evicted",
        &["A flow idle past the timeout is dropped and its connection closed"],
    );

    let config = Config {
        flow_idle_timeout: Duration::from_secs(60),
        ..Config::default()
    };
    let h = Harness::with_config(two_tenant_directory(), config);

    let stale = h.service.start_flow().await.unwrap();
    h.service
        .submit_step(stale.flow_id, StepInput::Endpoint(endpoint_input()))
        .await
        .unwrap();

    tokio::time::advance(Duration::from_secs(45)).await;
    let fresh = h.service.start_flow().await.unwrap();
    assert_eq!(h.service.evict_idle_flows().await, 0);

    tokio::time::advance(Duration::from_secs(30)).await;
    assert_eq!(h.service.evict_idle_flows().await, 1);
    assert_eq!(h.directory.open_connections(), 0);
    assert_eq!(h.service.open_flows(), 1);

    let err = h
        .service
        .submit_step(
            stale.flow_id,
            StepInput::Tenant {
                tenant: "Acme".into(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ProvisioningError::FlowNotFound { .. }));

    // Activity resets the idle clock
    tokio::time::advance(Duration::from_secs(45)).await;
    h.service
        .submit_step(fresh.flow_id, StepInput::Endpoint(endpoint_input()))
        .await
        .unwrap();
    tokio::time::advance(Duration::from_secs(45)).await;
    assert_eq!(h.service.evict_idle_flows().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_background_eviction() {
    let config = Config {
        flow_idle_timeout: Duration::from_secs(120),
        ..Config::default()
    };
    let h = Harness::with_config(single_tenant_directory(), config);
    let task = h.service.spawn_idle_eviction(Duration::from_secs(60));

    h.service.start_flow().await.unwrap();
    assert_eq!(h.service.open_flows(), 1);

    tokio::time::sleep(Duration::from_secs(5 * 60)).await;
    assert_eq!(h.service.open_flows(), 0);
    task.abort();
}

#[tokio::test]
async fn test_removed_record_can_be_provisioned_again() {
    let h = Harness::new(single_tenant_directory());
    let record = created(h.provision(endpoint_input(), broker_input("mqtt.local")).await);

    assert_eq!(h.service.list_records().await.unwrap().len(), 1);
    assert_eq!(
        h.service.get_record(&record.fingerprint).await.unwrap(),
        record
    );

    h.service.remove_record(&record.fingerprint).await.unwrap();
    assert!(h.service.list_records().await.unwrap().is_empty());
    let err = h.service.remove_record(&record.fingerprint).await.unwrap_err();
    assert!(matches!(err, ProvisioningError::RecordNotFound { .. }));

    let again = created(h.provision(endpoint_input(), broker_input("mqtt.local")).await);
    assert_eq!(again.fingerprint, record.fingerprint);
}

/// Validator that blocks until released, announcing when it is entered
struct GatedValidator {
    entered: parking_lot::Mutex<mpsc::Sender<()>>,
    release: parking_lot::Mutex<mpsc::Receiver<()>>,
}

impl ConnectivityValidator for GatedValidator {
    fn check_connectivity(
        &self,
        _broker: &BrokerEndpoint,
        _directory: &dyn DirectoryClient,
    ) -> Result<(), BrokerError> {
        let _ = self.entered.lock().send(());
        let _ = self.release.lock().recv();
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_submit_sees_busy_flow() {
    print_test_header(
        "test_concurrent_submit_sees_busy_flow",
        &["A second submission while a step runs is refused with FlowBusy"],
    );

    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let validator = GatedValidator {
        entered: parking_lot::Mutex::new(entered_tx),
        release: parking_lot::Mutex::new(release_rx),
    };

    let repo = MockRecordRepo::new();
    let service = Arc::new(
        Service::new(
            Arc::new(repo.clone()),
            Arc::new(single_tenant_directory()),
            Arc::new(validator),
            &Config::default(),
        )
        .unwrap(),
    );

    let handle = service.start_flow().await.unwrap();
    service
        .submit_step(handle.flow_id, StepInput::Endpoint(endpoint_input()))
        .await
        .unwrap();

    let running = {
        let service = service.clone();
        let flow_id = handle.flow_id;
        tokio::spawn(async move {
            service
                .submit_step(flow_id, StepInput::Broker(broker_input("mqtt.local")))
                .await
        })
    };

    tokio::task::spawn_blocking(move || entered_rx.recv())
        .await
        .unwrap()
        .unwrap();

    let err = service
        .submit_step(handle.flow_id, StepInput::Broker(broker_input("mqtt.local")))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ProvisioningError::FlowBusy {
            flow_id: handle.flow_id
        }
    );

    release_tx.send(()).unwrap();
    let result = running.await.unwrap().unwrap();
    assert!(matches!(result, FlowResult::Created(_)));
    assert_eq!(repo.count(), 1);
    assert_eq!(service.open_flows(), 0);
}
