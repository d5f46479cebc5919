//! Common test utilities: in-memory repository and scripted collaborators

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use provisioning_service::config::Config;
use provisioning_service::contract::*;
use provisioning_service::domain::repository::RecordRepository;
use provisioning_service::domain::{
    BrokerError, ConnectivityValidator, DirectoryClient, DirectoryConnector, DirectoryError,
    Service,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub fn print_test_header(test_name: &str, purpose: &[&str]) {
    println!("\n🧪 TEST: {}", test_name);
    if let Some(first) = purpose.first() {
        println!("📋 PURPOSE: {}", first);
    }
    for line in purpose.iter().skip(1) {
        println!("   {}", line);
    }
}

// ===== Record repository =====

#[derive(Clone, Default)]
pub struct MockRecordRepo {
    data: Arc<RwLock<BTreeMap<Fingerprint, ConfigurationRecord>>>,
    updates: Arc<AtomicUsize>,
}

impl MockRecordRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.data.read().len()
    }

    /// Number of update calls that reached the repository
    pub fn update_calls(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<ConfigurationRecord> {
        self.data.read().get(fingerprint).cloned()
    }

    pub fn print_state(&self, context: &str) {
        let data = self.data.read();
        println!("\n========== RecordRepository State: {} ==========", context);
        println!("Total records: {}", data.len());
        for record in data.values() {
            println!(
                "  {} -> {}:{} tenant={} app={} broker={}:{} log_level={}",
                record.fingerprint,
                record.directory.host,
                record.directory.port,
                record.tenant_id,
                record.application_id,
                record.broker.host,
                record.broker.port,
                record.options.log_level
            );
        }
        println!("====================================================\n");
    }
}

#[async_trait]
impl RecordRepository for MockRecordRepo {
    async fn insert(&self, record: &ConfigurationRecord) -> anyhow::Result<ConfigurationRecord> {
        let mut data = self.data.write();
        if data.contains_key(&record.fingerprint) {
            anyhow::bail!("duplicate fingerprint {}", record.fingerprint);
        }
        data.insert(record.fingerprint.clone(), record.clone());
        Ok(record.clone())
    }

    async fn find_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> anyhow::Result<Option<ConfigurationRecord>> {
        Ok(self.data.read().get(fingerprint).cloned())
    }

    async fn exists(&self, fingerprint: &Fingerprint) -> anyhow::Result<bool> {
        Ok(self.data.read().contains_key(fingerprint))
    }

    async fn list_all(&self) -> anyhow::Result<Vec<ConfigurationRecord>> {
        Ok(self.data.read().values().cloned().collect())
    }

    async fn update(&self, record: &ConfigurationRecord) -> anyhow::Result<ConfigurationRecord> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut data = self.data.write();
        let stored = data
            .get_mut(&record.fingerprint)
            .ok_or_else(|| anyhow::anyhow!("no record {}", record.fingerprint))?;
        stored.broker = record.broker.clone();
        stored.options = record.options.clone();
        stored.updated_at = record.updated_at;
        Ok(stored.clone())
    }

    async fn delete(&self, fingerprint: &Fingerprint) -> anyhow::Result<bool> {
        Ok(self.data.write().remove(fingerprint).is_some())
    }
}

// ===== Directory =====

/// What the scripted directory answers
#[derive(Debug, Clone)]
pub struct DirectoryScript {
    pub connect_error: Option<DirectoryError>,
    pub tenants: Result<Vec<Tenant>, DirectoryError>,
    /// tenant id -> applications
    pub applications: HashMap<String, Vec<Application>>,
}

impl Default for DirectoryScript {
    fn default() -> Self {
        Self {
            connect_error: None,
            tenants: Ok(Vec::new()),
            applications: HashMap::new(),
        }
    }
}

/// Connector handing out clients that follow one shared script
#[derive(Clone, Default)]
pub struct ScriptedDirectory {
    script: Arc<Mutex<DirectoryScript>>,
    connects: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

impl ScriptedDirectory {
    pub fn new(tenants: &[(&str, &str)], applications: &[(&str, &[(&str, &str)])]) -> Self {
        let directory = Self::default();
        directory.set_tenants(tenants);
        {
            let mut script = directory.script.lock();
            for (tenant_id, apps) in applications {
                script.applications.insert(
                    tenant_id.to_string(),
                    apps.iter()
                        .map(|(name, id)| Application {
                            name: name.to_string(),
                            id: id.to_string(),
                        })
                        .collect(),
                );
            }
        }
        directory
    }

    pub fn set_tenants(&self, tenants: &[(&str, &str)]) {
        self.script.lock().tenants = Ok(tenants
            .iter()
            .map(|(name, id)| Tenant {
                name: name.to_string(),
                id: id.to_string(),
            })
            .collect());
    }

    pub fn fail_connect(&self, error: Option<DirectoryError>) {
        self.script.lock().connect_error = error;
    }

    pub fn fail_tenants(&self, error: DirectoryError) {
        self.script.lock().tenants = Err(error);
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Connections opened and not yet closed
    pub fn open_connections(&self) -> usize {
        self.connects() - self.closes()
    }
}

struct ScriptedClient {
    script: Arc<Mutex<DirectoryScript>>,
    closes: Arc<AtomicUsize>,
}

impl DirectoryClient for ScriptedClient {
    fn list_tenants(&self) -> Result<Vec<Tenant>, DirectoryError> {
        self.script.lock().tenants.clone()
    }

    fn list_applications(&self, tenant_id: &str) -> Result<Vec<Application>, DirectoryError> {
        Ok(self
            .script
            .lock()
            .applications
            .get(tenant_id)
            .cloned()
            .unwrap_or_default())
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

impl DirectoryConnector for ScriptedDirectory {
    fn connect(
        &self,
        _endpoint: &DirectoryEndpoint,
    ) -> Result<Arc<dyn DirectoryClient>, DirectoryError> {
        if let Some(error) = self.script.lock().connect_error.clone() {
            return Err(error);
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(ScriptedClient {
            script: self.script.clone(),
            closes: self.closes.clone(),
        }))
    }
}

// ===== Broker =====

#[derive(Clone, Default)]
pub struct ScriptedValidator {
    outcome: Arc<Mutex<Option<BrokerError>>>,
    calls: Arc<AtomicUsize>,
    last_broker: Arc<Mutex<Option<BrokerEndpoint>>>,
}

impl ScriptedValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` lets every check pass
    pub fn fail_with(&self, error: Option<BrokerError>) {
        *self.outcome.lock() = error;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_broker(&self) -> Option<BrokerEndpoint> {
        self.last_broker.lock().clone()
    }
}

impl ConnectivityValidator for ScriptedValidator {
    fn check_connectivity(
        &self,
        broker: &BrokerEndpoint,
        _directory: &dyn DirectoryClient,
    ) -> Result<(), BrokerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_broker.lock() = Some(broker.clone());
        match self.outcome.lock().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

// ===== Harness =====

pub struct Harness {
    pub repo: MockRecordRepo,
    pub directory: ScriptedDirectory,
    pub validator: ScriptedValidator,
    pub service: Arc<Service>,
}

impl Harness {
    pub fn new(directory: ScriptedDirectory) -> Self {
        Self::with_config(directory, Config::default())
    }

    pub fn with_config(directory: ScriptedDirectory, config: Config) -> Self {
        Self::sharing(MockRecordRepo::new(), directory, config)
    }

    /// A second service instance over the same records
    pub fn sharing(repo: MockRecordRepo, directory: ScriptedDirectory, config: Config) -> Self {
        let validator = ScriptedValidator::new();
        let service = Arc::new(
            Service::new(
                Arc::new(repo.clone()),
                Arc::new(directory.clone()),
                Arc::new(validator.clone()),
                &config,
            )
            .unwrap(),
        );
        Self {
            repo,
            directory,
            validator,
            service,
        }
    }

    /// Run a flow through to a terminal result with the given inputs
    pub async fn provision(&self, endpoint: EndpointInput, broker: BrokerInput) -> FlowResult {
        let handle = self.service.start_flow().await.unwrap();
        let result = self
            .service
            .submit_step(handle.flow_id, StepInput::Endpoint(endpoint))
            .await
            .unwrap();
        assert_eq!(
            step_of(&result),
            Some(StepId::BrokerConfiguration),
            "expected single tenant and application"
        );
        self.service
            .submit_step(handle.flow_id, StepInput::Broker(broker))
            .await
            .unwrap()
    }
}

/// Single tenant "Acme" with single application "Sensors"
pub fn single_tenant_directory() -> ScriptedDirectory {
    ScriptedDirectory::new(&[("Acme", "t1")], &[("t1", &[("Sensors", "a1")])])
}

// ===== Inputs and result helpers =====

pub fn endpoint_input() -> EndpointInput {
    EndpointInput {
        host: "chirpstack.local".into(),
        port: 8080,
        api_key: "0123456789abcdef".into(),
    }
}

pub fn broker_input(host: &str) -> BrokerInput {
    BrokerInput {
        host: host.into(),
        port: 1883,
        username: "bridge".into(),
        password: Some("secret".into()),
        discovery_prefix: "homeassistant".into(),
        vendor_prefix: None,
    }
}

pub fn options_input_of(record: &ConfigurationRecord) -> OptionsInput {
    OptionsInput {
        start_delay: i64::from(record.options.start_delay),
        restore_age_window: i64::from(record.options.restore_age_window),
        debug_payload_logging: record.options.debug_payload_logging,
        log_level: record.options.log_level.to_string(),
        online_poll_interval_per_device: i64::from(
            record.options.online_poll_interval_per_device,
        ),
        expire_after: record.options.expire_after,
    }
}

pub fn broker_input_of(record: &ConfigurationRecord) -> BrokerInput {
    BrokerInput {
        host: record.broker.host.clone(),
        port: i64::from(record.broker.port),
        username: record.broker.username.clone(),
        password: Some(record.broker.password.clone()),
        discovery_prefix: record.broker.discovery_prefix.clone(),
        vendor_prefix: Some(record.broker.vendor_prefix.clone()),
    }
}

pub fn step_of(result: &FlowResult) -> Option<StepId> {
    match result {
        FlowResult::ShowForm(form) => Some(form.step_id),
        _ => None,
    }
}

pub fn form_of(result: FlowResult) -> StepForm {
    match result {
        FlowResult::ShowForm(form) => form,
        other => panic!("expected a form, got {:?}", other),
    }
}

pub fn created(result: FlowResult) -> ConfigurationRecord {
    match result {
        FlowResult::Created(record) => record,
        other => panic!("expected a created record, got {:?}", other),
    }
}
