//! Module declaration and lifecycle implementation

use crate::config::Config;
use crate::contract::ProvisioningApi;
use crate::domain::{ConnectivityValidator, DirectoryConnector, Service};
use anyhow::Result;
use parking_lot::{Mutex, RwLock};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Provisioning service module
///
/// Lifecycle: `migrate`, then `init`, then `register_rest` / `client`.
/// `shutdown` stops the idle flow eviction task.
#[derive(Default)]
pub struct ProvisioningServiceModule {
    service: RwLock<Option<Arc<Service>>>,
    eviction: Mutex<Option<JoinHandle<()>>>,
}

impl ProvisioningServiceModule {
    /// Build the repository and the domain service
    ///
    /// Must be called from within a tokio runtime.
    pub async fn init(
        &self,
        cfg: Config,
        db: Arc<DatabaseConnection>,
        connector: Arc<dyn DirectoryConnector>,
        validator: Arc<dyn ConnectivityValidator>,
    ) -> Result<()> {
        // Build repository
        let records = Arc::new(
            crate::infra::storage::repositories::SeaOrmRecordRepository::new(db),
        );

        // Build domain service
        let service = Arc::new(Service::new(records, connector, validator, &cfg)?);
        *self.service.write() = Some(service.clone());

        let period = (cfg.flow_idle_timeout / 4).max(std::time::Duration::from_secs(1));
        let task = service.spawn_idle_eviction(period);
        if let Some(previous) = self.eviction.lock().replace(task) {
            previous.abort();
        }

        tracing::info!(
            max_open_flows = cfg.max_open_flows,
            flow_idle_timeout = ?cfg.flow_idle_timeout,
            "Provisioning service initialized"
        );
        Ok(())
    }

    /// Run database migrations
    pub async fn migrate(&self, db: &DatabaseConnection) -> Result<()> {
        use crate::infra::storage::migrations::Migrator;
        use sea_orm_migration::MigratorTrait;

        Migrator::up(db, None).await?;
        tracing::info!("Provisioning service migrations completed");
        Ok(())
    }

    /// Mount the REST routes on `router`
    pub fn register_rest(&self, router: axum::Router) -> Result<axum::Router> {
        let service = self.service()?;

        tracing::info!("Registering provisioning service REST routes");
        crate::api::rest::routes::register_routes(router, service)
    }

    /// Native client for in-process calls
    pub fn client(&self) -> Result<Arc<dyn ProvisioningApi>> {
        let service = self.service()?;
        Ok(Arc::new(crate::api::native::NativeClient::new(service)))
    }

    /// Stop background work
    pub fn shutdown(&self) {
        if let Some(task) = self.eviction.lock().take() {
            task.abort();
        }
    }

    fn service(&self) -> Result<Arc<Service>> {
        self.service
            .read()
            .as_ref()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Service not initialized"))
    }
}
