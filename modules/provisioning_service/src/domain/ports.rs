//! Ports to the external collaborators of the provisioning flows
//!
//! Both collaborators are blocking. The domain only calls them from the
//! blocking pool (see [`run_blocking`]).

use crate::contract::{Application, BrokerEndpoint, DirectoryEndpoint, FieldError, Tenant};
use std::sync::Arc;

/// Failure kinds of the directory service
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    #[error("directory unreachable: {0}")]
    Unreachable(String),

    #[error("directory rejected the credential")]
    AuthRejected,

    /// Anything the client could not classify
    #[error("directory call failed: {0}")]
    Other(String),
}

impl DirectoryError {
    /// Field error shown to the operator
    pub fn to_field_error(&self) -> FieldError {
        match self {
            DirectoryError::AuthRejected => FieldError::DirectoryAuthRejected,
            DirectoryError::Unreachable(_) | DirectoryError::Other(_) => {
                FieldError::DirectoryConnectionFailed
            }
        }
    }
}

/// Failure kinds of the broker connectivity check
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrokerError {
    #[error("broker unreachable: {0}")]
    Unreachable(String),

    #[error("broker rejected the credentials")]
    AuthRejected,

    /// Anything the validator could not classify
    #[error("broker check failed: {0}")]
    Other(String),
}

impl BrokerError {
    /// Field error shown to the operator
    pub fn to_field_error(&self) -> FieldError {
        match self {
            BrokerError::AuthRejected => FieldError::BrokerAuthRejected,
            BrokerError::Unreachable(_) | BrokerError::Other(_) => {
                FieldError::BrokerConnectionFailed
            }
        }
    }
}

/// Open connection to one directory service instance
pub trait DirectoryClient: Send + Sync {
    /// List tenants visible to the credential
    fn list_tenants(&self) -> Result<Vec<Tenant>, DirectoryError>;

    /// List applications of a tenant
    fn list_applications(&self, tenant_id: &str) -> Result<Vec<Application>, DirectoryError>;

    /// Release the underlying connection
    fn close(&self);
}

/// Opens directory clients for an endpoint
pub trait DirectoryConnector: Send + Sync {
    fn connect(&self, endpoint: &DirectoryEndpoint)
        -> Result<Arc<dyn DirectoryClient>, DirectoryError>;
}

/// Connectivity-only check of a broker configuration
///
/// Implementations must not leave persistent side effects and must release
/// whatever they opened before returning, whatever the outcome.
pub trait ConnectivityValidator: Send + Sync {
    fn check_connectivity(
        &self,
        broker: &BrokerEndpoint,
        directory: &dyn DirectoryClient,
    ) -> Result<(), BrokerError>;
}

/// Scoped ownership of a directory client
///
/// The client is closed when the lease is released or dropped, on every exit
/// path of the owning session.
pub struct DirectoryLease {
    client: Arc<dyn DirectoryClient>,
}

impl DirectoryLease {
    pub fn new(client: Arc<dyn DirectoryClient>) -> Self {
        Self { client }
    }

    /// Shared handle for use on the blocking pool
    pub fn client(&self) -> Arc<dyn DirectoryClient> {
        self.client.clone()
    }

    pub fn release(self) {
        drop(self);
    }
}

impl Drop for DirectoryLease {
    fn drop(&mut self) {
        self.client.close();
    }
}

impl std::fmt::Debug for DirectoryLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryLease").finish_non_exhaustive()
    }
}

/// Run a blocking collaborator call off the async workers
///
/// A panicking collaborator is reported through `on_panic` so the caller can
/// classify it like any other unexpected failure.
pub async fn run_blocking<T, E, F>(f: F, on_panic: impl FnOnce(String) -> E) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(join_error) => Err(on_panic(join_error.to_string())),
    }
}

/// Drop a value holding directory leases on the blocking pool
///
/// Closing a directory client may block, so leases are never dropped on an
/// async worker.
pub async fn close_blocking<T: Send + 'static>(held: T) {
    if let Err(e) = tokio::task::spawn_blocking(move || drop(held)).await {
        tracing::warn!("closing directory connection failed: {}", e);
    }
}
