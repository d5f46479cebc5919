//! Domain layer - business logic and services

pub mod abort_policy;
pub mod fingerprint;
pub mod flow;
pub mod forms;
pub mod ports;
pub mod reconfigure;
pub mod repository;
pub mod service;
pub mod session;
pub mod validation;

pub use ports::{
    BrokerError, ConnectivityValidator, DirectoryClient, DirectoryConnector, DirectoryError,
};
pub use repository::RecordRepository;
pub use service::Service;
