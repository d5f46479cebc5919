//! Configuration fingerprints
//!
//! The fingerprint is an XXH3-128 digest over eight identity fields, each in
//! its string form, concatenated in fixed order without separators.

use crate::contract::{BrokerEndpoint, ConfigurationRecord, DirectoryEndpoint, Fingerprint};
use xxhash_rust::xxh3::xxh3_128;

/// The eight fields that identify a configuration
#[derive(Debug, Clone, Copy)]
pub struct FingerprintInput<'a> {
    pub directory_host: &'a str,
    pub directory_port: u16,
    pub tenant_id: &'a str,
    pub application_id: &'a str,
    pub broker_host: &'a str,
    pub broker_port: u16,
    pub discovery_prefix: &'a str,
    pub vendor_prefix: &'a str,
}

impl<'a> FingerprintInput<'a> {
    pub fn new(
        directory: &'a DirectoryEndpoint,
        tenant_id: &'a str,
        application_id: &'a str,
        broker: &'a BrokerEndpoint,
    ) -> Self {
        Self {
            directory_host: &directory.host,
            directory_port: directory.port,
            tenant_id,
            application_id,
            broker_host: &broker.host,
            broker_port: broker.port,
            discovery_prefix: &broker.discovery_prefix,
            vendor_prefix: &broker.vendor_prefix,
        }
    }

    /// Identity fields of a stored record with a candidate broker swapped in
    pub fn with_broker(record: &'a ConfigurationRecord, broker: &'a BrokerEndpoint) -> Self {
        Self::new(
            &record.directory,
            &record.tenant_id,
            &record.application_id,
            broker,
        )
    }
}

/// Compute the fingerprint of a configuration
pub fn fingerprint(input: &FingerprintInput<'_>) -> Fingerprint {
    let material = [
        input.directory_host.to_string(),
        input.directory_port.to_string(),
        input.tenant_id.to_string(),
        input.application_id.to_string(),
        input.broker_host.to_string(),
        input.broker_port.to_string(),
        input.discovery_prefix.to_string(),
        input.vendor_prefix.to_string(),
    ]
    .concat();

    Fingerprint::from_digest(xxh3_128(material.as_bytes()))
}
