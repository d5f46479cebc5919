//! Single-step (`init`) editor of a stored record
//!
//! Only the broker fields and the options are editable. A changed broker is
//! checked again before anything is written; options alone are saved without
//! contacting either collaborator.

use super::abort_policy::{AbortPolicy, Admission};
use super::forms;
use super::ports::{
    run_blocking, BrokerError, ConnectivityValidator, DirectoryConnector, DirectoryError,
    DirectoryLease,
};
use super::repository::RecordRepository;
use super::validation::{self, FieldErrors};
use crate::contract::{
    fields, BrokerEndpoint, ConfigurationRecord, FieldError, Fingerprint, ProvisioningError,
    ReconfigureInput, ReconfigureResult, StepForm,
};
use std::sync::Arc;

/// Why a changed broker could not be confirmed
#[derive(Debug)]
enum CheckFailure {
    Directory(DirectoryError),
    Broker(BrokerError),
}

impl CheckFailure {
    fn to_field_errors(&self) -> FieldErrors {
        let (field, error) = match self {
            CheckFailure::Directory(e) => (fields::BASE, e.to_field_error()),
            CheckFailure::Broker(e) => (fields::BROKER_HOST, e.to_field_error()),
        };
        FieldErrors::from([(field.to_string(), error)])
    }
}

pub struct ReconfigurationFlow {
    records: Arc<dyn RecordRepository>,
    connector: Arc<dyn DirectoryConnector>,
    validator: Arc<dyn ConnectivityValidator>,
    policy: Arc<AbortPolicy>,
}

impl ReconfigurationFlow {
    pub fn new(
        records: Arc<dyn RecordRepository>,
        connector: Arc<dyn DirectoryConnector>,
        validator: Arc<dyn ConnectivityValidator>,
        policy: Arc<AbortPolicy>,
    ) -> Self {
        Self {
            records,
            connector,
            validator,
            policy,
        }
    }

    /// The `init` form prefilled from the stored record
    pub async fn form(&self, fingerprint: &Fingerprint) -> Result<StepForm, ProvisioningError> {
        let record = self.load(fingerprint).await?;
        Ok(forms::init_form(&record, None, FieldErrors::new()))
    }

    /// Apply an `init` submission
    pub async fn submit(
        &self,
        fingerprint: &Fingerprint,
        input: ReconfigureInput,
    ) -> Result<ReconfigureResult, ProvisioningError> {
        let record = self.load(fingerprint).await?;
        let mut input = input;
        if input.broker.password.is_none() {
            input.broker.password = Some(record.broker.password.clone());
        }

        let broker = validation::validate_broker(&input.broker);
        let options = validation::validate_options(&input.options);
        let (broker, options) = match (broker, options) {
            (Ok(broker), Ok(options)) => (broker, options),
            (broker, options) => {
                let mut errors = broker.err().unwrap_or_default();
                errors.extend(options.err().unwrap_or_default());
                return Ok(self.reject(&record, &input, errors));
            }
        };

        let broker_changed = broker != record.broker;
        if !broker_changed && options == record.options {
            tracing::debug!(%fingerprint, "reconfiguration without changes");
            return Ok(ReconfigureResult::Updated(record));
        }

        if broker_changed {
            if let Err(failure) = self.check_broker(&record, &broker).await {
                tracing::warn!(
                    %fingerprint,
                    host = %broker.host,
                    port = broker.port,
                    "reconfigured broker rejected: {:?}",
                    failure
                );
                return Ok(self.reject(&record, &input, failure.to_field_errors()));
            }
        }

        let updated = ConfigurationRecord {
            broker,
            options,
            updated_at: chrono::Utc::now(),
            ..record
        };

        match self.policy.update(updated).await? {
            Admission::Stored(record) => {
                tracing::info!(
                    fingerprint = %record.fingerprint,
                    broker_changed,
                    "configuration record reconfigured"
                );
                Ok(ReconfigureResult::Updated(record))
            }
            Admission::Rejected(reason) => {
                tracing::info!(%fingerprint, "reconfigured broker collides with another record");
                Ok(ReconfigureResult::Aborted(reason))
            }
        }
    }

    async fn load(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<ConfigurationRecord, ProvisioningError> {
        self.records
            .find_by_fingerprint(fingerprint)
            .await
            .map_err(|e| {
                tracing::error!(%fingerprint, "failed to load record: {:#}", e);
                ProvisioningError::Internal
            })?
            .ok_or_else(|| ProvisioningError::RecordNotFound {
                fingerprint: fingerprint.to_string(),
            })
    }

    /// Connect to the stored directory and check the candidate broker
    ///
    /// The directory connection lives only for the duration of the check.
    async fn check_broker(
        &self,
        record: &ConfigurationRecord,
        broker: &BrokerEndpoint,
    ) -> Result<(), CheckFailure> {
        let connector = self.connector.clone();
        let validator = self.validator.clone();
        let directory = record.directory.clone();
        let candidate = broker.clone();

        run_blocking(
            move || {
                let client = connector
                    .connect(&directory)
                    .map_err(CheckFailure::Directory)?;
                let lease = DirectoryLease::new(client);
                let checked = validator.check_connectivity(&candidate, lease.client().as_ref());
                lease.release();
                checked.map_err(CheckFailure::Broker)
            },
            |panic| CheckFailure::Broker(BrokerError::Other(panic)),
        )
        .await
    }

    fn reject(
        &self,
        record: &ConfigurationRecord,
        input: &ReconfigureInput,
        errors: FieldErrors,
    ) -> ReconfigureResult {
        ReconfigureResult::ShowForm(forms::init_form(
            record,
            Some((&input.broker, &input.options)),
            errors,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_failure_lands_on_base() {
        let errors = CheckFailure::Directory(DirectoryError::AuthRejected).to_field_errors();
        assert_eq!(
            errors.get(fields::BASE),
            Some(&FieldError::DirectoryAuthRejected)
        );

        let unreachable = DirectoryError::Unreachable("refused".into());
        let errors = CheckFailure::Directory(unreachable).to_field_errors();
        assert_eq!(
            errors.get(fields::BASE),
            Some(&FieldError::DirectoryConnectionFailed)
        );
    }

    #[test]
    fn test_broker_failure_lands_on_broker_host() {
        let errors = CheckFailure::Broker(BrokerError::AuthRejected).to_field_errors();
        assert_eq!(
            errors.get(fields::BROKER_HOST),
            Some(&FieldError::BrokerAuthRejected)
        );
    }
}
