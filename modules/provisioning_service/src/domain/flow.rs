//! Provisioning state machine
//!
//! endpoint-entry -> tenant-selection -> application-selection ->
//! broker-configuration -> commit. Each step takes the session by value and
//! returns either the session waiting on a form or a terminal result. A step
//! with exactly one candidate choice is taken without showing its form.

use super::abort_policy::{AbortPolicy, Admission};
use super::fingerprint::{fingerprint, FingerprintInput};
use super::forms;
use super::ports::{
    close_blocking, run_blocking, BrokerError, ConnectivityValidator, DirectoryConnector,
    DirectoryError, DirectoryLease,
};
use super::session::{self, Choices, ProvisioningSession, SessionState};
use super::validation::{self, FieldErrors};
use crate::config::FormDefaults;
use crate::contract::{
    fields, BrokerInput, ConfigurationRecord, DirectoryEndpoint, EndpointInput, FieldError,
    FlowResult, OptionsRecord, ProvisioningError, StepForm, StepInput,
};
use std::sync::Arc;

/// Result of running one step
#[derive(Debug)]
pub enum Transition {
    /// The session waits on this form
    Continue(ProvisioningSession, StepForm),
    /// The session was consumed; its connection is closed
    Finished(FlowResult),
}

pub struct ProvisioningFlow {
    connector: Arc<dyn DirectoryConnector>,
    validator: Arc<dyn ConnectivityValidator>,
    policy: Arc<AbortPolicy>,
    form_defaults: FormDefaults,
    default_options: OptionsRecord,
}

impl ProvisioningFlow {
    pub fn new(
        connector: Arc<dyn DirectoryConnector>,
        validator: Arc<dyn ConnectivityValidator>,
        policy: Arc<AbortPolicy>,
        form_defaults: FormDefaults,
        default_options: OptionsRecord,
    ) -> Self {
        Self {
            connector,
            validator,
            policy,
            form_defaults,
            default_options,
        }
    }

    /// A new session at endpoint-entry
    pub fn start(&self) -> (ProvisioningSession, StepForm) {
        let form = forms::endpoint_form(&self.form_defaults, None, FieldErrors::new());
        (
            ProvisioningSession::new(SessionState::EndpointEntry { last: None }),
            form,
        )
    }

    /// Run the step the session waits on
    ///
    /// Input for another step is rejected and the session handed back
    /// unchanged. An internal failure consumes the session.
    pub async fn step(
        &self,
        session: ProvisioningSession,
        input: StepInput,
    ) -> Result<Transition, (Option<ProvisioningSession>, ProvisioningError)> {
        let expected = session.step_id();
        if input.step_id() != expected {
            let err = ProvisioningError::StepMismatch {
                expected: expected.as_str(),
                got: input.step_id().as_str(),
            };
            return Err((Some(session), err));
        }

        let transition = match (session.state, input) {
            (SessionState::EndpointEntry { .. }, StepInput::Endpoint(input)) => {
                self.submit_endpoint(input).await
            }
            (
                SessionState::TenantSelection {
                    directory,
                    lease,
                    tenants,
                },
                StepInput::Tenant { tenant },
            ) => self.select_tenant(directory, lease, tenants, tenant).await,
            (
                SessionState::ApplicationSelection {
                    directory,
                    lease,
                    tenant_id,
                    applications,
                },
                StepInput::Application { application },
            ) => Ok(self.select_application(
                directory,
                lease,
                tenant_id,
                applications,
                application,
            )),
            (
                SessionState::BrokerConfiguration {
                    directory,
                    lease,
                    tenant_id,
                    application_id,
                    ..
                },
                StepInput::Broker(input),
            ) => {
                self.configure_broker(directory, lease, tenant_id, application_id, input)
                    .await
            }
            (state, _) => {
                close_blocking(state).await;
                Err(ProvisioningError::Internal)
            }
        };

        transition.map_err(|e| (None, e))
    }

    // ===== S0 endpoint-entry =====

    async fn submit_endpoint(
        &self,
        input: EndpointInput,
    ) -> Result<Transition, ProvisioningError> {
        let directory = match validation::validate_endpoint(&input) {
            Ok(directory) => directory,
            Err(errors) => return Ok(self.reject_endpoint(input, errors)),
        };

        let connector = self.connector.clone();
        let target = directory.clone();
        let listed = run_blocking(
            move || {
                let client = connector.connect(&target)?;
                let lease = DirectoryLease::new(client.clone());
                let tenants = client.list_tenants()?;
                Ok((lease, tenants))
            },
            DirectoryError::Other,
        )
        .await;

        let (lease, tenants) = match listed {
            Ok(listed) => listed,
            Err(e) => {
                tracing::warn!(
                    host = %directory.host,
                    port = directory.port,
                    "directory connection failed: {}",
                    e
                );
                let errors = single(fields::DIRECTORY_HOST, e.to_field_error());
                return Ok(self.reject_endpoint(input, errors));
            }
        };

        if tenants.is_empty() {
            tracing::info!(host = %directory.host, "directory returned no tenants");
            close_blocking(lease).await;
            let errors = single(fields::DIRECTORY_HOST, FieldError::NoTenantsAvailable);
            return Ok(self.reject_endpoint(input, errors));
        }

        let tenants = session::choices(tenants.into_iter().map(|t| (t.name, t.id)));
        tracing::info!(
            host = %directory.host,
            port = directory.port,
            tenants = tenants.len(),
            "directory endpoint accepted"
        );

        match single_choice(&tenants) {
            Some(only) => {
                tracing::debug!(tenant = %only, "auto-selecting the only tenant");
                self.select_tenant(directory, lease, tenants, only).await
            }
            None => {
                let form = forms::tenant_form(&tenants, None, FieldErrors::new());
                let session = ProvisioningSession::new(SessionState::TenantSelection {
                    directory,
                    lease,
                    tenants,
                });
                Ok(Transition::Continue(session, form))
            }
        }
    }

    fn reject_endpoint(&self, input: EndpointInput, errors: FieldErrors) -> Transition {
        let form = forms::endpoint_form(&self.form_defaults, Some(&input), errors);
        let session = ProvisioningSession::new(SessionState::EndpointEntry { last: Some(input) });
        Transition::Continue(session, form)
    }

    // ===== S1 tenant-selection =====

    async fn select_tenant(
        &self,
        directory: DirectoryEndpoint,
        lease: DirectoryLease,
        tenants: Choices,
        selected: String,
    ) -> Result<Transition, ProvisioningError> {
        let Some(tenant_id) = tenants.get(&selected).cloned() else {
            let errors = single(fields::TENANT, FieldError::InvalidChoice);
            let form = forms::tenant_form(&tenants, Some(selected.as_str()), errors);
            let session = ProvisioningSession::new(SessionState::TenantSelection {
                directory,
                lease,
                tenants,
            });
            return Ok(Transition::Continue(session, form));
        };

        let client = lease.client();
        let query = tenant_id.clone();
        let listed = run_blocking(
            move || client.list_applications(&query),
            DirectoryError::Other,
        )
        .await;

        let error = match listed {
            Ok(applications) if !applications.is_empty() => {
                let applications =
                    session::choices(applications.into_iter().map(|a| (a.name, a.id)));
                tracing::info!(
                    tenant_id = %tenant_id,
                    applications = applications.len(),
                    "tenant selected"
                );
                return Ok(self.enter_application_selection(
                    directory,
                    lease,
                    tenant_id,
                    applications,
                ));
            }
            Ok(_) => {
                tracing::info!(tenant_id = %tenant_id, "tenant has no applications");
                FieldError::NoApplicationsAvailable
            }
            Err(e) => {
                tracing::warn!(tenant_id = %tenant_id, "listing applications failed: {}", e);
                e.to_field_error()
            }
        };

        let errors = single(fields::TENANT, error);
        let form = forms::tenant_form(&tenants, Some(selected.as_str()), errors);
        let session = ProvisioningSession::new(SessionState::TenantSelection {
            directory,
            lease,
            tenants,
        });
        Ok(Transition::Continue(session, form))
    }

    // ===== S2 application-selection =====

    fn enter_application_selection(
        &self,
        directory: DirectoryEndpoint,
        lease: DirectoryLease,
        tenant_id: String,
        applications: Choices,
    ) -> Transition {
        match single_choice(&applications) {
            Some(only) => {
                tracing::debug!(application = %only, "auto-selecting the only application");
                self.select_application(directory, lease, tenant_id, applications, only)
            }
            None => {
                let form = forms::application_form(&applications, None, FieldErrors::new());
                let session = ProvisioningSession::new(SessionState::ApplicationSelection {
                    directory,
                    lease,
                    tenant_id,
                    applications,
                });
                Transition::Continue(session, form)
            }
        }
    }

    fn select_application(
        &self,
        directory: DirectoryEndpoint,
        lease: DirectoryLease,
        tenant_id: String,
        applications: Choices,
        selected: String,
    ) -> Transition {
        let Some(application_id) = applications.get(&selected).cloned() else {
            let form = forms::application_form(
                &applications,
                Some(selected.as_str()),
                single(fields::APPLICATION, FieldError::InvalidChoice),
            );
            let session = ProvisioningSession::new(SessionState::ApplicationSelection {
                directory,
                lease,
                tenant_id,
                applications,
            });
            return Transition::Continue(session, form);
        };

        tracing::info!(application_id = %application_id, "application selected");
        let form = forms::broker_form(&self.form_defaults, None, FieldErrors::new());
        let session = ProvisioningSession::new(SessionState::BrokerConfiguration {
            directory,
            lease,
            tenant_id,
            application_id,
            last: None,
        });
        Transition::Continue(session, form)
    }

    // ===== S3 broker-configuration and commit =====

    async fn configure_broker(
        &self,
        directory: DirectoryEndpoint,
        lease: DirectoryLease,
        tenant_id: String,
        application_id: String,
        input: BrokerInput,
    ) -> Result<Transition, ProvisioningError> {
        let broker = match validation::validate_broker(&input) {
            Ok(broker) => broker,
            Err(errors) => {
                return Ok(self.reject_broker(
                    directory,
                    lease,
                    tenant_id,
                    application_id,
                    input,
                    errors,
                ))
            }
        };

        let candidate = fingerprint(&FingerprintInput::new(
            &directory,
            &tenant_id,
            &application_id,
            &broker,
        ));
        let claimed = self.policy.check(&candidate).await;
        let claimed = match claimed {
            Ok(claimed) => claimed,
            Err(e) => {
                close_blocking(lease).await;
                return Err(e);
            }
        };
        if let Some(reason) = claimed {
            tracing::info!(fingerprint = %candidate, "configuration already exists, aborting");
            close_blocking(lease).await;
            return Ok(Transition::Finished(FlowResult::Aborted(reason)));
        }

        let validator = self.validator.clone();
        let client = lease.client();
        let target = broker.clone();
        let checked = run_blocking(
            move || validator.check_connectivity(&target, client.as_ref()),
            BrokerError::Other,
        )
        .await;

        if let Err(e) = checked {
            tracing::warn!(
                host = %broker.host,
                port = broker.port,
                "broker connection failed: {}",
                e
            );
            let errors = single(fields::BROKER_HOST, e.to_field_error());
            return Ok(self.reject_broker(
                directory,
                lease,
                tenant_id,
                application_id,
                input,
                errors,
            ));
        }

        let now = chrono::Utc::now();
        let record = ConfigurationRecord {
            fingerprint: candidate,
            directory,
            tenant_id,
            application_id,
            broker,
            options: self.default_options.clone(),
            created_at: now,
            updated_at: now,
        };

        let admission = self.policy.commit(record).await;
        close_blocking(lease).await;

        match admission? {
            Admission::Stored(record) => {
                tracing::info!(fingerprint = %record.fingerprint, "configuration record created");
                Ok(Transition::Finished(FlowResult::Created(record)))
            }
            Admission::Rejected(reason) => {
                tracing::info!("configuration claimed concurrently, aborting");
                Ok(Transition::Finished(FlowResult::Aborted(reason)))
            }
        }
    }

    fn reject_broker(
        &self,
        directory: DirectoryEndpoint,
        lease: DirectoryLease,
        tenant_id: String,
        application_id: String,
        input: BrokerInput,
        errors: FieldErrors,
    ) -> Transition {
        let form = forms::broker_form(&self.form_defaults, Some(&input), errors);
        let session = ProvisioningSession::new(SessionState::BrokerConfiguration {
            directory,
            lease,
            tenant_id,
            application_id,
            last: Some(input),
        });
        Transition::Continue(session, form)
    }
}

/// The only choice, when there is exactly one
fn single_choice(choices: &Choices) -> Option<String> {
    match choices.len() {
        1 => choices.keys().next().cloned(),
        _ => None,
    }
}

fn single(field: &str, error: FieldError) -> FieldErrors {
    FieldErrors::from([(field.to_string(), error)])
}
