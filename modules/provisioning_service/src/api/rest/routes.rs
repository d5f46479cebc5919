//! Route registration

use super::{dto::*, error::Problem, handlers};
use crate::domain::Service;
use axum::{
    extract::Path,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use std::sync::Arc;
use utoipa::OpenApi;
use uuid::Uuid;

/// Schemas of the REST surface
#[derive(OpenApi)]
#[openapi(components(schemas(
    RecordDto,
    OptionsDto,
    RecordsListResponse,
    FormDto,
    FormFieldDto,
    FlowOutcomeDto,
    StartFlowResponse,
    SubmitStepRequest,
    BrokerFieldsDto,
    ReconfigureRequest,
    ReconfigureOutcomeDto,
)))]
pub struct ApiDoc;

/// Register all REST routes
pub fn register_routes(router: Router, service: Arc<Service>) -> anyhow::Result<Router> {
    let router = router
        // Flow endpoints
        .route("/provisioning/flows", post(start_flow_handler))
        .route(
            "/provisioning/flows/{flow_id}",
            post(submit_step_handler).delete(abandon_flow_handler),
        )
        // Record endpoints
        .route("/provisioning/records", get(list_records_handler))
        .route(
            "/provisioning/records/{fingerprint}",
            get(get_record_handler).delete(remove_record_handler),
        )
        .route(
            "/provisioning/records/{fingerprint}/options",
            get(reconfigure_form_handler).post(reconfigure_handler),
        )
        // Schema document
        .route("/provisioning/openapi.json", get(openapi_handler))
        // Add service as extension for handlers
        .layer(Extension(service));

    Ok(router)
}

async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

// ===== Handler wrappers that extract service from Extension =====

async fn start_flow_handler(
    Extension(service): Extension<Arc<Service>>,
) -> Result<(StatusCode, Json<StartFlowResponse>), Problem> {
    handlers::start_flow(service).await
}

async fn submit_step_handler(
    Extension(service): Extension<Arc<Service>>,
    path: Path<Uuid>,
    json: Json<SubmitStepRequest>,
) -> Result<Json<FlowOutcomeDto>, Problem> {
    handlers::submit_step(service, path, json).await
}

async fn abandon_flow_handler(
    Extension(service): Extension<Arc<Service>>,
    path: Path<Uuid>,
) -> Result<StatusCode, Problem> {
    handlers::abandon_flow(service, path).await
}

async fn list_records_handler(
    Extension(service): Extension<Arc<Service>>,
) -> Result<Json<RecordsListResponse>, Problem> {
    handlers::list_records(service).await
}

async fn get_record_handler(
    Extension(service): Extension<Arc<Service>>,
    path: Path<String>,
) -> Result<Json<RecordDto>, Problem> {
    handlers::get_record(service, path).await
}

async fn remove_record_handler(
    Extension(service): Extension<Arc<Service>>,
    path: Path<String>,
) -> Result<StatusCode, Problem> {
    handlers::remove_record(service, path).await
}

async fn reconfigure_form_handler(
    Extension(service): Extension<Arc<Service>>,
    path: Path<String>,
) -> Result<Json<FormDto>, Problem> {
    handlers::reconfigure_form(service, path).await
}

async fn reconfigure_handler(
    Extension(service): Extension<Arc<Service>>,
    path: Path<String>,
    json: Json<ReconfigureRequest>,
) -> Result<Json<ReconfigureOutcomeDto>, Problem> {
    handlers::reconfigure(service, path, json).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_has_components() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().unwrap().schemas;
        assert!(schemas.contains_key("SubmitStepRequest"));
        assert!(schemas.contains_key("FlowOutcomeDto"));
        assert!(schemas.contains_key("ReconfigureOutcomeDto"));
    }
}
