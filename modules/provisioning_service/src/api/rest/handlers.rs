//! HTTP request handlers - thin layer that delegates to domain service

use super::{
    dto::*,
    error::{invalid_fingerprint, map_domain_error, Problem},
};
use crate::contract::Fingerprint;
use crate::domain::Service;
use axum::{extract::Path, http::StatusCode, Json};
use std::sync::Arc;
use uuid::Uuid;

fn parse_fingerprint(raw: &str) -> Result<Fingerprint, Problem> {
    Fingerprint::parse(raw).ok_or_else(|| invalid_fingerprint(raw))
}

// ===== Flow Handlers =====

/// Open a provisioning flow
pub async fn start_flow(
    service: Arc<Service>,
) -> Result<(StatusCode, Json<StartFlowResponse>), Problem> {
    let handle = service.start_flow().await.map_err(map_domain_error)?;

    Ok((
        StatusCode::CREATED,
        Json(StartFlowResponse {
            flow_id: handle.flow_id,
            result: handle.result.into(),
        }),
    ))
}

/// Submit the current step of a flow
pub async fn submit_step(
    service: Arc<Service>,
    Path(flow_id): Path<Uuid>,
    Json(req): Json<SubmitStepRequest>,
) -> Result<Json<FlowOutcomeDto>, Problem> {
    let result = service
        .submit_step(flow_id, req.into())
        .await
        .map_err(map_domain_error)?;

    Ok(Json(result.into()))
}

/// Abandon a flow
pub async fn abandon_flow(
    service: Arc<Service>,
    Path(flow_id): Path<Uuid>,
) -> Result<StatusCode, Problem> {
    service
        .abandon_flow(flow_id)
        .await
        .map_err(map_domain_error)?;

    Ok(StatusCode::NO_CONTENT)
}

// ===== Record Handlers =====

/// List all records
pub async fn list_records(service: Arc<Service>) -> Result<Json<RecordsListResponse>, Problem> {
    let records = service.list_records().await.map_err(map_domain_error)?;

    let items: Vec<RecordDto> = records.into_iter().map(Into::into).collect();
    let total = items.len();

    Ok(Json(RecordsListResponse { items, total }))
}

/// Get one record
pub async fn get_record(
    service: Arc<Service>,
    Path(fingerprint): Path<String>,
) -> Result<Json<RecordDto>, Problem> {
    let fingerprint = parse_fingerprint(&fingerprint)?;
    let record = service
        .get_record(&fingerprint)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(record.into()))
}

/// Remove a record
pub async fn remove_record(
    service: Arc<Service>,
    Path(fingerprint): Path<String>,
) -> Result<StatusCode, Problem> {
    let fingerprint = parse_fingerprint(&fingerprint)?;
    service
        .remove_record(&fingerprint)
        .await
        .map_err(map_domain_error)?;

    Ok(StatusCode::NO_CONTENT)
}

// ===== Reconfiguration Handlers =====

/// Render the `init` form of a record
pub async fn reconfigure_form(
    service: Arc<Service>,
    Path(fingerprint): Path<String>,
) -> Result<Json<FormDto>, Problem> {
    let fingerprint = parse_fingerprint(&fingerprint)?;
    let form = service
        .reconfigure_form(&fingerprint)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(form.into()))
}

/// Apply an `init` submission
pub async fn reconfigure(
    service: Arc<Service>,
    Path(fingerprint): Path<String>,
    Json(req): Json<ReconfigureRequest>,
) -> Result<Json<ReconfigureOutcomeDto>, Problem> {
    let fingerprint = parse_fingerprint(&fingerprint)?;
    let result = service
        .reconfigure(&fingerprint, req.into())
        .await
        .map_err(map_domain_error)?;

    Ok(Json(result.into()))
}
