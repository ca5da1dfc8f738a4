//! Policy request handlers

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::policy::*;
use crate::{error::ApiError, AppState};
use domain_policy::PolicyError;

/// Creates a policy request at RECEIVED
pub async fn create_policy(
    State(state): State<AppState>,
    body: Result<Json<CreatePolicyRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body?;
    request
        .validate()
        .map_err(|e| PolicyError::creation(e.to_string()))?;

    let id = state.service.create(request.into()).await?;
    let id = *id.as_uuid();

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/policies/{}", id))],
        Json(CreatedResponse { id }),
    ))
}

/// Gets a policy request with its history
pub async fn get_policy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PolicyRequestResponse>, ApiError> {
    let policy = state.service.find_by_id(id.into()).await?;
    Ok(Json(PolicyRequestResponse::from(&policy)))
}

/// Lists a customer's policy requests, oldest first
pub async fn list_customer_policies(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<Vec<PolicyRequestResponse>>, ApiError> {
    let policies = state.service.find_by_customer(customer_id.into()).await?;
    Ok(Json(policies.iter().map(PolicyRequestResponse::from).collect()))
}

/// Runs the risk decision for a policy request
pub async fn validate_policy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PolicyRequestResponse>, ApiError> {
    let policy = state.service.validate(id.into()).await?;
    Ok(Json(PolicyRequestResponse::from(&policy)))
}

/// Cancels a policy request
pub async fn cancel_policy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PolicyRequestResponse>, ApiError> {
    let policy = state.service.cancel(id.into()).await?;
    Ok(Json(PolicyRequestResponse::from(&policy)))
}

/// Applies payment and subscription signals
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<PolicyRequestResponse>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let policy = state
        .service
        .update_status(id.into(), request.payment_confirmed, request.subscription_authorized)
        .await?;
    Ok(Json(PolicyRequestResponse::from(&policy)))
}
