//! Synchronous status event intake

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::ApiError, AppState};
use domain_policy::RequestStatus;

/// Status event posted by an upstream system
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEventRequest {
    pub id: Uuid,
    #[serde(default)]
    pub payment_confirmed: bool,
    #[serde(default)]
    pub subscription_authorized: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusEventResponse {
    pub status: RequestStatus,
}

/// Applies a status event and reports the resulting status
///
/// Unlike the queue path, failures are returned to the caller.
pub async fn receive_status_event(
    State(state): State<AppState>,
    body: Result<Json<StatusEventRequest>, axum::extract::rejection::JsonRejection>,
) -> Result<Json<StatusEventResponse>, ApiError> {
    let Json(event) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let policy = state
        .service
        .update_status(event.id.into(), event.payment_confirmed, event.subscription_authorized)
        .await?;

    Ok(Json(StatusEventResponse {
        status: policy.status(),
    }))
}
