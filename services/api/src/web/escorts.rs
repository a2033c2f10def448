//! services/api/src/web/escorts.rs
//!
//! Security escort endpoints. A user holds at most one outstanding
//! (`pending` or `assigned`) request; the store enforces this atomically.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use campus_safety_core::domain::{
    EscortRequest, EscortStatus, OfficerAssignment, INITIAL_ESCORT_WAIT_MINUTES,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::error::{not_found_as, AppError, ErrorBody};
use crate::web::middleware::CurrentUser;
use crate::web::rest::MessageResponse;
use crate::web::state::AppState;
use crate::web::validation::{coordinates, optional};

#[derive(Deserialize, ToSchema)]
pub struct CreateEscortRequest {
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub pickup_name: Option<String>,
    pub destination_lat: f64,
    pub destination_lng: f64,
    pub destination_name: Option<String>,
    pub notes: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EscortResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub pickup_name: Option<String>,
    pub destination_lat: f64,
    pub destination_lng: f64,
    pub destination_name: Option<String>,
    pub notes: Option<String>,
    /// `pending`, `assigned`, `cancelled` or `completed`.
    pub status: String,
    pub officer_name: Option<String>,
    pub officer_photo: Option<String>,
    /// Minutes until the officer is expected.
    pub estimated_wait: i32,
    pub created_at: DateTime<Utc>,
}

impl From<EscortRequest> for EscortResponse {
    fn from(request: EscortRequest) -> Self {
        Self {
            id: request.id,
            user_id: request.user_id,
            pickup_lat: request.pickup.lat,
            pickup_lng: request.pickup.lng,
            pickup_name: request.pickup_name,
            destination_lat: request.destination.lat,
            destination_lng: request.destination.lng,
            destination_name: request.destination_name,
            notes: request.notes,
            status: request.status.to_string(),
            officer_name: request.officer_name,
            officer_photo: request.officer_photo,
            estimated_wait: request.estimated_wait_minutes,
            created_at: request.created_at,
        }
    }
}

/// POST /api/escorts - Request a security escort
#[utoipa::path(
    post,
    path = "/api/escorts",
    request_body = CreateEscortRequest,
    responses(
        (status = 200, description = "Escort requested", body = EscortResponse),
        (status = 400, description = "Invalid coordinates or an outstanding request exists", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "escorts"
)]
pub async fn create_escort_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<CreateEscortRequest>,
) -> Result<Json<EscortResponse>, AppError> {
    let request = EscortRequest {
        id: Uuid::new_v4(),
        user_id: user.id,
        pickup: coordinates(req.pickup_lat, req.pickup_lng)?,
        pickup_name: optional(req.pickup_name),
        destination: coordinates(req.destination_lat, req.destination_lng)?,
        destination_name: optional(req.destination_name),
        notes: optional(req.notes),
        status: EscortStatus::Pending,
        officer_name: None,
        officer_photo: None,
        estimated_wait_minutes: INITIAL_ESCORT_WAIT_MINUTES,
        created_at: Utc::now(),
    };

    let request = state.db.create_escort_request(request).await?;
    info!("Escort request {} created by user {}", request.id, user.id);
    Ok(Json(EscortResponse::from(request)))
}

/// GET /api/escorts/active - The caller's outstanding request, or null
#[utoipa::path(
    get,
    path = "/api/escorts/active",
    responses(
        (status = 200, description = "Outstanding request or null", body = Option<EscortResponse>),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "escorts"
)]
pub async fn active_escort_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Option<EscortResponse>>, AppError> {
    let request = state.db.find_active_escort_request(user.id).await?;
    Ok(Json(request.map(EscortResponse::from)))
}

/// PUT /api/escorts/{request_id}/cancel - Cancel an outstanding request
#[utoipa::path(
    put,
    path = "/api/escorts/{request_id}/cancel",
    params(
        ("request_id" = Uuid, Path, description = "The escort request to cancel.")
    ),
    responses(
        (status = 200, description = "Escort request cancelled", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 404, description = "No outstanding request with this id for the caller", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "escorts"
)]
pub async fn cancel_escort_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .db
        .transition_escort_request(request_id, user.id, EscortStatus::Cancelled)
        .await
        .map_err(not_found_as("Escort request not found"))?;

    info!("Escort request {} cancelled by user {}", request_id, user.id);
    Ok(Json(MessageResponse::new("Escort request cancelled")))
}

/// PUT /api/escorts/{request_id}/complete - Close an assigned request once the walk is over
#[utoipa::path(
    put,
    path = "/api/escorts/{request_id}/complete",
    params(
        ("request_id" = Uuid, Path, description = "The assigned escort request.")
    ),
    responses(
        (status = 200, description = "Escort completed", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 404, description = "No assigned request with this id for the caller", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "escorts"
)]
pub async fn complete_escort_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .db
        .transition_escort_request(request_id, user.id, EscortStatus::Completed)
        .await
        .map_err(not_found_as("Escort request not found"))?;

    info!("Escort request {} completed by user {}", request_id, user.id);
    Ok(Json(MessageResponse::new("Escort completed")))
}

/// PUT /api/escorts/{request_id}/assign - Assign the stand-in officer
///
/// Administrative. There is no dispatch logic; every pending request gets the
/// same officer and wait estimate.
#[utoipa::path(
    put,
    path = "/api/escorts/{request_id}/assign",
    params(
        ("request_id" = Uuid, Path, description = "The pending escort request.")
    ),
    responses(
        (status = 200, description = "Officer assigned", body = EscortResponse),
        (status = 401, description = "Admin token missing or wrong", body = ErrorBody),
        (status = 404, description = "No pending request with this id", body = ErrorBody)
    ),
    security(("admin_token" = [])),
    tag = "admin"
)]
pub async fn assign_escort_handler(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<EscortResponse>, AppError> {
    let request = state
        .db
        .assign_escort_officer(request_id, &OfficerAssignment::mock())
        .await
        .map_err(not_found_as("Escort request not found"))?;

    info!(
        "Escort request {} assigned to {}",
        request.id,
        request.officer_name.as_deref().unwrap_or_default()
    );
    Ok(Json(EscortResponse::from(request)))
}
