//! services/api/src/web/sos.rs
//!
//! SOS alert endpoints.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use campus_safety_core::domain::{SosAlert, SosStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::error::{not_found_as, AppError, ErrorBody};
use crate::web::middleware::CurrentUser;
use crate::web::rest::MessageResponse;
use crate::web::state::AppState;
use crate::web::validation::{coordinates, optional};

#[derive(Deserialize, ToSchema)]
pub struct CreateSosRequest {
    pub location_lat: f64,
    pub location_lng: f64,
    pub alert_type: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SosAlertResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_phone: String,
    pub location_lat: f64,
    pub location_lng: f64,
    pub alert_type: Option<String>,
    /// `active` or `cancelled`.
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<SosAlert> for SosAlertResponse {
    fn from(alert: SosAlert) -> Self {
        Self {
            id: alert.id,
            user_id: alert.user_id,
            user_name: alert.user_name,
            user_phone: alert.user_phone,
            location_lat: alert.location.lat,
            location_lng: alert.location.lng,
            alert_type: alert.alert_type,
            status: alert.status.to_string(),
            created_at: alert.created_at,
        }
    }
}

/// POST /api/sos - Raise an SOS alert at the caller's position
///
/// The caller's name and phone are copied onto the alert so responders can act
/// on it without a second lookup.
#[utoipa::path(
    post,
    path = "/api/sos",
    request_body = CreateSosRequest,
    responses(
        (status = 200, description = "SOS alert raised", body = SosAlertResponse),
        (status = 400, description = "Invalid coordinates", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "sos"
)]
pub async fn create_sos_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<CreateSosRequest>,
) -> Result<Json<SosAlertResponse>, AppError> {
    let alert = SosAlert {
        id: Uuid::new_v4(),
        user_id: user.id,
        user_name: user.full_name.clone(),
        user_phone: user.phone.clone(),
        location: coordinates(req.location_lat, req.location_lng)?,
        alert_type: optional(req.alert_type),
        status: SosStatus::Active,
        created_at: Utc::now(),
    };

    let alert = state.db.create_sos_alert(alert).await?;
    warn!("SOS alert {} raised by user {}", alert.id, user.id);
    Ok(Json(SosAlertResponse::from(alert)))
}

/// GET /api/sos/active - The caller's newest active SOS alert, or null
#[utoipa::path(
    get,
    path = "/api/sos/active",
    responses(
        (status = 200, description = "Active alert or null", body = Option<SosAlertResponse>),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "sos"
)]
pub async fn active_sos_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Option<SosAlertResponse>>, AppError> {
    let alert = state.db.find_active_sos_alert(user.id).await?;
    Ok(Json(alert.map(SosAlertResponse::from)))
}

/// PUT /api/sos/{sos_id}/cancel - Cancel one of the caller's active alerts
#[utoipa::path(
    put,
    path = "/api/sos/{sos_id}/cancel",
    params(
        ("sos_id" = Uuid, Path, description = "The alert to cancel.")
    ),
    responses(
        (status = 200, description = "SOS alert cancelled", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 404, description = "No active alert with this id for the caller", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "sos"
)]
pub async fn cancel_sos_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(sos_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .db
        .transition_sos_alert(sos_id, user.id, SosStatus::Cancelled)
        .await
        .map_err(not_found_as("SOS alert not found"))?;

    info!("SOS alert {} cancelled by user {}", sos_id, user.id);
    Ok(Json(MessageResponse::new("SOS alert cancelled")))
}
