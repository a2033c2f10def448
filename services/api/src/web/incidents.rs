//! services/api/src/web/incidents.rs
//!
//! Incident report endpoints.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use campus_safety_core::domain::{Incident, IncidentStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::error::{not_found_as, AppError, ErrorBody};
use crate::web::middleware::CurrentUser;
use crate::web::state::AppState;
use crate::web::validation::{coordinates, optional, required};

/// Upper bound on the "my incidents" listing.
const MY_INCIDENTS_LIMIT: usize = 100;

#[derive(Deserialize, ToSchema)]
pub struct CreateIncidentRequest {
    pub incident_type: String,
    pub location_lat: f64,
    pub location_lng: f64,
    pub location_name: Option<String>,
    pub description: String,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub wants_contact: bool,
    pub contact_phone: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct IncidentResponse {
    pub id: Uuid,
    /// Absent for anonymous reports.
    pub user_id: Option<Uuid>,
    pub incident_type: String,
    pub location_lat: f64,
    pub location_lng: f64,
    pub location_name: Option<String>,
    pub description: String,
    pub photos: Vec<String>,
    pub is_anonymous: bool,
    pub wants_contact: bool,
    pub contact_phone: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<Incident> for IncidentResponse {
    fn from(incident: Incident) -> Self {
        Self {
            id: incident.id,
            user_id: incident.user_id,
            incident_type: incident.incident_type,
            location_lat: incident.location.lat,
            location_lng: incident.location.lng,
            location_name: incident.location_name,
            description: incident.description,
            photos: incident.photos,
            is_anonymous: incident.is_anonymous,
            wants_contact: incident.wants_contact,
            contact_phone: incident.contact_phone,
            status: incident.status.to_string(),
            created_at: incident.created_at,
        }
    }
}

/// POST /api/incidents - File an incident report
///
/// Anonymous reports are stored without an owner, so they never show up in
/// the reporter's own listing.
#[utoipa::path(
    post,
    path = "/api/incidents",
    request_body = CreateIncidentRequest,
    responses(
        (status = 200, description = "Incident reported", body = IncidentResponse),
        (status = 400, description = "Missing fields or invalid coordinates", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "incidents"
)]
pub async fn create_incident_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<CreateIncidentRequest>,
) -> Result<Json<IncidentResponse>, AppError> {
    let incident = Incident {
        id: Uuid::new_v4(),
        user_id: (!req.is_anonymous).then_some(user.id),
        incident_type: required("incident_type", &req.incident_type)?,
        location: coordinates(req.location_lat, req.location_lng)?,
        location_name: optional(req.location_name),
        description: required("description", &req.description)?,
        photos: req.photos,
        is_anonymous: req.is_anonymous,
        wants_contact: req.wants_contact,
        contact_phone: optional(req.contact_phone),
        status: IncidentStatus::Pending,
        created_at: Utc::now(),
    };

    let incident = state.db.create_incident(incident).await?;
    if incident.is_anonymous {
        info!("Anonymous incident {} reported", incident.id);
    } else {
        info!("Incident {} reported by user {}", incident.id, user.id);
    }
    Ok(Json(IncidentResponse::from(incident)))
}

/// GET /api/incidents/my - The caller's own reports, newest first
#[utoipa::path(
    get,
    path = "/api/incidents/my",
    responses(
        (status = 200, description = "Own incident reports", body = [IncidentResponse]),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "incidents"
)]
pub async fn my_incidents_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<IncidentResponse>>, AppError> {
    let incidents = state
        .db
        .list_incidents_by_user(user.id, MY_INCIDENTS_LIMIT)
        .await?;
    Ok(Json(incidents.into_iter().map(IncidentResponse::from).collect()))
}

/// GET /api/incidents/{incident_id} - Any incident by id
#[utoipa::path(
    get,
    path = "/api/incidents/{incident_id}",
    params(
        ("incident_id" = Uuid, Path, description = "The incident to fetch.")
    ),
    responses(
        (status = 200, description = "The incident", body = IncidentResponse),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 404, description = "Incident not found", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "incidents"
)]
pub async fn get_incident_handler(
    State(state): State<Arc<AppState>>,
    Path(incident_id): Path<Uuid>,
) -> Result<Json<IncidentResponse>, AppError> {
    let incident = state
        .db
        .get_incident_by_id(incident_id)
        .await
        .map_err(not_found_as("Incident not found"))?;
    Ok(Json(IncidentResponse::from(incident)))
}
