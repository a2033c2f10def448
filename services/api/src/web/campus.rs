//! services/api/src/web/campus.rs
//!
//! Campus reference data: the alert feed, the safety location map, and the
//! administrative reseed that replaces both.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use campus_safety_core::domain::{CampusAlert, CampusLocation, LocationType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::seed;
use crate::web::error::{not_found_as, AppError, ErrorBody};
use crate::web::state::AppState;

const ALERTS_LIMIT: usize = 50;
const LOCATIONS_LIMIT: usize = 100;

#[derive(Serialize, ToSchema)]
pub struct CampusAlertResponse {
    pub id: Uuid,
    /// `emergency`, `advisory` or `info`.
    pub alert_type: String,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

impl From<CampusAlert> for CampusAlertResponse {
    fn from(alert: CampusAlert) -> Self {
        Self {
            id: alert.id,
            alert_type: alert.level.to_string(),
            title: alert.title,
            message: alert.message,
            created_at: alert.created_at,
            is_read: alert.is_read,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct CampusLocationResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub location_type: String,
    pub lat: f64,
    pub lng: f64,
}

impl From<CampusLocation> for CampusLocationResponse {
    fn from(location: CampusLocation) -> Self {
        Self {
            id: location.id,
            name: location.name,
            description: location.description,
            location_type: location.location_type.to_string(),
            lat: location.position.lat,
            lng: location.position.lng,
        }
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LocationQuery {
    /// One of `emergency_phone`, `aed`, `safe_building`, `security_office`, `parking`.
    pub location_type: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SeedResponse {
    pub message: String,
    pub alerts: usize,
    pub locations: usize,
}

/// GET /api/alerts - Campus alerts, newest first
#[utoipa::path(
    get,
    path = "/api/alerts",
    responses(
        (status = 200, description = "Campus alerts", body = [CampusAlertResponse])
    ),
    tag = "campus"
)]
pub async fn list_alerts_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CampusAlertResponse>>, AppError> {
    let alerts = state.db.list_campus_alerts(ALERTS_LIMIT).await?;
    Ok(Json(alerts.into_iter().map(CampusAlertResponse::from).collect()))
}

/// GET /api/alerts/{alert_id} - One campus alert
#[utoipa::path(
    get,
    path = "/api/alerts/{alert_id}",
    params(
        ("alert_id" = Uuid, Path, description = "The alert to fetch.")
    ),
    responses(
        (status = 200, description = "The alert", body = CampusAlertResponse),
        (status = 404, description = "Alert not found", body = ErrorBody)
    ),
    tag = "campus"
)]
pub async fn get_alert_handler(
    State(state): State<Arc<AppState>>,
    Path(alert_id): Path<Uuid>,
) -> Result<Json<CampusAlertResponse>, AppError> {
    let alert = state
        .db
        .get_campus_alert_by_id(alert_id)
        .await
        .map_err(not_found_as("Alert not found"))?;
    Ok(Json(CampusAlertResponse::from(alert)))
}

/// GET /api/locations - Safety locations, optionally filtered by type
#[utoipa::path(
    get,
    path = "/api/locations",
    params(LocationQuery),
    responses(
        (status = 200, description = "Campus locations", body = [CampusLocationResponse]),
        (status = 400, description = "Unknown location type", body = ErrorBody)
    ),
    tag = "campus"
)]
pub async fn list_locations_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LocationQuery>,
) -> Result<Json<Vec<CampusLocationResponse>>, AppError> {
    let location_type = query
        .location_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::parse::<LocationType>)
        .transpose()
        .map_err(|e| AppError::Validation(format!("Unknown location_type '{}'", e.value)))?;

    let locations = state
        .db
        .list_campus_locations(location_type, LOCATIONS_LIMIT)
        .await?;
    Ok(Json(locations.into_iter().map(CampusLocationResponse::from).collect()))
}

/// POST /api/seed - Replace campus alerts and locations with the bundled dataset
#[utoipa::path(
    post,
    path = "/api/seed",
    responses(
        (status = 200, description = "Data seeded successfully", body = SeedResponse),
        (status = 401, description = "Admin token missing or wrong", body = ErrorBody)
    ),
    security(("admin_token" = [])),
    tag = "admin"
)]
pub async fn seed_handler(State(state): State<Arc<AppState>>) -> Result<Json<SeedResponse>, AppError> {
    let alerts = seed::campus_alerts(Utc::now());
    let locations = seed::campus_locations();
    let (alert_count, location_count) = (alerts.len(), locations.len());

    state.db.replace_campus_data(alerts, locations).await?;

    info!(
        "Campus data reseeded with {} alerts and {} locations",
        alert_count, location_count
    );
    Ok(Json(SeedResponse {
        message: "Data seeded successfully".to_string(),
        alerts: alert_count,
        locations: location_count,
    }))
}
