//! services/api/src/web/friend_walk.rs
//!
//! Friend walk endpoints: a timed walk during which the caller's chosen
//! trusted contacts can follow their position.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use campus_safety_core::domain::{FriendWalk, FriendWalkStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::web::error::{not_found_as, AppError, ErrorBody};
use crate::web::middleware::CurrentUser;
use crate::web::rest::MessageResponse;
use crate::web::state::AppState;
use crate::web::validation::{coordinates, positive_minutes};

const DEFAULT_EXTEND_MINUTES: i32 = 15;

#[derive(Deserialize, ToSchema)]
pub struct StartWalkRequest {
    /// Trusted contact ids; each must belong to the caller.
    pub contact_ids: Vec<Uuid>,
    pub duration_minutes: i32,
    pub location_lat: f64,
    pub location_lng: f64,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateLocationRequest {
    pub location_lat: f64,
    pub location_lng: f64,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExtendQuery {
    /// Minutes to add. Defaults to 15.
    pub minutes: Option<i32>,
}

#[derive(Serialize, ToSchema)]
pub struct FriendWalkResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub contact_ids: Vec<Uuid>,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub end_time: DateTime<Utc>,
    pub current_lat: f64,
    pub current_lng: f64,
    /// `active` or `completed`.
    pub status: String,
}

impl From<FriendWalk> for FriendWalkResponse {
    fn from(walk: FriendWalk) -> Self {
        Self {
            id: walk.id,
            user_id: walk.user_id,
            contact_ids: walk.contact_ids,
            start_time: walk.start_time,
            duration_minutes: walk.duration_minutes,
            end_time: walk.end_time,
            current_lat: walk.current_location.lat,
            current_lng: walk.current_location.lng,
            status: walk.status.to_string(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ExtendWalkResponse {
    pub message: String,
    pub new_end_time: DateTime<Utc>,
    pub duration_minutes: i32,
}

/// POST /api/friend-walk - Start a friend walk
#[utoipa::path(
    post,
    path = "/api/friend-walk",
    request_body = StartWalkRequest,
    responses(
        (status = 200, description = "Walk started", body = FriendWalkResponse),
        (status = 400, description = "Invalid input, unknown contact, or a walk is already active", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "friend-walk"
)]
pub async fn start_walk_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<StartWalkRequest>,
) -> Result<Json<FriendWalkResponse>, AppError> {
    let duration = positive_minutes("duration_minutes", req.duration_minutes)?;
    let location = coordinates(req.location_lat, req.location_lng)?;

    let known: HashSet<Uuid> = user.trusted_contacts.iter().map(|c| c.id).collect();
    if let Some(unknown) = req.contact_ids.iter().find(|id| !known.contains(*id)) {
        return Err(AppError::Validation(format!(
            "Contact {} is not one of your trusted contacts",
            unknown
        )));
    }

    let walk = FriendWalk::start(user.id, req.contact_ids, duration, location, Utc::now());
    let walk = state.db.create_friend_walk(walk).await?;

    info!(
        "Friend walk {} started by user {} for {} minutes",
        walk.id, user.id, walk.duration_minutes
    );
    Ok(Json(FriendWalkResponse::from(walk)))
}

/// GET /api/friend-walk/active - The caller's active walk, or null
#[utoipa::path(
    get,
    path = "/api/friend-walk/active",
    responses(
        (status = 200, description = "Active walk or null", body = Option<FriendWalkResponse>),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "friend-walk"
)]
pub async fn active_walk_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Option<FriendWalkResponse>>, AppError> {
    let walk = state.db.find_active_friend_walk(user.id).await?;
    Ok(Json(walk.map(FriendWalkResponse::from)))
}

/// PUT /api/friend-walk/{walk_id}/update - Report the caller's current position
#[utoipa::path(
    put,
    path = "/api/friend-walk/{walk_id}/update",
    params(
        ("walk_id" = Uuid, Path, description = "The active walk.")
    ),
    request_body = UpdateLocationRequest,
    responses(
        (status = 200, description = "Location updated", body = MessageResponse),
        (status = 400, description = "Invalid coordinates", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 404, description = "No active walk with this id for the caller", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "friend-walk"
)]
pub async fn update_location_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(walk_id): Path<Uuid>,
    Json(req): Json<UpdateLocationRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let location = coordinates(req.location_lat, req.location_lng)?;
    state
        .db
        .update_friend_walk_location(walk_id, user.id, location)
        .await
        .map_err(not_found_as("Friend walk not found"))?;

    Ok(Json(MessageResponse::new("Location updated")))
}

/// PUT /api/friend-walk/{walk_id}/extend - Push the end of the walk back
#[utoipa::path(
    put,
    path = "/api/friend-walk/{walk_id}/extend",
    params(
        ("walk_id" = Uuid, Path, description = "The active walk."),
        ExtendQuery
    ),
    responses(
        (status = 200, description = "Walk extended", body = ExtendWalkResponse),
        (status = 400, description = "Minutes out of range, or the walk would pass its limit", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 404, description = "No active walk with this id for the caller", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "friend-walk"
)]
pub async fn extend_walk_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(walk_id): Path<Uuid>,
    Query(query): Query<ExtendQuery>,
) -> Result<Json<ExtendWalkResponse>, AppError> {
    let minutes = positive_minutes("minutes", query.minutes.unwrap_or(DEFAULT_EXTEND_MINUTES))?;
    let walk = state
        .db
        .extend_friend_walk(walk_id, user.id, minutes)
        .await
        .map_err(not_found_as("Friend walk not found"))?;

    info!("Friend walk {} extended by {} minutes", walk.id, minutes);
    Ok(Json(ExtendWalkResponse {
        message: "Walk extended".to_string(),
        new_end_time: walk.end_time,
        duration_minutes: walk.duration_minutes,
    }))
}

/// PUT /api/friend-walk/{walk_id}/complete - Finish the walk
#[utoipa::path(
    put,
    path = "/api/friend-walk/{walk_id}/complete",
    params(
        ("walk_id" = Uuid, Path, description = "The active walk.")
    ),
    responses(
        (status = 200, description = "Friend walk completed", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 404, description = "No active walk with this id for the caller", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "friend-walk"
)]
pub async fn complete_walk_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(walk_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .db
        .transition_friend_walk(walk_id, user.id, FriendWalkStatus::Completed)
        .await
        .map_err(not_found_as("Friend walk not found"))?;

    info!("Friend walk {} completed by user {}", walk_id, user.id);
    Ok(Json(MessageResponse::new("Friend walk completed")))
}
