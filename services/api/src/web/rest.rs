//! services/api/src/web/rest.rs
//!
//! Contains the service-level REST handlers and the master definition for the
//! OpenAPI specification.

use axum::response::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi, ToSchema,
};

use crate::web::error::ErrorBody;
use crate::web::middleware::ADMIN_TOKEN_HEADER;
use crate::web::{auth, campus, contacts, escorts, friend_walk, incidents, sos};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        root_handler,
        health_handler,
        auth::signup_handler,
        auth::login_handler,
        auth::me_handler,
        auth::update_profile_handler,
        contacts::list_contacts_handler,
        contacts::add_contact_handler,
        contacts::delete_contact_handler,
        sos::create_sos_handler,
        sos::active_sos_handler,
        sos::cancel_sos_handler,
        incidents::create_incident_handler,
        incidents::my_incidents_handler,
        incidents::get_incident_handler,
        escorts::create_escort_handler,
        escorts::active_escort_handler,
        escorts::cancel_escort_handler,
        escorts::complete_escort_handler,
        escorts::assign_escort_handler,
        friend_walk::start_walk_handler,
        friend_walk::active_walk_handler,
        friend_walk::update_location_handler,
        friend_walk::extend_walk_handler,
        friend_walk::complete_walk_handler,
        campus::list_alerts_handler,
        campus::get_alert_handler,
        campus::list_locations_handler,
        campus::seed_handler,
    ),
    components(
        schemas(
            ErrorBody,
            MessageResponse,
            ServiceStatus,
            HealthResponse,
            auth::SignupRequest,
            auth::LoginRequest,
            auth::UpdateProfileRequest,
            auth::UserProfileResponse,
            auth::AuthResponse,
            contacts::CreateContactRequest,
            contacts::ContactResponse,
            sos::CreateSosRequest,
            sos::SosAlertResponse,
            incidents::CreateIncidentRequest,
            incidents::IncidentResponse,
            escorts::CreateEscortRequest,
            escorts::EscortResponse,
            friend_walk::StartWalkRequest,
            friend_walk::UpdateLocationRequest,
            friend_walk::FriendWalkResponse,
            friend_walk::ExtendWalkResponse,
            campus::CampusAlertResponse,
            campus::CampusLocationResponse,
            campus::SeedResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "service", description = "Liveness and service banner."),
        (name = "auth", description = "Signup, login and the caller's profile."),
        (name = "contacts", description = "Trusted contacts."),
        (name = "sos", description = "SOS alerts."),
        (name = "incidents", description = "Incident reports."),
        (name = "escorts", description = "Security escort requests."),
        (name = "friend-walk", description = "Timed walks shared with trusted contacts."),
        (name = "campus", description = "Campus alerts and safety locations."),
        (name = "admin", description = "Administrative operations guarded by the admin token.")
    )
)]
pub struct ApiDoc;

/// Registers the bearer and admin-token security schemes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "admin_token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(ADMIN_TOKEN_HEADER))),
            );
        }
    }
}

//=========================================================================================
// API Response Structs
//=========================================================================================

/// A bare confirmation message.
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ServiceStatus {
    pub message: String,
    pub status: String,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Service banner.
#[utoipa::path(
    get,
    path = "/api/",
    responses(
        (status = 200, description = "Service is up", body = ServiceStatus)
    ),
    tag = "service"
)]
pub async fn root_handler() -> Json<ServiceStatus> {
    Json(ServiceStatus {
        message: "Campus Safety API".to_string(),
        status: "healthy".to_string(),
    })
}

/// Liveness check.
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "service"
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
    })
}
