//! services/api/src/web/router.rs
//!
//! Assembles the HTTP application: public, authenticated and administrative
//! route groups, CORS, request tracing and the Swagger UI.

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderName, Method,
    },
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::web::middleware::{require_admin, require_auth, ADMIN_TOKEN_HEADER};
use crate::web::rest::{health_handler, root_handler, ApiDoc};
use crate::web::state::AppState;
use crate::web::{auth, campus, contacts, escorts, friend_walk, incidents, sos};

/// Incident photos travel inline, so bodies may be larger than axum's default.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Builds the complete application router around the shared state.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/api", get(root_handler))
        .route("/api/", get(root_handler))
        .route("/api/health", get(health_handler))
        .route("/api/auth/signup", post(auth::signup_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/alerts", get(campus::list_alerts_handler))
        .route("/api/alerts/{alert_id}", get(campus::get_alert_handler))
        .route("/api/locations", get(campus::list_locations_handler));

    // Protected routes (bearer token required)
    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth::me_handler))
        .route("/api/auth/profile", put(auth::update_profile_handler))
        .route(
            "/api/contacts",
            get(contacts::list_contacts_handler).post(contacts::add_contact_handler),
        )
        .route("/api/contacts/{contact_id}", delete(contacts::delete_contact_handler))
        .route("/api/sos", post(sos::create_sos_handler))
        .route("/api/sos/active", get(sos::active_sos_handler))
        .route("/api/sos/{sos_id}/cancel", put(sos::cancel_sos_handler))
        .route("/api/incidents", post(incidents::create_incident_handler))
        .route("/api/incidents/my", get(incidents::my_incidents_handler))
        .route("/api/incidents/{incident_id}", get(incidents::get_incident_handler))
        .route("/api/escorts", post(escorts::create_escort_handler))
        .route("/api/escorts/active", get(escorts::active_escort_handler))
        .route("/api/escorts/{request_id}/cancel", put(escorts::cancel_escort_handler))
        .route(
            "/api/escorts/{request_id}/complete",
            put(escorts::complete_escort_handler),
        )
        .route("/api/friend-walk", post(friend_walk::start_walk_handler))
        .route("/api/friend-walk/active", get(friend_walk::active_walk_handler))
        .route(
            "/api/friend-walk/{walk_id}/update",
            put(friend_walk::update_location_handler),
        )
        .route(
            "/api/friend-walk/{walk_id}/extend",
            put(friend_walk::extend_walk_handler),
        )
        .route(
            "/api/friend-walk/{walk_id}/complete",
            put(friend_walk::complete_walk_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Administrative routes (admin token required when configured)
    let admin_routes = Router::new()
        .route("/api/escorts/{request_id}/assign", put(escorts::assign_escort_handler))
        .route("/api/seed", post(campus::seed_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_admin,
        ));

    let cors = cors_layer(&app_state);

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(app_state: &AppState) -> CorsLayer {
    let origin = match &app_state.config.cors_allow_origin {
        Some(origin) => AllowOrigin::exact(origin.clone()),
        None => AllowOrigin::any(),
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            ACCEPT,
            HeaderName::from_static(ADMIN_TOKEN_HEADER),
        ])
}
