//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for signup, login and the caller's own profile.

use axum::{extract::State, Extension, Json};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use campus_safety_core::domain::{institutional_email, NewUser, ProfileUpdate, User};
use campus_safety_core::ports::PortError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;
use utoipa::ToSchema;

use crate::web::error::{AppError, ErrorBody};
use crate::web::middleware::CurrentUser;
use crate::web::state::AppState;
use crate::web::validation::{optional, required, required_if_present};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Only the fields present in the request body are changed.
#[derive(Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub profile_photo: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
}

/// The public view of a user. Never includes the password digest.
#[derive(Serialize, ToSchema)]
pub struct UserProfileResponse {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub profile_photo: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfileResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            profile_photo: user.profile_photo.clone(),
            emergency_contact_name: user.emergency_contact_name.clone(),
            emergency_contact_phone: user.emergency_contact_phone.clone(),
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    /// Bearer token for the `Authorization` header.
    pub token: String,
    pub user: UserProfileResponse,
}

//=========================================================================================
// Password Hashing
//=========================================================================================

/// Checked against on logins for unknown emails, so they cost the same Argon2 work
/// as a wrong password. Matches the default Argon2id parameters.
const UNKNOWN_USER_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$8kZgKWqOENyh20vF+GVrxw$r4CVHophugTx9ujsKP4aoUN7N+vX6AmbvlmwyV/Tmww";

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {:?}", e)))
}

fn verify_password(password: &str, hashed_password: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hashed_password)
        .map_err(|e| AppError::Internal(format!("Failed to parse password hash: {:?}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn invalid_credentials() -> AppError {
    AppError::Unauthenticated("Invalid email or password".to_string())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/auth/signup - Create a new account and start a session
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Email outside the institution, already registered, or missing fields", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    // 1. Validate the institutional email and required fields
    let domain = &state.config.institution_domain;
    let email = institutional_email(&req.email, domain)
        .ok_or_else(|| AppError::Validation(format!("Only @{} emails are allowed", domain)))?;
    let full_name = required("full_name", &req.full_name)?;
    let phone = required("phone", &req.phone)?;
    if req.password.trim().is_empty() {
        return Err(AppError::Validation("password is required".to_string()));
    }

    // 2. Hash the password and create the user
    let new_user = NewUser {
        id: Uuid::new_v4(),
        full_name,
        email,
        phone,
        hashed_password: hash_password(&req.password)?,
        created_at: Utc::now(),
    };
    let user = state.db.create_user(new_user).await.map_err(|e| match e {
        PortError::Conflict(_) => AppError::Conflict("Email already registered".to_string()),
        other => {
            error!("Failed to create user: {:?}", other);
            AppError::from(other)
        }
    })?;

    // 3. Signup implies an authenticated session
    let token = state
        .tokens
        .issue(user.id)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    info!("User {} signed up", user.id);
    Ok(Json(AuthResponse {
        token,
        user: UserProfileResponse::from(&user),
    }))
}

/// POST /api/auth/login - Login with an existing account
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    // 1. Get user by email. Unknown emails and wrong passwords share one error.
    let email = req.email.trim().to_lowercase();
    let user_creds = match state.db.get_user_by_email(&email).await {
        Ok(creds) => creds,
        Err(PortError::NotFound(_)) => {
            let _ = verify_password(&req.password, UNKNOWN_USER_HASH);
            warn!("Login attempt for unknown email");
            return Err(invalid_credentials());
        }
        Err(other) => return Err(AppError::from(other)),
    };

    // 2. Verify password
    if !verify_password(&req.password, &user_creds.hashed_password)? {
        warn!("Failed login for user {}", user_creds.user_id);
        return Err(invalid_credentials());
    }

    // 3. Issue a fresh token
    let user = state.db.get_user_by_id(user_creds.user_id).await?;
    let token = state
        .tokens
        .issue(user.id)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    info!("User {} logged in", user.id);
    Ok(Json(AuthResponse {
        token,
        user: UserProfileResponse::from(&user),
    }))
}

/// GET /api/auth/me - The authenticated user's profile
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current profile", body = UserProfileResponse),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn me_handler(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserProfileResponse> {
    Json(UserProfileResponse::from(&user))
}

/// PUT /api/auth/profile - Update selected profile fields
#[utoipa::path(
    put,
    path = "/api/auth/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserProfileResponse),
        (status = 400, description = "A provided field is blank", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn update_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfileResponse>, AppError> {
    let update = ProfileUpdate {
        full_name: required_if_present("full_name", req.full_name.as_deref())?,
        phone: required_if_present("phone", req.phone.as_deref())?,
        profile_photo: optional(req.profile_photo),
        emergency_contact_name: optional(req.emergency_contact_name),
        emergency_contact_phone: optional(req.emergency_contact_phone),
    };

    if update.is_empty() {
        return Ok(Json(UserProfileResponse::from(&user)));
    }

    let updated = state.db.update_user_profile(user.id, &update).await?;
    info!("User {} updated their profile", user.id);
    Ok(Json(UserProfileResponse::from(&updated)))
}
