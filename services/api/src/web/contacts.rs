//! services/api/src/web/contacts.rs
//!
//! Trusted contact endpoints. Contacts live inside the owning user's record,
//! so every operation is implicitly scoped to the caller.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use campus_safety_core::domain::TrustedContact;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::error::{not_found_as, AppError, ErrorBody};
use crate::web::middleware::CurrentUser;
use crate::web::rest::MessageResponse;
use crate::web::state::AppState;
use crate::web::validation::{optional, required};

#[derive(Deserialize, ToSchema)]
pub struct CreateContactRequest {
    pub name: String,
    pub phone: String,
    pub relationship: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ContactResponse {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub relationship: Option<String>,
}

impl From<TrustedContact> for ContactResponse {
    fn from(contact: TrustedContact) -> Self {
        Self {
            id: contact.id,
            name: contact.name,
            phone: contact.phone,
            relationship: contact.relationship,
        }
    }
}

/// GET /api/contacts - The caller's trusted contacts in insertion order
#[utoipa::path(
    get,
    path = "/api/contacts",
    responses(
        (status = 200, description = "Trusted contacts", body = [ContactResponse]),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "contacts"
)]
pub async fn list_contacts_handler(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<Vec<ContactResponse>> {
    Json(user.trusted_contacts.into_iter().map(ContactResponse::from).collect())
}

/// POST /api/contacts - Append a trusted contact
#[utoipa::path(
    post,
    path = "/api/contacts",
    request_body = CreateContactRequest,
    responses(
        (status = 200, description = "Contact added", body = ContactResponse),
        (status = 400, description = "Name or phone missing", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "contacts"
)]
pub async fn add_contact_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<CreateContactRequest>,
) -> Result<Json<ContactResponse>, AppError> {
    let contact = TrustedContact {
        id: Uuid::new_v4(),
        name: required("name", &req.name)?,
        phone: required("phone", &req.phone)?,
        relationship: optional(req.relationship),
    };

    let contact = state
        .db
        .add_trusted_contact(user.id, contact)
        .await
        .map_err(not_found_as("User not found"))?;

    info!("User {} added trusted contact {}", user.id, contact.id);
    Ok(Json(ContactResponse::from(contact)))
}

/// DELETE /api/contacts/{contact_id} - Remove one of the caller's contacts
#[utoipa::path(
    delete,
    path = "/api/contacts/{contact_id}",
    params(
        ("contact_id" = Uuid, Path, description = "The contact to remove.")
    ),
    responses(
        (status = 200, description = "Contact deleted", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 404, description = "No such contact for this user", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "contacts"
)]
pub async fn delete_contact_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(contact_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .db
        .remove_trusted_contact(user.id, contact_id)
        .await
        .map_err(not_found_as("Contact not found"))?;

    info!("User {} removed trusted contact {}", user.id, contact_id);
    Ok(Json(MessageResponse::new("Contact deleted")))
}
