//! crates/campus_safety_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific storage implementations.

use async_trait::async_trait;
use uuid::Uuid;
use crate::domain::{
    CampusAlert, CampusLocation, EscortRequest, EscortStatus, FriendWalk, FriendWalkStatus,
    GeoPoint, Incident, LocationType, NewUser, OfficerAssignment, ProfileUpdate, SosAlert,
    SosStatus, TrustedContact, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from the storage backend.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A uniqueness rule rejected the write (duplicate email, second active record).
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The document store behind every handler.
///
/// Operations that take both a record id and a `user_id` only match records
/// owned by that user; a record owned by someone else is reported as
/// `PortError::NotFound`, exactly like a missing one. Status transitions only
/// apply when the stored status may move to the requested one.
#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Users ---
    /// Fails with `Conflict` when the email is already registered.
    async fn create_user(&self, user: NewUser) -> PortResult<User>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn update_user_profile(&self, user_id: Uuid, update: &ProfileUpdate) -> PortResult<User>;

    // --- Trusted Contacts ---
    async fn add_trusted_contact(
        &self,
        user_id: Uuid,
        contact: TrustedContact,
    ) -> PortResult<TrustedContact>;

    async fn remove_trusted_contact(&self, user_id: Uuid, contact_id: Uuid) -> PortResult<()>;

    // --- SOS Alerts ---
    async fn create_sos_alert(&self, alert: SosAlert) -> PortResult<SosAlert>;

    async fn find_active_sos_alert(&self, user_id: Uuid) -> PortResult<Option<SosAlert>>;

    async fn transition_sos_alert(
        &self,
        alert_id: Uuid,
        user_id: Uuid,
        next: SosStatus,
    ) -> PortResult<SosAlert>;

    // --- Incidents ---
    async fn create_incident(&self, incident: Incident) -> PortResult<Incident>;

    async fn get_incident_by_id(&self, incident_id: Uuid) -> PortResult<Incident>;

    /// Newest first.
    async fn list_incidents_by_user(&self, user_id: Uuid, limit: usize) -> PortResult<Vec<Incident>>;

    // --- Escort Requests ---
    /// Fails with `Conflict` when the user already holds a non-terminal request.
    async fn create_escort_request(&self, request: EscortRequest) -> PortResult<EscortRequest>;

    async fn find_active_escort_request(&self, user_id: Uuid) -> PortResult<Option<EscortRequest>>;

    async fn transition_escort_request(
        &self,
        request_id: Uuid,
        user_id: Uuid,
        next: EscortStatus,
    ) -> PortResult<EscortRequest>;

    /// Moves a pending request to `assigned`. Not scoped to an owner.
    async fn assign_escort_officer(
        &self,
        request_id: Uuid,
        assignment: &OfficerAssignment,
    ) -> PortResult<EscortRequest>;

    // --- Friend Walks ---
    /// Fails with `Conflict` when the user already has an active walk.
    async fn create_friend_walk(&self, walk: FriendWalk) -> PortResult<FriendWalk>;

    async fn find_active_friend_walk(&self, user_id: Uuid) -> PortResult<Option<FriendWalk>>;

    async fn update_friend_walk_location(
        &self,
        walk_id: Uuid,
        user_id: Uuid,
        location: GeoPoint,
    ) -> PortResult<FriendWalk>;

    /// Adds `minutes` to both the duration and the end time of an active walk
    /// in a single step.
    async fn extend_friend_walk(
        &self,
        walk_id: Uuid,
        user_id: Uuid,
        minutes: i32,
    ) -> PortResult<FriendWalk>;

    async fn transition_friend_walk(
        &self,
        walk_id: Uuid,
        user_id: Uuid,
        next: FriendWalkStatus,
    ) -> PortResult<FriendWalk>;

    // --- Campus Reference Data ---
    /// Newest first.
    async fn list_campus_alerts(&self, limit: usize) -> PortResult<Vec<CampusAlert>>;

    async fn get_campus_alert_by_id(&self, alert_id: Uuid) -> PortResult<CampusAlert>;

    async fn list_campus_locations(
        &self,
        location_type: Option<LocationType>,
        limit: usize,
    ) -> PortResult<Vec<CampusLocation>>;

    /// Replaces both reference collections at once.
    async fn replace_campus_data(
        &self,
        alerts: Vec<CampusAlert>,
        locations: Vec<CampusLocation>,
    ) -> PortResult<()>;
}
