//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! The "one outstanding escort request" and "one active friend walk" rules are
//! partial unique indexes in the schema, so a racing second insert fails inside
//! PostgreSQL and comes back as `PortError::Conflict`.

use async_trait::async_trait;
use campus_safety_core::domain::{
    AlertLevel, CampusAlert, CampusLocation, EscortRequest, EscortStatus, FriendWalk,
    FriendWalkStatus, GeoPoint, Incident, LocationType, NewUser, OfficerAssignment,
    ProfileUpdate, SosAlert, SosStatus, StatusMachine, TrustedContact, UnknownVariant, User,
    UserCredentials, WalkTooLong, MAX_WALK_MINUTES,
};
use campus_safety_core::ports::{DatabaseService, PortError, PortResult};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    /// Closes every pooled connection. Called once on shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

//=========================================================================================
// Error Mapping Helpers
//=========================================================================================

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Maps a unique-index violation to `Conflict` and anything else to `Unexpected`.
fn conflict_or_unexpected(e: sqlx::Error, message: &str) -> PortError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            PortError::Conflict(message.to_string())
        }
        _ => unexpected(e),
    }
}

fn parse_stored<T>(raw: &str) -> PortResult<T>
where
    T: FromStr<Err = UnknownVariant>,
{
    raw.parse::<T>()
        .map_err(|e| PortError::Unexpected(format!("corrupt row: {}", e)))
}

fn status_list<S: StatusMachine + ToString>(statuses: Vec<S>) -> Vec<String> {
    statuses.into_iter().map(|s| s.to_string()).collect()
}

fn row_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

macro_rules! user_columns {
    () => {
        "id, full_name, email, phone, profile_photo, emergency_contact_name, emergency_contact_phone, created_at"
    };
}

macro_rules! sos_columns {
    () => {
        "id, user_id, user_name, user_phone, location_lat, location_lng, alert_type, status, created_at"
    };
}

macro_rules! incident_columns {
    () => {
        "id, user_id, incident_type, location_lat, location_lng, location_name, description, photos, \
         is_anonymous, wants_contact, contact_phone, status, created_at"
    };
}

macro_rules! escort_columns {
    () => {
        "id, user_id, pickup_lat, pickup_lng, pickup_name, destination_lat, destination_lng, \
         destination_name, notes, status, officer_name, officer_photo, estimated_wait, created_at"
    };
}

macro_rules! walk_columns {
    () => {
        "id, user_id, contact_ids, start_time, duration_minutes, end_time, current_lat, current_lng, status"
    };
}

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    full_name: String,
    email: String,
    phone: String,
    profile_photo: Option<String>,
    emergency_contact_name: Option<String>,
    emergency_contact_phone: Option<String>,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self, trusted_contacts: Vec<TrustedContact>) -> User {
        User {
            id: self.id,
            full_name: self.full_name,
            email: self.email,
            phone: self.phone,
            profile_photo: self.profile_photo,
            emergency_contact_name: self.emergency_contact_name,
            emergency_contact_phone: self.emergency_contact_phone,
            trusted_contacts,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: Uuid,
    email: String,
    password_hash: String,
}

#[derive(FromRow)]
struct ContactRecord {
    id: Uuid,
    name: String,
    phone: String,
    relationship: Option<String>,
}
impl ContactRecord {
    fn to_domain(self) -> TrustedContact {
        TrustedContact {
            id: self.id,
            name: self.name,
            phone: self.phone,
            relationship: self.relationship,
        }
    }
}

#[derive(FromRow)]
struct SosAlertRecord {
    id: Uuid,
    user_id: Uuid,
    user_name: String,
    user_phone: String,
    location_lat: f64,
    location_lng: f64,
    alert_type: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}
impl SosAlertRecord {
    fn to_domain(self) -> PortResult<SosAlert> {
        Ok(SosAlert {
            id: self.id,
            user_id: self.user_id,
            user_name: self.user_name,
            user_phone: self.user_phone,
            location: GeoPoint { lat: self.location_lat, lng: self.location_lng },
            alert_type: self.alert_type,
            status: parse_stored(&self.status)?,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct IncidentRecord {
    id: Uuid,
    user_id: Option<Uuid>,
    incident_type: String,
    location_lat: f64,
    location_lng: f64,
    location_name: Option<String>,
    description: String,
    photos: Vec<String>,
    is_anonymous: bool,
    wants_contact: bool,
    contact_phone: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}
impl IncidentRecord {
    fn to_domain(self) -> PortResult<Incident> {
        Ok(Incident {
            id: self.id,
            user_id: self.user_id,
            incident_type: self.incident_type,
            location: GeoPoint { lat: self.location_lat, lng: self.location_lng },
            location_name: self.location_name,
            description: self.description,
            photos: self.photos,
            is_anonymous: self.is_anonymous,
            wants_contact: self.wants_contact,
            contact_phone: self.contact_phone,
            status: parse_stored(&self.status)?,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct EscortRecord {
    id: Uuid,
    user_id: Uuid,
    pickup_lat: f64,
    pickup_lng: f64,
    pickup_name: Option<String>,
    destination_lat: f64,
    destination_lng: f64,
    destination_name: Option<String>,
    notes: Option<String>,
    status: String,
    officer_name: Option<String>,
    officer_photo: Option<String>,
    estimated_wait: i32,
    created_at: DateTime<Utc>,
}
impl EscortRecord {
    fn to_domain(self) -> PortResult<EscortRequest> {
        Ok(EscortRequest {
            id: self.id,
            user_id: self.user_id,
            pickup: GeoPoint { lat: self.pickup_lat, lng: self.pickup_lng },
            pickup_name: self.pickup_name,
            destination: GeoPoint { lat: self.destination_lat, lng: self.destination_lng },
            destination_name: self.destination_name,
            notes: self.notes,
            status: parse_stored(&self.status)?,
            officer_name: self.officer_name,
            officer_photo: self.officer_photo,
            estimated_wait_minutes: self.estimated_wait,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct FriendWalkRecord {
    id: Uuid,
    user_id: Uuid,
    contact_ids: Vec<Uuid>,
    start_time: DateTime<Utc>,
    duration_minutes: i32,
    end_time: DateTime<Utc>,
    current_lat: f64,
    current_lng: f64,
    status: String,
}
impl FriendWalkRecord {
    fn to_domain(self) -> PortResult<FriendWalk> {
        Ok(FriendWalk {
            id: self.id,
            user_id: self.user_id,
            contact_ids: self.contact_ids,
            start_time: self.start_time,
            duration_minutes: self.duration_minutes,
            end_time: self.end_time,
            current_location: GeoPoint { lat: self.current_lat, lng: self.current_lng },
            status: parse_stored(&self.status)?,
        })
    }
}

#[derive(FromRow)]
struct CampusAlertRecord {
    id: Uuid,
    alert_type: String,
    title: String,
    message: String,
    created_at: DateTime<Utc>,
    is_read: bool,
}
impl CampusAlertRecord {
    fn to_domain(self) -> PortResult<CampusAlert> {
        Ok(CampusAlert {
            id: self.id,
            level: parse_stored::<AlertLevel>(&self.alert_type)?,
            title: self.title,
            message: self.message,
            created_at: self.created_at,
            is_read: self.is_read,
        })
    }
}

#[derive(FromRow)]
struct CampusLocationRecord {
    id: Uuid,
    name: String,
    description: Option<String>,
    location_type: String,
    lat: f64,
    lng: f64,
}
impl CampusLocationRecord {
    fn to_domain(self) -> PortResult<CampusLocation> {
        Ok(CampusLocation {
            id: self.id,
            name: self.name,
            description: self.description,
            location_type: parse_stored::<LocationType>(&self.location_type)?,
            position: GeoPoint { lat: self.lat, lng: self.lng },
        })
    }
}

impl DbAdapter {
    async fn contacts_for(&self, user_id: Uuid) -> PortResult<Vec<TrustedContact>> {
        let records = sqlx::query_as::<_, ContactRecord>(
            "SELECT id, name, phone, relationship FROM trusted_contacts WHERE user_id = $1 ORDER BY position ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user(&self, user: NewUser) -> PortResult<User> {
        sqlx::query(
            "INSERT INTO users (id, full_name, email, phone, password_hash, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(user.id)
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.hashed_password)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or_unexpected(e, "Email already registered"))?;

        Ok(user.to_user())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;

        let contacts = self.contacts_for(user_id).await?;
        Ok(record.to_domain(contacts))
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, email, password_hash FROM users WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound("User not found".to_string()))?;

        Ok(UserCredentials {
            user_id: record.id,
            email: record.email,
            hashed_password: record.password_hash,
        })
    }

    async fn update_user_profile(&self, user_id: Uuid, update: &ProfileUpdate) -> PortResult<User> {
        let updated = sqlx::query(
            "UPDATE users SET \
                full_name = COALESCE($2, full_name), \
                phone = COALESCE($3, phone), \
                profile_photo = COALESCE($4, profile_photo), \
                emergency_contact_name = COALESCE($5, emergency_contact_name), \
                emergency_contact_phone = COALESCE($6, emergency_contact_phone) \
             WHERE id = $1",
        )
        .bind(user_id)
        .bind(&update.full_name)
        .bind(&update.phone)
        .bind(&update.profile_photo)
        .bind(&update.emergency_contact_name)
        .bind(&update.emergency_contact_phone)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        if updated.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("User {} not found", user_id)));
        }
        self.get_user_by_id(user_id).await
    }

    async fn add_trusted_contact(
        &self,
        user_id: Uuid,
        contact: TrustedContact,
    ) -> PortResult<TrustedContact> {
        sqlx::query(
            "INSERT INTO trusted_contacts (id, user_id, name, phone, relationship) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(contact.id)
        .bind(user_id)
        .bind(&contact.name)
        .bind(&contact.phone)
        .bind(&contact.relationship)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                PortError::NotFound(format!("User {} not found", user_id))
            }
            _ => unexpected(e),
        })?;

        Ok(contact)
    }

    async fn remove_trusted_contact(&self, user_id: Uuid, contact_id: Uuid) -> PortResult<()> {
        let deleted = sqlx::query("DELETE FROM trusted_contacts WHERE id = $1 AND user_id = $2")
            .bind(contact_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        if deleted.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Contact {} not found", contact_id)));
        }
        Ok(())
    }

    async fn create_sos_alert(&self, alert: SosAlert) -> PortResult<SosAlert> {
        sqlx::query(concat!(
            "INSERT INTO sos_alerts (",
            sos_columns!(),
            ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        ))
        .bind(alert.id)
        .bind(alert.user_id)
        .bind(&alert.user_name)
        .bind(&alert.user_phone)
        .bind(alert.location.lat)
        .bind(alert.location.lng)
        .bind(&alert.alert_type)
        .bind(alert.status.as_str())
        .bind(alert.created_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(alert)
    }

    async fn find_active_sos_alert(&self, user_id: Uuid) -> PortResult<Option<SosAlert>> {
        sqlx::query_as::<_, SosAlertRecord>(concat!(
            "SELECT ",
            sos_columns!(),
            " FROM sos_alerts WHERE user_id = $1 AND status = $2 ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(user_id)
        .bind(SosStatus::Active.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .map(SosAlertRecord::to_domain)
        .transpose()
    }

    async fn transition_sos_alert(
        &self,
        alert_id: Uuid,
        user_id: Uuid,
        next: SosStatus,
    ) -> PortResult<SosAlert> {
        sqlx::query_as::<_, SosAlertRecord>(concat!(
            "UPDATE sos_alerts SET status = $1 WHERE id = $2 AND user_id = $3 AND status = ANY($4) RETURNING ",
            sos_columns!()
        ))
        .bind(next.as_str())
        .bind(alert_id)
        .bind(user_id)
        .bind(status_list(SosStatus::sources_of(next)))
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("SOS alert {} not found", alert_id)))?
        .to_domain()
    }

    async fn create_incident(&self, incident: Incident) -> PortResult<Incident> {
        sqlx::query(concat!(
            "INSERT INTO incidents (",
            incident_columns!(),
            ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"
        ))
        .bind(incident.id)
        .bind(incident.user_id)
        .bind(&incident.incident_type)
        .bind(incident.location.lat)
        .bind(incident.location.lng)
        .bind(&incident.location_name)
        .bind(&incident.description)
        .bind(&incident.photos)
        .bind(incident.is_anonymous)
        .bind(incident.wants_contact)
        .bind(&incident.contact_phone)
        .bind(incident.status.as_str())
        .bind(incident.created_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(incident)
    }

    async fn get_incident_by_id(&self, incident_id: Uuid) -> PortResult<Incident> {
        sqlx::query_as::<_, IncidentRecord>(concat!(
            "SELECT ",
            incident_columns!(),
            " FROM incidents WHERE id = $1"
        ))
        .bind(incident_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Incident {} not found", incident_id)))?
        .to_domain()
    }

    async fn list_incidents_by_user(&self, user_id: Uuid, limit: usize) -> PortResult<Vec<Incident>> {
        let records = sqlx::query_as::<_, IncidentRecord>(concat!(
            "SELECT ",
            incident_columns!(),
            " FROM incidents WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2"
        ))
        .bind(user_id)
        .bind(row_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(IncidentRecord::to_domain).collect()
    }

    async fn create_escort_request(&self, request: EscortRequest) -> PortResult<EscortRequest> {
        sqlx::query(concat!(
            "INSERT INTO escort_requests (",
            escort_columns!(),
            ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)"
        ))
        .bind(request.id)
        .bind(request.user_id)
        .bind(request.pickup.lat)
        .bind(request.pickup.lng)
        .bind(&request.pickup_name)
        .bind(request.destination.lat)
        .bind(request.destination.lng)
        .bind(&request.destination_name)
        .bind(&request.notes)
        .bind(request.status.as_str())
        .bind(&request.officer_name)
        .bind(&request.officer_photo)
        .bind(request.estimated_wait_minutes)
        .bind(request.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or_unexpected(e, "You already have an active escort request"))?;

        Ok(request)
    }

    async fn find_active_escort_request(&self, user_id: Uuid) -> PortResult<Option<EscortRequest>> {
        let outstanding: Vec<String> = EscortStatus::ALL
            .iter()
            .filter(|s| !s.is_terminal())
            .map(|s| s.to_string())
            .collect();

        sqlx::query_as::<_, EscortRecord>(concat!(
            "SELECT ",
            escort_columns!(),
            " FROM escort_requests WHERE user_id = $1 AND status = ANY($2) ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(user_id)
        .bind(outstanding)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .map(EscortRecord::to_domain)
        .transpose()
    }

    async fn transition_escort_request(
        &self,
        request_id: Uuid,
        user_id: Uuid,
        next: EscortStatus,
    ) -> PortResult<EscortRequest> {
        sqlx::query_as::<_, EscortRecord>(concat!(
            "UPDATE escort_requests SET status = $1 WHERE id = $2 AND user_id = $3 AND status = ANY($4) RETURNING ",
            escort_columns!()
        ))
        .bind(next.as_str())
        .bind(request_id)
        .bind(user_id)
        .bind(status_list(EscortStatus::sources_of(next)))
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Escort request {} not found", request_id)))?
        .to_domain()
    }

    async fn assign_escort_officer(
        &self,
        request_id: Uuid,
        assignment: &OfficerAssignment,
    ) -> PortResult<EscortRequest> {
        sqlx::query_as::<_, EscortRecord>(concat!(
            "UPDATE escort_requests SET status = $1, officer_name = $2, officer_photo = $3, estimated_wait = $4 \
             WHERE id = $5 AND status = ANY($6) RETURNING ",
            escort_columns!()
        ))
        .bind(EscortStatus::Assigned.as_str())
        .bind(&assignment.officer_name)
        .bind(&assignment.officer_photo)
        .bind(assignment.estimated_wait_minutes)
        .bind(request_id)
        .bind(status_list(EscortStatus::sources_of(EscortStatus::Assigned)))
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Escort request {} not found", request_id)))?
        .to_domain()
    }

    async fn create_friend_walk(&self, walk: FriendWalk) -> PortResult<FriendWalk> {
        sqlx::query(concat!(
            "INSERT INTO friend_walks (",
            walk_columns!(),
            ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        ))
        .bind(walk.id)
        .bind(walk.user_id)
        .bind(&walk.contact_ids)
        .bind(walk.start_time)
        .bind(walk.duration_minutes)
        .bind(walk.end_time)
        .bind(walk.current_location.lat)
        .bind(walk.current_location.lng)
        .bind(walk.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or_unexpected(e, "You already have an active Friend Walk"))?;

        Ok(walk)
    }

    async fn find_active_friend_walk(&self, user_id: Uuid) -> PortResult<Option<FriendWalk>> {
        sqlx::query_as::<_, FriendWalkRecord>(concat!(
            "SELECT ",
            walk_columns!(),
            " FROM friend_walks WHERE user_id = $1 AND status = $2 LIMIT 1"
        ))
        .bind(user_id)
        .bind(FriendWalkStatus::Active.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .map(FriendWalkRecord::to_domain)
        .transpose()
    }

    async fn update_friend_walk_location(
        &self,
        walk_id: Uuid,
        user_id: Uuid,
        location: GeoPoint,
    ) -> PortResult<FriendWalk> {
        sqlx::query_as::<_, FriendWalkRecord>(concat!(
            "UPDATE friend_walks SET current_lat = $1, current_lng = $2 \
             WHERE id = $3 AND user_id = $4 AND status = $5 RETURNING ",
            walk_columns!()
        ))
        .bind(location.lat)
        .bind(location.lng)
        .bind(walk_id)
        .bind(user_id)
        .bind(FriendWalkStatus::Active.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Friend walk {} not found", walk_id)))?
        .to_domain()
    }

    async fn extend_friend_walk(
        &self,
        walk_id: Uuid,
        user_id: Uuid,
        minutes: i32,
    ) -> PortResult<FriendWalk> {
        let sources = status_list(FriendWalkStatus::sources_of(FriendWalkStatus::Active));
        // One statement, so concurrent extends add up instead of overwriting each other.
        let extended = sqlx::query_as::<_, FriendWalkRecord>(concat!(
            "UPDATE friend_walks SET duration_minutes = duration_minutes + $1, \
             end_time = end_time + make_interval(mins => $1) \
             WHERE id = $2 AND user_id = $3 AND status = ANY($4) \
             AND duration_minutes::bigint + $1 <= $5 RETURNING ",
            walk_columns!()
        ))
        .bind(minutes)
        .bind(walk_id)
        .bind(user_id)
        .bind(&sources)
        .bind(MAX_WALK_MINUTES)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        if let Some(record) = extended {
            return record.to_domain();
        }

        // Nothing matched: either the walk is not the caller's active one, or it hit the limit.
        let exists: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM friend_walks WHERE id = $1 AND user_id = $2 AND status = ANY($3)",
        )
        .bind(walk_id)
        .bind(user_id)
        .bind(&sources)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        match exists {
            Some(_) => Err(PortError::Conflict(WalkTooLong.to_string())),
            None => Err(PortError::NotFound(format!("Friend walk {} not found", walk_id))),
        }
    }

    async fn transition_friend_walk(
        &self,
        walk_id: Uuid,
        user_id: Uuid,
        next: FriendWalkStatus,
    ) -> PortResult<FriendWalk> {
        sqlx::query_as::<_, FriendWalkRecord>(concat!(
            "UPDATE friend_walks SET status = $1 WHERE id = $2 AND user_id = $3 AND status = ANY($4) RETURNING ",
            walk_columns!()
        ))
        .bind(next.as_str())
        .bind(walk_id)
        .bind(user_id)
        .bind(status_list(FriendWalkStatus::sources_of(next)))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_or_unexpected(e, "You already have an active Friend Walk"))?
        .ok_or_else(|| PortError::NotFound(format!("Friend walk {} not found", walk_id)))?
        .to_domain()
    }

    async fn list_campus_alerts(&self, limit: usize) -> PortResult<Vec<CampusAlert>> {
        let records = sqlx::query_as::<_, CampusAlertRecord>(
            "SELECT id, alert_type, title, message, created_at, is_read FROM campus_alerts ORDER BY created_at DESC LIMIT $1",
        )
        .bind(row_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(CampusAlertRecord::to_domain).collect()
    }

    async fn get_campus_alert_by_id(&self, alert_id: Uuid) -> PortResult<CampusAlert> {
        sqlx::query_as::<_, CampusAlertRecord>(
            "SELECT id, alert_type, title, message, created_at, is_read FROM campus_alerts WHERE id = $1",
        )
        .bind(alert_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Alert {} not found", alert_id)))?
        .to_domain()
    }

    async fn list_campus_locations(
        &self,
        location_type: Option<LocationType>,
        limit: usize,
    ) -> PortResult<Vec<CampusLocation>> {
        let records = sqlx::query_as::<_, CampusLocationRecord>(
            "SELECT id, name, description, location_type, lat, lng FROM campus_locations \
             WHERE ($1::TEXT IS NULL OR location_type = $1) ORDER BY name ASC LIMIT $2",
        )
        .bind(location_type.map(LocationType::as_str))
        .bind(row_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(CampusLocationRecord::to_domain).collect()
    }

    async fn replace_campus_data(
        &self,
        alerts: Vec<CampusAlert>,
        locations: Vec<CampusLocation>,
    ) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        sqlx::query("DELETE FROM campus_alerts")
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        for alert in &alerts {
            sqlx::query(
                "INSERT INTO campus_alerts (id, alert_type, title, message, created_at, is_read) VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(alert.id)
            .bind(alert.level.as_str())
            .bind(&alert.title)
            .bind(&alert.message)
            .bind(alert.created_at)
            .bind(alert.is_read)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        }

        sqlx::query("DELETE FROM campus_locations")
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        for location in &locations {
            sqlx::query(
                "INSERT INTO campus_locations (id, name, description, location_type, lat, lng) VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(location.id)
            .bind(&location.name)
            .bind(&location.description)
            .bind(location.location_type.as_str())
            .bind(location.position.lat)
            .bind(location.position.lng)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        }

        tx.commit().await.map_err(unexpected)
    }
}
