//! crates/campus_safety_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Enumerated values
//=========================================================================================

/// Returned when a stored or submitted string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a closed set of lowercase string values with `Display`/`FromStr`.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownVariant {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

string_enum!(
    /// Lifecycle of an SOS alert.
    SosStatus {
        Active => "active",
        Cancelled => "cancelled",
    }
);

string_enum!(
    /// Lifecycle of an escort request.
    EscortStatus {
        Pending => "pending",
        Assigned => "assigned",
        Cancelled => "cancelled",
        Completed => "completed",
    }
);

string_enum!(
    /// Lifecycle of a friend walk.
    FriendWalkStatus {
        Active => "active",
        Completed => "completed",
    }
);

string_enum!(
    /// Review state of an incident report. Only `Pending` is ever written here;
    /// the remaining values belong to a review workflow outside this service.
    IncidentStatus {
        Pending => "pending",
        InReview => "in_review",
        Resolved => "resolved",
    }
);

string_enum!(
    /// Severity of a campus-wide alert.
    AlertLevel {
        Emergency => "emergency",
        Advisory => "advisory",
        Info => "info",
    }
);

string_enum!(
    /// Kind of safety infrastructure shown on the campus map.
    LocationType {
        EmergencyPhone => "emergency_phone",
        Aed => "aed",
        SafeBuilding => "safe_building",
        SecurityOffice => "security_office",
        Parking => "parking",
    }
);

//=========================================================================================
// Status machines
//=========================================================================================

/// A status enum with a fixed transition relation.
pub trait StatusMachine: Copy + PartialEq + 'static {
    /// Every value of the status type.
    fn all() -> &'static [Self];

    /// Whether a record in `self` may move to `next`.
    fn can_transition_to(self, next: Self) -> bool;

    /// A status is terminal when no transition leaves it.
    fn is_terminal(self) -> bool {
        !Self::all().iter().any(|next| self.can_transition_to(*next))
    }

    /// The statuses from which `next` is reachable in one step.
    fn sources_of(next: Self) -> Vec<Self> {
        Self::all()
            .iter()
            .copied()
            .filter(|from| from.can_transition_to(next))
            .collect()
    }
}

impl StatusMachine for SosStatus {
    fn all() -> &'static [Self] {
        Self::ALL
    }

    fn can_transition_to(self, next: Self) -> bool {
        matches!((self, next), (SosStatus::Active, SosStatus::Cancelled))
    }
}

impl StatusMachine for EscortStatus {
    fn all() -> &'static [Self] {
        Self::ALL
    }

    fn can_transition_to(self, next: Self) -> bool {
        use EscortStatus::*;
        matches!(
            (self, next),
            (Pending, Assigned) | (Pending, Cancelled) | (Assigned, Cancelled) | (Assigned, Completed)
        )
    }
}

impl StatusMachine for FriendWalkStatus {
    fn all() -> &'static [Self] {
        Self::ALL
    }

    // Active -> Active is the extend operation.
    fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (FriendWalkStatus::Active, FriendWalkStatus::Active)
                | (FriendWalkStatus::Active, FriendWalkStatus::Completed)
        )
    }
}

//=========================================================================================
// Users and trusted contacts
//=========================================================================================

/// Represents a user - used throughout the app. Never carries the password digest.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub profile_photo: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub trusted_contacts: Vec<TrustedContact>,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

/// A fully prepared account, ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    /// The user record as it exists right after signup.
    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            profile_photo: None,
            emergency_contact_name: None,
            emergency_contact_phone: None,
            trusted_contacts: Vec::new(),
            created_at: self.created_at,
        }
    }
}

/// Someone the user wants notified during an emergency or a friend walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedContact {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub relationship: Option<String>,
}

/// Profile fields a user may change. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub profile_photo: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        *self == ProfileUpdate::default()
    }

    /// Copies every provided field into `user`.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(full_name) = &self.full_name {
            user.full_name = full_name.clone();
        }
        if let Some(phone) = &self.phone {
            user.phone = phone.clone();
        }
        if let Some(photo) = &self.profile_photo {
            user.profile_photo = Some(photo.clone());
        }
        if let Some(name) = &self.emergency_contact_name {
            user.emergency_contact_name = Some(name.clone());
        }
        if let Some(phone) = &self.emergency_contact_phone {
            user.emergency_contact_phone = Some(phone.clone());
        }
    }
}

/// Normalises `email` and checks that it belongs to `domain`.
///
/// Returns the trimmed, lowercased address, or `None` when the address is
/// malformed or registered under another domain.
pub fn institutional_email(email: &str, domain: &str) -> Option<String> {
    let email = email.trim().to_lowercase();
    let domain = domain.trim().trim_start_matches('@').to_lowercase();
    let (local, host) = email.split_once('@')?;
    if local.is_empty() || host.contains('@') || host != domain {
        return None;
    }
    Some(email)
}

//=========================================================================================
// Owned safety records
//=========================================================================================

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Builds a point, rejecting values outside the valid latitude/longitude range.
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        let valid = (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng);
        valid.then_some(Self { lat, lng })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SosAlert {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_phone: String,
    pub location: GeoPoint,
    pub alert_type: Option<String>,
    pub status: SosStatus,
    pub created_at: DateTime<Utc>,
}

/// An incident report. Anonymous reports have no owner.
#[derive(Debug, Clone, PartialEq)]
pub struct Incident {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub incident_type: String,
    pub location: GeoPoint,
    pub location_name: Option<String>,
    pub description: String,
    pub photos: Vec<String>,
    pub is_anonymous: bool,
    pub wants_contact: bool,
    pub contact_phone: Option<String>,
    pub status: IncidentStatus,
    pub created_at: DateTime<Utc>,
}

/// Estimated wait quoted for a freshly created escort request.
pub const INITIAL_ESCORT_WAIT_MINUTES: i32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct EscortRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub pickup: GeoPoint,
    pub pickup_name: Option<String>,
    pub destination: GeoPoint,
    pub destination_name: Option<String>,
    pub notes: Option<String>,
    pub status: EscortStatus,
    pub officer_name: Option<String>,
    pub officer_photo: Option<String>,
    pub estimated_wait_minutes: i32,
    pub created_at: DateTime<Utc>,
}

/// The officer details written when an escort request is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfficerAssignment {
    pub officer_name: String,
    pub officer_photo: Option<String>,
    pub estimated_wait_minutes: i32,
}

impl OfficerAssignment {
    /// The fixed assignment used until real dispatch exists.
    pub fn mock() -> Self {
        Self {
            officer_name: "Officer John".to_string(),
            officer_photo: None,
            estimated_wait_minutes: 5,
        }
    }

    pub fn apply_to(&self, request: &mut EscortRequest) {
        request.status = EscortStatus::Assigned;
        request.officer_name = Some(self.officer_name.clone());
        request.officer_photo = self.officer_photo.clone();
        request.estimated_wait_minutes = self.estimated_wait_minutes;
    }
}

/// A timed walk during which trusted contacts follow the user's location.
/// Longest a friend walk may last, extensions included.
pub const MAX_WALK_MINUTES: i32 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("A friend walk cannot last longer than {} minutes", MAX_WALK_MINUTES)]
pub struct WalkTooLong;

#[derive(Debug, Clone, PartialEq)]
pub struct FriendWalk {
    pub id: Uuid,
    pub user_id: Uuid,
    pub contact_ids: Vec<Uuid>,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub end_time: DateTime<Utc>,
    pub current_location: GeoPoint,
    pub status: FriendWalkStatus,
}

impl FriendWalk {
    pub fn start(
        user_id: Uuid,
        contact_ids: Vec<Uuid>,
        duration_minutes: i32,
        location: GeoPoint,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            contact_ids,
            start_time: now,
            duration_minutes,
            end_time: now + Duration::minutes(i64::from(duration_minutes)),
            current_location: location,
            status: FriendWalkStatus::Active,
        }
    }

    /// Pushes the end of the walk forward by `minutes`. The walk is left
    /// untouched when the new total would pass `MAX_WALK_MINUTES`.
    pub fn extend(&mut self, minutes: i32) -> Result<(), WalkTooLong> {
        let total = self
            .duration_minutes
            .checked_add(minutes)
            .filter(|total| *total <= MAX_WALK_MINUTES)
            .ok_or(WalkTooLong)?;
        self.duration_minutes = total;
        self.end_time += Duration::minutes(i64::from(minutes));
        Ok(())
    }
}

//=========================================================================================
// Campus reference data
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct CampusAlert {
    pub id: Uuid,
    pub level: AlertLevel,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CampusLocation {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub location_type: LocationType,
    pub position: GeoPoint,
}
