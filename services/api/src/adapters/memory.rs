//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of the `DatabaseService` port, used when no
//! `DATABASE_URL` is configured and throughout the test suite.
//!
//! Every collection sits behind one async mutex, so each port call runs as a
//! single critical section. The one-active-record checks and the insert that
//! follows them therefore cannot interleave with another request.

use async_trait::async_trait;
use campus_safety_core::domain::{
    CampusAlert, CampusLocation, EscortRequest, EscortStatus, FriendWalk, FriendWalkStatus,
    GeoPoint, Incident, LocationType, NewUser, OfficerAssignment, ProfileUpdate, SosAlert,
    SosStatus, StatusMachine, TrustedContact, User, UserCredentials,
};
use campus_safety_core::ports::{DatabaseService, PortError, PortResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

struct StoredUser {
    user: User,
    hashed_password: String,
}

#[derive(Default)]
struct Collections {
    users: HashMap<Uuid, StoredUser>,
    sos_alerts: Vec<SosAlert>,
    incidents: Vec<Incident>,
    escort_requests: Vec<EscortRequest>,
    friend_walks: Vec<FriendWalk>,
    campus_alerts: Vec<CampusAlert>,
    campus_locations: Vec<CampusLocation>,
}

/// A `DatabaseService` that keeps everything in memory.
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    inner: Arc<Mutex<Collections>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(what: &str, id: Uuid) -> PortError {
    PortError::NotFound(format!("{} {} not found", what, id))
}

#[async_trait]
impl DatabaseService for InMemoryDatabase {
    async fn create_user(&self, user: NewUser) -> PortResult<User> {
        let mut db = self.inner.lock().await;
        let taken = db
            .users
            .values()
            .any(|stored| stored.user.email.eq_ignore_ascii_case(&user.email));
        if taken {
            return Err(PortError::Conflict("Email already registered".to_string()));
        }

        let created = user.to_user();
        db.users.insert(
            user.id,
            StoredUser {
                user: created.clone(),
                hashed_password: user.hashed_password,
            },
        );
        Ok(created)
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let db = self.inner.lock().await;
        db.users
            .get(&user_id)
            .map(|stored| stored.user.clone())
            .ok_or_else(|| not_found("User", user_id))
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let db = self.inner.lock().await;
        db.users
            .values()
            .find(|stored| stored.user.email.eq_ignore_ascii_case(email))
            .map(|stored| UserCredentials {
                user_id: stored.user.id,
                email: stored.user.email.clone(),
                hashed_password: stored.hashed_password.clone(),
            })
            .ok_or_else(|| PortError::NotFound("User not found".to_string()))
    }

    async fn update_user_profile(&self, user_id: Uuid, update: &ProfileUpdate) -> PortResult<User> {
        let mut db = self.inner.lock().await;
        let stored = db
            .users
            .get_mut(&user_id)
            .ok_or_else(|| not_found("User", user_id))?;
        update.apply_to(&mut stored.user);
        Ok(stored.user.clone())
    }

    async fn add_trusted_contact(
        &self,
        user_id: Uuid,
        contact: TrustedContact,
    ) -> PortResult<TrustedContact> {
        let mut db = self.inner.lock().await;
        let stored = db
            .users
            .get_mut(&user_id)
            .ok_or_else(|| not_found("User", user_id))?;
        stored.user.trusted_contacts.push(contact.clone());
        Ok(contact)
    }

    async fn remove_trusted_contact(&self, user_id: Uuid, contact_id: Uuid) -> PortResult<()> {
        let mut db = self.inner.lock().await;
        let stored = db
            .users
            .get_mut(&user_id)
            .ok_or_else(|| not_found("User", user_id))?;
        let before = stored.user.trusted_contacts.len();
        stored.user.trusted_contacts.retain(|c| c.id != contact_id);
        if stored.user.trusted_contacts.len() == before {
            return Err(not_found("Contact", contact_id));
        }
        Ok(())
    }

    async fn create_sos_alert(&self, alert: SosAlert) -> PortResult<SosAlert> {
        let mut db = self.inner.lock().await;
        db.sos_alerts.push(alert.clone());
        Ok(alert)
    }

    async fn find_active_sos_alert(&self, user_id: Uuid) -> PortResult<Option<SosAlert>> {
        let db = self.inner.lock().await;
        Ok(db
            .sos_alerts
            .iter()
            .filter(|a| a.user_id == user_id && a.status == SosStatus::Active)
            .max_by_key(|a| a.created_at)
            .cloned())
    }

    async fn transition_sos_alert(
        &self,
        alert_id: Uuid,
        user_id: Uuid,
        next: SosStatus,
    ) -> PortResult<SosAlert> {
        let mut db = self.inner.lock().await;
        let alert = db
            .sos_alerts
            .iter_mut()
            .find(|a| a.id == alert_id && a.user_id == user_id && a.status.can_transition_to(next))
            .ok_or_else(|| not_found("SOS alert", alert_id))?;
        alert.status = next;
        Ok(alert.clone())
    }

    async fn create_incident(&self, incident: Incident) -> PortResult<Incident> {
        let mut db = self.inner.lock().await;
        db.incidents.push(incident.clone());
        Ok(incident)
    }

    async fn get_incident_by_id(&self, incident_id: Uuid) -> PortResult<Incident> {
        let db = self.inner.lock().await;
        db.incidents
            .iter()
            .find(|i| i.id == incident_id)
            .cloned()
            .ok_or_else(|| not_found("Incident", incident_id))
    }

    async fn list_incidents_by_user(&self, user_id: Uuid, limit: usize) -> PortResult<Vec<Incident>> {
        let db = self.inner.lock().await;
        let mut incidents: Vec<Incident> = db
            .incidents
            .iter()
            .filter(|i| i.user_id == Some(user_id))
            .cloned()
            .collect();
        incidents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        incidents.truncate(limit);
        Ok(incidents)
    }

    async fn create_escort_request(&self, request: EscortRequest) -> PortResult<EscortRequest> {
        let mut db = self.inner.lock().await;
        let outstanding = db
            .escort_requests
            .iter()
            .any(|r| r.user_id == request.user_id && !r.status.is_terminal());
        if outstanding {
            return Err(PortError::Conflict(
                "You already have an active escort request".to_string(),
            ));
        }
        db.escort_requests.push(request.clone());
        Ok(request)
    }

    async fn find_active_escort_request(&self, user_id: Uuid) -> PortResult<Option<EscortRequest>> {
        let db = self.inner.lock().await;
        Ok(db
            .escort_requests
            .iter()
            .find(|r| r.user_id == user_id && !r.status.is_terminal())
            .cloned())
    }

    async fn transition_escort_request(
        &self,
        request_id: Uuid,
        user_id: Uuid,
        next: EscortStatus,
    ) -> PortResult<EscortRequest> {
        let mut db = self.inner.lock().await;
        let request = db
            .escort_requests
            .iter_mut()
            .find(|r| r.id == request_id && r.user_id == user_id && r.status.can_transition_to(next))
            .ok_or_else(|| not_found("Escort request", request_id))?;
        request.status = next;
        Ok(request.clone())
    }

    async fn assign_escort_officer(
        &self,
        request_id: Uuid,
        assignment: &OfficerAssignment,
    ) -> PortResult<EscortRequest> {
        let mut db = self.inner.lock().await;
        let request = db
            .escort_requests
            .iter_mut()
            .find(|r| r.id == request_id && r.status.can_transition_to(EscortStatus::Assigned))
            .ok_or_else(|| not_found("Escort request", request_id))?;
        assignment.apply_to(request);
        Ok(request.clone())
    }

    async fn create_friend_walk(&self, walk: FriendWalk) -> PortResult<FriendWalk> {
        let mut db = self.inner.lock().await;
        let active = db
            .friend_walks
            .iter()
            .any(|w| w.user_id == walk.user_id && w.status == FriendWalkStatus::Active);
        if active {
            return Err(PortError::Conflict(
                "You already have an active Friend Walk".to_string(),
            ));
        }
        db.friend_walks.push(walk.clone());
        Ok(walk)
    }

    async fn find_active_friend_walk(&self, user_id: Uuid) -> PortResult<Option<FriendWalk>> {
        let db = self.inner.lock().await;
        Ok(db
            .friend_walks
            .iter()
            .find(|w| w.user_id == user_id && w.status == FriendWalkStatus::Active)
            .cloned())
    }

    async fn update_friend_walk_location(
        &self,
        walk_id: Uuid,
        user_id: Uuid,
        location: GeoPoint,
    ) -> PortResult<FriendWalk> {
        let mut db = self.inner.lock().await;
        let walk = db
            .friend_walks
            .iter_mut()
            .find(|w| w.id == walk_id && w.user_id == user_id && w.status == FriendWalkStatus::Active)
            .ok_or_else(|| not_found("Friend walk", walk_id))?;
        walk.current_location = location;
        Ok(walk.clone())
    }

    async fn extend_friend_walk(
        &self,
        walk_id: Uuid,
        user_id: Uuid,
        minutes: i32,
    ) -> PortResult<FriendWalk> {
        let mut db = self.inner.lock().await;
        let walk = db
            .friend_walks
            .iter_mut()
            .find(|w| {
                w.id == walk_id
                    && w.user_id == user_id
                    && w.status.can_transition_to(FriendWalkStatus::Active)
            })
            .ok_or_else(|| not_found("Friend walk", walk_id))?;
        walk.extend(minutes).map_err(|e| PortError::Conflict(e.to_string()))?;
        Ok(walk.clone())
    }

    async fn transition_friend_walk(
        &self,
        walk_id: Uuid,
        user_id: Uuid,
        next: FriendWalkStatus,
    ) -> PortResult<FriendWalk> {
        let mut db = self.inner.lock().await;
        let walk = db
            .friend_walks
            .iter_mut()
            .find(|w| w.id == walk_id && w.user_id == user_id && w.status.can_transition_to(next))
            .ok_or_else(|| not_found("Friend walk", walk_id))?;
        walk.status = next;
        Ok(walk.clone())
    }

    async fn list_campus_alerts(&self, limit: usize) -> PortResult<Vec<CampusAlert>> {
        let db = self.inner.lock().await;
        let mut alerts = db.campus_alerts.clone();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        alerts.truncate(limit);
        Ok(alerts)
    }

    async fn get_campus_alert_by_id(&self, alert_id: Uuid) -> PortResult<CampusAlert> {
        let db = self.inner.lock().await;
        db.campus_alerts
            .iter()
            .find(|a| a.id == alert_id)
            .cloned()
            .ok_or_else(|| not_found("Alert", alert_id))
    }

    async fn list_campus_locations(
        &self,
        location_type: Option<LocationType>,
        limit: usize,
    ) -> PortResult<Vec<CampusLocation>> {
        let db = self.inner.lock().await;
        let mut locations: Vec<CampusLocation> = db
            .campus_locations
            .iter()
            .filter(|l| location_type.map_or(true, |t| l.location_type == t))
            .cloned()
            .collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        locations.truncate(limit);
        Ok(locations)
    }

    async fn replace_campus_data(
        &self,
        alerts: Vec<CampusAlert>,
        locations: Vec<CampusLocation>,
    ) -> PortResult<()> {
        let mut db = self.inner.lock().await;
        db.campus_alerts = alerts;
        db.campus_locations = locations;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_safety_core::domain::{INITIAL_ESCORT_WAIT_MINUTES, MAX_WALK_MINUTES};
    use chrono::{Duration, Utc};

    async fn seeded_user(db: &InMemoryDatabase, email: &str) -> User {
        db.create_user(NewUser {
            id: Uuid::new_v4(),
            full_name: "Test Student".to_string(),
            email: email.to_string(),
            phone: "902-555-0100".to_string(),
            hashed_password: "not-a-real-hash".to_string(),
            created_at: Utc::now(),
        })
        .await
        .unwrap()
    }

    fn escort_for(user_id: Uuid) -> EscortRequest {
        EscortRequest {
            id: Uuid::new_v4(),
            user_id,
            pickup: GeoPoint { lat: 45.0875, lng: -64.3665 },
            pickup_name: Some("Library".to_string()),
            destination: GeoPoint { lat: 45.0885, lng: -64.3675 },
            destination_name: None,
            notes: None,
            status: EscortStatus::Pending,
            officer_name: None,
            officer_photo: None,
            estimated_wait_minutes: INITIAL_ESCORT_WAIT_MINUTES,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict_regardless_of_case() {
        let db = InMemoryDatabase::new();
        seeded_user(&db, "ada@acadiau.ca").await;

        let err = db
            .create_user(NewUser {
                id: Uuid::new_v4(),
                full_name: "Other".to_string(),
                email: "ADA@acadiau.ca".to_string(),
                phone: "1".to_string(),
                hashed_password: "x".to_string(),
                created_at: Utc::now(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PortError::Conflict(_)));
    }

    #[tokio::test]
    async fn removing_a_contact_leaves_the_others_in_order() {
        let db = InMemoryDatabase::new();
        let user = seeded_user(&db, "ada@acadiau.ca").await;
        let mut ids = Vec::new();
        for name in ["Mum", "Dad", "Roommate"] {
            let contact = TrustedContact {
                id: Uuid::new_v4(),
                name: name.to_string(),
                phone: "555".to_string(),
                relationship: None,
            };
            ids.push(contact.id);
            db.add_trusted_contact(user.id, contact).await.unwrap();
        }

        db.remove_trusted_contact(user.id, ids[1]).await.unwrap();

        let names: Vec<String> = db
            .get_user_by_id(user.id)
            .await
            .unwrap()
            .trusted_contacts
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Mum", "Roommate"]);

        let again = db.remove_trusted_contact(user.id, ids[1]).await;
        assert!(matches!(again, Err(PortError::NotFound(_))));
    }

    #[tokio::test]
    async fn another_users_contact_cannot_be_removed() {
        let db = InMemoryDatabase::new();
        let owner = seeded_user(&db, "owner@acadiau.ca").await;
        let other = seeded_user(&db, "other@acadiau.ca").await;
        let contact = db
            .add_trusted_contact(
                owner.id,
                TrustedContact {
                    id: Uuid::new_v4(),
                    name: "Mum".to_string(),
                    phone: "555".to_string(),
                    relationship: Some("parent".to_string()),
                },
            )
            .await
            .unwrap();

        let err = db.remove_trusted_contact(other.id, contact.id).await.unwrap_err();

        assert!(matches!(err, PortError::NotFound(_)));
        assert_eq!(db.get_user_by_id(owner.id).await.unwrap().trusted_contacts.len(), 1);
    }

    #[tokio::test]
    async fn one_outstanding_escort_request_per_user() {
        let db = InMemoryDatabase::new();
        let user = seeded_user(&db, "ada@acadiau.ca").await;
        let first = db.create_escort_request(escort_for(user.id)).await.unwrap();

        let err = db.create_escort_request(escort_for(user.id)).await.unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));

        db.assign_escort_officer(first.id, &OfficerAssignment::mock())
            .await
            .unwrap();
        let err = db.create_escort_request(escort_for(user.id)).await.unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));

        db.transition_escort_request(first.id, user.id, EscortStatus::Completed)
            .await
            .unwrap();
        assert!(db.create_escort_request(escort_for(user.id)).await.is_ok());
    }

    #[tokio::test]
    async fn transitions_are_scoped_to_the_owner() {
        let db = InMemoryDatabase::new();
        let owner = seeded_user(&db, "owner@acadiau.ca").await;
        let stranger = seeded_user(&db, "stranger@acadiau.ca").await;
        let request = db.create_escort_request(escort_for(owner.id)).await.unwrap();

        let err = db
            .transition_escort_request(request.id, stranger.id, EscortStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));

        let cancelled = db
            .transition_escort_request(request.id, owner.id, EscortStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(cancelled.status, EscortStatus::Cancelled);

        // Terminal: a second cancel finds nothing to move.
        let err = db
            .transition_escort_request(request.id, owner.id, EscortStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[tokio::test]
    async fn extend_adds_minutes_to_duration_and_end_time() {
        let db = InMemoryDatabase::new();
        let user = seeded_user(&db, "ada@acadiau.ca").await;
        let walk = FriendWalk::start(
            user.id,
            vec![],
            20,
            GeoPoint { lat: 45.0, lng: -64.0 },
            Utc::now(),
        );
        let created = db.create_friend_walk(walk).await.unwrap();

        db.extend_friend_walk(created.id, user.id, 15).await.unwrap();
        let extended = db.extend_friend_walk(created.id, user.id, 15).await.unwrap();

        assert_eq!(extended.duration_minutes, 50);
        assert_eq!(extended.end_time, created.end_time + Duration::minutes(30));
        assert_eq!(extended.status, FriendWalkStatus::Active);

        db.transition_friend_walk(created.id, user.id, FriendWalkStatus::Completed)
            .await
            .unwrap();
        let err = db.extend_friend_walk(created.id, user.id, 15).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[tokio::test]
    async fn extend_past_the_walk_limit_is_a_conflict() {
        let db = InMemoryDatabase::new();
        let user = seeded_user(&db, "ada@acadiau.ca").await;
        let walk = FriendWalk::start(
            user.id,
            vec![],
            MAX_WALK_MINUTES,
            GeoPoint { lat: 45.0, lng: -64.0 },
            Utc::now(),
        );
        let created = db.create_friend_walk(walk).await.unwrap();

        let err = db.extend_friend_walk(created.id, user.id, 1).await.unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));
        let err = db.extend_friend_walk(created.id, user.id, i32::MAX).await.unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));

        let stored = db.find_active_friend_walk(user.id).await.unwrap().unwrap();
        assert_eq!(stored.duration_minutes, MAX_WALK_MINUTES);
        assert_eq!(stored.end_time, created.end_time);
    }

    #[tokio::test]
    async fn locations_filter_by_type() {
        let db = InMemoryDatabase::new();
        let location = |name: &str, location_type| CampusLocation {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            location_type,
            position: GeoPoint { lat: 45.0, lng: -64.0 },
        };
        db.replace_campus_data(
            vec![],
            vec![
                location("Library AED", LocationType::Aed),
                location("Main Lot", LocationType::Parking),
                location("Arena AED", LocationType::Aed),
            ],
        )
        .await
        .unwrap();

        let aeds = db
            .list_campus_locations(Some(LocationType::Aed), 100)
            .await
            .unwrap();
        let names: Vec<&str> = aeds.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Arena AED", "Library AED"]);
        assert_eq!(db.list_campus_locations(None, 100).await.unwrap().len(), 3);
        assert_eq!(db.list_campus_locations(None, 2).await.unwrap().len(), 2);
    }
}
