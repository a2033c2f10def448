//! services/api/src/seed.rs
//!
//! The bundled campus dataset written by the reseed operation.

use campus_safety_core::domain::{AlertLevel, CampusAlert, CampusLocation, GeoPoint, LocationType};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Demo alerts, dated relative to `now` so the feed always looks recent.
pub fn campus_alerts(now: DateTime<Utc>) -> Vec<CampusAlert> {
    let alert = |level, title: &str, message: &str, age: Duration| CampusAlert {
        id: Uuid::new_v4(),
        level,
        title: title.to_string(),
        message: message.to_string(),
        created_at: now - age,
        is_read: false,
    };

    vec![
        alert(
            AlertLevel::Emergency,
            "Campus Lockdown Drill",
            "This is a scheduled campus lockdown drill. Please follow all standard lockdown procedures. This drill will last approximately 30 minutes.",
            Duration::hours(2),
        ),
        alert(
            AlertLevel::Advisory,
            "Suspicious Activity Reported",
            "Suspicious activity has been reported near the Science building. Campus security is investigating. Please remain vigilant and report any unusual activity.",
            Duration::days(1),
        ),
        alert(
            AlertLevel::Info,
            "Winter Weather Advisory",
            "Environment Canada has issued a winter storm warning. Classes may be affected. Check your email for updates on campus closures.",
            Duration::days(2),
        ),
    ]
}

const LOCATIONS: &[(&str, &str, LocationType, f64, f64)] = &[
    ("Acadia Security Office", "Main campus security headquarters. Open 24/7.", LocationType::SecurityOffice, 45.0875, -64.3665),
    ("BAC Emergency Phone", "Emergency phone outside Beveridge Arts Centre", LocationType::EmergencyPhone, 45.0880, -64.3670),
    ("Library Emergency Phone", "Emergency phone at main library entrance", LocationType::EmergencyPhone, 45.0870, -64.3660),
    ("SUB Emergency Phone", "Emergency phone at Student Union Building", LocationType::EmergencyPhone, 45.0885, -64.3675),
    ("Patterson Hall AED", "AED located in main lobby of Patterson Hall", LocationType::Aed, 45.0865, -64.3655),
    ("Library AED", "AED located at library front desk", LocationType::Aed, 45.0871, -64.3661),
    ("Athletic Centre AED", "AED located at athletic centre entrance", LocationType::Aed, 45.0860, -64.3680),
    ("Library", "Vaughan Memorial Library - 24/7 access during exams", LocationType::SafeBuilding, 45.0870, -64.3660),
    ("Student Union Building", "SUB - Open until midnight daily", LocationType::SafeBuilding, 45.0885, -64.3675),
    ("KC Irving Centre", "Environmental Science Centre - Card access after hours", LocationType::SafeBuilding, 45.0878, -64.3668),
    ("Main Parking Lot", "Main campus parking - Well lit, security patrols", LocationType::Parking, 45.0882, -64.3658),
    ("Residence Parking", "Residence parking lot - Permit required", LocationType::Parking, 45.0868, -64.3672),
];

/// Emergency phones, AEDs, safe buildings, the security office and parking.
pub fn campus_locations() -> Vec<CampusLocation> {
    LOCATIONS
        .iter()
        .map(|&(name, description, location_type, lat, lng)| CampusLocation {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: Some(description.to_string()),
            location_type,
            position: GeoPoint { lat, lng },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_covers_every_location_type() {
        let locations = campus_locations();
        assert_eq!(locations.len(), 12);
        for location_type in LocationType::ALL {
            assert!(locations.iter().any(|l| l.location_type == *location_type));
        }
        for location in &locations {
            assert!(GeoPoint::new(location.position.lat, location.position.lng).is_some());
        }
    }

    #[test]
    fn alerts_are_dated_before_now() {
        let now = Utc::now();
        let alerts = campus_alerts(now);
        assert_eq!(alerts.len(), 3);
        assert!(alerts.iter().all(|a| a.created_at < now && !a.is_read));
    }
}
