mod common;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{
    app_with_config, detail, signup, test_app, test_config, TestRequest, ADMIN_TOKEN,
};
use serde_json::{json, Value};

fn location() -> Value {
    json!({ "location_lat": 45.0875, "location_lng": -64.3665 })
}

fn escort_body() -> Value {
    json!({
        "pickup_lat": 45.0870,
        "pickup_lng": -64.3660,
        "pickup_name": "Library",
        "destination_lat": 45.0868,
        "destination_lng": -64.3672,
        "destination_name": "Residence",
    })
}

fn timestamp(value: &Value) -> DateTime<Utc> {
    value.as_str().unwrap().parse().unwrap()
}

async fn add_contact(app: &axum::Router, token: &str, name: &str) -> String {
    let (status, body) = TestRequest::post("/api/contacts")
        .bearer(token)
        .json(json!({ "name": name, "phone": "902-555-0111", "relationship": "friend" }))
        .send(app)
        .await;
    assert_eq!(status, StatusCode::OK, "add contact failed: {}", body);
    body["id"].as_str().unwrap().to_string()
}

//=========================================================================================
// Trusted contacts
//=========================================================================================

#[tokio::test]
async fn deleting_a_contact_removes_exactly_that_entry() {
    let app = test_app();
    let token = signup(&app, "ada").await;
    let first = add_contact(&app, &token, "Mum").await;
    let second = add_contact(&app, &token, "Dad").await;
    let third = add_contact(&app, &token, "Sam").await;

    let (status, body) = TestRequest::delete(&format!("/api/contacts/{}", second))
        .bearer(&token)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Contact deleted");

    let (_, contacts) = TestRequest::get("/api/contacts").bearer(&token).send(&app).await;
    let ids: Vec<&str> = contacts
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![first.as_str(), third.as_str()]);

    let (status, body) = TestRequest::delete(&format!("/api/contacts/{}", second))
        .bearer(&token)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(detail(&body), "Contact not found");
}

#[tokio::test]
async fn contacts_are_private_to_their_owner() {
    let app = test_app();
    let ada = signup(&app, "ada").await;
    let bob = signup(&app, "bob").await;
    let contact = add_contact(&app, &ada, "Mum").await;

    let (status, _) = TestRequest::delete(&format!("/api/contacts/{}", contact))
        .bearer(&bob)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, contacts) = TestRequest::get("/api/contacts").bearer(&ada).send(&app).await;
    assert_eq!(contacts.as_array().unwrap().len(), 1);
    let (_, contacts) = TestRequest::get("/api/contacts").bearer(&bob).send(&app).await;
    assert!(contacts.as_array().unwrap().is_empty());
}

//=========================================================================================
// SOS alerts
//=========================================================================================

#[tokio::test]
async fn sos_alert_lifecycle() {
    let app = test_app();
    let token = signup(&app, "ada").await;

    let (status, alert) = TestRequest::post("/api/sos")
        .bearer(&token)
        .json(json!({ "location_lat": 45.0875, "location_lng": -64.3665, "alert_type": "medical" }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(alert["status"], "active");
    assert_eq!(alert["user_name"], "ada Student");
    assert_eq!(alert["user_phone"], "902-555-0100");
    let alert_id = alert["id"].as_str().unwrap().to_string();

    let (_, active) = TestRequest::get("/api/sos/active").bearer(&token).send(&app).await;
    assert_eq!(active["id"], alert_id.as_str());

    let bob = signup(&app, "bob").await;
    let cancel_uri = format!("/api/sos/{}/cancel", alert_id);
    let (status, _) = TestRequest::put(&cancel_uri).bearer(&bob).send(&app).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = TestRequest::put(&cancel_uri).bearer(&token).send(&app).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "SOS alert cancelled");

    let (status, active) = TestRequest::get("/api/sos/active").bearer(&token).send(&app).await;
    assert_eq!(status, StatusCode::OK);
    assert!(active.is_null());

    let (status, _) = TestRequest::put(&cancel_uri).bearer(&token).send(&app).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sos_rejects_impossible_coordinates() {
    let app = test_app();
    let token = signup(&app, "ada").await;

    let (status, body) = TestRequest::post("/api/sos")
        .bearer(&token)
        .json(json!({ "location_lat": 123.0, "location_lng": 0.0 }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(detail(&body), "Invalid coordinates");
}

//=========================================================================================
// Incidents
//=========================================================================================

#[tokio::test]
async fn anonymous_incidents_have_no_owner() {
    let app = test_app();
    let token = signup(&app, "ada").await;

    let mut anonymous = location();
    anonymous["incident_type"] = json!("theft");
    anonymous["description"] = json!("Bike taken from the rack");
    anonymous["is_anonymous"] = json!(true);
    let (status, incident) = TestRequest::post("/api/incidents")
        .bearer(&token)
        .json(anonymous)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(incident["user_id"].is_null());
    assert_eq!(incident["status"], "pending");
    let anonymous_id = incident["id"].as_str().unwrap().to_string();

    let mut named = location();
    named["incident_type"] = json!("harassment");
    named["description"] = json!("Followed near the SUB");
    named["photos"] = json!(["photo-1"]);
    let (status, incident) = TestRequest::post("/api/incidents")
        .bearer(&token)
        .json(named)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(incident["user_id"].is_string());
    let named_id = incident["id"].as_str().unwrap().to_string();

    let (_, mine) = TestRequest::get("/api/incidents/my").bearer(&token).send(&app).await;
    let mine = mine.as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["id"], named_id.as_str());
    assert_eq!(mine[0]["photos"], json!(["photo-1"]));

    // Lookup by id is open to any authenticated user.
    let bob = signup(&app, "bob").await;
    let (status, fetched) = TestRequest::get(&format!("/api/incidents/{}", anonymous_id))
        .bearer(&bob)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["description"], "Bike taken from the rack");

    let (status, body) = TestRequest::get(&format!("/api/incidents/{}", uuid::Uuid::new_v4()))
        .bearer(&bob)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(detail(&body), "Incident not found");
}

//=========================================================================================
// Escorts
//=========================================================================================

#[tokio::test]
async fn only_one_outstanding_escort_per_user() {
    let app = test_app();
    let token = signup(&app, "ada").await;

    let (status, escort) = TestRequest::post("/api/escorts")
        .bearer(&token)
        .json(escort_body())
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(escort["status"], "pending");
    assert_eq!(escort["estimated_wait"], 10);
    let escort_id = escort["id"].as_str().unwrap().to_string();

    let (status, body) = TestRequest::post("/api/escorts")
        .bearer(&token)
        .json(escort_body())
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(detail(&body), "You already have an active escort request");

    let (status, body) = TestRequest::put(&format!("/api/escorts/{}/cancel", escort_id))
        .bearer(&token)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Escort request cancelled");

    let (_, active) = TestRequest::get("/api/escorts/active").bearer(&token).send(&app).await;
    assert!(active.is_null());

    let (status, _) = TestRequest::post("/api/escorts")
        .bearer(&token)
        .json(escort_body())
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn assigned_escort_can_be_completed_and_frees_the_slot() {
    let app = test_app();
    let token = signup(&app, "ada").await;

    let (_, escort) = TestRequest::post("/api/escorts")
        .bearer(&token)
        .json(escort_body())
        .send(&app)
        .await;
    let escort_id = escort["id"].as_str().unwrap().to_string();

    // Completing before assignment is not a valid transition.
    let complete_uri = format!("/api/escorts/{}/complete", escort_id);
    let (status, _) = TestRequest::put(&complete_uri).bearer(&token).send(&app).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, assigned) = TestRequest::put(&format!("/api/escorts/{}/assign", escort_id))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(assigned["status"], "assigned");
    assert_eq!(assigned["officer_name"], "Officer John");
    assert_eq!(assigned["estimated_wait"], 5);

    let (_, active) = TestRequest::get("/api/escorts/active").bearer(&token).send(&app).await;
    assert_eq!(active["status"], "assigned");

    let (status, body) = TestRequest::put(&complete_uri).bearer(&token).send(&app).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Escort completed");

    let (status, _) = TestRequest::post("/api/escorts")
        .bearer(&token)
        .json(escort_body())
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn escorts_cannot_be_cancelled_by_other_users() {
    let app = test_app();
    let ada = signup(&app, "ada").await;
    let bob = signup(&app, "bob").await;

    let (_, escort) = TestRequest::post("/api/escorts")
        .bearer(&ada)
        .json(escort_body())
        .send(&app)
        .await;
    let cancel_uri = format!("/api/escorts/{}/cancel", escort["id"].as_str().unwrap());

    let (status, body) = TestRequest::put(&cancel_uri).bearer(&bob).send(&app).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(detail(&body), "Escort request not found");

    let (_, active) = TestRequest::get("/api/escorts/active").bearer(&ada).send(&app).await;
    assert_eq!(active["status"], "pending");
}

//=========================================================================================
// Friend walks
//=========================================================================================

#[tokio::test]
async fn extending_twice_by_default_equals_thirty_minutes() {
    let app = test_app();
    let token = signup(&app, "ada").await;
    let contact = add_contact(&app, &token, "Mum").await;

    let mut start = location();
    start["contact_ids"] = json!([contact]);
    start["duration_minutes"] = json!(20);
    let (status, walk) = TestRequest::post("/api/friend-walk")
        .bearer(&token)
        .json(start.clone())
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(walk["status"], "active");
    let walk_id = walk["id"].as_str().unwrap().to_string();
    let original_end = timestamp(&walk["end_time"]);

    let (status, body) = TestRequest::post("/api/friend-walk")
        .bearer(&token)
        .json(start)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(detail(&body), "You already have an active Friend Walk");

    let extend_uri = format!("/api/friend-walk/{}/extend", walk_id);
    let (status, first) = TestRequest::put(&extend_uri).bearer(&token).send(&app).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["message"], "Walk extended");
    assert_eq!(first["duration_minutes"], 35);

    let (_, second) = TestRequest::put(&extend_uri).bearer(&token).send(&app).await;
    assert_eq!(second["duration_minutes"], 50);
    assert_eq!(
        timestamp(&second["new_end_time"]) - original_end,
        chrono::Duration::minutes(30)
    );

    let (status, body) = TestRequest::put(&format!("{}?minutes=0", extend_uri))
        .bearer(&token)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(detail(&body), "minutes must be at least 1 minute");
}

#[tokio::test]
async fn walks_cannot_run_past_one_day() {
    let app = test_app();
    let token = signup(&app, "ada").await;

    let mut start = location();
    start["contact_ids"] = json!([]);
    start["duration_minutes"] = json!(1441);
    let (status, body) = TestRequest::post("/api/friend-walk")
        .bearer(&token)
        .json(start.clone())
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(detail(&body), "duration_minutes must be at most 1440 minutes");

    start["duration_minutes"] = json!(1440);
    let (status, walk) = TestRequest::post("/api/friend-walk")
        .bearer(&token)
        .json(start)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    let extend_uri = format!("/api/friend-walk/{}/extend", walk["id"].as_str().unwrap());

    let (status, body) = TestRequest::put(&extend_uri).bearer(&token).send(&app).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(detail(&body), "A friend walk cannot last longer than 1440 minutes");

    let (status, body) = TestRequest::put(&format!("{}?minutes=2147483647", extend_uri))
        .bearer(&token)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(detail(&body), "minutes must be at most 1440 minutes");

    let (_, active) = TestRequest::get("/api/friend-walk/active")
        .bearer(&token)
        .send(&app)
        .await;
    assert_eq!(active["duration_minutes"], 1440);
    assert_eq!(active["end_time"], walk["end_time"]);
}

#[tokio::test]
async fn walk_location_updates_and_completion() {
    let app = test_app();
    let token = signup(&app, "ada").await;

    let mut start = location();
    start["contact_ids"] = json!([]);
    start["duration_minutes"] = json!(15);
    let (_, walk) = TestRequest::post("/api/friend-walk")
        .bearer(&token)
        .json(start)
        .send(&app)
        .await;
    let walk_id = walk["id"].as_str().unwrap().to_string();
    let update_uri = format!("/api/friend-walk/{}/update", walk_id);

    let (status, body) = TestRequest::put(&update_uri)
        .bearer(&token)
        .json(json!({ "location_lat": 45.0880, "location_lng": -64.3670 }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Location updated");

    let (_, active) = TestRequest::get("/api/friend-walk/active").bearer(&token).send(&app).await;
    assert_eq!(active["current_lat"], 45.0880);
    assert_eq!(active["current_lng"], -64.3670);
    assert_eq!(active["status"], "active");

    let (status, body) = TestRequest::put(&format!("/api/friend-walk/{}/complete", walk_id))
        .bearer(&token)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Friend walk completed");

    let (_, active) = TestRequest::get("/api/friend-walk/active").bearer(&token).send(&app).await;
    assert!(active.is_null());

    let (status, _) = TestRequest::put(&update_uri)
        .bearer(&token)
        .json(json!({ "location_lat": 45.0, "location_lng": -64.0 }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn walks_only_share_with_the_callers_own_contacts() {
    let app = test_app();
    let ada = signup(&app, "ada").await;
    let bob = signup(&app, "bob").await;
    let bobs_contact = add_contact(&app, &bob, "Bob's Mum").await;

    let mut start = location();
    start["contact_ids"] = json!([bobs_contact]);
    start["duration_minutes"] = json!(15);
    let (status, _) = TestRequest::post("/api/friend-walk")
        .bearer(&ada)
        .json(start)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut start = location();
    start["contact_ids"] = json!([]);
    start["duration_minutes"] = json!(0);
    let (status, body) = TestRequest::post("/api/friend-walk")
        .bearer(&ada)
        .json(start)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(detail(&body), "duration_minutes must be at least 1 minute");
}

//=========================================================================================
// Campus data
//=========================================================================================

#[tokio::test]
async fn seeding_populates_alerts_and_locations() {
    let app = test_app();

    let (status, alerts) = TestRequest::get("/api/alerts").send(&app).await;
    assert_eq!(status, StatusCode::OK);
    assert!(alerts.as_array().unwrap().is_empty());

    let (status, body) = TestRequest::post("/api/seed").send(&app).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Data seeded successfully");
    assert_eq!(body["alerts"], 3);
    assert_eq!(body["locations"], 12);

    // Reseeding replaces rather than appends.
    TestRequest::post("/api/seed").send(&app).await;

    let (_, alerts) = TestRequest::get("/api/alerts").send(&app).await;
    let alerts = alerts.as_array().unwrap();
    assert_eq!(alerts.len(), 3);
    assert_eq!(alerts[0]["alert_type"], "emergency");
    let created: Vec<DateTime<Utc>> = alerts.iter().map(|a| timestamp(&a["created_at"])).collect();
    assert!(created.windows(2).all(|pair| pair[0] >= pair[1]));

    let alert_id = alerts[1]["id"].as_str().unwrap().to_string();
    let (status, alert) = TestRequest::get(&format!("/api/alerts/{}", alert_id)).send(&app).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(alert["title"], alerts[1]["title"]);

    let (_, locations) = TestRequest::get("/api/locations").send(&app).await;
    assert_eq!(locations.as_array().unwrap().len(), 12);

    let (_, aeds) = TestRequest::get("/api/locations?location_type=aed").send(&app).await;
    let aeds = aeds.as_array().unwrap();
    assert_eq!(aeds.len(), 3);
    assert!(aeds.iter().all(|l| l["location_type"] == "aed"));

    let (status, body) = TestRequest::get("/api/locations?location_type=helipad").send(&app).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(detail(&body), "Unknown location_type 'helipad'");

    let (status, body) = TestRequest::get(&format!("/api/alerts/{}", uuid::Uuid::new_v4()))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(detail(&body), "Alert not found");
}

#[tokio::test]
async fn admin_routes_require_the_configured_token() {
    let app = app_with_config(test_config(Some(ADMIN_TOKEN)));

    let (status, body) = TestRequest::post("/api/seed").send(&app).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(detail(&body), "Admin token required");

    let (status, _) = TestRequest::post("/api/seed")
        .header("x-admin-token", "wrong")
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = TestRequest::post("/api/seed")
        .header("x-admin-token", ADMIN_TOKEN)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);

    // A user's bearer token is not an admin credential.
    let token = signup(&app, "ada").await;
    let (_, escort) = TestRequest::post("/api/escorts")
        .bearer(&token)
        .json(escort_body())
        .send(&app)
        .await;
    let assign_uri = format!("/api/escorts/{}/assign", escort["id"].as_str().unwrap());
    let (status, _) = TestRequest::put(&assign_uri).bearer(&token).send(&app).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, assigned) = TestRequest::put(&assign_uri)
        .header("x-admin-token", ADMIN_TOKEN)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(assigned["officer_name"], "Officer John");
}
