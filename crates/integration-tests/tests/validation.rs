//! Identifier validation and moderation visibility.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use tripmate_core::AccountType;
use tripmate_integration_tests::TestApp;

#[tokio::test]
async fn test_malformed_ids_never_reach_the_store() {
    let app = TestApp::new();
    let (_, admin) = app.sign_in("root", AccountType::Admin).await;
    let before = app.store_calls();

    for uri in [
        "/products/12345",
        "/museums/not-an-id",
        "/activities/507f1f77bcf86cd79943901z",
        "/itineraries/507f1f77bcf86cd7994390111",
        "/users/xyz",
    ] {
        let response = app.request(Method::GET, uri, None, Some(&admin)).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(response.body["message"].is_string(), "{uri}");
    }
    let deleted = app
        .request(Method::DELETE, "/museums/nope", None, Some(&admin))
        .await;
    assert_eq!(deleted.status, StatusCode::BAD_REQUEST);

    assert_eq!(app.store_calls(), before);
}

#[tokio::test]
async fn test_well_formed_unknown_id_is_not_found() {
    let app = TestApp::new();
    let response = app.get("/museums/507f1f77bcf86cd799439011").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body, json!({ "message": "Museum not found" }));
}

#[tokio::test]
async fn test_invalid_json_body() {
    let app = TestApp::new();
    let (_, seller) = app.sign_in("seller", AccountType::Seller).await;
    let response = app
        .request(Method::POST, "/products", Some(json!({ "price": 10 })), Some(&seller))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_flagged_activity_hidden_from_public() {
    let app = TestApp::new();
    let (_, advertiser) = app.sign_in("nile-cruises", AccountType::Advertiser).await;
    let created = app
        .request(
            Method::POST,
            "/activities",
            Some(json!({ "name": "Felucca ride", "price": 300 })),
            Some(&advertiser),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    let id = created.body["data"]["id"].as_str().unwrap().to_owned();
    let uri = format!("/activities/{id}");

    let (_, admin) = app.sign_in("root", AccountType::Admin).await;
    let flagged = app
        .request(
            Method::PATCH,
            &format!("{uri}/flag"),
            Some(json!({ "flagged": true })),
            Some(&admin),
        )
        .await;
    assert_eq!(flagged.status, StatusCode::OK);

    assert_eq!(app.get(&uri).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/activities").await.body["data"], json!([]));

    let own = app.request(Method::GET, &uri, None, Some(&advertiser)).await;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.body["data"]["flagged"], true);
}

#[tokio::test]
async fn test_inactive_itinerary_hidden_from_public() {
    let app = TestApp::new();
    let (_, guide) = app.sign_in("guide", AccountType::TourGuide).await;
    let created = app
        .request(
            Method::POST,
            "/itineraries",
            Some(json!({ "name": "Old Cairo walk", "price": 500, "language": "English" })),
            Some(&guide),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    let id = created.body["data"]["id"].as_str().unwrap().to_owned();

    let listed = app.get("/itineraries?language=English").await;
    assert_eq!(listed.body["data"].as_array().unwrap().len(), 1);

    let deactivated = app
        .request(
            Method::PATCH,
            &format!("/itineraries/{id}/active"),
            Some(json!({ "active": false })),
            Some(&guide),
        )
        .await;
    assert_eq!(deactivated.status, StatusCode::OK);
    assert_eq!(deactivated.body["message"], "Itinerary deactivated");

    assert_eq!(app.get("/itineraries").await.body["data"], json!([]));
    assert_eq!(
        app.get(&format!("/itineraries/{id}")).await.status,
        StatusCode::NOT_FOUND
    );
}
