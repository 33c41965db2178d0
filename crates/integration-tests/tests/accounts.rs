//! Registration, login and account management over HTTP.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use tripmate_core::AccountType;
use tripmate_integration_tests::{PASSWORD, TestApp};

async fn register(app: &TestApp, username: &str, account_type: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .request(
            Method::POST,
            "/auth/register",
            Some(json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": PASSWORD,
                "account_type": account_type,
                "nationality": "Egyptian",
            })),
            None,
        )
        .await;
    (response.status, response.body)
}

#[tokio::test]
async fn test_tourist_registers_and_logs_in() {
    let app = TestApp::new();
    let (status, body) = register(&app, "amira", "Tourist").await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["message"], "Account created");
    assert_eq!(body["data"]["accepted"], true);
    assert!(body["data"].get("password_hash").is_none());

    // Login by email works as well as by username.
    let cookie = app.login("amira@example.com").await;
    let me = app.request(Method::GET, "/users/me", None, Some(&cookie)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["data"]["username"], "amira");
    assert_eq!(me.body["data"]["nationality"], "Egyptian");

    let out = app.request(Method::POST, "/auth/logout", None, Some(&cookie)).await;
    assert_eq!(out.status, StatusCode::OK);
    let me = app.request(Method::GET, "/users/me", None, Some(&cookie)).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_registration_rejections() {
    let app = TestApp::new();
    assert_eq!(register(&app, "amira", "Tourist").await.0, StatusCode::CREATED);
    assert_eq!(register(&app, "amira", "Tourist").await.0, StatusCode::CONFLICT);
    assert_eq!(register(&app, "root", "Admin").await.0, StatusCode::FORBIDDEN);
    assert_eq!(register(&app, "ghost", "Pharaoh").await.0, StatusCode::BAD_REQUEST);

    let weak = app
        .request(
            Method::POST,
            "/auth/register",
            Some(json!({ "username": "weak", "password": "short", "account_type": "Tourist" })),
            None,
        )
        .await;
    assert_eq!(weak.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_seller_waits_for_acceptance() {
    let app = TestApp::new();
    let (status, body) = register(&app, "bazaar", "Seller").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Account created, pending approval");
    let id = body["data"]["id"].as_str().unwrap().to_owned();

    let refused = app
        .request(
            Method::POST,
            "/auth/login",
            Some(json!({ "username": "bazaar", "password": PASSWORD })),
            None,
        )
        .await;
    assert_eq!(refused.status, StatusCode::FORBIDDEN);

    let (_, admin) = app.sign_in("root", AccountType::Admin).await;
    let accepted = app
        .request(Method::PATCH, &format!("/users/{id}/accept"), None, Some(&admin))
        .await;
    assert_eq!(accepted.status, StatusCode::OK);
    assert_eq!(accepted.body["data"]["accepted"], true);

    app.login("bazaar").await;
}

#[tokio::test]
async fn test_wrong_password() {
    let app = TestApp::new();
    app.provision("amira", AccountType::Tourist).await;
    let response = app
        .request(
            Method::POST,
            "/auth/login",
            Some(json!({ "username": "amira", "password": "not-the-password-1" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.cookie.is_none());
}

#[tokio::test]
async fn test_user_admin_endpoints() {
    let app = TestApp::new();
    let (tourist, cookie) = app.sign_in("amira", AccountType::Tourist).await;
    let listing = app.request(Method::GET, "/users", None, Some(&cookie)).await;
    assert_eq!(listing.status, StatusCode::FORBIDDEN);

    let (_, admin) = app.sign_in("root", AccountType::Admin).await;
    let tourists = app
        .request(Method::GET, "/users?account_type=Tourist", None, Some(&admin))
        .await;
    assert_eq!(tourists.status, StatusCode::OK);
    assert_eq!(tourists.body["data"].as_array().unwrap().len(), 1);

    let uri = format!("/users/{}", tourist.id);
    let deleted = app.request(Method::DELETE, &uri, None, Some(&admin)).await;
    assert_eq!(deleted.status, StatusCode::OK);
    let gone = app.request(Method::GET, &uri, None, Some(&admin)).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}
