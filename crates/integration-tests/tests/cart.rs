//! Cart flows over HTTP.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use tripmate_core::AccountType;
use tripmate_integration_tests::{TestApp, number};

/// Create a product as a fresh seller and return its id.
async fn listed_product(app: &TestApp, price: f64, stock: u32) -> String {
    let (_, seller) = app.sign_in("seller", AccountType::Seller).await;
    let response = app
        .request(
            Method::POST,
            "/products",
            Some(json!({ "name": "Papyrus scroll", "price": price, "available_quantity": stock })),
            Some(&seller),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.body["data"]["id"].as_str().unwrap().to_owned()
}

async fn add(app: &TestApp, cookie: &str, product: &str, quantity: i64) -> (StatusCode, Value) {
    let response = app
        .request(
            Method::POST,
            "/cart",
            Some(json!({ "productId": product, "quantity": quantity })),
            Some(cookie),
        )
        .await;
    (response.status, response.body)
}

#[tokio::test]
async fn test_quantity_bounded_by_stock() {
    let app = TestApp::new();
    let product = listed_product(&app, 150.0, 3).await;
    let (_, tourist) = app.sign_in("tourist", AccountType::Tourist).await;

    let (status, body) = add(&app, &tourist, &product, 2).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Product added to cart");
    assert_eq!(body["cart"], json!([{ "product": product, "quantity": 2 }]));

    // Replaces rather than adds: 3 is within stock even though 2 + 3 is not.
    let (status, body) = add(&app, &tourist, &product, 3).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Cart quantity updated");
    assert_eq!(body["cart"][0]["quantity"], 3);

    let (status, _) = add(&app, &tourist, &product, 4).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let cart = app.request(Method::GET, "/cart", None, Some(&tourist)).await;
    assert_eq!(cart.body["cart"][0]["quantity"], 3);
}

#[tokio::test]
async fn test_non_positive_quantity_leaves_cart_unchanged() {
    let app = TestApp::new();
    let product = listed_product(&app, 20.0, 5).await;
    let (_, tourist) = app.sign_in("tourist", AccountType::Tourist).await;
    add(&app, &tourist, &product, 1).await;

    for quantity in [0, -2] {
        let (status, body) = add(&app, &tourist, &product, quantity).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert!(body["message"].is_string());
    }

    let cart = app.request(Method::GET, "/cart", None, Some(&tourist)).await;
    assert_eq!(cart.body["cart"].as_array().unwrap().len(), 1);
    assert_eq!(cart.body["cart"][0]["quantity"], 1);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let app = TestApp::new();
    let (_, tourist) = app.sign_in("tourist", AccountType::Tourist).await;

    let (status, _) = add(&app, &tourist, "507f1f77bcf86cd799439011", 1).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = add(&app, &tourist, "not-an-id", 1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_remove_line() {
    let app = TestApp::new();
    let product = listed_product(&app, 20.0, 5).await;
    let (_, tourist) = app.sign_in("tourist", AccountType::Tourist).await;
    add(&app, &tourist, &product, 2).await;

    let uri = format!("/cart/{product}");
    let removed = app.request(Method::DELETE, &uri, None, Some(&tourist)).await;
    assert_eq!(removed.status, StatusCode::OK);
    assert_eq!(removed.body["cart"], json!([]));

    let again = app.request(Method::DELETE, &uri, None, Some(&tourist)).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cart_localized_to_requested_currency() {
    let app = TestApp::new();
    let product = listed_product(&app, 150.0, 5).await;
    let (_, tourist) = app.sign_in("tourist", AccountType::Tourist).await;
    add(&app, &tourist, &product, 2).await;

    let cart = app
        .request(Method::GET, "/cart?currency=EUR", None, Some(&tourist))
        .await;
    assert_eq!(cart.status, StatusCode::OK);
    assert_eq!(cart.body["currency"], "EUR");
    let entry = &cart.body["cart"][0];
    assert_eq!(entry["quantity"], 2);
    assert!((number(&entry["product"]["price"]) - 135.0).abs() < f64::EPSILON);

    // The stored price is untouched.
    let stored = app.get(&format!("/products/{product}")).await;
    assert!((number(&stored.body["data"]["price"]) - 150.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_cart_requires_tourist() {
    let app = TestApp::new();
    let anonymous = app.get("/cart").await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let (_, seller) = app.sign_in("seller", AccountType::Seller).await;
    let forbidden = app.request(Method::GET, "/cart", None, Some(&seller)).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
}
