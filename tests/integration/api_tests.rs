//! API integration tests
//!
//! Need a running server. The admin flows also need an administrator
//! account, given by `ADMIN_EMAIL` / `ADMIN_PASSWORD`.

use reqwest::Client;
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080/api/v1";

fn base_url() -> String {
    std::env::var("BASE_URL").unwrap_or_else(|_| BASE_URL.to_string())
}

/// Register a fresh buyer and return (email, password)
async fn register_buyer(client: &Client) -> (String, String) {
    let email = format!("buyer-{}@example.com", Uuid::new_v4());
    let password = "correct-horse-battery".to_string();

    let response = client
        .post(format!("{}/users", base_url()))
        .json(&json!({
            "name": "Test Buyer",
            "email": email,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(response.status(), 201);

    (email, password)
}

async fn login(client: &Client, email: &str, password: &str) -> Value {
    let response = client
        .post(format!("{}/users/login", base_url()))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["data"].clone()
}

async fn buyer_token(client: &Client) -> String {
    let (email, password) = register_buyer(client).await;
    let tokens = login(client, &email, &password).await;
    tokens["access_token"].as_str().expect("No token in response").to_string()
}

async fn admin_token(client: &Client) -> String {
    let email = std::env::var("ADMIN_EMAIL").expect("ADMIN_EMAIL not set");
    let password = std::env::var("ADMIN_PASSWORD").expect("ADMIN_PASSWORD not set");
    let tokens = login(client, &email, &password).await;
    tokens["access_token"].as_str().expect("No token in response").to_string()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_register_login_and_profile() {
    let client = Client::new();
    let (email, password) = register_buyer(&client).await;

    let tokens = login(&client, &email.to_uppercase(), &password).await;
    assert_eq!(tokens["token_type"], "Bearer");
    assert!(tokens["refresh_token"].is_string());

    let response = client
        .get(format!("{}/users", base_url()))
        .bearer_auth(tokens["access_token"].as_str().unwrap())
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["email"], email);
    assert_eq!(body["data"]["role"], "buyer");
    assert!(body["data"].get("password").is_none());
}

#[tokio::test]
#[ignore]
async fn test_duplicate_registration_conflicts() {
    let client = Client::new();
    let (email, _) = register_buyer(&client).await;

    let response = client
        .post(format!("{}/users", base_url()))
        .json(&json!({
            "name": "Someone Else",
            "email": email.to_uppercase(),
            "password": "another-password"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["data"].is_null());
    assert_eq!(body["errors"]["code"], "CONFLICT");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();
    let (email, _) = register_buyer(&client).await;

    let response = client
        .post(format!("{}/users/login", base_url()))
        .json(&json!({ "email": email, "password": "wrong-password" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_refresh_token_exchange() {
    let client = Client::new();
    let (email, password) = register_buyer(&client).await;
    let tokens = login(&client, &email, &password).await;

    let response = client
        .post(format!("{}/users/refresh", base_url()))
        .json(&json!({ "refresh_token": tokens["refresh_token"] }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    // An access token is not accepted as a refresh token
    let response = client
        .post(format!("{}/users/refresh", base_url()))
        .json(&json!({ "refresh_token": tokens["access_token"] }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_list_venues_paging_envelope() {
    let client = Client::new();

    let response = client
        .get(format!("{}/venues?page=0&size=0&sort=password&order=sideways", base_url()))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["data"].is_array());
    assert_eq!(body["paging"]["page"], 1);
    assert_eq!(body["paging"]["size"], 10);
    assert!(body["paging"]["total_item"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_missing_event_is_not_found() {
    let client = Client::new();

    let response = client
        .get(format!("{}/events/999999999", base_url()))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["errors"]["code"], "NOT_FOUND");
}

#[tokio::test]
#[ignore]
async fn test_buyer_cannot_create_venue() {
    let client = Client::new();
    let token = buyer_token(&client).await;

    let response = client
        .post(format!("{}/venues", base_url()))
        .bearer_auth(&token)
        .json(&json!({
            "name": "Garage",
            "address": "1 Side St",
            "capacity": 10,
            "city": "Bandung",
            "state": "West Java",
            "zip": "40111"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_orders_require_authentication() {
    let client = Client::new();

    let response = client
        .get(format!("{}/orders", base_url()))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_ticketing_flow() {
    let client = Client::new();
    let admin = admin_token(&client).await;

    let venue: Value = client
        .post(format!("{}/venues", base_url()))
        .bearer_auth(&admin)
        .json(&json!({
            "name": "Small Room",
            "address": "2 Main St",
            "capacity": 3,
            "city": "Bandung",
            "state": "West Java",
            "zip": "40111"
        }))
        .send()
        .await
        .expect("Failed to create venue")
        .json()
        .await
        .expect("Failed to parse venue");
    let venue_id = venue["data"]["id"].as_i64().expect("venue id");

    let event: Value = client
        .post(format!("{}/events", base_url()))
        .bearer_auth(&admin)
        .json(&json!({
            "venue_id": venue_id,
            "name": "Annual Event",
            "description": "Integration test",
            "date": "2030-05-01",
            "time": "19:30:00"
        }))
        .send()
        .await
        .expect("Failed to create event")
        .json()
        .await
        .expect("Failed to parse event");
    let event_id = event["data"]["id"].as_i64().expect("event id");

    let response = client
        .post(format!("{}/tickets", base_url()))
        .bearer_auth(&admin)
        .json(&json!({ "event_id": event_id, "price": "50.00", "type": "vip", "count": 2 }))
        .send()
        .await
        .expect("Failed to issue tickets");
    assert_eq!(response.status(), 201);
    let issued: Value = response.json().await.expect("Failed to parse tickets");
    let tickets = issued["data"].as_array().expect("tickets");
    assert_eq!(tickets[0]["seat_number"], "VIP-001");
    assert_eq!(tickets[1]["seat_number"], "VIP-002");

    // Capacity is 3, two are issued
    let response = client
        .post(format!("{}/tickets", base_url()))
        .bearer_auth(&admin)
        .json(&json!({ "event_id": event_id, "price": "20.00", "type": "regular", "count": 2 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);

    let buyer = buyer_token(&client).await;
    let ticket_ids: Vec<Value> = tickets.iter().map(|t| t["id"].clone()).collect();

    let response = client
        .post(format!("{}/orders", base_url()))
        .bearer_auth(&buyer)
        .json(&json!({ "ticket_ids": ticket_ids }))
        .send()
        .await
        .expect("Failed to place order");
    assert_eq!(response.status(), 201);
    let order: Value = response.json().await.expect("Failed to parse order");
    let order_id = order["data"]["id"].as_i64().expect("order id");
    assert_eq!(order["data"]["status"], "pending");
    assert_eq!(order["data"]["total_price"], "100.00");

    // The same tickets cannot be sold twice
    let other_buyer = buyer_token(&client).await;
    let response = client
        .post(format!("{}/orders", base_url()))
        .bearer_auth(&other_buyer)
        .json(&json!({ "ticket_ids": ticket_ids }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // Other buyers cannot see the order
    let response = client
        .get(format!("{}/orders/{}", base_url(), order_id))
        .bearer_auth(&other_buyer)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);

    // Owner cancels, tickets are released
    let response = client
        .put(format!("{}/orders/{}", base_url(), order_id))
        .bearer_auth(&buyer)
        .json(&json!({ "status": "cancelled" }))
        .send()
        .await
        .expect("Failed to cancel order");
    assert!(response.status().is_success());
    let cancelled: Value = response.json().await.expect("Failed to parse order");
    assert_eq!(cancelled["data"]["status"], "cancelled");
    assert_eq!(cancelled["data"]["tickets"].as_array().map(Vec::len), Some(0));

    let response = client
        .get(format!("{}/tickets?event_id={}&seat_numbers=VIP-001,VIP-002", base_url(), event_id))
        .send()
        .await
        .expect("Failed to list tickets");
    let listed: Value = response.json().await.expect("Failed to parse tickets");
    assert_eq!(listed["paging"]["total_item"], 2);
    assert!(listed["data"]
        .as_array()
        .expect("tickets")
        .iter()
        .all(|t| t["order_id"].is_null()));
}
