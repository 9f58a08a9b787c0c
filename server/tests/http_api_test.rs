//! HTTP API integration tests.
//!
//! Drives the real router over in-memory stores with minted bearer tokens,
//! checking routing, auth gates, status codes and JSON shapes.

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::too_many_lines)] // Scenario tests read top to bottom

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::Duration;
use crewbook_auth::{JwtService, UserRole};
use crewbook_core::{BookingId, BookingStatus, UserId, WorkerId};
use crewbook_server::{AppState, Config, build_router};
use crewbook_testing::Marketplace;
use crewbook_web::handlers::{HealthCheck, ReadinessProbe};
use serde_json::{Value, json};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

struct Probe(bool);

impl ReadinessProbe for Probe {
    fn check(&self) -> Pin<Box<dyn Future<Output = HealthCheck> + Send + '_>> {
        let health = if self.0 {
            HealthCheck::healthy("database")
        } else {
            HealthCheck::unhealthy("database", "connection refused")
        };
        Box::pin(async move { health })
    }
}

struct TestApp {
    server: TestServer,
    market: Marketplace,
    jwt: Arc<JwtService>,
}

impl TestApp {
    fn new() -> Self {
        Self::with_probe(Probe(true))
    }

    fn with_probe(probe: Probe) -> Self {
        let market = Marketplace::new();
        let jwt = Arc::new(JwtService::new("http-test-secret"));
        let state = AppState::new(
            market.lifecycle.clone(),
            market.resolver.clone(),
            jwt.clone(),
            Arc::new(probe),
        );
        let server = TestServer::new(build_router(state, &Config::default().server)).unwrap();
        Self {
            server,
            market,
            jwt,
        }
    }

    fn token(&self, user_id: UserId, role: UserRole) -> String {
        self.jwt
            .issue(user_id, "someone@example.com", role, Duration::hours(1))
            .unwrap()
    }

    /// A registered customer and a token for them.
    fn customer(&self) -> String {
        let (user_id, _) = self.market.identity.register_customer("Ada", "Lovelace");
        self.token(user_id, UserRole::Customer)
    }

    /// A registered worker, their worker id and a token for them.
    fn worker(&self, name: &str) -> (WorkerId, String) {
        let (user_id, worker_id) = self.market.identity.register_worker(name, "Tiling");
        (worker_id, self.token(user_id, UserRole::Worker))
    }

    async fn post_open_booking(&self, customer: &str) -> String {
        let response = self
            .server
            .post("/api/v1/bookings")
            .authorization_bearer(customer)
            .json(&booking_body(true))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()["booking"]["id"]
            .as_str()
            .unwrap()
            .to_string()
    }

    async fn apply(&self, worker: &str, booking_id: &str) -> String {
        let response = self
            .server
            .post("/api/v1/applications")
            .authorization_bearer(worker)
            .json(&json!({ "bookingId": booking_id, "message": "Available Monday", "proposedPrice": 450.0 }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()["application"]["id"]
            .as_str()
            .unwrap()
            .to_string()
    }
}

/// Scheduled a week after the harness clock (2025-01-01).
fn booking_body(is_open: bool) -> Value {
    json!({
        "isOpen": is_open,
        "title": "Retile bathroom floor",
        "description": "Remove old tiles and lay new porcelain",
        "scheduledDate": "2025-01-08T09:00:00Z",
        "durationHours": 8,
        "location": "12 Harbour Street",
        "totalCost": 480.0
    })
}

fn error_code(response: &axum_test::TestResponse) -> String {
    response.json::<Value>()["code"].as_str().unwrap().to_string()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_is_unauthenticated() {
    let app = TestApp::new();
    let response = app.server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "ok");
}

#[tokio::test]
async fn test_ready_reflects_probe() {
    let ready = TestApp::new().server.get("/ready").await;
    ready.assert_status_ok();
    assert_eq!(ready.json::<Value>()["status"], "Healthy");

    let down = TestApp::with_probe(Probe(false)).server.get("/ready").await;
    down.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(down.json::<Value>()["message"], "connection refused");
}

#[tokio::test]
async fn test_correlation_id_is_echoed() {
    let app = TestApp::new();
    let id = "3b0f1f5e-8b1e-4d7a-9a57-2d5b2f1f3c11";
    let response = app
        .server
        .get("/health")
        .add_header(
            "x-correlation-id".parse::<axum::http::HeaderName>().unwrap(),
            id.parse::<axum::http::HeaderValue>().unwrap(),
        )
        .await;
    assert_eq!(response.header("x-correlation-id"), id);
}

// ============================================================================
// Auth gates
// ============================================================================

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = TestApp::new();
    let response = app.server.get("/api/v1/bookings/open").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&response), "UNAUTHORIZED");
}

#[tokio::test]
async fn test_token_signed_elsewhere_is_unauthorized() {
    let app = TestApp::new();
    let forged = JwtService::new("not-the-server-secret")
        .issue(UserId::new(), "x@example.com", UserRole::Worker, Duration::hours(1))
        .unwrap();
    app.server
        .get("/api/v1/bookings/open")
        .authorization_bearer(forged)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_customer_cannot_use_worker_routes() {
    let app = TestApp::new();
    let customer = app.customer();
    let response = app
        .server
        .get("/api/v1/bookings/open")
        .authorization_bearer(&customer)
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(error_code(&response), "FORBIDDEN");
}

#[tokio::test]
async fn test_worker_cannot_create_bookings() {
    let app = TestApp::new();
    let (_, worker) = app.worker("Sam");
    app.server
        .post("/api/v1/bookings")
        .authorization_bearer(&worker)
        .json(&booking_body(true))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

// ============================================================================
// Bookings
// ============================================================================

#[tokio::test]
async fn test_create_booking_returns_pending_booking() {
    let app = TestApp::new();
    let customer = app.customer();

    let response = app
        .server
        .post("/api/v1/bookings")
        .authorization_bearer(&customer)
        .json(&booking_body(true))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body = response.json::<Value>();
    assert_eq!(body["booking"]["status"], "pending");
    assert_eq!(body["booking"]["isOpen"], true);
    assert_eq!(body["booking"]["workerId"], Value::Null);
    assert_eq!(body["message"], "Booking created successfully");
}

#[tokio::test]
async fn test_create_booking_in_the_past_is_rejected() {
    let app = TestApp::new();
    let customer = app.customer();
    let mut body = booking_body(true);
    body["scheduledDate"] = json!("2024-12-01T09:00:00Z");

    let response = app
        .server
        .post("/api/v1/bookings")
        .authorization_bearer(&customer)
        .json(&body)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_create_booking_without_title_is_validation_error() {
    let app = TestApp::new();
    let customer = app.customer();
    let mut body = booking_body(true);
    body.as_object_mut().unwrap().remove("title");

    let response = app
        .server
        .post("/api/v1/bookings")
        .authorization_bearer(&customer)
        .json(&body)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let error = response.json::<Value>();
    assert_eq!(error["code"], "VALIDATION_ERROR");
    assert!(error["message"].as_str().unwrap().contains("title"));
    assert!(app.market.bookings.is_empty());
}

#[tokio::test]
async fn test_non_json_body_is_bad_request() {
    let app = TestApp::new();
    let customer = app.customer();

    let response = app
        .server
        .post("/api/v1/bookings")
        .authorization_bearer(&customer)
        .text("title=Retile")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "BAD_REQUEST");
}

#[tokio::test]
async fn test_malformed_booking_id_is_bad_request() {
    let app = TestApp::new();
    let (_, worker) = app.worker("Sam");

    let response = app
        .server
        .get("/api/v1/bookings/not-a-uuid")
        .authorization_bearer(&worker)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "BAD_REQUEST");
}

#[tokio::test]
async fn test_status_override_without_status_is_validation_error() {
    let app = TestApp::new();
    let customer = app.customer();
    let booking_id = app.post_open_booking(&customer).await;

    let response = app
        .server
        .patch(&format!("/api/v1/bookings/{booking_id}/status"))
        .authorization_bearer(&customer)
        .json(&json!({ "state": "completed" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_customer_without_profile_gets_404() {
    let app = TestApp::new();
    let stranger = app.token(UserId::new(), UserRole::Customer);

    let response = app
        .server
        .post("/api/v1/bookings")
        .authorization_bearer(&stranger)
        .json(&booking_body(true))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(error_code(&response), "PROFILE_NOT_FOUND");
}

#[tokio::test]
async fn test_claim_race_has_one_winner() {
    let app = TestApp::new();
    let customer = app.customer();
    let booking_id = app.post_open_booking(&customer).await;
    let (w1, first) = app.worker("Sam");
    let (_, second) = app.worker("Kim");

    let open = app
        .server
        .get("/api/v1/bookings/open")
        .authorization_bearer(&first)
        .await;
    assert_eq!(open.json::<Value>()["count"], 1);

    let won = app
        .server
        .put(&format!("/api/v1/bookings/{booking_id}/claim"))
        .authorization_bearer(&first)
        .await;
    won.assert_status_ok();
    assert_eq!(won.json::<Value>()["booking"]["workerId"], w1.to_string());
    assert_eq!(won.json::<Value>()["booking"]["isOpen"], false);

    for _ in 0..2 {
        let lost = app
            .server
            .put(&format!("/api/v1/bookings/{booking_id}/claim"))
            .authorization_bearer(&second)
            .await;
        lost.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(error_code(&lost), "ALREADY_CLAIMED");
    }

    let open = app
        .server
        .get("/api/v1/bookings/open")
        .authorization_bearer(&first)
        .await;
    assert_eq!(open.json::<Value>()["count"], 0);
}

#[tokio::test]
async fn test_claim_for_someone_else_is_forbidden() {
    let app = TestApp::new();
    let customer = app.customer();
    let booking_id = app.post_open_booking(&customer).await;
    let (_, worker) = app.worker("Sam");
    let (other, _) = app.worker("Kim");

    app.server
        .put(&format!("/api/v1/bookings/{booking_id}/claim"))
        .authorization_bearer(&worker)
        .json(&json!({ "workerId": other }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let booking = app
        .market
        .lifecycle
        .get_booking(booking_id.parse().unwrap())
        .await
        .unwrap();
    assert!(booking.is_claimable());
}

#[tokio::test]
async fn test_claim_creates_worker_record_on_first_use() {
    let app = TestApp::new();
    let customer = app.customer();
    let booking_id = app.post_open_booking(&customer).await;
    let new_user = app.market.identity.register_user("Lee", "Chen");
    let token = app.token(new_user, UserRole::Worker);

    let response = app
        .server
        .put(&format!("/api/v1/bookings/{booking_id}/claim"))
        .authorization_bearer(&token)
        .await;

    response.assert_status_ok();
    assert!(response.json::<Value>()["booking"]["workerId"].is_string());
}

#[tokio::test]
async fn test_decline_then_complete_fails() {
    let app = TestApp::new();
    let customer = app.customer();
    let booking_id = app.post_open_booking(&customer).await;
    let (_, worker) = app.worker("Sam");

    app.server
        .put(&format!("/api/v1/bookings/{booking_id}/decline"))
        .authorization_bearer(&worker)
        .await
        .assert_status_ok();

    let response = app
        .server
        .put(&format!("/api/v1/bookings/{booking_id}/complete"))
        .authorization_bearer(&worker)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "INVALID_TRANSITION");

    let current = app
        .server
        .get(&format!("/api/v1/bookings/{booking_id}"))
        .authorization_bearer(&worker)
        .await;
    assert_eq!(current.json::<Value>()["status"], "declined");
}

#[tokio::test]
async fn test_accept_then_complete() {
    let app = TestApp::new();
    let customer = app.customer();
    let booking_id = app.post_open_booking(&customer).await;
    let (_, worker) = app.worker("Sam");

    let accepted = app
        .server
        .put(&format!("/api/v1/bookings/{booking_id}/accept"))
        .authorization_bearer(&worker)
        .await;
    accepted.assert_status_ok();
    assert_eq!(accepted.json::<Value>()["booking"]["status"], "accepted");

    let completed = app
        .server
        .put(&format!("/api/v1/bookings/{booking_id}/complete"))
        .authorization_bearer(&worker)
        .await;
    completed.assert_status_ok();
    assert_eq!(completed.json::<Value>()["booking"]["status"], "completed");
}

#[tokio::test]
async fn test_cancel_keeps_the_booking() {
    let app = TestApp::new();
    let customer = app.customer();
    let booking_id = app.post_open_booking(&customer).await;

    let response = app
        .server
        .delete(&format!("/api/v1/bookings/{booking_id}"))
        .authorization_bearer(&customer)
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["booking"]["status"], "cancelled");
    assert_eq!(response.json::<Value>()["booking"]["isOpen"], false);

    let again = app
        .server
        .delete(&format!("/api/v1/bookings/{booking_id}"))
        .authorization_bearer(&customer)
        .await;
    again.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_status_override_skips_transition_checks() {
    let app = TestApp::new();
    let customer = app.customer();
    let booking_id = app.post_open_booking(&customer).await;

    let response = app
        .server
        .patch(&format!("/api/v1/bookings/{booking_id}/status"))
        .authorization_bearer(&customer)
        .json(&json!({ "status": "completed" }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["booking"]["status"], "completed");

    let unknown = app
        .server
        .patch(&format!("/api/v1/bookings/{booking_id}/status"))
        .authorization_bearer(&customer)
        .json(&json!({ "status": "archived" }))
        .await;
    unknown.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&unknown), "VALIDATION_ERROR");

    let booking = app
        .market
        .lifecycle
        .get_booking(booking_id.parse().unwrap())
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Completed);
}

#[tokio::test]
async fn test_missing_booking_is_404() {
    let app = TestApp::new();
    let (_, worker) = app.worker("Sam");

    let response = app
        .server
        .put(&format!("/api/v1/bookings/{}/accept", BookingId::new()))
        .authorization_bearer(&worker)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(error_code(&response), "NOT_FOUND");
}

#[tokio::test]
async fn test_user_bookings_follow_the_callers_role() {
    let app = TestApp::new();
    let (customer_user, _) = app.market.identity.register_customer("Ada", "Lovelace");
    let customer = app.token(customer_user, UserRole::Customer);
    let booking_id = app.post_open_booking(&customer).await;
    let (worker_user, _) = app.market.identity.register_worker("Sam", "Tiling");
    let worker = app.token(worker_user, UserRole::Worker);

    let mine = app
        .server
        .get(&format!("/api/v1/bookings/user/{customer_user}"))
        .authorization_bearer(&customer)
        .await;
    mine.assert_status_ok();
    assert_eq!(mine.json::<Value>()["count"], 1);
    assert_eq!(mine.json::<Value>()["bookings"][0]["id"], booking_id);

    let assigned = app
        .server
        .get(&format!("/api/v1/bookings/user/{worker_user}"))
        .authorization_bearer(&worker)
        .await;
    assigned.assert_status_ok();
    assert_eq!(assigned.json::<Value>()["count"], 0);
}

// ============================================================================
// Applications
// ============================================================================

#[tokio::test]
async fn test_accept_application_assigns_worker_and_rejects_siblings() {
    let app = TestApp::new();
    let customer = app.customer();
    let booking_id = app.post_open_booking(&customer).await;
    let (w1, first) = app.worker("Sam");
    let (_, second) = app.worker("Kim");

    let a1 = app.apply(&first, &booking_id).await;
    let a2 = app.apply(&second, &booking_id).await;

    let listed = app
        .server
        .get(&format!("/api/v1/applications/booking/{booking_id}"))
        .authorization_bearer(&customer)
        .await;
    listed.assert_status_ok();
    let listed = listed.json::<Value>();
    assert_eq!(listed["count"], 2);
    assert!(listed["applications"][0]["worker"]["specialty"].is_string());

    let accepted = app
        .server
        .put(&format!("/api/v1/applications/{a1}/accept"))
        .authorization_bearer(&customer)
        .await;
    accepted.assert_status_ok();
    let body = accepted.json::<Value>();
    assert_eq!(body["application"]["status"], "accepted");
    assert_eq!(body["booking"]["workerId"], w1.to_string());
    assert_eq!(body["rejected"], json!([a2]));
    assert_eq!(body["unresolved"], json!([]));

    let mine = app
        .server
        .get("/api/v1/applications/my")
        .authorization_bearer(&second)
        .await;
    mine.assert_status_ok();
    let mine = mine.json::<Value>();
    assert_eq!(mine["applications"][0]["status"], "rejected");
    assert_eq!(mine["applications"][0]["booking"]["id"], booking_id);
}

#[tokio::test]
async fn test_duplicate_application_is_rejected() {
    let app = TestApp::new();
    let customer = app.customer();
    let booking_id = app.post_open_booking(&customer).await;
    let (_, worker) = app.worker("Sam");

    app.apply(&worker, &booking_id).await;

    let response = app
        .server
        .post("/api/v1/applications")
        .authorization_bearer(&worker)
        .json(&json!({ "bookingId": booking_id, "proposedPrice": 400.0 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "DUPLICATE_APPLICATION");
}

#[tokio::test]
async fn test_apply_to_direct_booking_is_refused() {
    let app = TestApp::new();
    let customer = app.customer();
    let created = app
        .server
        .post("/api/v1/bookings")
        .authorization_bearer(&customer)
        .json(&booking_body(false))
        .await;
    created.assert_status(StatusCode::CREATED);
    let booking_id = created.json::<Value>()["booking"]["id"].clone();
    let (_, worker) = app.worker("Sam");

    let response = app
        .server
        .post("/api/v1/applications")
        .authorization_bearer(&worker)
        .json(&json!({ "bookingId": booking_id }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "NOT_ACCEPTING_APPLICATIONS");
}

#[tokio::test]
async fn test_reject_twice_is_invalid_state() {
    let app = TestApp::new();
    let customer = app.customer();
    let booking_id = app.post_open_booking(&customer).await;
    let (_, worker) = app.worker("Sam");
    let application_id = app.apply(&worker, &booking_id).await;

    let rejected = app
        .server
        .put(&format!("/api/v1/applications/{application_id}/reject"))
        .authorization_bearer(&customer)
        .await;
    rejected.assert_status_ok();
    assert_eq!(rejected.json::<Value>()["application"]["status"], "rejected");

    let again = app
        .server
        .put(&format!("/api/v1/applications/{application_id}/reject"))
        .authorization_bearer(&customer)
        .await;
    again.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&again), "INVALID_STATE");

    let booking = app
        .market
        .lifecycle
        .get_booking(booking_id.parse().unwrap())
        .await
        .unwrap();
    assert!(booking.is_claimable());
}
