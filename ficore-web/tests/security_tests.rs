//! Security tests for ficore-web
//!
//! Bearer-token authentication, role checks, per-user isolation and
//! sanitization of hostile input.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use ficore_common::api::create_user;
use ficore_common::db::connect_in_memory;
use ficore_common::models::Role;
use ficore_web::{build_router, AppState};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::util::ServiceExt;

struct TestApp {
    app: Router,
    db: SqlitePool,
    trader: String,
    admin: String,
}

async fn setup() -> TestApp {
    let db = connect_in_memory().await.unwrap();
    let (_, trader) = create_user(&db, "Trader", Role::Trader).await.unwrap();
    let (_, admin) = create_user(&db, "Admin", Role::Admin).await.unwrap();
    TestApp {
        app: build_router(AppState::new(db.clone())),
        db,
        trader,
        admin,
    }
}

fn request(method: &str, uri: &str, auth: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = auth {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_missing_token_rejected() {
    let t = setup().await;
    let (status, body) = send(&t.app, request("GET", "/business/home", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Missing bearer token");
}

#[tokio::test]
async fn test_unknown_token_rejected() {
    let t = setup().await;
    let (status, _) = send(
        &t.app,
        request("GET", "/business/home", Some("Bearer not-a-real-token"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_bearer_scheme_rejected() {
    let t = setup().await;
    let (status, _) = send(
        &t.app,
        request("GET", "/business/home", Some(&format!("Basic {}", t.trader)), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_every_protected_route_requires_token() {
    let t = setup().await;
    let routes = [
        ("GET", "/business/view_data"),
        ("GET", "/business/recent_activity"),
        ("POST", "/business/debt/add"),
        ("GET", "/inventory/"),
        ("POST", "/receipts/add"),
        ("POST", "/payments/delete/x"),
        ("GET", "/api/expense_categories"),
        ("GET", "/education/tip"),
        ("GET", "/tax/bands?taxable_income=1"),
        ("GET", "/admin/cleanup/status"),
    ];

    for (method, uri) in routes {
        let (status, _) = send(&t.app, request(method, uri, None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
    }
}

// =============================================================================
// Roles
// =============================================================================

#[tokio::test]
async fn test_admin_routes_forbidden_for_trader() {
    let t = setup().await;
    let token = bearer(&t.trader);

    for (method, uri) in [
        ("GET", "/admin/cleanup/status"),
        ("POST", "/admin/bulk-cleanup"),
        ("POST", "/admin/cleanup/user/someone"),
    ] {
        let (status, body) = send(&t.app, request(method, uri, Some(&token), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{} {}", method, uri);
        assert_eq!(body["error"], "Admin access required");
    }
}

#[tokio::test]
async fn test_admin_can_use_business_routes() {
    let t = setup().await;
    let (status, _) = send(
        &t.app,
        request("GET", "/business/home", Some(&bearer(&t.admin)), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_cleanup_endpoints() {
    let t = setup().await;
    sqlx::query(
        r"INSERT INTO cashflows (id, user_id, type, amount, party_name, created_at)
          VALUES ('dirty', 'victim', 'receipt', 10.0, 'Back\slash', '2026-10-01T00:00:00.000000Z')",
    )
    .execute(&t.db)
    .await
    .unwrap();
    let token = bearer(&t.admin);

    let (status, status_body) = send(
        &t.app,
        request("GET", "/admin/cleanup/status", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(status_body["problems"]["fields"]["party_name"], 1);

    let (status, body) = send(
        &t.app,
        request("POST", "/admin/cleanup/user/victim", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], "victim");
    assert_eq!(body["stats"]["cleaned"], 1);

    let (status, body) = send(
        &t.app,
        request("POST", "/admin/bulk-cleanup", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processed"], 1);
    assert_eq!(body["cleaned"], 0);

    let (_, status_body) = send(
        &t.app,
        request("GET", "/admin/cleanup/status", Some(&token), None),
    )
    .await;
    assert_eq!(status_body["problems"]["total"], 0);
}

#[tokio::test]
async fn test_admin_user_id_is_sanitized() {
    let t = setup().await;
    let (status, body) = send(
        &t.app,
        request("POST", "/admin/cleanup/user/%3C%3E", Some(&bearer(&t.admin)), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid user ID");
}

// =============================================================================
// Isolation and sanitization
// =============================================================================

#[tokio::test]
async fn test_users_cannot_see_each_others_data() {
    let t = setup().await;
    let today = chrono::Utc::now().date_naive().to_string();

    let (status, created) = send(
        &t.app,
        request(
            "POST",
            "/receipts/add",
            Some(&bearer(&t.trader)),
            Some(json!({"party_name": "Chinedu", "date": today, "amount": 100.0})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["cashflow"]["id"].as_str().unwrap().to_string();

    let admin = bearer(&t.admin);
    let (_, recent) = send(
        &t.app,
        request("GET", "/business/recent_activity", Some(&admin), None),
    )
    .await;
    assert!(recent.as_array().unwrap().is_empty());

    let (status, _) = send(
        &t.app,
        request("POST", &format!("/receipts/delete/{}", id), Some(&admin), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_hostile_input_is_sanitized_before_storage() {
    let t = setup().await;
    let today = chrono::Utc::now().date_naive().to_string();

    let (status, created) = send(
        &t.app,
        request(
            "POST",
            "/payments/add",
            Some(&bearer(&t.trader)),
            Some(json!({
                "party_name": "<Bola> Ventures",
                "date": today,
                "amount": 250.0,
                "expense_category": "office_admin",
                "description": "paper {and} [ink] \\ \"quoted\""
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let cashflow = &created["cashflow"];
    assert_eq!(cashflow["party_name"], "Bola Ventures");
    let description = cashflow["description"].as_str().unwrap();
    for forbidden in ['<', '>', '{', '}', '[', ']', '"'] {
        assert!(!description.contains(forbidden), "{:?} kept in {}", forbidden, description);
    }
}
