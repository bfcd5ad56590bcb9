#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use cleantrack_api::auth::jwt::{generate_access_token, JwtConfig};
use cleantrack_api::config::ServerConfig;
use cleantrack_api::routes;
use cleantrack_api::state::AppState;
use cleantrack_core::roles::Role;
use cleantrack_core::types::DbId;
use cleantrack_db::models::equipment::{CreateEquipment, Equipment};
use cleantrack_db::models::facility::CreateFacility;
use cleantrack_db::models::user::CreateUser;
use cleantrack_db::repositories::{EquipmentRepo, FacilityRepo, UserRepo};
use cleantrack_events::EventBus;

/// Build a test `ServerConfig` with fixed secrets and the production
/// defaults for token lifetime and the due-soon window.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-jwt-secret".to_string(),
            access_token_expiry_mins: 15,
        },
        token_secret: "test-token-secret".to_string(),
        public_token_ttl_minutes: 5,
        due_soon_warning_percent: 20,
        sweep_interval_secs: 900,
        report_interval_secs: 7 * 24 * 3600,
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack (CORS, request ID, timeout, tracing,
/// panic recovery) that production uses. No notification dispatcher is
/// subscribed, so published events are dropped.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_config(pool, test_config())
}

/// Like [`build_test_app`] with a caller-supplied configuration.
pub fn build_test_app_with_config(pool: PgPool, config: ServerConfig) -> Router {
    let state = AppState::new(pool, config, Arc::new(EventBus::default()))
        .expect("test config is valid");

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::GET, uri, None, Some(token)).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::POST, uri, Some(body), None).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send(app, Method::POST, uri, Some(body), Some(token)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send(app, Method::PUT, uri, Some(body), Some(token)).await
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
    token: Option<&str>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

/// Read the response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Seeding helpers
// ---------------------------------------------------------------------------

/// Bearer token for the given user, signed with the test JWT secret.
pub fn token_for(user_id: DbId, role: Role) -> String {
    generate_access_token(user_id, role.as_str(), &test_config().jwt).unwrap()
}

/// Create a user with the given role and return its id and bearer token.
pub async fn seed_user(pool: &PgPool, role: Role) -> (DbId, String) {
    let user = UserRepo::create(
        pool,
        &CreateUser {
            email: format!("{}@example.com", role.as_str()),
            full_name: format!("Test {}", role.as_str()),
            role,
        },
    )
    .await
    .unwrap();
    (user.id, token_for(user.id, role))
}

pub async fn seed_facility(pool: &PgPool, name: &str) -> DbId {
    FacilityRepo::create(
        pool,
        &CreateFacility {
            name: name.to_string(),
            address: None,
        },
    )
    .await
    .unwrap()
    .id
}

pub async fn seed_equipment(pool: &PgPool, facility_id: DbId, serial: &str) -> Equipment {
    EquipmentRepo::create(
        pool,
        &CreateEquipment {
            facility_id,
            name: format!("Ventilator {serial}"),
            serial_number: serial.to_string(),
            category: Some("life_support".to_string()),
            location: Some("ICU".to_string()),
            description: None,
            cleaning_frequency_hours: Some(24),
        },
    )
    .await
    .unwrap()
}
