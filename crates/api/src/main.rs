use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cleantrack_api::config::ServerConfig;
use cleantrack_api::{background, routes, state};
use cleantrack_events::{EmailConfig, EmailDelivery, EventBus, NotificationDispatcher, NotificationSink};

use state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cleantrack_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = cleantrack_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    cleantrack_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    cleantrack_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- CORS ---
    let cors = build_cors_layer(&config);

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    tracing::info!("Event bus created");

    // Spawn the notification dispatcher (emails alerts to facility staff).
    let sink: Option<Arc<dyn NotificationSink>> = match EmailConfig::from_env() {
        Some(email_config) => {
            tracing::info!(smtp_host = %email_config.smtp_host, "SMTP configured");
            let delivery: Arc<dyn NotificationSink> = Arc::new(
                EmailDelivery::new(email_config).expect("Failed to build SMTP transport"),
            );
            Some(delivery)
        }
        None => None,
    };
    let dispatcher = NotificationDispatcher::new(pool.clone(), sink);
    let dispatcher_handle = tokio::spawn(dispatcher.run(event_bus.subscribe()));

    // --- App state ---
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    let sweep_interval = Duration::from_secs(config.sweep_interval_secs);
    let report_interval = Duration::from_secs(config.report_interval_secs);
    let state = AppState::new(pool, config.clone(), Arc::clone(&event_bus))
        .expect("Invalid compliance configuration");

    // Spawn the periodic compliance sweep.
    let background_cancel = tokio_util::sync::CancellationToken::new();
    let sweep_handle = tokio::spawn(background::compliance_sweep::run(
        state.pool.clone(),
        Arc::clone(&event_bus),
        state.compliance_policy,
        Arc::clone(&state.sweep_status),
        sweep_interval,
        background_cancel.clone(),
    ));

    // Spawn the periodic compliance report email.
    let report_handle = tokio::spawn(background::compliance_report::run(
        state.pool.clone(),
        Arc::clone(&event_bus),
        state.compliance_policy,
        report_interval,
        background_cancel.clone(),
    ));

    tracing::info!(
        "Background services started (notification dispatcher, compliance sweep, compliance report)"
    );

    // --- Request ID header name ---
    let request_id_header = HeaderName::from_static("x-request-id");

    // --- Router ---
    let app = Router::new()
        // Health check at root level (not under /api/v1).
        .merge(routes::health::router())
        // API v1 routes.
        .nest("/api/v1", routes::api_routes())
        // -- Middleware stack (applied bottom-up) --
        // Panic recovery: catch panics and return 500 JSON.
        .layer(CatchPanicLayer::new())
        // Request timeout.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        // Propagate request ID to response.
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        // Structured request/response tracing.
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Set request ID on incoming requests.
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        // CORS.
        .layer(cors)
        // Shared state.
        .with_state(state);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Stop the publishers first so nothing is published after the bus closes.
    background_cancel.cancel();
    if tokio::time::timeout(shutdown_timeout, sweep_handle).await.is_err() {
        tracing::warn!("Compliance sweep did not stop in time");
    }
    if tokio::time::timeout(shutdown_timeout, report_handle).await.is_err() {
        tracing::warn!("Compliance report job did not stop in time");
    }
    tracing::info!("Compliance background jobs stopped");

    // Dropping the last sender closes the broadcast channel, which ends the
    // dispatcher loop once it has drained queued events.
    drop(event_bus);
    if tokio::time::timeout(shutdown_timeout, dispatcher_handle).await.is_err() {
        tracing::warn!("Notification dispatcher did not drain in time");
    }
    tracing::info!("Notification dispatcher stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Build the CORS middleware layer from server configuration.
///
/// Panics at startup if any configured origin is invalid, so
/// misconfiguration fails fast.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
