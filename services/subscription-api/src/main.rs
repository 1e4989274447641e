//! Tiffin Subscription API
//!
//! Subscription lifecycle microservice for the tiffin marketplace.
//!
//! ## REST Endpoints
//!
//! - `POST /api/v1/subscriptions` - Create a pending subscription
//! - `GET /api/v1/subscriptions/:id` - Get a subscription
//! - `POST /api/v1/subscriptions/:id/payment-order` - Attach a payment order
//! - `POST /api/v1/subscriptions/:id/pause` - Pause
//! - `POST /api/v1/subscriptions/:id/resume` - Resume
//! - `POST /api/v1/subscriptions/:id/cancel` - Cancel
//! - `PUT /api/v1/subscriptions/:id/address` - Update the address (weekly lock)
//! - `GET /api/v1/subscriptions/:id/deliveries` - List scheduled deliveries
//! - `POST /api/v1/deliveries/:id/skip` - Skip a delivery (per-delivery cutoff)
//! - `PUT /api/v1/deliveries/:id/address` - Redirect a delivery
//! - `POST /api/v1/deliveries/:id/delivered` - Chef marks a delivery complete
//! - `GET /api/v1/lock-status` - Weekly lock state (public)
//! - `POST /webhooks/payment` - Payment gateway webhook handler
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics

mod config;
mod error;
mod extractors;
mod handlers;
mod state;

use std::net::SocketAddr;

use axum::routing::{get, post, put};
use axum::Router;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use tiffin_db::Repositories;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::handlers::{health, ready};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("subscription_api=debug".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Tiffin Subscription API");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(
        http_port = config.http_port,
        cutoff_hour = config.cutoff_hour,
        "Configuration loaded"
    );

    // Initialize metrics
    let metrics_handle = if config.metrics_enabled {
        Some(setup_metrics()?)
    } else {
        None
    };

    // Create database pool
    let pool = tiffin_db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    // Create repositories
    let repos = Repositories::new(pool.clone());

    // Create application state
    let state = AppState::new(repos, pool, config.clone());

    // Build HTTP router
    let app = build_router(state.clone(), metrics_handle);

    // Start server
    let http_addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    run_http_server(app, http_addr).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let request_timeout = state.request_timeout();

    // API v1 routes
    let api_v1 = Router::new()
        // Subscription lifecycle
        .route("/subscriptions", post(handlers::create_subscription))
        .route("/subscriptions/{id}", get(handlers::get_subscription))
        .route(
            "/subscriptions/{id}/payment-order",
            post(handlers::attach_payment_order),
        )
        .route(
            "/subscriptions/{id}/pause",
            post(handlers::pause_subscription),
        )
        .route(
            "/subscriptions/{id}/resume",
            post(handlers::resume_subscription),
        )
        .route(
            "/subscriptions/{id}/cancel",
            post(handlers::cancel_subscription),
        )
        .route(
            "/subscriptions/{id}/address",
            put(handlers::update_subscription_address),
        )
        .route(
            "/subscriptions/{id}/deliveries",
            get(handlers::list_subscription_deliveries),
        )
        // Delivery modification gate
        .route("/deliveries/{id}/skip", post(handlers::skip_delivery))
        .route(
            "/deliveries/{id}/address",
            put(handlers::change_delivery_address),
        )
        .route("/deliveries/{id}/delivered", post(handlers::mark_delivered))
        // Public lock window state
        .route("/lock-status", get(handlers::lock_status));

    // Webhook route (separate - uses raw body, no JSON parsing)
    let webhook_routes = Router::new().route("/webhooks/payment", post(handlers::payment_webhook));

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    // Metrics route (no timeout)
    let metrics_route = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Build middleware stack (order matters - outermost first)
    let middleware = ServiceBuilder::new()
        // Request ID propagation (outermost)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        // Tracing with request details
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // CORS
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        // Request timeout (innermost - closest to handler)
        .layer(TimeoutLayer::new(request_timeout));

    // Combine all routes
    Router::new()
        .nest("/api/v1", api_v1)
        .merge(webhook_routes)
        .layer(middleware)
        .merge(health_routes) // Health routes without timeout
        .merge(metrics_route) // Metrics route without timeout
        .with_state(state)
}

async fn run_http_server(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn setup_metrics() -> anyhow::Result<PrometheusHandle> {
    // Latency buckets for subscription operations
    // Most ops are a couple of single-row queries; SLO at <200ms p99
    let latency_buckets = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.2, 0.5, 1.0, 2.5];

    let builder = PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full("subscription_operation_duration_seconds".to_string()),
        latency_buckets,
    )?;

    let handle = builder.install_recorder()?;

    // Register metrics with descriptions
    metrics::describe_counter!(
        "subscriptions_created_total",
        "Total pending subscriptions created"
    );
    metrics::describe_counter!(
        "subscriptions_cancelled_total",
        "Total subscriptions cancelled"
    );
    metrics::describe_counter!("deliveries_skipped_total", "Total deliveries skipped");
    metrics::describe_counter!(
        "deliveries_completed_total",
        "Total deliveries marked delivered"
    );
    metrics::describe_counter!(
        "payment_webhooks_processed_total",
        "Total payment webhooks processed by status"
    );
    metrics::describe_histogram!(
        "subscription_operation_duration_seconds",
        "Subscription operation latency in seconds by operation type"
    );

    Ok(handle)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
