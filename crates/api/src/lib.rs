//! # TutorBook API
//!
//! The API crate provides the web server for the TutorBook booking service.
//! It exposes the session lifecycle (book, confirm, cancel, reschedule
//! negotiation, completion) and the notification inbox as JSON endpoints.
//!
//! ## Architecture
//!
//! This crate follows a layered architecture:
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Extract the request and call the booking service
//! - **Middleware**: Caller identity and error mapping
//! - **Config**: Handle environment and application configuration
//!
//! Business rules live in `tutorbook-core`; persistence comes from
//! `tutorbook-db` through the core repository traits, so the router can be
//! built over any store implementation.

/// Configuration module for API settings
pub mod config;
/// Request handlers for sessions and notifications
pub mod handlers;
/// Middleware for caller identity and error handling
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;

use std::sync::Arc;

use axum::{
    BoxError, Json, Router,
    error_handling::HandleErrorLayer,
    http::{HeaderName, HeaderValue, Method, StatusCode, header},
};
use eyre::Result;
use serde_json::{Value, json};
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;
use tutorbook_core::{
    repository::{NotificationStore, SessionStore},
    service::BookingService,
};
use tutorbook_db::PgStore;

use crate::middleware::auth::{USER_ID_HEADER, USER_ROLE_HEADER};

/// Shared application state that is accessible to all request handlers
pub struct ApiState {
    /// Runs session actions against the store
    pub bookings: BookingService,
    /// Inbox reads and read receipts
    pub notifications: Arc<dyn NotificationStore>,
}

impl ApiState {
    pub fn new(sessions: Arc<dyn SessionStore>, notifications: Arc<dyn NotificationStore>) -> Self {
        Self {
            bookings: BookingService::new(sessions, notifications.clone()),
            notifications,
        }
    }
}

/// Builds the application router with all routes and request tracing
pub fn build_router(state: Arc<ApiState>) -> Router {
    Router::new()
        // Health check endpoints
        .merge(routes::health::routes())
        // Session lifecycle endpoints
        .merge(routes::sessions::routes())
        // Notification inbox endpoints
        .merge(routes::notifications::routes())
        // Attach shared state to all routes
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Starts the API server with the provided configuration and database connection
///
/// Initializes logging, wires the Postgres store into the booking service,
/// applies CORS and request timeouts and serves until the process stops.
///
/// # Example
///
/// ```no_run
/// # async fn run() -> eyre::Result<()> {
/// let config = tutorbook_api::config::ApiConfig::from_env()?;
/// let db_pool = tutorbook_db::create_pool(&config.database_url).await?;
/// tutorbook_api::start_server(config, db_pool).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_server(config: config::ApiConfig, db_pool: PgPool) -> Result<()> {
    // Initialize tracing for logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Create shared state with dependencies
    let store = Arc::new(PgStore::new(db_pool));
    let state = Arc::new(ApiState::new(store.clone(), store));

    let app = build_router(state);

    // Apply CORS configuration if origins are specified
    let app = match &config.cors_origins {
        Some(origins) => app.layer(cors_layer(origins)),
        None => app,
    };

    // Add request timeout middleware
    let app = app.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_timeout))
            .timeout(config.request_timeout()),
    );

    // Start the HTTP server
    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(USER_ID_HEADER),
            HeaderName::from_static(USER_ROLE_HEADER),
        ])
        .allow_origin(allowed)
        .allow_credentials(true)
}

async fn handle_timeout(err: BoxError) -> (StatusCode, Json<Value>) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(json!({ "error": "Request timed out" })),
        )
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": format!("Unhandled internal error: {}", err) })),
        )
    }
}
