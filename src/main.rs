//! Pastoral Scheduling Service
//!
//! The appointment subsystem of the church community portal.
//!
//! ## Features
//!
//! - **Appointment requests**: members ask a pastor for a meeting
//! - **Pastoral review**: pastors confirm or refuse pending requests
//! - **Availability calendar**: weekly open slots and block-out periods
//! - **Notifications**: best-effort messages on every lifecycle change

mod config;
mod db;
mod error;
mod handlers;
mod models;
mod scheduling;
mod validation;

#[cfg(test)]
mod testing;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use db::PgRepository;
use handlers::AppState;
use scheduling::notifications::{NotificationDispatcher, PgNotificationSink};
use scheduling::SchedulingService;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pastoral_scheduling=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::Config::from_env()?;
    tracing::info!("Starting Pastoral Scheduling Service");
    tracing::info!("Environment: {:?}", config.environment);

    // Create database pool
    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    db::run_migrations(&pool).await?;

    // Wire the scheduling core
    let notifier = NotificationDispatcher::new(
        Arc::new(PgNotificationSink::new(pool.clone())),
        config.notification_timeout,
    );
    let service = SchedulingService::new(Arc::new(PgRepository::new(pool.clone())), notifier);

    // Create application state
    let state = AppState {
        pool,
        service,
        is_production: config.is_production(),
        session_cookie: config.session_cookie.clone(),
    };

    // Build CORS layer
    let cors = if config.is_production() {
        CorsLayer::new()
            .allow_origin(
                config
                    .cors_origins
                    .iter()
                    .filter_map(|o| o.parse().ok())
                    .collect::<Vec<_>>(),
            )
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::permissive()
    };

    // Build API routes; every route needs a resolved caller
    let api_routes = Router::new()
        // Appointments
        .route("/appointments", post(handlers::request_appointment))
        .route("/appointments/mine", get(handlers::list_my_appointments))
        .route("/appointments/pastor", get(handlers::list_pastor_appointments))
        .route(
            "/appointments/:id/respond",
            put(handlers::respond_to_appointment),
        )
        .route("/appointments/:id/cancel", post(handlers::cancel_appointment))
        // Own calendar (pastor)
        .route("/availability/slots", get(handlers::list_my_slots))
        .route("/availability/slots", post(handlers::create_slot))
        .route("/availability/slots/:slot_id", delete(handlers::delete_slot))
        .route(
            "/availability/unavailability",
            get(handlers::list_my_unavailability),
        )
        .route(
            "/availability/unavailability",
            post(handlers::create_unavailability),
        )
        .route(
            "/availability/unavailability/:period_id",
            delete(handlers::delete_unavailability),
        )
        // Pastor directory
        .route("/pastors", get(handlers::list_pastors))
        .route(
            "/pastors/:pastor_id/availability",
            get(handlers::get_pastor_calendar),
        )
        .route(
            "/pastors/:pastor_id/availability/open",
            get(handlers::get_pastor_open_at),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            handlers::middleware::require_identity,
        ));

    // Build main router
    let app = Router::new()
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            handlers::middleware::security_headers,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(config.max_body_size))
        .layer(cors)
        .with_state(state);

    // Start server
    let addr = config.server_addr();
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
