use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use laganbus::config::AppConfig;
use laganbus::handlers;
use laganbus::services::dashboard::Dashboard;
use laganbus::services::sheet::apps_script::AppsScriptClient;
use laganbus::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    config.validate()?;

    if config.admin_token == "changeme" {
        tracing::warn!("ADMIN_TOKEN is the default value, set it before exposing the dashboard");
    }

    let sheet = AppsScriptClient::new(config.sheet_url.clone());

    let state = Arc::new(AppState {
        config: config.clone(),
        sheet: Box::new(sheet),
        dashboard: Mutex::new(Dashboard::default()),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/catalog", get(handlers::public::get_catalog))
        .route("/api/bookings", post(handlers::public::create_booking))
        .route("/api/bookings/status", get(handlers::public::booking_status))
        .route("/api/admin/dashboard", get(handlers::admin::get_dashboard))
        .route(
            "/api/admin/bookings/approve",
            post(handlers::admin::approve_booking),
        )
        .route(
            "/api/admin/bookings/update",
            post(handlers::admin::update_booking),
        )
        .route(
            "/api/admin/bookings/delete",
            post(handlers::admin::delete_booking),
        )
        .route("/api/admin/quote", post(handlers::admin::quote_total))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
