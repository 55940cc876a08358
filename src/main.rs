// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{sync::Arc, time::Duration};
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_service::DashboardService;
use crate::application::rate_controller::RateController;
use crate::application::scheduler::UpdateScheduler;
use crate::infrastructure::config::load_dashboard_config;
use crate::infrastructure::event_feed::EventFeed;
use crate::infrastructure::http_provider::HttpVariableProvider;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    bind_variable, clear_all, clear_binding_data, detect_variables, get_binding, get_status,
    get_variable, health_check, list_variables, refresh_variables, set_binding_active, set_rate,
    show_all, stream_events, unbind_variable,
};

const EVENT_BUFFER: usize = 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("variable_dashboard=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let config = load_dashboard_config()?;
    let rate_controller = RateController::default();
    let initial_rate = rate_controller.validate(&config.scheduler.initial_rate_ms.to_string())?;

    // Provider and collaborators (infrastructure layer)
    let provider = Arc::new(HttpVariableProvider::new(
        &config.provider.base_url,
        Duration::from_millis(config.provider.timeout_ms),
    )?);
    let feed = EventFeed::new(EVENT_BUFFER);

    // Process-wide dashboard state (application layer)
    let dashboard = Arc::new(DashboardService::new(
        provider,
        Arc::new(feed.clone()),
        Arc::new(feed.clone()),
    ));

    if let Err(e) = dashboard.refresh_catalog().await {
        tracing::warn!("Initial variable load failed: {}", e);
    }
    if config.dashboard.show_all_on_start {
        dashboard.show_all();
    }

    let mut scheduler = UpdateScheduler::new(dashboard.clone(), config.scheduler.settings(), initial_rate);
    scheduler.start();

    let state = Arc::new(AppState {
        dashboard: dashboard.clone(),
        scheduler: tokio::sync::Mutex::new(scheduler),
        rate_controller,
        feed,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/api/status", get(get_status))
        .route("/api/events", get(stream_events))
        .route("/api/variables", get(list_variables))
        .route("/api/variables/:name", get(get_variable))
        .route("/api/refresh", post(refresh_variables))
        .route("/api/detect", post(detect_variables))
        .route("/api/rate", put(set_rate))
        .route("/api/bindings", post(show_all).delete(clear_all))
        .route(
            "/api/bindings/:name",
            get(get_binding).post(bind_variable).delete(unbind_variable),
        )
        .route("/api/bindings/:name/active", put(set_binding_active))
        .route("/api/bindings/:name/clear", post(clear_binding_data))
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    tracing::info!(
        "Dashboard runtime polling {} and serving on {}",
        config.provider.base_url,
        config.server.bind_addr
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Tear down in reverse order of construction
    state.scheduler.lock().await.stop();
    dashboard.clear_all();
    tracing::info!("Dashboard runtime stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
