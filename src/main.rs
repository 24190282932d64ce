use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use anyhow::Context;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod auth;
mod config;
mod db;
mod error;
mod extract;
mod handlers;
mod identity;
mod models;
mod services;
mod validation;

use config::Config;
use db::{MemoryStore, PgStore, Store, StoreGateway};
use identity::{Clock, SystemClock};
use services::{RecordBuilder, ReminderScheduler};

/// Buffered reminder events per subscriber before slow sockets start lagging.
const REMINDER_CHANNEL_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct AppState {
    pub gateway: StoreGateway,
    pub records: RecordBuilder,
    pub reminders: ReminderScheduler,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moodlog_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env()?);

    let store = open_store(&config).await?;
    tracing::info!(
        backend = store.backend_name(),
        today = %identity::today(),
        week_id = %identity::current_week_id(),
        "Store ready"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let reminders = ReminderScheduler::new(clock.clone(), REMINDER_CHANNEL_CAPACITY);

    let state = AppState {
        gateway: StoreGateway::new(store.clone()),
        records: RecordBuilder::new(clock),
        reminders: reminders.clone(),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(cors_layer(&config)?)
        .layer(TraceLayer::new_for_http());

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    reminders.shutdown().await;
    store.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn open_store(config: &Config) -> anyhow::Result<Store> {
    match &config.database_url {
        Some(url) => {
            let pg = PgStore::connect(url)
                .await
                .context("Failed to connect to database")?;
            pg.migrate()
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");
            Ok(Store::Postgres(pg))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; records are kept in memory and lost on restart");
            Ok(Store::Memory(MemoryStore::new()))
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .route("/api/emotions", get(handlers::emotions::list_emotions))
        .route("/ws", get(handlers::ws::ws_handler));

    let protected_routes = Router::new()
        // Daily check-ins
        .route(
            "/api/check-ins",
            post(handlers::check_ins::submit_check_in).get(handlers::check_ins::list_check_ins),
        )
        .route("/api/check-ins/today", get(handlers::check_ins::today_check_in))
        .route(
            "/api/check-ins/summary",
            get(handlers::check_ins::check_in_summary),
        )
        // Weekly surveys
        .route(
            "/api/surveys",
            post(handlers::surveys::submit_survey).get(handlers::surveys::list_surveys),
        )
        .route("/api/surveys/current", get(handlers::surveys::current_survey))
        .route("/api/surveys/:week_id", get(handlers::surveys::get_survey))
        // Reminders
        .route("/api/reminders", put(handlers::reminders::schedule_reminder))
        .route(
            "/api/reminders/:kind",
            axum::routing::delete(handlers::reminders::cancel_reminder),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

fn cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = vec![config
        .frontend_url
        .parse::<axum::http::HeaderValue>()
        .context("FRONTEND_URL is not a valid origin")?];
    for o in &config.cors_extra_origins {
        match o.parse::<axum::http::HeaderValue>() {
            Ok(hv) => origins.push(hv),
            Err(_) => tracing::warn!(origin = %o, "Ignoring invalid CORS origin"),
        }
    }

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
