//! Classified Ads Backend - library for app logic and testing

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod routes;
pub mod services;
pub mod state;
pub mod uploads;

#[cfg(test)]
mod testing;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    set_header::SetResponseHeader,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::db::memory::{MemoryAdStore, MemoryAdminStore};
use crate::db::postgres::{PgAdStore, PgAdminStore};
use crate::db::{AdStore, AdminStore};
use crate::services::session::SessionGate;
use crate::state::AppState;
use crate::uploads::LocalImageStore;

/// Multipart submissions and import documents need more than the 2 MB default.
/// Extractors enforce it, so an oversized body still gets a JSON error.
pub const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

const UPLOAD_CACHE_CONTROL: &str = "public, max-age=86400";

/// Configure CORS from the allowed origins, or any origin when none are set.
pub fn configure_cors(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .flatten()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("ngrok-skip-browser-warning"),
        ])
}

fn api_routes() -> Router<AppState> {
    use routes::{admin, ads, auth, health};

    Router::new()
        .route("/ads", get(ads::list_ads).post(ads::submit_ad))
        .route("/admin/login", post(auth::login))
        .route("/admin/validate", get(auth::validate))
        .route("/admin/ads", get(admin::all_ads))
        .route("/admin/ads/pending", get(admin::pending_ads))
        .route("/admin/ads/clear", delete(admin::clear_ads))
        .route("/admin/ads/{id}", delete(admin::delete_ad))
        .route("/admin/ads/{id}/approve", put(admin::approve))
        .route("/admin/password", put(admin::change_password))
        .route("/admin/stats", get(admin::stats))
        .route("/admin/export", get(admin::export))
        .route("/admin/import", post(admin::import))
        .route("/health", get(health::health_ping))
        .route("/health/detailed", get(health::health_detailed))
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors(&state.config);

    let uploads = SetResponseHeader::overriding(
        ServeDir::new(&state.config.upload_dir),
        header::CACHE_CONTROL,
        HeaderValue::from_static(UPLOAD_CACHE_CONTROL),
    );

    Router::new()
        .route("/", get(routes::root_info))
        .nest("/api", api_routes())
        .nest_service("/uploads", uploads)
        .fallback(routes::not_found)
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(cors)
        .with_state(state)
}

/// Postgres stores when a database is configured and reachable, in-memory
/// stores otherwise.
async fn build_stores(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn AdStore>, Arc<dyn AdminStore>)> {
    let Some(db_config) = &config.database else {
        tracing::info!("DATABASE_URL not set. Using in-memory storage; data is lost on restart.");
        return Ok((
            Arc::new(MemoryAdStore::new()),
            Arc::new(MemoryAdminStore::new()),
        ));
    };

    match db::init_pool(db_config).await {
        Ok(pool) => {
            db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            Ok((
                Arc::new(PgAdStore::new(pool.clone())),
                Arc::new(PgAdminStore::new(pool)),
            ))
        }
        Err(e) => {
            tracing::warn!(
                "Failed to initialize database pool: {}. Falling back to in-memory storage.",
                e
            );
            Ok((
                Arc::new(MemoryAdStore::new()),
                Arc::new(MemoryAdminStore::new()),
            ))
        }
    }
}

/// Run the server (used by main).
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();

    // Held for the whole run; dropping them loses buffered log lines.
    let _log_guards = logging::init(&config.environment);

    routes::health::init_start_time();

    let warnings = config
        .check_production()
        .map_err(|e| anyhow::anyhow!("FATAL: {}", e))?;
    for warning in warnings {
        tracing::warn!("{}", warning);
    }

    let (ads, admins) = build_stores(&config).await?;

    let images = LocalImageStore::new(config.upload_dir.clone());
    images.ensure_dir().await?;
    tracing::info!("Serving uploads from {}", images.root().display());

    services::admin::ensure_admin(admins.as_ref(), &config.admin, config.bcrypt_cost)
        .await
        .context("Failed to seed the administrator account")?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid HOST/PORT configuration")?;

    let state = AppState {
        ads,
        admins,
        images: Arc::new(images),
        sessions: Arc::new(SessionGate::new(&config.jwt_secret, config.session_ttl)),
        config: Arc::new(config),
    };

    let app = create_app(state);

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
