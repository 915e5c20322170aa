//! Ad and administrator persistence.
//!
//! Two implementations of each store exist: Postgres (`postgres`) for
//! deployments and an in-process map (`memory`) used when no database is
//! configured and by the tests.

pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::error::Result;
use models::{Ad, AdStats, AdStatus, Admin};

/// Persistent table of ads.
///
/// Every method is a single atomic storage operation. Lists are ordered by
/// `created_at` descending.
#[async_trait]
pub trait AdStore: Send + Sync {
    /// Fails with `Conflict` when the id already exists.
    async fn insert(&self, ad: &Ad) -> Result<()>;

    async fn get(&self, id: &str) -> Result<Option<Ad>>;

    async fn list_by_status(&self, status: AdStatus) -> Result<Vec<Ad>>;

    /// Approved ads with `expires_at > now`.
    async fn list_visible(&self, now: DateTime<Utc>) -> Result<Vec<Ad>>;

    async fn list_all(&self) -> Result<Vec<Ad>>;

    /// Fails with `NotFound` when no such id. Approving twice is a no-op.
    async fn set_approved(&self, id: &str) -> Result<()>;

    /// Removes the row and hands back its image reference.
    async fn delete(&self, id: &str) -> Result<Option<String>>;

    /// Removes every row, returning how many were removed.
    async fn delete_all(&self) -> Result<u64>;

    /// Replaces the whole table with `ads` in one transaction.
    async fn replace_all(&self, ads: &[Ad]) -> Result<()>;

    async fn stats(&self, now: DateTime<Utc>) -> Result<AdStats>;

    /// Round-trip latency check for the health endpoint.
    async fn ping(&self) -> Result<std::time::Duration>;
}

/// The administrator table. Holds exactly one row after seeding.
#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<Admin>>;

    async fn get(&self, id: i64) -> Result<Option<Admin>>;

    async fn create(&self, username: &str, password_hash: &str) -> Result<Admin>;

    /// Fails with `NotFound` when no such id. Bumps `updated_at`.
    async fn update_password(&self, id: i64, password_hash: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl DbConfig {
    /// Reads pool settings from the environment. `None` when
    /// `DATABASE_URL` is not set.
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("DATABASE_URL").ok()?;
        Some(Self {
            url,
            max_connections: env_or("DB_POOL_MAX", 10),
            min_connections: env_or("DB_POOL_MIN", 2),
            connect_timeout_secs: env_or("DB_CONNECT_TIMEOUT", 10),
            idle_timeout_secs: env_or("DB_IDLE_TIMEOUT", 300),
        })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

pub async fn init_pool(config: &DbConfig) -> std::result::Result<PgPool, sqlx::Error> {
    tracing::info!("Initializing database connection pool...");
    tracing::debug!(
        "Database URL: {}",
        config.url.replace(
            |c: char| !c.is_ascii_alphanumeric() && c != ':' && c != '/' && c != '@' && c != '.',
            "*"
        )
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(std::time::Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(std::time::Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(std::time::Duration::from_secs(1800))
        .test_before_acquire(true)
        .connect(&config.url)
        .await?;

    sqlx::query("SELECT 1").fetch_one(&pool).await?;

    tracing::info!("Database connection pool initialized successfully");

    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> std::result::Result<(), sqlx::Error> {
    tracing::info!("Running database migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ads (
            id TEXT PRIMARY KEY,
            store_name TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            country TEXT NOT NULL,
            category TEXT NOT NULL,
            duration TEXT NOT NULL,
            image_path TEXT NOT NULL,
            email TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'approved')),
            created_at TIMESTAMPTZ NOT NULL,
            expires_at TIMESTAMPTZ NOT NULL
        )
    "#,
    )
    .execute(pool)
    .await?;

    // One statement per query: prepared statements reject multi-statement SQL.
    for index in [
        "CREATE INDEX IF NOT EXISTS idx_ads_status ON ads(status)",
        "CREATE INDEX IF NOT EXISTS idx_ads_created_at ON ads(created_at DESC)",
        "CREATE INDEX IF NOT EXISTS idx_ads_category ON ads(category)",
        "CREATE INDEX IF NOT EXISTS idx_ads_expires_at ON ads(expires_at)",
    ] {
        sqlx::query(index).execute(pool).await?;
    }

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS admin (
            id BIGSERIAL PRIMARY KEY,
            username TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
    "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed successfully");

    Ok(())
}
