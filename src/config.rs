//! Environment-driven configuration, read once at startup.

use chrono::Duration;
use std::path::PathBuf;

use crate::db::DbConfig;

pub const DEFAULT_JWT_SECRET: &str = "default-jwt-secret-change-in-production";
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// bcrypt accepts work factors in this range.
pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;

/// Session credentials are valid for 24 hours.
pub const SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    /// Plain seed password, hashed at startup when no hash is given.
    pub password: String,
    /// Pre-computed bcrypt hash; wins over `password`.
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub jwt_secret: String,
    pub session_ttl: Duration,
    pub bcrypt_cost: u32,
    pub admin: AdminSeed,
    pub allowed_origins: Option<Vec<String>>,
    pub database: Option<DbConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            host: "0.0.0.0".to_string(),
            port: 5000,
            upload_dir: PathBuf::from("uploads"),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            session_ttl: Duration::hours(SESSION_TTL_HOURS),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            admin: AdminSeed {
                username: DEFAULT_ADMIN_USERNAME.to_string(),
                password: DEFAULT_ADMIN_PASSWORD.to_string(),
                password_hash: None,
            },
            allowed_origins: None,
            database: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let allowed_origins = std::env::var("ALLOWED_ORIGINS").ok().and_then(|s| {
            let origins: Vec<String> = s
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect();
            if origins.is_empty() {
                None
            } else {
                Some(origins)
            }
        });

        Self {
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            upload_dir: std::env::var("UPLOAD_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            jwt_secret: std::env::var("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            session_ttl: defaults.session_ttl,
            bcrypt_cost: std::env::var("BCRYPT_COST")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|cost| (MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(cost))
                .unwrap_or(defaults.bcrypt_cost),
            admin: AdminSeed {
                username: std::env::var("ADMIN_USERNAME").unwrap_or(defaults.admin.username),
                password: std::env::var("ADMIN_PASSWORD").unwrap_or(defaults.admin.password),
                password_hash: std::env::var("ADMIN_HASH_PASSWORD").ok(),
            },
            allowed_origins,
            database: DbConfig::from_env(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Refuses insecure settings in production. Returns the warnings that
    /// should be logged but do not stop startup.
    pub fn check_production(&self) -> Result<Vec<String>, String> {
        let mut warnings = Vec::new();
        if !self.is_production() {
            return Ok(warnings);
        }

        if self.jwt_secret.is_empty() || self.jwt_secret == DEFAULT_JWT_SECRET {
            return Err("JWT_SECRET must be set to a secure, unique value in production. \
                        Refusing to start with the default secret."
                .to_string());
        }

        if self.admin.password_hash.is_none() && self.admin.password == DEFAULT_ADMIN_PASSWORD {
            warnings.push(
                "SECURITY: the admin seed password is the default 'admin123'. \
                 Set ADMIN_HASH_PASSWORD or ADMIN_PASSWORD before exposing this server."
                    .to_string(),
            );
        }

        Ok(warnings)
    }
}
