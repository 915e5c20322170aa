//! Session gate: issues and checks the signed, time-limited credential that
//! proves administrator identity.
//!
//! The credential is a bearer JWT (HS256). Any holder is the administrator
//! until `exp`; there is no revocation list.

use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::db::{models::Admin, AdminStore};
use crate::error::{AppError, Result};
use crate::services::passwords::verify_password;

/// Role marker embedded in every credential.
pub const ADMIN_ROLE: &str = "admin";

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,      // Admin ID
    pub username: String, // Admin username
    pub role: String,     // Always "admin"
    pub exp: i64,         // Expiry timestamp
    pub iat: i64,         // Issued at timestamp
}

impl Claims {
    pub fn admin_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

pub struct SessionGate {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl SessionGate {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact; no grace period.
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn issue(&self, admin: &Admin) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: admin.id.to_string(),
            username: admin.username.clone(),
            role: ADMIN_ROLE.to_string(),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("failed to create token: {}", e)))
    }

    /// Decodes a credential, rejecting bad signatures, expiry and a missing
    /// role marker.
    pub fn verify(&self, token: &str) -> std::result::Result<Claims, jsonwebtoken::errors::Error> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)?.claims;
        if claims.role != ADMIN_ROLE {
            return Err(jsonwebtoken::errors::ErrorKind::InvalidToken.into());
        }
        Ok(claims)
    }

    /// Never fails: a missing or broken credential is simply invalid.
    pub fn validate(&self, token: Option<&str>) -> bool {
        match token {
            Some(t) => self.verify(t).is_ok(),
            None => false,
        }
    }
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Checks the administrator's credentials and issues a session credential.
///
/// Unknown username and wrong password fail identically.
pub async fn login(
    admins: &dyn AdminStore,
    gate: &SessionGate,
    username: &str,
    password: &str,
) -> Result<String> {
    let admin = match admins.find_by_username(username).await? {
        Some(admin) => admin,
        None => {
            tracing::warn!("Login attempt for unknown admin");
            return Err(AppError::Authentication);
        }
    };

    if !verify_password(password, &admin.password_hash).await {
        tracing::warn!("Failed login attempt for admin: {}", admin.username);
        return Err(AppError::Authentication);
    }

    let token = gate.issue(&admin)?;
    tracing::info!("Admin logged in: {}", admin.username);
    Ok(token)
}
