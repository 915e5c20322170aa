//! bcrypt helpers. Hashing is CPU-bound, so both run on the blocking pool.

use bcrypt::{hash, verify};

use crate::error::{AppError, Result};

pub async fn hash_password(password: &str, cost: u32) -> Result<String> {
    let password = password.to_string();
    match tokio::task::spawn_blocking(move || hash(&password, cost)).await {
        Ok(Ok(h)) => Ok(h),
        Ok(Err(e)) => Err(AppError::Internal(format!("failed to hash password: {}", e))),
        Err(e) => Err(AppError::Internal(format!(
            "spawn_blocking panic during hash: {}",
            e
        ))),
    }
}

/// `false` on mismatch and on a malformed stored hash.
pub async fn verify_password(password: &str, password_hash: &str) -> bool {
    let pwd = password.to_string();
    let hash_clone = password_hash.to_string();
    tokio::task::spawn_blocking(move || verify(&pwd, &hash_clone).unwrap_or(false))
        .await
        .unwrap_or(false)
}
