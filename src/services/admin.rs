//! Administrator seeding.

use crate::config::AdminSeed;
use crate::db::{models::Admin, AdminStore};
use crate::error::Result;
use crate::services::passwords::hash_password;

/// Guarantees the configured administrator row exists. An existing row is
/// left untouched, so a password changed at runtime survives restarts.
pub async fn ensure_admin(admins: &dyn AdminStore, seed: &AdminSeed, cost: u32) -> Result<Admin> {
    if let Some(existing) = admins.find_by_username(&seed.username).await? {
        tracing::info!("Admin user '{}' already exists", existing.username);
        return Ok(existing);
    }

    let password_hash = match &seed.password_hash {
        Some(h) => h.clone(),
        None => hash_password(&seed.password, cost).await?,
    };

    let admin = admins.create(&seed.username, &password_hash).await?;
    tracing::info!("Admin user '{}' created successfully", admin.username);
    Ok(admin)
}
