//! Administrator-only operations on ads and on the administrator account.
//!
//! A `Moderation` can only be built from verified session claims, so every
//! operation here has already passed the session gate.

use chrono::{DateTime, Utc};

use crate::db::models::{Ad, AdStats, AdStatus};
use crate::db::{AdStore, AdminStore};
use crate::error::{AppError, Result, ValidationErrors};
use crate::services::passwords::{hash_password, verify_password};
use crate::services::session::Claims;
use crate::uploads::ImageStore;

pub const MIN_PASSWORD_LEN: usize = 6;

pub struct Moderation<'a> {
    ads: &'a dyn AdStore,
    admins: &'a dyn AdminStore,
    images: &'a dyn ImageStore,
    bcrypt_cost: u32,
    claims: &'a Claims,
}

impl<'a> Moderation<'a> {
    pub fn new(
        ads: &'a dyn AdStore,
        admins: &'a dyn AdminStore,
        images: &'a dyn ImageStore,
        bcrypt_cost: u32,
        claims: &'a Claims,
    ) -> Self {
        Self {
            ads,
            admins,
            images,
            bcrypt_cost,
            claims,
        }
    }

    pub async fn list_pending(&self) -> Result<Vec<Ad>> {
        self.ads.list_by_status(AdStatus::Pending).await
    }

    pub async fn list_approved(&self) -> Result<Vec<Ad>> {
        self.ads.list_by_status(AdStatus::Approved).await
    }

    /// One-way transition to approved. Approving an approved ad is a no-op.
    pub async fn approve(&self, id: &str) -> Result<Ad> {
        let ad = self
            .ads
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ad".to_string()))?;

        self.ads.set_approved(id).await?;
        tracing::info!(ad_id = %id, by = %self.claims.username, "Ad approved: \"{}\"", ad.title);

        Ok(Ad {
            status: AdStatus::Approved,
            ..ad
        })
    }

    /// Deletes an ad and releases its image. Rejection is the same thing.
    ///
    /// A failed image release is logged and does not stop the deletion.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let ad = self
            .ads
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ad".to_string()))?;

        self.release_image(&ad.image_path).await;

        if self.ads.delete(id).await?.is_none() {
            return Err(AppError::NotFound("Ad".to_string()));
        }

        tracing::info!(ad_id = %id, by = %self.claims.username, "Ad deleted: \"{}\"", ad.title);
        Ok(())
    }

    pub async fn reject(&self, id: &str) -> Result<()> {
        self.delete(id).await
    }

    /// Releases every image, then removes every ad. Irreversible.
    pub async fn clear_all(&self) -> Result<u64> {
        let ads = self.ads.list_all().await?;
        for ad in &ads {
            self.release_image(&ad.image_path).await;
        }

        let removed = self.ads.delete_all().await?;
        tracing::info!(removed, by = %self.claims.username, "All ads cleared");
        Ok(removed)
    }

    pub async fn stats(&self, now: DateTime<Utc>) -> Result<AdStats> {
        self.ads.stats(now).await
    }

    pub async fn export(&self) -> Result<Vec<Ad>> {
        self.ads.list_all().await
    }

    /// Replaces every stored ad with `ads`. Image files are left alone.
    pub async fn import(&self, ads: Vec<Ad>) -> Result<usize> {
        self.ads.replace_all(&ads).await?;
        tracing::info!(imported = ads.len(), by = %self.claims.username, "Ads imported");
        Ok(ads.len())
    }

    /// Changes the signed-in administrator's password.
    pub async fn change_password(&self, current: &str, new: &str) -> Result<()> {
        if current.is_empty() || new.is_empty() {
            return Err(AppError::Validation(ValidationErrors::single(
                "password",
                "Current and new password are required",
            )));
        }
        if new.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(ValidationErrors::single(
                "newPassword",
                format!(
                    "New password must be at least {} characters",
                    MIN_PASSWORD_LEN
                ),
            )));
        }

        let admin_id = self
            .claims
            .admin_id()
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".to_string()))?;
        let admin = self
            .admins
            .get(admin_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Admin".to_string()))?;

        if !verify_password(current, &admin.password_hash).await {
            return Err(AppError::IncorrectPassword);
        }

        let new_hash = hash_password(new, self.bcrypt_cost).await?;
        self.admins.update_password(admin.id, &new_hash).await?;

        tracing::info!("Admin password changed: {}", admin.username);
        Ok(())
    }

    async fn release_image(&self, reference: &str) {
        if let Err(e) = self.images.remove(reference).await {
            tracing::warn!(image = %reference, error = %e, "failed to release image, leaving it orphaned");
        }
    }
}
