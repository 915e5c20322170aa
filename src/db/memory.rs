//! In-process stores, used when `DATABASE_URL` is not set.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::RwLock;

use super::models::{Ad, AdStats, AdStatus, Admin};
use super::{AdStore, AdminStore};
use crate::error::{AppError, Result};
use crate::services::visibility::is_visible;

#[derive(Default)]
pub struct MemoryAdStore {
    ads: RwLock<HashMap<String, Ad>>,
}

impl MemoryAdStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut ads: Vec<Ad>) -> Vec<Ad> {
    ads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    ads
}

#[async_trait]
impl AdStore for MemoryAdStore {
    async fn insert(&self, ad: &Ad) -> Result<()> {
        let mut ads = self.ads.write().await;
        if ads.contains_key(&ad.id) {
            return Err(AppError::Conflict(format!("ad id {} already exists", ad.id)));
        }
        ads.insert(ad.id.clone(), ad.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Ad>> {
        Ok(self.ads.read().await.get(id).cloned())
    }

    async fn list_by_status(&self, status: AdStatus) -> Result<Vec<Ad>> {
        let ads = self.ads.read().await;
        Ok(newest_first(
            ads.values().filter(|ad| ad.status == status).cloned().collect(),
        ))
    }

    async fn list_visible(&self, now: DateTime<Utc>) -> Result<Vec<Ad>> {
        let ads = self.ads.read().await;
        Ok(newest_first(
            ads.values().filter(|ad| is_visible(ad, now)).cloned().collect(),
        ))
    }

    async fn list_all(&self) -> Result<Vec<Ad>> {
        let ads = self.ads.read().await;
        Ok(newest_first(ads.values().cloned().collect()))
    }

    async fn set_approved(&self, id: &str) -> Result<()> {
        let mut ads = self.ads.write().await;
        match ads.get_mut(id) {
            Some(ad) => {
                ad.status = AdStatus::Approved;
                Ok(())
            }
            None => Err(AppError::NotFound("Ad".to_string())),
        }
    }

    async fn delete(&self, id: &str) -> Result<Option<String>> {
        Ok(self.ads.write().await.remove(id).map(|ad| ad.image_path))
    }

    async fn delete_all(&self) -> Result<u64> {
        let mut ads = self.ads.write().await;
        let removed = ads.len() as u64;
        ads.clear();
        Ok(removed)
    }

    async fn replace_all(&self, replacement: &[Ad]) -> Result<()> {
        let mut fresh = HashMap::with_capacity(replacement.len());
        for ad in replacement {
            if fresh.insert(ad.id.clone(), ad.clone()).is_some() {
                return Err(AppError::Conflict(format!("ad id {} appears twice", ad.id)));
            }
        }
        *self.ads.write().await = fresh;
        Ok(())
    }

    async fn stats(&self, now: DateTime<Utc>) -> Result<AdStats> {
        let ads = self.ads.read().await;
        let mut stats = AdStats {
            total_ads: ads.len() as i64,
            ..AdStats::default()
        };
        for ad in ads.values() {
            match ad.status {
                AdStatus::Pending => stats.pending_ads += 1,
                AdStatus::Approved => stats.approved_ads += 1,
            }
            if ad.expires_at < now {
                stats.expired_ads += 1;
            }
        }
        Ok(stats)
    }

    async fn ping(&self) -> Result<std::time::Duration> {
        let start = Instant::now();
        let _ = self.ads.read().await.len();
        Ok(start.elapsed())
    }
}

#[derive(Default)]
pub struct MemoryAdminStore {
    admins: RwLock<Vec<Admin>>,
}

impl MemoryAdminStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AdminStore for MemoryAdminStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Admin>> {
        let admins = self.admins.read().await;
        Ok(admins.iter().find(|a| a.username == username).cloned())
    }

    async fn get(&self, id: i64) -> Result<Option<Admin>> {
        let admins = self.admins.read().await;
        Ok(admins.iter().find(|a| a.id == id).cloned())
    }

    async fn create(&self, username: &str, password_hash: &str) -> Result<Admin> {
        let mut admins = self.admins.write().await;
        if admins.iter().any(|a| a.username == username) {
            return Err(AppError::Conflict(format!("admin {} already exists", username)));
        }
        let now = Utc::now();
        let admin = Admin {
            id: admins.iter().map(|a| a.id).max().unwrap_or(0) + 1,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };
        admins.push(admin.clone());
        Ok(admin)
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<()> {
        let mut admins = self.admins.write().await;
        match admins.iter_mut().find(|a| a.id == id) {
            Some(admin) => {
                admin.password_hash = password_hash.to_string();
                admin.updated_at = Utc::now();
                Ok(())
            }
            None => Err(AppError::NotFound("Admin".to_string())),
        }
    }
}
