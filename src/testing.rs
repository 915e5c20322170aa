//! Shared test doubles.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use crate::config::{AdminSeed, AppConfig};
use crate::db::memory::{MemoryAdStore, MemoryAdminStore};
use crate::db::models::{Ad, AdStats, AdStatus};
use crate::db::AdStore;
use crate::error::{AppError, Result};
use crate::services::session::SessionGate;
use crate::state::AppState;
use crate::uploads::ImageStore;

pub const TEST_SECRET: &str = "test-secret";

/// A minimal PNG signature followed by padding.
pub fn png_bytes() -> Vec<u8> {
    let mut bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&[0u8; 24]);
    bytes
}

/// Records every save and release instead of touching the filesystem.
#[derive(Default)]
pub struct RecordingImageStore {
    saved: Mutex<Vec<String>>,
    removed: Mutex<Vec<String>>,
    fail_removals: AtomicBool,
}

impl RecordingImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self) -> Vec<String> {
        self.saved.lock().unwrap().clone()
    }

    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }

    /// Every later `remove` records the call and then fails.
    pub fn fail_removals(&self) {
        self.fail_removals.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ImageStore for RecordingImageStore {
    async fn save(&self, _bytes: &[u8], mime_type: &str) -> Result<String> {
        let ext = mime_type.rsplit('/').next().unwrap_or("bin");
        let mut saved = self.saved.lock().unwrap();
        let reference = format!("image-{}.{}", saved.len(), ext);
        saved.push(reference.clone());
        Ok(reference)
    }

    async fn remove(&self, reference: &str) -> Result<()> {
        self.removed.lock().unwrap().push(reference.to_string());
        if self.fail_removals.load(Ordering::SeqCst) {
            return Err(AppError::Storage("disk unavailable".to_string()));
        }
        Ok(())
    }
}

/// An ad store whose writes always fail.
pub struct BrokenAdStore;

#[async_trait]
impl AdStore for BrokenAdStore {
    async fn insert(&self, _ad: &Ad) -> Result<()> {
        Err(AppError::Storage("connection reset".to_string()))
    }
    async fn get(&self, _id: &str) -> Result<Option<Ad>> {
        Ok(None)
    }
    async fn list_by_status(&self, _status: AdStatus) -> Result<Vec<Ad>> {
        Ok(Vec::new())
    }
    async fn list_visible(&self, _now: DateTime<Utc>) -> Result<Vec<Ad>> {
        Ok(Vec::new())
    }
    async fn list_all(&self) -> Result<Vec<Ad>> {
        Ok(Vec::new())
    }
    async fn set_approved(&self, _id: &str) -> Result<()> {
        Err(AppError::Storage("connection reset".to_string()))
    }
    async fn delete(&self, _id: &str) -> Result<Option<String>> {
        Err(AppError::Storage("connection reset".to_string()))
    }
    async fn delete_all(&self) -> Result<u64> {
        Err(AppError::Storage("connection reset".to_string()))
    }
    async fn replace_all(&self, _ads: &[Ad]) -> Result<()> {
        Err(AppError::Storage("connection reset".to_string()))
    }
    async fn stats(&self, _now: DateTime<Utc>) -> Result<AdStats> {
        Ok(AdStats::default())
    }
    async fn ping(&self) -> Result<std::time::Duration> {
        Err(AppError::Storage("connection reset".to_string()))
    }
}

pub struct TestApp {
    pub state: AppState,
    pub ads: Arc<MemoryAdStore>,
    pub images: Arc<RecordingImageStore>,
}

/// In-memory state with a seeded `admin` / `admin123` account.
pub async fn test_app() -> TestApp {
    let config = AppConfig {
        jwt_secret: TEST_SECRET.to_string(),
        bcrypt_cost: crate::config::MIN_BCRYPT_COST,
        admin: AdminSeed {
            username: "admin".to_string(),
            password: "admin123".to_string(),
            password_hash: None,
        },
        ..AppConfig::default()
    };

    let ads = Arc::new(MemoryAdStore::new());
    let images = Arc::new(RecordingImageStore::new());
    let admins = Arc::new(MemoryAdminStore::new());

    crate::services::admin::ensure_admin(admins.as_ref(), &config.admin, config.bcrypt_cost)
        .await
        .unwrap();

    let state = AppState {
        ads: ads.clone(),
        admins,
        images: images.clone(),
        sessions: Arc::new(SessionGate::new(TEST_SECRET, Duration::hours(24))),
        config: Arc::new(config),
    };

    TestApp { state, ads, images }
}
