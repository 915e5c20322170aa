//! Shared application state injected into every handler.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::{AdStore, AdminStore};
use crate::services::moderation::Moderation;
use crate::services::session::{Claims, SessionGate};
use crate::uploads::ImageStore;

#[derive(Clone)]
pub struct AppState {
    pub ads: Arc<dyn AdStore>,
    pub admins: Arc<dyn AdminStore>,
    pub images: Arc<dyn ImageStore>,
    pub sessions: Arc<SessionGate>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Moderation operations on behalf of a verified session.
    pub fn moderation<'a>(&'a self, claims: &'a Claims) -> Moderation<'a> {
        Moderation::new(
            self.ads.as_ref(),
            self.admins.as_ref(),
            self.images.as_ref(),
            self.config.bcrypt_cost,
            claims,
        )
    }
}
