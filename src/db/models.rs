//! Database Models - ads, the administrator row, and the lookup tables that
//! go with them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

/// Moderation status. Only ever moves from `Pending` to `Approved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdStatus {
    Pending,
    Approved,
}

impl AdStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdStatus::Pending => "pending",
            AdStatus::Approved => "approved",
        }
    }
}

impl std::str::FromStr for AdStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AdStatus::Pending),
            "approved" => Ok(AdStatus::Approved),
            other => Err(AppError::Storage(format!("unknown ad status '{}'", other))),
        }
    }
}

/// Fixed set of ad categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Electronics,
    Fashion,
    HomeGarden,
    Beauty,
    Sports,
    Automotive,
    Entertainment,
    FoodDining,
    Travel,
    Services,
    RealEstate,
    Jobs,
    Education,
    Health,
    Pets,
    Other,
}

impl Category {
    pub const ALL: [Category; 16] = [
        Category::Electronics,
        Category::Fashion,
        Category::HomeGarden,
        Category::Beauty,
        Category::Sports,
        Category::Automotive,
        Category::Entertainment,
        Category::FoodDining,
        Category::Travel,
        Category::Services,
        Category::RealEstate,
        Category::Jobs,
        Category::Education,
        Category::Health,
        Category::Pets,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Electronics => "electronics",
            Category::Fashion => "fashion",
            Category::HomeGarden => "home-garden",
            Category::Beauty => "beauty",
            Category::Sports => "sports",
            Category::Automotive => "automotive",
            Category::Entertainment => "entertainment",
            Category::FoodDining => "food-dining",
            Category::Travel => "travel",
            Category::Services => "services",
            Category::RealEstate => "real-estate",
            Category::Jobs => "jobs",
            Category::Education => "education",
            Category::Health => "health",
            Category::Pets => "pets",
            Category::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Category> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

/// Duration keys offered to submitters, with their day counts.
pub const DURATION_DAYS: &[(&str, i64)] = &[
    ("1-week", 7),
    ("2-weeks", 14),
    ("1-month", 30),
    ("2-months", 60),
    ("3-months", 90),
];

/// Days used when the duration key is not in the table.
pub const DEFAULT_DURATION_DAYS: i64 = 30;

pub fn duration_days(key: &str) -> i64 {
    DURATION_DAYS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, days)| *days)
        .unwrap_or(DEFAULT_DURATION_DAYS)
}

/// `created_at + DURATION_DAYS[duration]`, fixed at creation.
pub fn expiry_for(created_at: DateTime<Utc>, duration: &str) -> DateTime<Utc> {
    created_at + Duration::days(duration_days(duration))
}

/// A submitted listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ad {
    pub id: String,
    pub store_name: String,
    pub title: String,
    pub description: String,
    pub country: String,
    pub category: Category,
    pub duration: String,
    /// File name inside the upload directory.
    pub image_path: String,
    pub email: String,
    pub status: AdStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Row shape of the `ads` table; enums are stored as text.
#[derive(Debug, Clone, FromRow)]
pub struct AdRow {
    pub id: String,
    pub store_name: String,
    pub title: String,
    pub description: String,
    pub country: String,
    pub category: String,
    pub duration: String,
    pub image_path: String,
    pub email: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TryFrom<AdRow> for Ad {
    type Error = AppError;

    fn try_from(row: AdRow) -> Result<Self, Self::Error> {
        let category = Category::parse(&row.category).ok_or_else(|| {
            AppError::Storage(format!("unknown category '{}' on ad {}", row.category, row.id))
        })?;
        Ok(Ad {
            status: row.status.parse()?,
            category,
            id: row.id,
            store_name: row.store_name,
            title: row.title,
            description: row.description,
            country: row.country,
            duration: row.duration,
            image_path: row.image_path,
            email: row.email,
            created_at: row.created_at,
            expires_at: row.expires_at,
        })
    }
}

/// The single administrator.
#[derive(Debug, Clone, FromRow)]
pub struct Admin {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Informational counters for the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdStats {
    pub total_ads: i64,
    pub pending_ads: i64,
    pub approved_ads: i64,
    pub expired_ads: i64,
}
