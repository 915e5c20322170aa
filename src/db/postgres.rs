//! Postgres-backed stores.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::models::{Ad, AdRow, AdStats, AdStatus, Admin};
use super::{AdStore, AdminStore};
use crate::error::{AppError, Result};

const AD_COLUMNS: &str = "id, store_name, title, description, country, category, duration, \
                          image_path, email, status, created_at, expires_at";

#[derive(Clone)]
pub struct PgAdStore {
    pool: PgPool,
}

impl PgAdStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_ads(rows: Vec<AdRow>) -> Result<Vec<Ad>> {
    rows.into_iter().map(Ad::try_from).collect()
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

async fn insert_ad<'e, E>(executor: E, ad: &Ad) -> std::result::Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO ads (id, store_name, title, description, country, category, duration,
                         image_path, email, status, created_at, expires_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(&ad.id)
    .bind(&ad.store_name)
    .bind(&ad.title)
    .bind(&ad.description)
    .bind(&ad.country)
    .bind(ad.category.as_str())
    .bind(&ad.duration)
    .bind(&ad.image_path)
    .bind(&ad.email)
    .bind(ad.status.as_str())
    .bind(ad.created_at)
    .bind(ad.expires_at)
    .execute(executor)
    .await?;
    Ok(())
}

#[async_trait]
impl AdStore for PgAdStore {
    async fn insert(&self, ad: &Ad) -> Result<()> {
        insert_ad(&self.pool, ad).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("ad id {} already exists", ad.id))
            } else {
                e.into()
            }
        })
    }

    async fn get(&self, id: &str) -> Result<Option<Ad>> {
        let row = sqlx::query_as::<_, AdRow>(&format!(
            "SELECT {} FROM ads WHERE id = $1",
            AD_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Ad::try_from).transpose()
    }

    async fn list_by_status(&self, status: AdStatus) -> Result<Vec<Ad>> {
        let rows = sqlx::query_as::<_, AdRow>(&format!(
            "SELECT {} FROM ads WHERE status = $1 ORDER BY created_at DESC",
            AD_COLUMNS
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        into_ads(rows)
    }

    async fn list_visible(&self, now: DateTime<Utc>) -> Result<Vec<Ad>> {
        let rows = sqlx::query_as::<_, AdRow>(&format!(
            "SELECT {} FROM ads WHERE status = 'approved' AND expires_at > $1 \
             ORDER BY created_at DESC",
            AD_COLUMNS
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        into_ads(rows)
    }

    async fn list_all(&self) -> Result<Vec<Ad>> {
        let rows = sqlx::query_as::<_, AdRow>(&format!(
            "SELECT {} FROM ads ORDER BY created_at DESC",
            AD_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        into_ads(rows)
    }

    async fn set_approved(&self, id: &str) -> Result<()> {
        let result = sqlx::query("UPDATE ads SET status = 'approved' WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Ad".to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<Option<String>> {
        let image: Option<(String,)> =
            sqlx::query_as("DELETE FROM ads WHERE id = $1 RETURNING image_path")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(image.map(|(path,)| path))
    }

    async fn delete_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM ads").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn replace_all(&self, ads: &[Ad]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM ads").execute(&mut *tx).await?;
        for ad in ads {
            insert_ad(&mut *tx, ad).await.map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict(format!("ad id {} appears twice", ad.id))
                } else {
                    e.into()
                }
            })?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn stats(&self, now: DateTime<Utc>) -> Result<AdStats> {
        let (total_ads, pending_ads, approved_ads, expired_ads): (i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*),
                    COUNT(*) FILTER (WHERE status = 'pending'),
                    COUNT(*) FILTER (WHERE status = 'approved'),
                    COUNT(*) FILTER (WHERE expires_at < $1)
                FROM ads
                "#,
            )
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        Ok(AdStats {
            total_ads,
            pending_ads,
            approved_ads,
            expired_ads,
        })
    }

    async fn ping(&self) -> Result<std::time::Duration> {
        let start = std::time::Instant::now();
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(start.elapsed())
    }
}

#[derive(Clone)]
pub struct PgAdminStore {
    pool: PgPool,
}

impl PgAdminStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminStore for PgAdminStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>(
            "SELECT id, username, password_hash, created_at, updated_at \
             FROM admin WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(admin)
    }

    async fn get(&self, id: i64) -> Result<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>(
            "SELECT id, username, password_hash, created_at, updated_at \
             FROM admin WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(admin)
    }

    async fn create(&self, username: &str, password_hash: &str) -> Result<Admin> {
        sqlx::query_as::<_, Admin>(
            r#"
            INSERT INTO admin (username, password_hash, created_at, updated_at)
            VALUES ($1, $2, now(), now())
            RETURNING id, username, password_hash, created_at, updated_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("admin {} already exists", username))
            } else {
                e.into()
            }
        })
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE admin SET password_hash = $1, updated_at = now() WHERE id = $2",
        )
        .bind(password_hash)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Admin".to_string()));
        }
        Ok(())
    }
}
