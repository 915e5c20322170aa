/**
 * Admin Routes
 * Moderation dashboard endpoints. Every handler takes `AdminSession` first,
 * so an invalid credential is rejected before anything else happens.
 */
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::models::{Ad, AdStats};
use crate::error::Result;
use crate::routes::auth::AdminSession;
use crate::routes::{json_body, with_image_urls, AdView, SuccessResponse};
use crate::state::AppState;

pub const EXPORT_VERSION: &str = "1.0.0";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct AllAdsResponse {
    pub pending: Vec<AdView>,
    pub approved: Vec<AdView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PendingAdsResponse {
    pub ads: Vec<AdView>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub ads: Vec<Ad>,
    pub exported_at: DateTime<Utc>,
    pub version: String,
}

/// Accepts an export document as is; extra keys are ignored.
#[derive(Debug, Serialize, Deserialize)]
pub struct ImportRequest {
    pub ads: Vec<Ad>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportResponse {
    pub success: bool,
    pub imported: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearResponse {
    pub success: bool,
    pub message: String,
    pub deleted: u64,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/admin/ads
pub async fn all_ads(
    AdminSession(claims): AdminSession,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AllAdsResponse>> {
    let moderation = state.moderation(&claims);
    let pending = moderation.list_pending().await?;
    let approved = moderation.list_approved().await?;

    Ok(Json(AllAdsResponse {
        pending: with_image_urls(pending, &headers),
        approved: with_image_urls(approved, &headers),
    }))
}

/// GET /api/admin/ads/pending
pub async fn pending_ads(
    AdminSession(claims): AdminSession,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PendingAdsResponse>> {
    let pending = state.moderation(&claims).list_pending().await?;
    Ok(Json(PendingAdsResponse {
        ads: with_image_urls(pending, &headers),
    }))
}

/// PUT /api/admin/ads/{id}/approve
pub async fn approve(
    AdminSession(claims): AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>> {
    state.moderation(&claims).approve(&id).await?;
    Ok(Json(SuccessResponse::with_message("Ad approved successfully")))
}

/// DELETE /api/admin/ads/{id}
pub async fn delete_ad(
    AdminSession(claims): AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>> {
    state.moderation(&claims).delete(&id).await?;
    Ok(Json(SuccessResponse::with_message("Ad deleted successfully")))
}

/// DELETE /api/admin/ads/clear
pub async fn clear_ads(
    AdminSession(claims): AdminSession,
    State(state): State<AppState>,
) -> Result<Json<ClearResponse>> {
    let deleted = state.moderation(&claims).clear_all().await?;
    Ok(Json(ClearResponse {
        success: true,
        message: "All ads cleared successfully".to_string(),
        deleted,
    }))
}

/// PUT /api/admin/password
pub async fn change_password(
    AdminSession(claims): AdminSession,
    State(state): State<AppState>,
    payload: std::result::Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>> {
    let payload = json_body(payload)?;
    state
        .moderation(&claims)
        .change_password(&payload.current_password, &payload.new_password)
        .await?;
    Ok(Json(SuccessResponse::with_message("Password changed successfully")))
}

/// GET /api/admin/stats
pub async fn stats(
    AdminSession(claims): AdminSession,
    State(state): State<AppState>,
) -> Result<Json<AdStats>> {
    Ok(Json(state.moderation(&claims).stats(Utc::now()).await?))
}

/// GET /api/admin/export
pub async fn export(
    AdminSession(claims): AdminSession,
    State(state): State<AppState>,
) -> Result<Json<ExportDocument>> {
    let ads = state.moderation(&claims).export().await?;
    Ok(Json(ExportDocument {
        ads,
        exported_at: Utc::now(),
        version: EXPORT_VERSION.to_string(),
    }))
}

/// POST /api/admin/import
pub async fn import(
    AdminSession(claims): AdminSession,
    State(state): State<AppState>,
    payload: std::result::Result<Json<ImportRequest>, JsonRejection>,
) -> Result<Json<ImportResponse>> {
    let payload = json_body(payload)?;
    let imported = state.moderation(&claims).import(payload.ads).await?;
    Ok(Json(ImportResponse {
        success: true,
        imported,
    }))
}
