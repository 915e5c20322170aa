/**
 * Routes Module
 * API route handlers
 */

pub mod admin;
pub mod ads;
pub mod auth;
pub mod health;

use axum::{
    extract::rejection::JsonRejection,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::models::Ad;
use crate::error::{AppError, ErrorResponse, ValidationErrors};

/// An ad as returned to clients, with a resolvable image URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdView {
    #[serde(flatten)]
    pub ad: Ad,
    pub image_url: String,
}

/// Success response for mutations
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SuccessResponse {
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }
}

/// Scheme and host the client used, honouring tunnel/proxy headers.
pub fn base_url(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let proto = header("x-forwarded-proto").unwrap_or("http");
    let host = header("x-forwarded-host")
        .or_else(|| header("host"))
        .unwrap_or("localhost");
    format!("{}://{}", proto, host)
}

pub fn with_image_urls(ads: Vec<Ad>, headers: &HeaderMap) -> Vec<AdView> {
    let base = base_url(headers);
    ads.into_iter()
        .map(|ad| AdView {
            image_url: format!("{}/uploads/{}", base, ad.image_path),
            ad,
        })
        .collect()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub status: String,
    pub endpoints: Vec<String>,
}

/// GET /
pub async fn root_info() -> impl IntoResponse {
    let endpoints = [
        "GET /api/ads",
        "POST /api/ads",
        "POST /api/admin/login",
        "GET /api/admin/validate",
        "GET /api/admin/ads",
        "GET /api/admin/ads/pending",
        "PUT /api/admin/ads/{id}/approve",
        "DELETE /api/admin/ads/{id}",
        "DELETE /api/admin/ads/clear",
        "PUT /api/admin/password",
        "GET /api/admin/stats",
        "GET /api/admin/export",
        "POST /api/admin/import",
        "GET /api/health",
    ];

    Json(ServiceInfo {
        name: "Classified Ads API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "running".to_string(),
        endpoints: endpoints.iter().map(|e| e.to_string()).collect(),
    })
}

/// Unwraps a JSON body. Malformed or mismatched bodies become a JSON
/// validation error instead of axum's plain-text rejection.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> crate::error::Result<T> {
    payload.map(|Json(value)| value).map_err(|e| {
        tracing::debug!("JSON body rejected: {}", e);
        AppError::Validation(ValidationErrors::single("body", "Invalid JSON body"))
    })
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new("Endpoint not found")),
    )
}
