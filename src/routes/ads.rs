/**
 * Public Ad Routes
 * Listing of visible ads and multipart ad submission
 */
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result, ValidationErrors};
use crate::routes::{with_image_urls, AdView};
use crate::services::submission::{self, AdSubmission, ImageUpload};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct AdsResponse {
    pub ads: Vec<AdView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
    pub id: String,
}

/// GET /api/ads
/// Approved, unexpired ads, newest first.
pub async fn list_ads(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AdsResponse>> {
    let ads = state.ads.list_visible(Utc::now()).await?;
    Ok(Json(AdsResponse {
        ads: with_image_urls(ads, &headers),
    }))
}

/// POST /api/ads
pub async fn submit_ad(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse> {
    let multipart = multipart.map_err(|e| {
        tracing::debug!("Multipart rejected: {}", e);
        AppError::Validation(ValidationErrors::single("form", "Invalid multipart data"))
    })?;

    let submission = read_submission(multipart).await?;
    let ad = submission::submit(
        state.ads.as_ref(),
        state.images.as_ref(),
        submission,
        Utc::now(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            success: true,
            message: "Ad submitted successfully and is pending approval".to_string(),
            id: ad.id,
        }),
    ))
}

/// Collects the known form fields. Unknown parts are skipped; a zero-length
/// image part counts as no image.
async fn read_submission(mut multipart: Multipart) -> Result<AdSubmission> {
    let mut submission = AdSubmission::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "image" {
            let file_name = field.file_name().map(str::to_string);
            let bytes = field.bytes().await.map_err(multipart_error)?;
            if !bytes.is_empty() {
                submission.image = Some(ImageUpload {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let slot = match name.as_str() {
            "store_name" => &mut submission.store_name,
            "title" => &mut submission.title,
            "description" => &mut submission.description,
            "country" => &mut submission.country,
            "category" => &mut submission.category,
            "duration" => &mut submission.duration,
            "email" => &mut submission.email,
            _ => continue,
        };
        *slot = field.text().await.map_err(multipart_error)?;
    }

    Ok(submission)
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::Validation(ValidationErrors::single(
            "image",
            "File too large. Maximum size is 5MB.",
        ));
    }
    tracing::warn!("Multipart error: {}", err);
    AppError::Validation(ValidationErrors::single("form", "Invalid multipart data"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Ad, AdStatus};
    use crate::db::AdStore;
    use crate::error::ErrorResponse;
    use crate::testing::{png_bytes, test_app};
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use chrono::Duration;
    use tower::ServiceExt;

    const BOUNDARY: &str = "ads-test-boundary";

    fn router(state: AppState) -> Router {
        Router::new()
            .route("/api/ads", get(list_ads).post(submit_ad))
            .with_state(state)
    }

    fn multipart_body(fields: &[(&str, &str)], image: Option<&[u8]>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    BOUNDARY, name, value
                )
                .as_bytes(),
            );
        }
        if let Some(bytes) = image {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"banner.png\"\r\nContent-Type: image/png\r\n\r\n",
                    BOUNDARY
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn valid_fields() -> Vec<(&'static str, &'static str)> {
        vec![
            ("store_name", "Corner Shop"),
            ("title", "Summer sale"),
            ("description", "Half price on everything"),
            ("country", "Ireland"),
            ("category", "fashion"),
            ("duration", "1-week"),
            ("email", "owner@corner.shop"),
        ]
    }

    async fn post_form(app: Router, body: Vec<u8>) -> (StatusCode, axum::body::Bytes) {
        let req = Request::post("/api/ads")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes)
    }

    #[tokio::test]
    async fn test_submit_creates_pending_ad() {
        let app = test_app().await;
        let body = multipart_body(&valid_fields(), Some(&png_bytes()));

        let (status, bytes) = post_form(router(app.state.clone()), body).await;
        assert_eq!(status, StatusCode::CREATED);
        let res: SubmitResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(res.success);

        let ad = app.ads.get(&res.id).await.unwrap().unwrap();
        assert_eq!(ad.status, AdStatus::Pending);
        assert_eq!(ad.title, "Summer sale");
        assert_eq!(app.images.saved(), vec![ad.image_path]);
    }

    #[tokio::test]
    async fn test_submit_without_image_is_rejected() {
        let app = test_app().await;
        let body = multipart_body(&valid_fields(), None);

        let (status, bytes) = post_form(router(app.state.clone()), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let res: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(res.error, "Image is required");
        assert!(app.ads.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_names_first_missing_field() {
        let app = test_app().await;
        let fields: Vec<_> = valid_fields()
            .into_iter()
            .filter(|(name, _)| *name != "country")
            .collect();
        let body = multipart_body(&fields, Some(&png_bytes()));

        let (status, bytes) = post_form(router(app.state), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let res: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(res.error, "Country is required");
    }

    #[tokio::test]
    async fn test_submit_rejects_non_multipart_body() {
        let app = test_app().await;
        let req = Request::post("/api/ads")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let res = router(app.state).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_shows_only_visible_ads_with_urls() {
        let app = test_app().await;
        let now = Utc::now();
        let ad = |id: &str, status: AdStatus, expires_in: Duration| Ad {
            id: id.to_string(),
            store_name: "Shop".to_string(),
            title: id.to_string(),
            description: "d".to_string(),
            country: "Chile".to_string(),
            category: crate::db::models::Category::Other,
            duration: "1-week".to_string(),
            image_path: format!("{}.png", id),
            email: "a@b.cl".to_string(),
            status,
            created_at: now,
            expires_at: now + expires_in,
        };
        app.ads.insert(&ad("live", AdStatus::Approved, Duration::days(3))).await.unwrap();
        app.ads.insert(&ad("waiting", AdStatus::Pending, Duration::days(3))).await.unwrap();
        app.ads.insert(&ad("stale", AdStatus::Approved, -Duration::days(1))).await.unwrap();

        let req = Request::get("/api/ads")
            .header("host", "ads.local:5000")
            .body(Body::empty())
            .unwrap();
        let res = router(app.state).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: AdsResponse = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body.ads.len(), 1);
        assert_eq!(body.ads[0].ad.id, "live");
        assert_eq!(body.ads[0].image_url, "http://ads.local:5000/uploads/live.png");
    }
}
