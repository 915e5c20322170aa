//! Public ad submission: one validation pass, sanitization, then image
//! storage and the pending insert.

use chrono::{DateTime, Utc};
use regex::Regex;
use uuid::Uuid;

use crate::db::models::{expiry_for, Ad, AdStatus, Category};
use crate::db::AdStore;
use crate::error::{AppError, Result, ValidationErrors};
use crate::uploads::{validate_image_magic_bytes, ImageStore, MAX_FILE_SIZE};

lazy_static::lazy_static! {
    /// local@domain.tld
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

const STORE_NAME_MAX: usize = 100;
const TITLE_MAX: usize = 200;
const DESCRIPTION_MAX: usize = 2000;
const COUNTRY_MAX: usize = 100;
const CATEGORY_MAX: usize = 50;
const EMAIL_MAX: usize = 100;

/// The uploaded file as received.
#[derive(Debug, Clone, Default)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

/// Untrusted submission input. Missing text fields are empty strings.
#[derive(Debug, Clone, Default)]
pub struct AdSubmission {
    pub store_name: String,
    pub title: String,
    pub description: String,
    pub country: String,
    pub category: String,
    pub duration: String,
    pub email: String,
    pub image: Option<ImageUpload>,
}

/// A submission that passed validation, already trimmed and capped.
#[derive(Debug, Clone)]
pub struct ValidSubmission {
    pub store_name: String,
    pub title: String,
    pub description: String,
    pub country: String,
    pub category: Category,
    pub duration: String,
    pub email: String,
    pub image: Vec<u8>,
    pub mime_type: &'static str,
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Validates and sanitizes in one pass. Every problem is collected; the
/// error message names the first one in field order.
pub fn validate(submission: AdSubmission) -> Result<ValidSubmission> {
    let mut errors = ValidationErrors::new();

    let required = [
        ("store_name", "Store name", &submission.store_name),
        ("title", "Title", &submission.title),
        ("description", "Description", &submission.description),
        ("country", "Country", &submission.country),
        ("category", "Category", &submission.category),
        ("duration", "Duration", &submission.duration),
        ("email", "Email", &submission.email),
    ];
    for (field, label, value) in required {
        if value.trim().is_empty() {
            errors.push(field, format!("{} is required", label));
        }
    }

    let email = submission.email.trim();
    if !email.is_empty() && !is_valid_email(email) {
        errors.push("email", "Invalid email address");
    }

    let category_text = truncate_chars(submission.category.trim(), CATEGORY_MAX);
    let category = Category::parse(&category_text);
    if !category_text.is_empty() && category.is_none() {
        errors.push("category", "Unknown category");
    }

    let mut mime_type = None;
    match &submission.image {
        None => errors.push("image", "Image is required"),
        Some(upload) if upload.bytes.is_empty() => errors.push("image", "Empty file"),
        Some(upload) if upload.bytes.len() > MAX_FILE_SIZE => {
            errors.push("image", "File too large. Maximum size is 5MB.")
        }
        Some(upload) => match validate_image_magic_bytes(&upload.bytes) {
            Some(mime) => mime_type = Some(mime),
            None => errors.push(
                "image",
                "Invalid file type. Only JPEG, PNG, GIF and WebP images are allowed.",
            ),
        },
    }

    errors.into_result()?;

    // Every branch below was checked above.
    let (Some(category), Some(mime_type), Some(image)) = (category, mime_type, submission.image)
    else {
        return Err(AppError::Internal("validated submission is incomplete".to_string()));
    };

    Ok(ValidSubmission {
        store_name: truncate_chars(submission.store_name.trim(), STORE_NAME_MAX),
        title: truncate_chars(submission.title.trim(), TITLE_MAX),
        description: truncate_chars(submission.description.trim(), DESCRIPTION_MAX),
        country: truncate_chars(submission.country.trim(), COUNTRY_MAX),
        category,
        duration: submission.duration.trim().to_string(),
        email: truncate_chars(&email.to_lowercase(), EMAIL_MAX),
        image: image.bytes,
        mime_type,
    })
}

/// Validates, stores the image, and inserts the ad as pending.
///
/// Nothing is left behind on failure: if the insert fails the stored image
/// is released again.
pub async fn submit(
    ads: &dyn AdStore,
    images: &dyn ImageStore,
    submission: AdSubmission,
    now: DateTime<Utc>,
) -> Result<Ad> {
    if let Some(name) = submission.image.as_ref().and_then(|i| i.file_name.as_deref()) {
        tracing::debug!(original_name = %name, "Ad submission received");
    }
    let valid = validate(submission)?;

    let image_path = images.save(&valid.image, valid.mime_type).await?;

    let ad = Ad {
        id: Uuid::new_v4().to_string(),
        store_name: valid.store_name,
        title: valid.title,
        description: valid.description,
        country: valid.country,
        category: valid.category,
        expires_at: expiry_for(now, &valid.duration),
        duration: valid.duration,
        image_path,
        email: valid.email,
        status: AdStatus::Pending,
        created_at: now,
    };

    if let Err(e) = ads.insert(&ad).await {
        if let Err(release_err) = images.remove(&ad.image_path).await {
            tracing::warn!(
                image = %ad.image_path,
                error = %release_err,
                "failed to release image after rejected insert"
            );
        }
        return Err(e);
    }

    tracing::info!(ad_id = %ad.id, "Ad submitted and pending approval");
    Ok(ad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryAdStore;
    use crate::testing::{png_bytes, BrokenAdStore, RecordingImageStore};
    use chrono::Duration;

    fn submission(duration: &str) -> AdSubmission {
        AdSubmission {
            store_name: "  Corner Shop ".to_string(),
            title: "Summer sale".to_string(),
            description: "Half price on everything".to_string(),
            country: "Ireland".to_string(),
            category: "fashion".to_string(),
            duration: duration.to_string(),
            email: " Owner@Corner.SHOP ".to_string(),
            image: Some(ImageUpload {
                file_name: Some("banner.png".to_string()),
                bytes: png_bytes(),
            }),
        }
    }

    fn first_field(err: AppError) -> String {
        match err {
            AppError::Validation(errors) => errors.first().unwrap().field.clone(),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_sanitizes_fields() {
        let valid = validate(submission("1-week")).unwrap();
        assert_eq!(valid.store_name, "Corner Shop");
        assert_eq!(valid.email, "owner@corner.shop");
        assert_eq!(valid.category, Category::Fashion);
        assert_eq!(valid.mime_type, "image/png");
    }

    #[test]
    fn test_caps_lengths() {
        let mut sub = submission("1-week");
        sub.title = "t".repeat(500);
        sub.description = "é".repeat(3000);
        let valid = validate(sub).unwrap();
        assert_eq!(valid.title.chars().count(), 200);
        assert_eq!(valid.description.chars().count(), 2000);
    }

    #[test]
    fn test_first_offending_field_is_named() {
        let mut sub = submission("1-week");
        sub.title = "   ".to_string();
        sub.email = "not-an-email".to_string();
        sub.image = None;

        let err = validate(sub).unwrap_err();
        assert_eq!(err.to_string(), "Title is required");
        assert_eq!(first_field(err), "title");
    }

    #[test]
    fn test_rejects_bad_email() {
        let mut sub = submission("1-week");
        sub.email = "owner@shop".to_string();
        assert_eq!(first_field(validate(sub).unwrap_err()), "email");
    }

    #[test]
    fn test_rejects_unknown_category() {
        let mut sub = submission("1-week");
        sub.category = "weapons".to_string();
        assert_eq!(first_field(validate(sub).unwrap_err()), "category");
    }

    #[test]
    fn test_rejects_missing_oversized_and_non_image_files() {
        let mut sub = submission("1-week");
        sub.image = None;
        assert_eq!(first_field(validate(sub).unwrap_err()), "image");

        let mut sub = submission("1-week");
        let mut big = png_bytes();
        big.resize(MAX_FILE_SIZE + 1, 0);
        sub.image = Some(ImageUpload { file_name: None, bytes: big });
        assert_eq!(validate(sub).unwrap_err().to_string(), "File too large. Maximum size is 5MB.");

        let mut sub = submission("1-week");
        sub.image = Some(ImageUpload {
            file_name: Some("notes.txt".to_string()),
            bytes: b"plain text, not an image".to_vec(),
        });
        assert_eq!(first_field(validate(sub).unwrap_err()), "image");
    }

    #[tokio::test]
    async fn test_submit_creates_pending_ad_with_expiry() {
        let ads = MemoryAdStore::new();
        let images = RecordingImageStore::new();
        let t = Utc::now();

        let ad = submit(&ads, &images, submission("1-week"), t).await.unwrap();
        assert_eq!(ad.status, AdStatus::Pending);
        assert_eq!(ad.created_at, t);
        assert_eq!(ad.expires_at, t + Duration::days(7));
        assert_eq!(images.saved(), vec![ad.image_path.clone()]);
        assert_eq!(ads.get(&ad.id).await.unwrap(), Some(ad));
    }

    #[tokio::test]
    async fn test_unknown_duration_defaults_to_thirty_days() {
        let ads = MemoryAdStore::new();
        let images = RecordingImageStore::new();
        let t = Utc::now();

        let ad = submit(&ads, &images, submission("bogus"), t).await.unwrap();
        assert_eq!(ad.duration, "bogus");
        assert_eq!(ad.expires_at, t + Duration::days(30));
    }

    #[tokio::test]
    async fn test_invalid_submission_has_no_side_effects() {
        let ads = MemoryAdStore::new();
        let images = RecordingImageStore::new();
        let mut sub = submission("1-week");
        sub.email = String::new();

        assert!(submit(&ads, &images, sub, Utc::now()).await.is_err());
        assert!(images.saved().is_empty());
        assert!(ads.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_insert_releases_stored_image() {
        let images = RecordingImageStore::new();
        let err = submit(&BrokenAdStore, &images, submission("1-week"), Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Storage(_)));
        assert_eq!(images.saved().len(), 1);
        assert_eq!(images.removed(), images.saved());
    }

    #[tokio::test]
    async fn test_each_submission_gets_a_fresh_id() {
        let ads = MemoryAdStore::new();
        let images = RecordingImageStore::new();
        let a = submit(&ads, &images, submission("1-week"), Utc::now()).await.unwrap();
        let b = submit(&ads, &images, submission("1-week"), Utc::now()).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(ads.list_all().await.unwrap().len(), 2);
    }
}
