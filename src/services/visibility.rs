use chrono::{DateTime, Utc};

use crate::db::models::{Ad, AdStatus};

/// An ad is publicly listed iff it is approved and not yet expired.
///
/// Evaluated on every read; nothing sweeps expired ads.
pub fn is_visible(ad: &Ad, now: DateTime<Utc>) -> bool {
    ad.status == AdStatus::Approved && ad.expires_at > now
}
