//! Media Catalog Types
//!
//! A `MediaItem` is the purchasable unit: a single movie carrying one video
//! URL, or a series carrying one URL per episode.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Catalog item kind
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "MOVIE",
            MediaKind::Series => "SERIES",
        }
    }

    /// Parse a client-supplied kind string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "MOVIE" => Some(MediaKind::Movie),
            "SERIES" => Some(MediaKind::Series),
            _ => None,
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A purchasable catalog entry
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    /// Catalog id
    pub id: String,

    pub title: String,

    pub description: String,

    pub genre: String,

    /// Poster/thumbnail URL
    pub thumbnail: String,

    /// Constituent video URLs: exactly one for a movie, one per episode
    /// for a series
    pub video_urls: Vec<String>,

    pub kind: MediaKind,

    /// Purchase price; `None` means not individually purchasable
    pub amount: Option<Decimal>,

    #[serde(default)]
    pub release_date: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,
}

impl MediaItem {
    /// Check the unit-count invariant for this item's kind.
    ///
    /// Enforced at catalog-write time only; the purchase path trusts the
    /// catalog and does not re-validate.
    pub fn validate(&self) -> Result<()> {
        match self.kind {
            MediaKind::Movie if self.video_urls.len() != 1 => Err(CoreError::InvalidItem(
                format!(
                    "movie '{}' must carry exactly one video URL, got {}",
                    self.id,
                    self.video_urls.len()
                ),
            )),
            MediaKind::Series if self.video_urls.is_empty() => Err(CoreError::InvalidItem(
                format!("series '{}' must carry at least one video URL", self.id),
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(kind: MediaKind, urls: &[&str]) -> MediaItem {
        MediaItem {
            id: "m1".into(),
            title: "Test Title".into(),
            description: "desc".into(),
            genre: "Drama".into(),
            thumbnail: "https://cdn.example.com/t.jpg".into(),
            video_urls: urls.iter().map(|s| (*s).to_string()).collect(),
            kind,
            amount: Some(dec!(100)),
            release_date: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_movie_requires_exactly_one_url() {
        assert!(item(MediaKind::Movie, &["https://v/1"]).validate().is_ok());
        assert!(item(MediaKind::Movie, &[]).validate().is_err());
        assert!(
            item(MediaKind::Movie, &["https://v/1", "https://v/2"])
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_series_requires_at_least_one_url() {
        assert!(item(MediaKind::Series, &[]).validate().is_err());
        assert!(
            item(MediaKind::Series, &["https://v/e1", "https://v/e2"])
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!(MediaKind::parse("movie"), Some(MediaKind::Movie));
        assert_eq!(MediaKind::parse("SERIES"), Some(MediaKind::Series));
        assert_eq!(MediaKind::parse("PODCAST"), None);
    }
}
