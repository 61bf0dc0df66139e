use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lenient;
use crate::media::{MediaIdentity, MediaKind};

/// A saved title, newest first in the persisted list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchlistEntry {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::or_default")]
    pub poster_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::or_default")]
    pub backdrop_path: Option<String>,
    #[serde(default, deserialize_with = "lenient::number_or_zero")]
    pub vote_average: f64,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::or_default")]
    pub release_date: Option<String>, // movies
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::or_default")]
    pub first_air_date: Option<String>, // series
    /// Epoch milliseconds on the wire; unreadable values fall back to the epoch
    #[serde(
        default,
        serialize_with = "chrono::serde::ts_milliseconds::serialize",
        deserialize_with = "lenient::millis_or_default"
    )]
    pub added_at: DateTime<Utc>,
}

impl WatchlistEntry {
    pub fn identity(&self) -> MediaIdentity {
        MediaIdentity::new(self.kind, self.id)
    }

    /// Release date for movies, first air date for series.
    pub fn premiere_date(&self) -> Option<&str> {
        match self.kind {
            MediaKind::Movie => self.release_date.as_deref(),
            MediaKind::Series => self.first_air_date.as_deref(),
        }
    }
}

/// Watchlist entry as supplied by callers, before the store stamps `added_at`.
///
/// Display fields come from the catalog client; the store never fetches them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchlistDraft {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default, deserialize_with = "lenient::number_or_zero")]
    pub vote_average: f64,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
}

impl WatchlistDraft {
    pub fn new(identity: MediaIdentity, title: impl Into<String>) -> Self {
        Self {
            id: identity.id,
            kind: identity.kind,
            title: title.into(),
            poster_path: None,
            backdrop_path: None,
            vote_average: 0.0,
            release_date: None,
            first_air_date: None,
        }
    }

    pub fn identity(&self) -> MediaIdentity {
        MediaIdentity::new(self.kind, self.id)
    }

    pub fn into_entry(self, added_at: DateTime<Utc>) -> WatchlistEntry {
        WatchlistEntry {
            id: self.id,
            kind: self.kind,
            title: self.title,
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
            vote_average: self.vote_average,
            release_date: self.release_date,
            first_air_date: self.first_air_date,
            added_at,
        }
    }
}
