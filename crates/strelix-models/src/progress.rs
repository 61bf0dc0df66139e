use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::lenient;
use crate::media::{MediaIdentity, MediaKind};

/// Watched position and total length of one piece of media, in seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct PlaybackProgress {
    #[serde(default, deserialize_with = "lenient::number_or_zero")]
    pub watched: f64,
    #[serde(default, deserialize_with = "lenient::number_or_zero")]
    pub duration: f64,
}

impl PlaybackProgress {
    pub fn new(watched: f64, duration: f64) -> Self {
        Self { watched, duration }
    }

    /// Rounded percentage watched, clamped to `0..=100`.
    ///
    /// Returns `None` when the duration is unknown (zero, negative or not finite);
    /// such records are not eligible for ranking.
    pub fn percent(&self) -> Option<u8> {
        if !self.duration.is_finite() || self.duration <= 0.0 || !self.watched.is_finite() {
            return None;
        }
        let pct = (100.0 * self.watched / self.duration).round();
        Some(pct.clamp(0.0, 100.0) as u8)
    }
}

/// Season/episode pair, written as `s<season>e<episode>` in per-episode maps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EpisodeKey {
    pub season: u32,
    pub episode: u32,
}

impl EpisodeKey {
    pub fn new(season: u32, episode: u32) -> Self {
        Self { season, episode }
    }
}

impl Default for EpisodeKey {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl fmt::Display for EpisodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}e{}", self.season, self.episode)
    }
}

impl FromStr for EpisodeKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        let rest = lower
            .strip_prefix('s')
            .ok_or_else(|| format!("invalid episode key '{}'", s))?;
        let (season, episode) = rest
            .split_once('e')
            .ok_or_else(|| format!("invalid episode key '{}'", s))?;
        let season = season
            .parse()
            .map_err(|_| format!("invalid season in episode key '{}'", s))?;
        let episode = episode
            .parse()
            .map_err(|_| format!("invalid episode in episode key '{}'", s))?;
        Ok(Self { season, episode })
    }
}

/// Progress of a single episode inside a series record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EpisodeProgress {
    #[serde(with = "numeric_string")]
    pub season: u32,
    #[serde(with = "numeric_string")]
    pub episode: u32,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub progress: PlaybackProgress,
    /// Player fields this model does not name, kept so they are written back as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EpisodeProgress {
    pub fn new(season: u32, episode: u32, progress: PlaybackProgress) -> Self {
        Self {
            season,
            episode,
            progress,
            extra: Map::new(),
        }
    }

    pub fn key(&self) -> EpisodeKey {
        EpisodeKey::new(self.season, self.episode)
    }
}

/// Playback state of one title, as reported by the embedded player.
///
/// The display fields are denormalized copies of catalog metadata. For series the
/// top-level `progress` tracks the most recently active episode, while
/// `show_progress` keeps every episode the player has seen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressRecord {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::or_default")]
    pub poster_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::or_default")]
    pub backdrop_path: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub progress: PlaybackProgress,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "numeric_string::option")]
    pub last_season_watched: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "numeric_string::option")]
    pub last_episode_watched: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "episode_map")]
    pub show_progress: Option<BTreeMap<String, EpisodeProgress>>,
    /// Time of the player's last write (epoch milliseconds on the wire)
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "chrono::serde::ts_milliseconds_option::serialize",
        deserialize_with = "lenient::millis_option"
    )]
    pub last_updated: Option<DateTime<Utc>>,
    /// Player fields this model does not name, kept so they are written back as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProgressRecord {
    pub fn new(identity: MediaIdentity, title: impl Into<String>, progress: PlaybackProgress) -> Self {
        Self {
            id: identity.id,
            kind: identity.kind,
            title: title.into(),
            poster_path: None,
            backdrop_path: None,
            progress,
            last_season_watched: None,
            last_episode_watched: None,
            show_progress: None,
            last_updated: None,
            extra: Map::new(),
        }
    }

    pub fn identity(&self) -> MediaIdentity {
        MediaIdentity::new(self.kind, self.id)
    }

    pub fn percent_watched(&self) -> Option<u8> {
        self.progress.percent()
    }

    /// Episode to resume a series at; `None` for movies.
    ///
    /// Falls back to season 1 / episode 1 when the player did not report one.
    pub fn resume_episode(&self) -> Option<EpisodeKey> {
        match self.kind {
            MediaKind::Movie => None,
            MediaKind::Series => Some(EpisodeKey::new(
                self.last_season_watched.unwrap_or(1),
                self.last_episode_watched.unwrap_or(1),
            )),
        }
    }

    /// Look up one episode's progress.
    ///
    /// Tries the canonical `s<n>e<n>` key first, then falls back to scanning entries
    /// since the map keys come from a third party.
    pub fn episode_progress(&self, key: EpisodeKey) -> Option<&EpisodeProgress> {
        let episodes = self.show_progress.as_ref()?;
        episodes
            .get(&key.to_string())
            .or_else(|| episodes.values().find(|ep| ep.key() == key))
    }

    /// Backdrop if present, poster otherwise.
    pub fn artwork_path(&self) -> Option<&str> {
        self.backdrop_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .or_else(|| self.poster_path.as_deref().filter(|p| !p.is_empty()))
    }
}

/// Complete progress state: one record per identity.
///
/// The embedded player always reports its full state, so a snapshot is replaced as a
/// whole rather than merged. On the wire it is a JSON object whose values are
/// records; the identity of each record is read from its own `id` and `type`
/// fields. Decoded records are written back under the key they arrived with, and
/// records inserted locally under `movie-<id>` / `tv-<id>`. Entries that fail to
/// decode are skipped without discarding the rest of the snapshot.
#[derive(Debug, Clone, Default)]
pub struct ProgressSnapshot {
    records: BTreeMap<MediaIdentity, ProgressRecord>,
    keys: BTreeMap<MediaIdentity, String>,
}

/// Snapshots compare by their records; wire keys are presentation only.
impl PartialEq for ProgressSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.records == other.records
    }
}

impl ProgressSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record under its own identity, returning the record it replaced.
    pub fn insert(&mut self, record: ProgressRecord) -> Option<ProgressRecord> {
        self.records.insert(record.identity(), record)
    }

    pub fn get(&self, identity: &MediaIdentity) -> Option<&ProgressRecord> {
        self.records.get(identity)
    }

    pub fn remove(&mut self, identity: &MediaIdentity) -> Option<ProgressRecord> {
        self.keys.remove(identity);
        self.records.remove(identity)
    }

    pub fn contains(&self, identity: &MediaIdentity) -> bool {
        self.records.contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MediaIdentity, &ProgressRecord)> {
        self.records.iter()
    }

    pub fn records(&self) -> impl Iterator<Item = &ProgressRecord> {
        self.records.values()
    }
}

impl FromIterator<ProgressRecord> for ProgressSnapshot {
    fn from_iter<I: IntoIterator<Item = ProgressRecord>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for record in iter {
            snapshot.insert(record);
        }
        snapshot
    }
}

impl IntoIterator for ProgressSnapshot {
    type Item = (MediaIdentity, ProgressRecord);
    type IntoIter = std::collections::btree_map::IntoIter<MediaIdentity, ProgressRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl Serialize for ProgressSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        let mut written = HashSet::new();
        for (identity, record) in &self.records {
            // Two records may have arrived under one key; the later one gets its canonical key
            let key = match self.keys.get(identity) {
                Some(key) if !written.contains(key.as_str()) => key.clone(),
                _ => identity.to_string(),
            };
            map.serialize_entry(&key, record)?;
            written.insert(key);
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ProgressSnapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SnapshotVisitor;

        impl<'de> Visitor<'de> for SnapshotVisitor {
            type Value = ProgressSnapshot;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of progress records")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut snapshot = ProgressSnapshot::new();
                let mut skipped = 0usize;
                while let Some((key, value)) = access.next_entry::<String, serde_json::Value>()? {
                    match serde_json::from_value::<ProgressRecord>(value) {
                        Ok(record) => {
                            snapshot.keys.insert(record.identity(), key);
                            snapshot.insert(record);
                        }
                        Err(e) => {
                            skipped += 1;
                            warn!("Skipping malformed progress entry '{}': {}", key, e);
                        }
                    }
                }
                if skipped > 0 {
                    warn!(
                        "Decoded progress snapshot with {} record(s), skipped {} malformed entr(ies)",
                        snapshot.len(),
                        skipped
                    );
                }
                Ok(snapshot)
            }
        }

        deserializer.deserialize_map(SnapshotVisitor)
    }
}

/// Decode `show_progress`, skipping episodes that cannot be read.
///
/// A missing `season` or `episode` is recovered from the `s<n>e<n>` map key.
fn episode_map<'de, D>(deserializer: D) -> Result<Option<BTreeMap<String, EpisodeProgress>>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = match Value::deserialize(deserializer)? {
        Value::Object(entries) => entries,
        Value::Null => return Ok(None),
        other => {
            warn!("Ignoring show_progress that is not an object: {}", other);
            return Ok(None);
        }
    };

    let mut episodes = BTreeMap::new();
    for (key, mut value) in entries {
        if let (Value::Object(fields), Ok(fallback)) = (&mut value, key.parse::<EpisodeKey>()) {
            for (field, number) in [("season", fallback.season), ("episode", fallback.episode)] {
                if fields.get(field).map_or(true, Value::is_null) {
                    fields.insert(field.to_string(), Value::from(number));
                }
            }
        }
        match serde_json::from_value::<EpisodeProgress>(value) {
            Ok(episode) => {
                episodes.insert(key, episode);
            }
            Err(e) => warn!("Skipping malformed episode progress '{}': {}", key, e),
        }
    }
    Ok(Some(episodes))
}

/// Season/episode numbers arrive as strings from the player (`"3"`), but plain
/// numbers are accepted too. They are written back as strings.
mod numeric_string {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    use crate::lenient::as_u32;

    pub fn serialize<S: Serializer>(value: &u32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let value = Value::deserialize(deserializer)?;
        as_u32(&value).ok_or_else(|| D::Error::custom(format!("expected a number, got {}", value)))
    }

    /// Optional variant: unreadable values decode as `None`
    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};
        use serde_json::Value;

        use crate::lenient::as_u32;

        pub fn serialize<S: Serializer>(value: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error> {
            match value {
                Some(n) => serializer.serialize_str(&n.to_string()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
            Ok(as_u32(&Value::deserialize(deserializer)?))
        }
    }
}
