use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use strelix_config::ContinueWatchingConfig;
use strelix_models::{EpisodeKey, MediaIdentity, ProgressRecord, ProgressSnapshot};

/// One entry of the continue-watching row.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContinueWatchingItem {
    pub identity: MediaIdentity,
    pub percent: u8,
    /// Episode to resume at; `None` for movies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume: Option<EpisodeKey>,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artwork_path: Option<String>,
    pub record: ProgressRecord,
}

impl ContinueWatchingItem {
    fn from_record(record: &ProgressRecord, percent: u8) -> Self {
        let label = match (record.last_season_watched, record.last_episode_watched) {
            (Some(season), Some(episode)) if record.identity().is_series() => {
                format!("S{} E{}", season, episode)
            }
            _ => format!("{}% watched", percent),
        };

        Self {
            identity: record.identity(),
            percent,
            resume: record.resume_episode(),
            label,
            artwork_path: record.artwork_path().map(str::to_string),
            record: record.clone(),
        }
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.record.last_updated
    }
}

/// Picks the partially watched titles worth resuming, most recent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinueWatchingSelector {
    min_percent: u8,
    max_percent: u8,
    limit: usize,
}

impl ContinueWatchingSelector {
    pub fn new(min_percent: u8, max_percent: u8, limit: usize) -> Self {
        Self {
            min_percent,
            max_percent,
            limit,
        }
    }

    pub fn from_config(config: &ContinueWatchingConfig) -> Self {
        Self::new(config.min_percent, config.max_percent, config.limit)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Records strictly between the thresholds, newest `last_updated` first.
    ///
    /// Records without a timestamp sort after all timestamped ones; ties keep
    /// snapshot order.
    pub fn select(&self, snapshot: &ProgressSnapshot) -> Vec<ContinueWatchingItem> {
        let mut items: Vec<ContinueWatchingItem> = snapshot
            .records()
            .filter_map(|record| {
                let percent = record.percent_watched()?;
                (percent > self.min_percent && percent < self.max_percent)
                    .then(|| ContinueWatchingItem::from_record(record, percent))
            })
            .collect();

        items.sort_by(|a, b| newest_first(a.last_updated(), b.last_updated()));
        items.truncate(self.limit);
        items
    }
}

impl Default for ContinueWatchingSelector {
    fn default() -> Self {
        Self::from_config(&ContinueWatchingConfig::default())
    }
}

fn newest_first(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use strelix_models::PlaybackProgress;

    fn record(identity: MediaIdentity, watched: f64, duration: f64, updated: Option<i64>) -> ProgressRecord {
        let mut record = ProgressRecord::new(identity, "Title", PlaybackProgress::new(watched, duration));
        record.last_updated = updated.map(|ms| Utc.timestamp_millis_opt(ms).unwrap());
        record
    }

    fn snapshot(records: Vec<ProgressRecord>) -> ProgressSnapshot {
        records.into_iter().collect()
    }

    fn ids(items: &[ContinueWatchingItem]) -> Vec<u64> {
        items.iter().map(|item| item.identity.id).collect()
    }

    #[test]
    fn test_threshold_boundaries() {
        let selector = ContinueWatchingSelector::default();
        let items = selector.select(&snapshot(vec![
            record(MediaIdentity::movie(1), 2.0, 100.0, Some(1)),
            record(MediaIdentity::movie(2), 50.0, 100.0, Some(2)),
            record(MediaIdentity::movie(3), 99.0, 100.0, Some(3)),
            record(MediaIdentity::movie(4), 5.0, 100.0, Some(4)),
            record(MediaIdentity::movie(5), 95.0, 100.0, Some(5)),
            record(MediaIdentity::movie(6), 6.0, 100.0, Some(6)),
        ]));

        assert_eq!(ids(&items), vec![6, 2]);
    }

    #[test]
    fn test_zero_duration_is_never_eligible() {
        let selector = ContinueWatchingSelector::default();
        let items = selector.select(&snapshot(vec![record(MediaIdentity::movie(1), 30.0, 0.0, Some(1))]));
        assert!(items.is_empty());
    }

    #[test]
    fn test_limits_to_ten_newest() {
        let selector = ContinueWatchingSelector::default();
        let records = (1..=50)
            .map(|id| record(MediaIdentity::movie(id), 50.0, 100.0, Some(id as i64 * 1000)))
            .collect();

        let items = selector.select(&snapshot(records));
        assert_eq!(items.len(), 10);
        assert_eq!(ids(&items), (41..=50).rev().collect::<Vec<u64>>());
        assert!(items
            .windows(2)
            .all(|pair| pair[0].last_updated() >= pair[1].last_updated()));
    }

    #[test]
    fn test_missing_timestamps_sort_last() {
        let selector = ContinueWatchingSelector::default();
        let items = selector.select(&snapshot(vec![
            record(MediaIdentity::movie(1), 50.0, 100.0, None),
            record(MediaIdentity::movie(2), 50.0, 100.0, Some(10)),
            record(MediaIdentity::series(3), 50.0, 100.0, None),
            record(MediaIdentity::movie(4), 50.0, 100.0, Some(20)),
        ]));

        assert_eq!(ids(&items), vec![4, 2, 1, 3]);
    }

    #[test]
    fn test_custom_bounds() {
        let selector = ContinueWatchingSelector::new(0, 100, 2);
        let items = selector.select(&snapshot(vec![
            record(MediaIdentity::movie(1), 1.0, 100.0, Some(1)),
            record(MediaIdentity::movie(2), 99.0, 100.0, Some(2)),
            record(MediaIdentity::movie(3), 100.0, 100.0, Some(3)),
        ]));
        assert_eq!(ids(&items), vec![2, 1]);
    }

    #[test]
    fn test_item_labels_and_resume_target() {
        let selector = ContinueWatchingSelector::default();

        let mut show = record(MediaIdentity::series(10), 600.0, 2400.0, Some(2));
        show.last_season_watched = Some(2);
        show.last_episode_watched = Some(3);
        show.backdrop_path = Some("/backdrop.jpg".to_string());
        show.poster_path = Some("/poster.jpg".to_string());

        let mut bare_show = record(MediaIdentity::series(11), 600.0, 2400.0, Some(1));
        bare_show.poster_path = Some("/poster.jpg".to_string());

        let movie = record(MediaIdentity::movie(12), 42.0, 100.0, Some(0));

        let items = selector.select(&snapshot(vec![movie, bare_show, show]));

        assert_eq!(items[0].label, "S2 E3");
        assert_eq!(items[0].resume, Some(EpisodeKey::new(2, 3)));
        assert_eq!(items[0].artwork_path.as_deref(), Some("/backdrop.jpg"));

        assert_eq!(items[1].label, "25% watched");
        assert_eq!(items[1].resume, Some(EpisodeKey::new(1, 1)));
        assert_eq!(items[1].artwork_path.as_deref(), Some("/poster.jpg"));

        assert_eq!(items[2].label, "42% watched");
        assert_eq!(items[2].resume, None);
        assert_eq!(items[2].artwork_path, None);
    }
}
