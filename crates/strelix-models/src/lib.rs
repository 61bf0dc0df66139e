mod lenient;
pub mod media;
pub mod progress;
pub mod watchlist;

pub use media::{MediaIdentity, MediaKind, ParseIdentityError};
pub use progress::{EpisodeKey, EpisodeProgress, PlaybackProgress, ProgressRecord, ProgressSnapshot};
pub use watchlist::{WatchlistDraft, WatchlistEntry};
