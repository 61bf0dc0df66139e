pub mod bridge;
pub mod continue_watching;
pub mod notify;
pub mod progress;
pub mod registry;
pub mod state;
pub mod storage;
pub mod watchlist;

pub use bridge::{InboundMessage, MessageOutcome, MessageRejection, SyncBridge};
pub use continue_watching::{ContinueWatchingItem, ContinueWatchingSelector};
pub use notify::{ChangeNotifier, ChangeSource, StorageEvent, Subscription};
pub use progress::ProgressStore;
pub use registry::ProviderRegistry;
pub use state::WatchState;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};
pub use watchlist::WatchlistStore;
