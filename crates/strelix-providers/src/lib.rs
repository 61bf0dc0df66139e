pub mod catalog;
pub mod embeds;
pub mod error;
pub mod traits;
pub mod vidlink;

pub use catalog::ProviderCatalog;
pub use embeds::{MultiEmbedProvider, TwoEmbedProvider, VidSrcProvider};
pub use error::ProviderError;
pub use traits::{resolve_playback_url, VideoProvider};
pub use vidlink::{AnimeAudio, VidLinkProvider};
