use super::AppContext;
use crate::output::Output;
use crate::PlayTarget;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde_json::json;
use strelix_core::ProviderRegistry;
use strelix_models::{EpisodeKey, MediaIdentity};
use strelix_providers::{AnimeAudio, VidLinkProvider, VideoProvider};
use tracing::debug;

pub fn run_play(target: PlayTarget, provider: Option<String>, ctx: &AppContext, output: &Output) -> Result<()> {
    let (_, state) = ctx.open_state()?;
    let registry = state.registry();

    match target {
        PlayTarget::Movie { id } => {
            let identity = MediaIdentity::movie(id);
            let (provider_id, url) = resolve_url(registry, provider.as_deref(), identity, None, None)?;
            print_url(output, &url, provider_id, identity, None);
        }
        PlayTarget::Tv { id, season, episode } => {
            let identity = MediaIdentity::series(id);

            let episode_key = match (season, episode) {
                (None, None) => {
                    let resume = state
                        .progress()
                        .get(&identity)
                        .and_then(|record| record.resume_episode())
                        .unwrap_or_default();
                    debug!("No episode given for {}; resuming at {}", identity, resume);
                    resume
                }
                (season, episode) => {
                    let default = EpisodeKey::default();
                    EpisodeKey::new(season.unwrap_or(default.season), episode.unwrap_or(default.episode))
                }
            };

            let (provider_id, url) = resolve_url(
                registry,
                provider.as_deref(),
                identity,
                Some(episode_key.season),
                Some(episode_key.episode),
            )?;
            print_url(output, &url, provider_id, identity, Some(episode_key));
        }
        PlayTarget::Anime { mal_id, episode, dub, fallback } => {
            let vidlink = VidLinkProvider::new(&ctx.config.providers.vidlink);
            if let Some(requested) = provider.as_deref() {
                if requested != vidlink.id() {
                    return Err(eyre!(
                        "Anime playback is only available from '{}', not '{}'",
                        vidlink.id(),
                        requested
                    ));
                }
            }

            let audio = if dub { AnimeAudio::Dub } else { AnimeAudio::Sub };
            let url = vidlink.anime_url(mal_id, episode, audio, fallback);
            output.data(&json!({
                "url": url,
                "provider": vidlink.id(),
                "mal_id": mal_id,
                "episode": episode,
                "audio": audio.as_str(),
            }));
            if output.is_human() {
                output.info(&url);
            }
        }
    }

    Ok(())
}

/// Playback URL from the explicitly requested provider, or the preferred one
fn resolve_url<'a>(
    registry: &'a ProviderRegistry,
    requested: Option<&str>,
    identity: MediaIdentity,
    season: Option<u32>,
    episode: Option<u32>,
) -> Result<(&'a str, String)> {
    match requested {
        Some(id) => {
            let provider = registry.catalog().require(id).map_err(|e| {
                eyre!("{} (available: {})", e, registry.catalog().ids().join(", "))
            })?;
            Ok((provider.id(), registry.resolve_playback_url(provider, identity, season, episode)))
        }
        None => Ok((
            registry.get_selected().id(),
            registry.resolve_selected_url(identity, season, episode),
        )),
    }
}

fn print_url(output: &Output, url: &str, provider: &str, identity: MediaIdentity, episode: Option<EpisodeKey>) {
    output.data(&json!({
        "url": url,
        "provider": provider,
        "identity": identity.to_string(),
        "season": episode.map(|e| e.season),
        "episode": episode.map(|e| e.episode),
    }));
    if output.is_human() {
        output.info(url);
    }
}
