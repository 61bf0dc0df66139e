use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use strelix_models::MediaIdentity;

mod commands;
mod logging;
mod output;

use commands::{clear, config, listen, play, progress, providers, watchlist, AppContext};

#[derive(Parser)]
#[command(name = "strelix")]
#[command(about = "Strelix - resume what you were watching, from any player")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List video providers or choose the preferred one
    Providers {
        #[command(subcommand)]
        cmd: Option<ProvidersCommands>,
    },
    /// Print the embed URL for a title
    #[command(long_about = "Print the player URL for a movie, episode or anime episode. Uses the preferred provider unless --provider is given. Series without --season/--episode resume where progress left off, or start at S1 E1.")]
    Play {
        /// Provider id (see `strelix providers`)
        #[arg(long, global = true)]
        provider: Option<String>,

        #[command(subcommand)]
        target: PlayTarget,
    },
    /// Inspect, clear or import watch progress
    Progress {
        #[command(subcommand)]
        cmd: Option<ProgressCommands>,
    },
    /// Show the continue-watching row
    Continue,
    /// Manage the watchlist
    Watchlist {
        #[command(subcommand)]
        cmd: Option<WatchlistCommands>,
    },
    /// Accept player messages on stdin and follow changes made by other views
    #[command(long_about = "Run as an open view: read player messages from stdin, one JSON object per line ({\"origin\": ..., \"payload\": ...}), store trusted progress snapshots, and print the continue-watching row whenever another process changes the stored progress. Runs until Ctrl+C.")]
    Listen {
        /// How often to check the storage file for changes from other processes
        #[arg(long, default_value_t = 1000, value_name = "MS")]
        poll_interval_ms: u64,
    },
    /// Show or create the configuration file
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
    /// Wipe stored watch state
    #[command(long_about = "Remove stored data. Use --progress for watch progress, --watchlist for saved titles, --preferences for the preferred provider, or --all for everything.")]
    Clear {
        /// Clear progress, watchlist and preferences
        #[arg(long, action = ArgAction::SetTrue)]
        all: bool,

        /// Clear watch progress
        #[arg(long, action = ArgAction::SetTrue)]
        progress: bool,

        /// Clear the watchlist
        #[arg(long, action = ArgAction::SetTrue)]
        watchlist: bool,

        /// Clear the preferred provider
        #[arg(long, action = ArgAction::SetTrue)]
        preferences: bool,
    },
}

#[derive(Subcommand)]
pub enum ProvidersCommands {
    /// List providers in priority order, marking the selected one
    List,
    /// Persist the preferred provider
    Select {
        /// Provider id
        id: String,
    },
}

#[derive(Subcommand)]
pub enum PlayTarget {
    /// A movie by TMDB id
    Movie { id: u64 },
    /// A series episode by TMDB id
    Tv {
        id: u64,
        #[arg(short, long)]
        season: Option<u32>,
        #[arg(short, long)]
        episode: Option<u32>,
    },
    /// An anime episode by MyAnimeList id (VidLink only)
    Anime {
        mal_id: u64,
        episode: u32,
        /// Dubbed audio instead of subtitles
        #[arg(long, action = ArgAction::SetTrue)]
        dub: bool,
        /// Let the player fall back to the other audio track
        #[arg(long, action = ArgAction::SetTrue)]
        fallback: bool,
    },
}

#[derive(Subcommand)]
pub enum ProgressCommands {
    /// Show stored progress (all titles, or one like movie-550 / tv-1399)
    Show { identity: Option<MediaIdentity> },
    /// Delete all stored progress
    Clear,
    /// Feed a player message payload through the sync bridge
    #[command(long_about = "Read a player payload ({\"type\": \"MEDIA_DATA\", \"data\": {...}}) from FILE or stdin and hand it to the sync bridge as if it came from --origin. Untrusted origins and malformed payloads are reported and change nothing.")]
    Ingest {
        /// Origin the message claims to come from
        #[arg(long)]
        origin: String,
        /// Payload file; reads stdin when omitted
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum WatchlistCommands {
    /// List saved titles, newest first
    List,
    /// Save a title
    Add(DraftArgs),
    /// Remove a saved title
    Remove { identity: MediaIdentity },
    /// Add a title if absent, otherwise remove it
    Toggle(DraftArgs),
    /// Check whether a title is saved (exit code 1 if not)
    Contains { identity: MediaIdentity },
}

/// Display fields for a watchlist entry, as shown by the catalog
#[derive(Args)]
pub struct DraftArgs {
    /// Title identity, e.g. movie-550 or tv-1399
    pub identity: MediaIdentity,
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub poster: Option<String>,
    #[arg(long)]
    pub backdrop: Option<String>,
    #[arg(long, default_value_t = 0.0)]
    pub vote_average: f64,
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub release_date: Option<String>,
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub first_air_date: Option<String>,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
    /// Print config, storage and log locations
    Path,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let output = output::Output::new(cli.output, cli.quiet);
    let ctx = AppContext::load(cli.config)?;

    logging::init_logging(cli.verbose, cli.quiet, &ctx.config.logging)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;
    tracing::debug!("Using config {}", ctx.config_file.display());

    match cli.command {
        Commands::Providers { cmd } => providers::run_providers(cmd.unwrap_or(ProvidersCommands::List), &ctx, &output),
        Commands::Play { provider, target } => play::run_play(target, provider, &ctx, &output),
        Commands::Progress { cmd } => {
            progress::run_progress(cmd.unwrap_or(ProgressCommands::Show { identity: None }), &ctx, &output)
        }
        Commands::Continue => progress::run_continue(&ctx, &output),
        Commands::Watchlist { cmd } => watchlist::run_watchlist(cmd.unwrap_or(WatchlistCommands::List), &ctx, &output),
        Commands::Listen { poll_interval_ms } => listen::run_listen(poll_interval_ms, &ctx, &output).await,
        Commands::Config { cmd } => config::run_config(cmd.unwrap_or(ConfigCommands::Show), &ctx, &output),
        Commands::Clear { all, progress, watchlist, preferences } => {
            clear::run_clear(all, progress, watchlist, preferences, &ctx, &output)
        }
    }
}
