use super::AppContext;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use strelix_core::WatchState;

pub fn run_clear(
    all: bool,
    progress: bool,
    watchlist: bool,
    preferences: bool,
    ctx: &AppContext,
    output: &Output,
) -> Result<()> {
    if !(all || progress || watchlist || preferences) {
        output.warn("No clear option specified. Use --progress, --watchlist, --preferences, or --all");
        output.info("\nExample: strelix clear --progress");
        return Ok(());
    }

    let (_, state) = ctx.open_state()?;

    if all || progress {
        clear_progress(&state, output)?;
    }
    if all || watchlist {
        clear_watchlist(&state, output)?;
    }
    if all || preferences {
        clear_preferences(&state, output)?;
    }

    if all {
        output.success("All watch progress, watchlist entries and preferences cleared");
    }
    Ok(())
}

fn clear_progress(state: &WatchState, output: &Output) -> Result<()> {
    let count = state.progress().get_all().len();
    state
        .progress()
        .clear_all()
        .map_err(|e| eyre!("Failed to clear progress: {}", e))?;
    if count > 0 {
        output.success(format!("Cleared progress for {} title(s)", count));
    } else {
        output.info("No watch progress found to clear");
    }
    Ok(())
}

fn clear_watchlist(state: &WatchState, output: &Output) -> Result<()> {
    let count = state.watchlist().list().len();
    state
        .watchlist()
        .clear_all()
        .map_err(|e| eyre!("Failed to clear watchlist: {}", e))?;
    if count > 0 {
        output.success(format!("Removed {} title(s) from the watchlist", count));
    } else {
        output.info("Watchlist was already empty");
    }
    Ok(())
}

fn clear_preferences(state: &WatchState, output: &Output) -> Result<()> {
    let had_preference = state.registry().selected_id().is_some();
    state
        .registry()
        .clear_selected()
        .map_err(|e| eyre!("Failed to clear preferences: {}", e))?;
    if had_preference {
        output.success(format!(
            "Cleared preferred provider; '{}' will be used",
            state.registry().get_selected().id()
        ));
    } else {
        output.info("No preferred provider set");
    }
    Ok(())
}
