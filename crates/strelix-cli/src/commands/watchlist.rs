use super::AppContext;
use crate::output::{new_table, Output};
use crate::{DraftArgs, WatchlistCommands};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::Cell;
use serde_json::json;
use strelix_models::WatchlistDraft;

pub fn run_watchlist(cmd: WatchlistCommands, ctx: &AppContext, output: &Output) -> Result<()> {
    let (_, state) = ctx.open_state()?;
    let store = state.watchlist();

    match cmd {
        WatchlistCommands::List => {
            let entries = store.list();
            output.data(&json!({ "watchlist": entries }));

            if entries.is_empty() {
                output.info("Your watchlist is empty");
                return Ok(());
            }

            let mut table = new_table(vec!["Id", "Title", "Rating", "Premiere", "Added"]);
            for entry in &entries {
                table.add_row(vec![
                    Cell::new(entry.identity().to_string()),
                    Cell::new(&entry.title),
                    Cell::new(format!("{:.1}", entry.vote_average)),
                    Cell::new(entry.premiere_date().unwrap_or("-")),
                    Cell::new(entry.added_at.format("%Y-%m-%d").to_string()),
                ]);
            }
            output.table(&table);
        }
        WatchlistCommands::Add(args) => {
            let draft = into_draft(args);
            let identity = draft.identity();
            let added = store
                .add(draft)
                .map_err(|e| eyre!("Failed to update watchlist: {}", e))?;
            output.data(&json!({ "identity": identity.to_string(), "added": added }));
            if added {
                output.success(format!("Added {} to your watchlist", identity));
            } else {
                output.info(format!("{} is already on your watchlist", identity));
            }
        }
        WatchlistCommands::Remove { identity } => {
            let removed = store
                .remove(&identity)
                .map_err(|e| eyre!("Failed to update watchlist: {}", e))?;
            output.data(&json!({ "identity": identity.to_string(), "removed": removed }));
            if removed {
                output.success(format!("Removed {} from your watchlist", identity));
            } else {
                output.info(format!("{} was not on your watchlist", identity));
            }
        }
        WatchlistCommands::Toggle(args) => {
            let draft = into_draft(args);
            let identity = draft.identity();
            let saved = store
                .toggle(draft)
                .map_err(|e| eyre!("Failed to update watchlist: {}", e))?;
            output.data(&json!({ "identity": identity.to_string(), "in_watchlist": saved }));
            if saved {
                output.success(format!("Added {} to your watchlist", identity));
            } else {
                output.success(format!("Removed {} from your watchlist", identity));
            }
        }
        WatchlistCommands::Contains { identity } => {
            let present = store.contains(&identity);
            output.data(&json!({ "identity": identity.to_string(), "in_watchlist": present }));
            if present {
                output.info(format!("{} is on your watchlist", identity));
            } else {
                output.info(format!("{} is not on your watchlist", identity));
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn into_draft(args: DraftArgs) -> WatchlistDraft {
    let mut draft = WatchlistDraft::new(args.identity, args.title);
    draft.poster_path = args.poster;
    draft.backdrop_path = args.backdrop;
    draft.vote_average = args.vote_average;
    draft.release_date = args.release_date;
    draft.first_air_date = args.first_air_date;
    draft
}
