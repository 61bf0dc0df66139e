use super::AppContext;
use crate::output::{new_table, Output};
use crate::ProgressCommands;
use chrono::{DateTime, Local, Utc};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use comfy_table::Cell;
use owo_colors::OwoColorize;
use serde_json::json;
use std::io::Read;
use std::path::Path;
use strelix_core::{ContinueWatchingItem, InboundMessage, MessageOutcome};
use strelix_models::{MediaIdentity, ProgressRecord};

pub fn run_progress(cmd: ProgressCommands, ctx: &AppContext, output: &Output) -> Result<()> {
    match cmd {
        ProgressCommands::Show { identity } => show_progress(identity, ctx, output),
        ProgressCommands::Clear => clear_progress(ctx, output),
        ProgressCommands::Ingest { origin, file } => ingest(origin, file.as_deref(), ctx, output),
    }
}

fn show_progress(identity: Option<MediaIdentity>, ctx: &AppContext, output: &Output) -> Result<()> {
    let (_, state) = ctx.open_state()?;
    let snapshot = state.progress().get_all();

    let records: Vec<&ProgressRecord> = match identity {
        Some(identity) => match snapshot.get(&identity) {
            Some(record) => vec![record],
            None => {
                output.info(format!("No progress stored for {}", identity));
                return Ok(());
            }
        },
        None => snapshot.records().collect(),
    };

    if identity.is_none() {
        output.data(&snapshot);
    } else {
        output.data(&records);
    }

    if records.is_empty() {
        output.info("No watch progress stored yet");
        return Ok(());
    }

    let mut table = new_table(vec!["Id", "Title", "Watched", "Episode", "Last updated"]);
    for record in &records {
        let watched = match record.percent_watched() {
            Some(pct) => format!("{}%", pct),
            None => "-".to_string(),
        };
        let episode = record
            .resume_episode()
            .map(|key| format!("S{} E{}", key.season, key.episode))
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(record.identity().to_string()),
            Cell::new(&record.title),
            Cell::new(watched),
            Cell::new(episode),
            Cell::new(format_timestamp(record.last_updated)),
        ]);
    }
    output.table(&table);
    Ok(())
}

fn clear_progress(ctx: &AppContext, output: &Output) -> Result<()> {
    let (_, state) = ctx.open_state()?;
    state
        .progress()
        .clear_all()
        .map_err(|e| eyre!("Failed to clear progress: {}", e))?;
    output.success("Cleared all watch progress");
    Ok(())
}

fn ingest(origin: String, file: Option<&Path>, ctx: &AppContext, output: &Output) -> Result<()> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read payload from {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .wrap_err("Failed to read payload from stdin")?;
            buf
        }
    };
    let payload: serde_json::Value = serde_json::from_str(&raw).wrap_err("Payload is not valid JSON")?;

    let (_, state) = ctx.open_state()?;
    let bridge = state.bridge();
    bridge.attach();

    match bridge.handle_message(&InboundMessage::new(origin, payload)) {
        MessageOutcome::Ingested { records } => {
            output.data(&json!({ "ingested": true, "records": records }));
            output.success(format!("Stored progress for {} title(s)", records));
            Ok(())
        }
        MessageOutcome::Rejected(rejection) => {
            output.data(&json!({ "ingested": false, "reason": rejection.to_string() }));
            Err(eyre!("Message ignored: {}", rejection))
        }
        MessageOutcome::PersistFailed(e) => Err(eyre!("Failed to store progress: {}", e)),
    }
}

pub fn run_continue(ctx: &AppContext, output: &Output) -> Result<()> {
    let (_, state) = ctx.open_state()?;
    let items = state.continue_watching();
    render_continue_watching(&items, output);
    Ok(())
}

pub fn render_continue_watching(items: &[ContinueWatchingItem], output: &Output) {
    output.data(&json!({ "continue_watching": items }));

    if items.is_empty() {
        output.info("Nothing to continue watching");
        return;
    }

    let mut table = new_table(vec!["#", "Id", "Title", "Progress", "Last watched"]);
    for (index, item) in items.iter().enumerate() {
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(item.identity.to_string()),
            Cell::new(&item.record.title),
            Cell::new(format!("{} {}", progress_bar(item.percent), item.label)),
            Cell::new(format_timestamp(item.last_updated())),
        ]);
    }
    output.table(&table);
}

fn progress_bar(percent: u8) -> String {
    const WIDTH: usize = 10;
    let filled = (usize::from(percent) * WIDTH + 50) / 100;
    format!(
        "{}{}",
        "█".repeat(filled).red(),
        "░".repeat(WIDTH - filled).bright_black()
    )
}

fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|ts| ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}
