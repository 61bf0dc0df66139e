use super::AppContext;
use crate::output::{new_table, Output};
use crate::ConfigCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::Cell;
use owo_colors::OwoColorize;
use serde_json::json;
use strelix_config::Config;

pub fn run_config(cmd: ConfigCommands, ctx: &AppContext, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show_config(ctx, output),
        ConfigCommands::Init { force } => init_config(force, ctx, output),
        ConfigCommands::Path => show_paths(ctx, output),
    }
}

fn show_config(ctx: &AppContext, output: &Output) -> Result<()> {
    let config = &ctx.config;
    output.data(&json!({
        "config_file": ctx.config_file,
        "exists": ctx.config_file.exists(),
        "config": config,
    }));

    if !output.is_human() {
        return Ok(());
    }

    if !ctx.config_file.exists() {
        output.warn(format!(
            "No config file at {}; showing defaults. Run 'strelix config init' to create one.",
            ctx.config_file.display()
        ));
    }

    let vidlink = &config.providers.vidlink;
    let rows: Vec<(&str, String)> = vec![
        ("Trusted origin", config.player.trusted_origin.clone()),
        ("Message type", config.player.message_type.clone()),
        ("Storage file", ctx.storage_file().display().to_string()),
        ("Progress key", config.storage.progress_key.clone()),
        ("Watchlist key", config.storage.watchlist_key.clone()),
        ("Provider key", config.storage.preferred_provider_key.clone()),
        (
            "Continue watching",
            format!(
                "{}% < progress < {}%, up to {} titles",
                config.continue_watching.min_percent,
                config.continue_watching.max_percent,
                config.continue_watching.limit
            ),
        ),
        ("VidLink colors", format!(
            "primary={} secondary={} icon={}",
            vidlink.primary_color.as_deref().unwrap_or("-"),
            vidlink.secondary_color.as_deref().unwrap_or("-"),
            vidlink.icon_color.as_deref().unwrap_or("-")
        )),
        ("VidLink autoplay", describe(vidlink.autoplay)),
        ("VidLink next button", describe(vidlink.next_button)),
        ("Log level", config.logging.level.clone()),
        (
            "Log file",
            config
                .logging
                .file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "stderr".to_string()),
        ),
    ];

    let mut table = new_table(vec!["Setting", "Value"]);
    for (name, value) in rows {
        table.add_row(vec![Cell::new(name).fg(comfy_table::Color::Cyan), Cell::new(value)]);
    }
    output.info(format!("{} {}", "Config file:".bold(), ctx.config_file.display()));
    output.table(&table);
    Ok(())
}

fn describe(value: Option<bool>) -> String {
    match value {
        Some(true) => "on".to_string(),
        Some(false) => "off".to_string(),
        None => "player default".to_string(),
    }
}

fn init_config(force: bool, ctx: &AppContext, output: &Output) -> Result<()> {
    let path = &ctx.config_file;
    if path.exists() && !force {
        output.warn(format!(
            "Config file already exists at {}. Use --force to overwrite it.",
            path.display()
        ));
        return Ok(());
    }

    ctx.paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create directories: {}", e))?;
    Config::default()
        .save_to_file(path)
        .map_err(|e| eyre!("Failed to write config to {}: {}", path.display(), e))?;

    output.data(&json!({ "config_file": path, "created": true }));
    output.success(format!("Wrote default config to {}", path.display()));
    Ok(())
}

fn show_paths(ctx: &AppContext, output: &Output) -> Result<()> {
    let storage_file = ctx.storage_file();
    let log_file = ctx.config.logging.file.clone();

    output.data(&json!({
        "config_file": ctx.config_file,
        "storage_file": storage_file,
        "log_file": log_file,
        "data_dir": ctx.paths.data_dir(),
    }));

    if output.is_human() {
        output.info(format!("Config:  {}", ctx.config_file.display()));
        output.info(format!("Storage: {}", storage_file.display()));
        match log_file {
            Some(path) => output.info(format!("Logs:    {}", path.display())),
            None => output.info(format!(
                "Logs:    stderr (set [logging] file, e.g. {})",
                ctx.paths.log_file().display()
            )),
        }
    }
    Ok(())
}
