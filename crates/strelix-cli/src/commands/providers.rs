use super::AppContext;
use crate::output::{new_table, Output};
use crate::ProvidersCommands;
use color_eyre::Result;
use comfy_table::Cell;
use owo_colors::OwoColorize;
use serde_json::json;

pub fn run_providers(cmd: ProvidersCommands, ctx: &AppContext, output: &Output) -> Result<()> {
    match cmd {
        ProvidersCommands::List => list_providers(ctx, output),
        ProvidersCommands::Select { id } => select_provider(&id, ctx, output),
    }
}

fn list_providers(ctx: &AppContext, output: &Output) -> Result<()> {
    let (_, state) = ctx.open_state()?;
    let registry = state.registry();
    let selected = registry.get_selected().id().to_string();

    let providers: Vec<_> = registry
        .list_providers()
        .map(|p| {
            json!({
                "id": p.id(),
                "name": p.display_name(),
                "selected": p.id() == selected,
            })
        })
        .collect();
    output.data(&json!({ "providers": providers, "selected": selected }));

    let mut table = new_table(vec!["", "Id", "Name"]);
    for provider in registry.list_providers() {
        let marker = if provider.id() == selected {
            "●".green().to_string()
        } else {
            String::new()
        };
        table.add_row(vec![
            Cell::new(marker),
            Cell::new(provider.id()),
            Cell::new(provider.display_name()),
        ]);
    }
    output.table(&table);

    if let Some(stored) = registry.selected_id().filter(|id| *id != selected) {
        output.warn(format!(
            "Stored preference '{}' is not a known provider; using '{}'",
            stored, selected
        ));
    }
    Ok(())
}

fn select_provider(id: &str, ctx: &AppContext, output: &Output) -> Result<()> {
    let (_, state) = ctx.open_state()?;
    let registry = state.registry();

    registry
        .set_selected(id)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save preferred provider: {}", e))?;

    if registry.catalog().contains(id) {
        output.success(format!("Preferred provider set to '{}'", id));
    } else {
        output.warn(format!(
            "'{}' is not a known provider ({}); '{}' will be used until it is",
            id,
            registry.catalog().ids().join(", "),
            registry.get_selected().id()
        ));
    }
    Ok(())
}
