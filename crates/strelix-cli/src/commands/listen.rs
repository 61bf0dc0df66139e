use super::progress::render_continue_watching;
use super::AppContext;
use crate::output::Output;
use color_eyre::Result;
use std::time::Duration;
use strelix_core::{ContinueWatchingItem, InboundMessage, MessageOutcome, SyncBridge};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const MIN_POLL_INTERVAL_MS: u64 = 50;

pub async fn run_listen(poll_interval_ms: u64, ctx: &AppContext, output: &Output) -> Result<()> {
    let (storage, state) = ctx.open_state()?;
    let bridge = state.bridge();

    // Refreshes fire inside storage polling; hand them to the loop for printing
    let (refresh_tx, mut refresh_rx) = mpsc::unbounded_channel::<Vec<ContinueWatchingItem>>();
    bridge.on_refresh(move |items| {
        let _ = refresh_tx.send(items.to_vec());
    });
    bridge.attach();

    output.info(format!(
        "Listening for player messages from {} (Ctrl+C to stop)",
        bridge.trusted_origin()
    ));
    render_continue_watching(&state.continue_watching(), output);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut poll = tokio::time::interval(Duration::from_millis(poll_interval_ms.max(MIN_POLL_INTERVAL_MS)));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                if let Err(e) = result {
                    warn!("Failed to listen for Ctrl+C: {}", e);
                }
                info!("Received Ctrl+C, stopping");
                break;
            }
            _ = poll.tick() => {
                if let Err(e) = storage.poll_external_changes() {
                    warn!("Failed to check storage for changes: {}", e);
                }
            }
            Some(items) = refresh_rx.recv() => {
                render_continue_watching(&items, output);
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => handle_line(&bridge, &line, output),
                Ok(None) => {
                    debug!("Input closed; still following storage changes");
                    stdin_open = false;
                }
                Err(e) => {
                    warn!("Failed to read input: {}", e);
                    stdin_open = false;
                }
            },
        }
    }

    bridge.detach();
    Ok(())
}

fn handle_line(bridge: &SyncBridge, line: &str, output: &Output) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    let message: InboundMessage = match serde_json::from_str(line) {
        Ok(message) => message,
        Err(e) => {
            warn!("Skipping input line that is not a message: {}", e);
            return;
        }
    };

    match bridge.handle_message(&message) {
        MessageOutcome::Ingested { records } => {
            output.success(format!("Stored progress for {} title(s)", records));
        }
        // Rejections are logged by the bridge and otherwise ignored
        MessageOutcome::Rejected(_) => {}
        MessageOutcome::PersistFailed(e) => {
            output.error(format!("Failed to store progress: {}", e));
        }
    }
}
