//! `qwatch watch`: follow the live feed.

use std::future::Future;

use color_eyre::Result;
use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tracing::{info, warn};

use super::args::WatchArgs;
use crate::cli_output::{self, connection_line, format_event_line, icons};
use crate::config::MonitorConfig;
use crate::connection::ConnectionState;
use crate::events::{Event, EventCategory};
use crate::monitor::Monitor;

/// Render one event for stdout, or `None` when it is filtered out.
pub fn render_event(event: &Event, args: &WatchArgs) -> Option<String> {
    if args.quiet_heartbeats && event.category() == EventCategory::Heartbeat {
        return None;
    }
    if args.json {
        return Some(event.to_json().to_string());
    }
    Some(format_event_line(event))
}

/// Render whatever is still buffered for `events` without waiting.
pub fn drain_rendered(events: &mut broadcast::Receiver<Event>, args: &WatchArgs) -> Vec<String> {
    let mut lines = Vec::new();
    loop {
        match events.try_recv() {
            Ok(event) => lines.extend(render_event(&event, args)),
            Err(TryRecvError::Lagged(skipped)) => {
                warn!("Output fell behind, skipped {} events", skipped);
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
    lines
}

pub async fn run(config: MonitorConfig, args: WatchArgs) -> Result<()> {
    let monitor = Monitor::start(config).map_err(super::report)?;
    watch_until(monitor, &args, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    })
    .await
}

/// Print the feed until `shutdown` completes or the connection gives up,
/// then print the final stats and stop the monitor.
///
/// In text mode a stats block is printed after each refresh that saw new
/// events.
pub async fn watch_until(
    monitor: Monitor,
    args: &WatchArgs,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let handle = monitor.handle();
    let mut events = handle.subscribe();
    let mut state_rx = monitor.connection().watch_state();
    let mut stats_rx = handle.watch_stats();
    let mut last_printed = stats_rx.borrow_and_update().counters;
    tokio::pin!(shutdown);

    if !args.json {
        cli_output::print_line(icons::PENDING, &format!("Watching {}", monitor.backend().base_url()));
    }

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *state_rx.borrow_and_update();
                if !args.json {
                    let (icon, message) = connection_line(&state);
                    cli_output::print_line(icon, &message);
                }
                if state == ConnectionState::Disconnected {
                    break;
                }
            }
            Ok(()) = stats_rx.changed(), if !args.json => {
                let stats = stats_rx.borrow_and_update().clone();
                if stats.counters != last_printed {
                    last_printed = stats.counters;
                    cli_output::print_stats(&stats);
                }
            }
            received = events.recv() => match received {
                Ok(event) => {
                    if let Some(line) = render_event(&event, args) {
                        println!("{}", line);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Output fell behind, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    // Recorded before the refresh is answered, so nothing is left behind
    let stats = handle.refresh_now().await.map_err(super::report)?;
    for line in drain_rendered(&mut events, args) {
        println!("{}", line);
    }
    let prompts = if args.prompts {
        handle.prompts().await.map_err(super::report)?
    } else {
        Vec::new()
    };
    monitor.shutdown().await;

    if args.json {
        println!("{}", serde_json::to_string(&stats)?);
        for prompt in &prompts {
            println!("{}", serde_json::to_string(prompt)?);
        }
        return Ok(());
    }

    println!();
    cli_output::print_stats(&stats);
    if args.prompts {
        cli_output::print_prompts(&prompts);
    }
    Ok(())
}
