//! Simple line-based CLI output utilities.

use crate::backend::{HealthReport, RemoteStats};
use crate::connection::ConnectionState;
use crate::events::{Event, EventKind};
use crate::stats::StatsSnapshot;
use crate::store::PromptEntry;

/// Line width for separators.
const LINE_WIDTH: usize = 60;

/// Longest chunk or prompt preview shown on one line, in characters.
const PREVIEW_CHARS: usize = 48;

/// Status icons
pub mod icons {
    pub const SUCCESS: &str = "✓";
    pub const FAILURE: &str = "✗";
    pub const WARNING: &str = "⚠";
    pub const PENDING: &str = "…";
}

/// Print the main header.
///
/// ```text
/// QWATCH STATUS
/// ════════════════════════════════════════════════════════════
/// ```
pub fn print_header(title: &str) {
    println!();
    println!("{}", title);
    println!("{}", "═".repeat(LINE_WIDTH));
    println!();
}

/// Print a section title.
///
/// ```text
/// EVENT COUNTS
/// ────────────────────────────────────────────────────────────
/// ```
pub fn print_section(title: &str) {
    println!("{}", title);
    println!("{}", "─".repeat(LINE_WIDTH));
}

/// Print an indented status line.
///
/// ```text
///   ✓ Connected
/// ```
pub fn print_line(icon: &str, message: &str) {
    println!("  {} {}", icon, message);
}

/// Print the end of a section (just a blank line).
pub fn print_section_end() {
    println!();
}

/// Shorten `text` to `max` characters, marking the cut with `…`.
pub fn preview(text: &str, max: usize) -> String {
    let single_line = text.replace(['\n', '\r'], " ");
    if single_line.chars().count() <= max {
        return single_line;
    }
    let mut out: String = single_line.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// One-line rendering of an event for the live feed.
///
/// ```text
/// 12:00:00  query_start     openai/gpt-4 "Weekly report"
/// ```
pub fn format_event_line(event: &Event) -> String {
    let time = event
        .time()
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string());

    let detail = match &event.kind {
        EventKind::QueryStart(query) => format!(
            "{}/{} \"{}\"",
            query.provider_or_unknown(),
            query.model_or_unknown(),
            preview(query.title_or_default(), PREVIEW_CHARS)
        ),
        EventKind::StreamChunk(chunk) => {
            let text = chunk
                .content
                .as_deref()
                .or(chunk.reasoning.as_deref())
                .unwrap_or("");
            preview(text, PREVIEW_CHARS)
        }
        EventKind::QueryComplete(done) => {
            let mut parts = Vec::new();
            if let Some(tokens) = done.tokens {
                parts.push(format!(
                    "{} tokens ({} in, {} out)",
                    tokens.total(),
                    tokens.prompt,
                    tokens.completion
                ));
            }
            if let Some(ms) = done.duration_ms {
                parts.push(format!("{:.0}ms", ms));
            }
            parts.join(", ")
        }
        EventKind::Error(info) => preview(info.message_or_default(), PREVIEW_CHARS),
        EventKind::Heartbeat => String::new(),
        EventKind::Unknown { .. } => format!("{} payload keys", event.payload.len()),
    };

    format!("{}  {:<15} {}", time, event.tag(), detail)
        .trim_end()
        .to_string()
}

/// Icon and message for a connection state change.
pub fn connection_line(state: &ConnectionState) -> (&'static str, String) {
    match state {
        ConnectionState::Connected => (icons::SUCCESS, "Connected".to_string()),
        ConnectionState::Connecting { attempt: 0 } => {
            (icons::PENDING, "Connecting".to_string())
        }
        ConnectionState::Connecting { attempt } => {
            (icons::PENDING, format!("Connecting (attempt {})", attempt))
        }
        ConnectionState::ReconnectPending { attempt, delay } => (
            icons::WARNING,
            format!(
                "Disconnected, retry {} in {:.1}s",
                attempt,
                delay.as_secs_f64()
            ),
        ),
        ConnectionState::Disconnected => (icons::FAILURE, "Disconnected".to_string()),
    }
}

/// Lines of the local stats block, without the section title.
pub fn stats_lines(stats: &StatsSnapshot) -> Vec<String> {
    let c = &stats.counters;
    let mut lines = vec![
        format!("Total:          {}", c.total),
        format!("Query start:    {}", c.query_start),
        format!("Stream chunk:   {}", c.stream_chunk),
        format!("Query complete: {}", c.query_complete),
        format!("Error:          {}", c.error),
        format!("Heartbeat:      {}", c.heartbeat),
    ];
    let unknown = stats.unknown_count();
    if unknown > 0 {
        lines.push(format!("Unknown:        {}", unknown));
    }

    for (label, breakdown) in [("Providers", &stats.providers), ("Models", &stats.models)] {
        if breakdown.is_empty() {
            continue;
        }
        let joined = breakdown
            .iter()
            .map(|(name, count)| format!("{}={}", name, count))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("{:<16}{}", format!("{}:", label), joined));
    }
    lines
}

/// Print the local stats block.
pub fn print_stats(stats: &StatsSnapshot) {
    print_section("EVENT COUNTS");
    for line in stats_lines(stats) {
        println!("  {}", line);
    }
    print_section_end();
}

/// One line per prompt: model, title and the last user message.
///
/// ```text
/// openai/gpt-4  "Weekly report"  > summarize the attached numbers
/// ```
pub fn format_prompt_line(prompt: &PromptEntry) -> String {
    let mut line = format!(
        "{}/{}  \"{}\"",
        prompt.provider,
        prompt.model,
        preview(&prompt.title, PREVIEW_CHARS)
    );
    if let Some(message) = prompt.last_user_message() {
        line.push_str("  > ");
        line.push_str(&preview(message.content_or_default(), PREVIEW_CHARS));
    }
    line
}

/// Print the prompt log, newest first.
pub fn print_prompts(prompts: &[PromptEntry]) {
    print_section("PROMPTS");
    if prompts.is_empty() {
        println!("  (none)");
    }
    for prompt in prompts {
        println!("  {}", format_prompt_line(prompt));
    }
    print_section_end();
}

/// Print the backend health and retention summary.
pub fn print_status(base_url: &str, health: &HealthReport, remote: Option<&RemoteStats>) {
    print_header("QWATCH STATUS");

    print_section("BACKEND");
    let icon = if health.is_ok() {
        icons::SUCCESS
    } else {
        icons::WARNING
    };
    print_line(icon, &format!("{} is {}", base_url, health.status));
    print_line(" ", &format!("Retained events: {}", health.events_count));
    if let Some(ts) = &health.timestamp {
        print_line(" ", &format!("Server time:     {}", ts));
    }
    print_section_end();

    if let Some(remote) = remote {
        print_section("RETAINED EVENTS");
        print_line(" ", &format!("Connected clients: {}", remote.connected_clients));
        for (tag, count) in &remote.event_types {
            print_line(" ", &format!("{:<18} {}", format!("{}:", tag), count));
        }
        if let (Some(oldest), Some(newest)) = (&remote.oldest_event, &remote.newest_event) {
            print_line(" ", &format!("Window: {} .. {}", oldest, newest));
        }
        print_section_end();
    }
}
