//! SSE (Server-Sent Events) stream framing
//!
//! Turns the raw `text/event-stream` byte stream of the event feed into
//! complete message payloads. SSE format consists of:
//! - `data: <json>` - data payload line(s)
//! - `event: <type>` / `id: <id>` / `retry: <ms>` - optional fields
//! - Empty line - signals end of a message
//! - Lines starting with `:` - comments (ignored, used as keepalives)
//!
//! # Module structure
//! - `events` - Line and frame types (SseLine, SseFrame)
//! - `parser` - Parsing logic (parse_sse_line, SseParser, LineBuffer, SseDecoder)

mod events;
mod parser;

// Re-export public types
pub use events::{SseFrame, SseLine};
pub use parser::{parse_sse_line, LineBuffer, SseDecoder, SseParser};
