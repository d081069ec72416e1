//! SSE line parsing, frame accumulation and byte-stream decoding.

use tracing::warn;

use super::events::{SseFrame, SseLine};

/// Longest partial line held back while waiting for its terminator.
pub const DEFAULT_MAX_LINE_BYTES: usize = 8 * 1024 * 1024;

/// Strip the single optional space that follows the field colon.
fn field_value(rest: &str) -> &str {
    rest.strip_prefix(' ').unwrap_or(rest)
}

/// Parse a single SSE line into its component type
pub fn parse_sse_line(line: &str) -> SseLine {
    if line.is_empty() {
        return SseLine::Empty;
    }

    if let Some(stripped) = line.strip_prefix(':') {
        return SseLine::Comment(stripped.trim().to_string());
    }

    if let Some(rest) = line.strip_prefix("data:") {
        return SseLine::Data(field_value(rest).to_string());
    }

    if let Some(rest) = line.strip_prefix("event:") {
        return SseLine::Event(rest.trim().to_string());
    }

    if let Some(rest) = line.strip_prefix("id:") {
        return SseLine::Id(field_value(rest).to_string());
    }

    if let Some(rest) = line.strip_prefix("retry:") {
        if let Ok(ms) = field_value(rest).trim().parse::<u64>() {
            return SseLine::Retry(ms);
        }
    }

    // Unknown line format - treat as comment
    SseLine::Comment(line.to_string())
}

/// Stateful SSE parser that accumulates lines and emits complete frames
#[derive(Debug, Default)]
pub struct SseParser {
    /// Current event type being accumulated
    current_event_type: Option<String>,
    /// Accumulated data lines (SSE allows multiple data: lines)
    data_buffer: Vec<String>,
    /// Last id seen for the current frame
    current_id: Option<String>,
    /// Retry hint seen for the current frame
    current_retry: Option<u64>,
}

impl SseParser {
    /// Create a new SSE parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a line to the parser, potentially returning a complete frame
    ///
    /// Returns:
    /// - `Some(frame)` - A blank line closed a frame that carried data
    /// - `None` - Line was consumed but no frame is complete yet
    pub fn feed_line(&mut self, line: &str) -> Option<SseFrame> {
        match parse_sse_line(line) {
            SseLine::Event(event_type) => {
                self.current_event_type = Some(event_type);
                None
            }
            SseLine::Data(data) => {
                self.data_buffer.push(data);
                None
            }
            SseLine::Id(id) => {
                self.current_id = Some(id);
                None
            }
            SseLine::Retry(ms) => {
                self.current_retry = Some(ms);
                None
            }
            SseLine::Empty => self.try_emit_frame(),
            SseLine::Comment(_) => None,
        }
    }

    /// Emit the accumulated frame, if it carries any data.
    fn try_emit_frame(&mut self) -> Option<SseFrame> {
        let event_type = self.current_event_type.take();
        let id = self.current_id.take();
        let retry_ms = self.current_retry.take();

        // A message without data lines is not dispatched
        if self.data_buffer.is_empty() {
            return None;
        }

        let data = self.data_buffer.join("\n");
        self.data_buffer.clear();

        Some(SseFrame {
            event_type,
            data,
            id,
            retry_ms,
        })
    }

    /// Reset the parser state
    pub fn reset(&mut self) {
        self.current_event_type = None;
        self.data_buffer.clear();
        self.current_id = None;
        self.current_retry = None;
    }
}

/// Splits arbitrary byte chunks into text lines.
///
/// Chunk boundaries from the network rarely line up with line boundaries, so
/// partial lines are held back until their terminator arrives. Lines are
/// split on `\n` with any trailing `\r` removed; invalid UTF-8 is replaced
/// rather than dropped. A partial line that grows past the limit is
/// discarded up to its terminator.
#[derive(Debug)]
pub struct LineBuffer {
    pending: Vec<u8>,
    max_line: usize,
    discarding: bool,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::with_max_line(DEFAULT_MAX_LINE_BYTES)
    }
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            pending: Vec::new(),
            max_line,
            discarding: false,
        }
    }

    /// Append a chunk and return every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();

        let mut chunk = chunk;
        if self.discarding {
            match chunk.iter().position(|b| *b == b'\n') {
                Some(pos) => {
                    self.discarding = false;
                    chunk = &chunk[pos + 1..];
                }
                None => return lines,
            }
        }

        // Bytes already pending were scanned by an earlier push.
        let mut search = self.pending.len();
        self.pending.extend_from_slice(chunk);

        let mut start = 0;
        while let Some(offset) = self.pending[search..].iter().position(|b| *b == b'\n') {
            let end = search + offset;
            let line = &self.pending[start..end];
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            lines.push(String::from_utf8_lossy(line).into_owned());
            start = end + 1;
            search = start;
        }
        self.pending.drain(..start);

        if self.pending.len() > self.max_line {
            warn!("Dropping SSE line longer than {} bytes", self.max_line);
            self.pending.clear();
            self.discarding = true;
        }

        lines
    }

    /// Take whatever is left once the stream has ended.
    pub fn finish(&mut self) -> Option<String> {
        self.discarding = false;
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        let rest = rest.strip_suffix(b"\r").unwrap_or(&rest[..]);
        Some(String::from_utf8_lossy(rest).into_owned())
    }

    /// Discard any partial line.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.discarding = false;
    }
}

/// Byte-stream to frame decoder: a [`LineBuffer`] feeding an [`SseParser`].
#[derive(Debug, Default)]
pub struct SseDecoder {
    lines: LineBuffer,
    parser: SseParser,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a network chunk, returning the frames it completed in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.lines
            .push(chunk)
            .iter()
            .filter_map(|line| self.parser.feed_line(line))
            .collect()
    }

    /// Flush at end of stream. A trailing frame without its blank-line
    /// terminator is still emitted.
    pub fn finish(&mut self) -> Option<SseFrame> {
        if let Some(line) = self.lines.finish() {
            if let Some(frame) = self.parser.feed_line(&line) {
                return Some(frame);
            }
        }
        self.parser.feed_line("")
    }

    /// Drop all partial state, e.g. before reading a fresh connection.
    pub fn reset(&mut self) {
        self.lines.clear();
        self.parser.reset();
    }
}
