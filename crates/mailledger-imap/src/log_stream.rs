//! Structured protocol log stream.
//!
//! Every line sent or received, plus synthetic protocol events (STARTTLS,
//! DEFLATE, disconnect cause, parse errors), is worth recording for
//! diagnosing a misbehaving server - but dumping raw bytes to a log file is
//! both noisy and occasionally has sensitive content (AUTHENTICATE
//! payloads) that a generic `tracing::debug!(line)` call wouldn't know to
//! handle consistently.
//!
//! This module is the single place that turns an I/O event or protocol
//! event into a [`tracing`] event carrying a fixed set of fields -
//! `parser_id`, `kind`, `source`, `payload`, `truncated` - so any `tracing`
//! subscriber (fmt, journald, a GUI log pane) can filter or render the
//! stream uniformly without depending on a specific sink. It does not log
//! anything itself; callers in [`connection`](crate::connection) and
//! [`protocol`](crate::protocol) call into it at the point each event
//! occurs.

/// Classifies a log record the same way the wire-level engine classifies
/// the event that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    /// Bytes read from the socket.
    IoRead,
    /// Bytes written to the socket.
    IoWritten,
    /// A response failed to parse.
    ParseError,
    /// A mailbox synchronisation decision or mutation.
    MailboxSync,
    /// A scheduler task lifecycle event.
    Task,
    /// A message-level event (fetch, flag change).
    Message,
    /// Anything not covered by the other kinds.
    Other,
}

impl LogKind {
    /// The wire name used as the `kind` field's value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IoRead => "IO_READ",
            Self::IoWritten => "IO_WRITTEN",
            Self::ParseError => "PARSE_ERROR",
            Self::MailboxSync => "MAILBOX_SYNC",
            Self::Task => "TASK",
            Self::Message => "MESSAGE",
            Self::Other => "OTHER",
        }
    }
}

impl std::fmt::Display for LogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payloads longer than this are truncated before rendering; the dropped
/// byte count is still reported so a reader knows data was cut.
pub const MAX_PAYLOAD_LEN: usize = 4096;

/// Replaces CR and LF with the visible Unicode symbols U+240D (␍) and
/// U+240A (␊) and truncates to [`MAX_PAYLOAD_LEN`] bytes, returning the
/// rendered text and the number of bytes dropped by truncation.
#[must_use]
pub fn render_payload(raw: &str) -> (String, usize) {
    let (kept, truncated) = if raw.len() > MAX_PAYLOAD_LEN {
        let mut boundary = MAX_PAYLOAD_LEN;
        while boundary > 0 && !raw.is_char_boundary(boundary) {
            boundary -= 1;
        }
        (&raw[..boundary], raw.len() - boundary)
    } else {
        (raw, 0)
    };

    let mut rendered = String::with_capacity(kept.len());
    for ch in kept.chars() {
        match ch {
            '\r' => rendered.push('\u{240D}'),
            '\n' => rendered.push('\u{240A}'),
            other => rendered.push(other),
        }
    }
    (rendered, truncated)
}

/// A single structured log record, ready to be handed to [`emit`] or
/// inspected directly in a test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Identifies which connection/parser instance produced this record,
    /// so records from concurrent connections can be told apart in a
    /// shared log sink.
    pub parser_id: u64,
    /// The record's classification.
    pub kind: LogKind,
    /// A short label for where the record originated (e.g. a mailbox
    /// name, `"socket"`, a task id).
    pub source: String,
    /// The rendered payload (CR/LF already replaced with visible glyphs).
    pub payload: String,
    /// How many trailing bytes of the original payload were dropped by
    /// truncation (`0` if it fit).
    pub truncated: usize,
}

impl LogRecord {
    /// Builds a record, rendering and truncating `raw_payload` per
    /// [`render_payload`].
    #[must_use]
    pub fn new(parser_id: u64, kind: LogKind, source: impl Into<String>, raw_payload: &str) -> Self {
        let (payload, truncated) = render_payload(raw_payload);
        Self {
            parser_id,
            kind,
            source: source.into(),
            payload,
            truncated,
        }
    }

    /// Emits this record as a `tracing` event at the level appropriate to
    /// its kind (parse errors at `error`, everything else at `debug`,
    /// except raw I/O which logs at `trace` to keep default verbosity
    /// usable).
    pub fn emit(&self) {
        match self.kind {
            LogKind::IoRead | LogKind::IoWritten => tracing::trace!(
                parser_id = self.parser_id,
                kind = self.kind.as_str(),
                source = %self.source,
                payload = %self.payload,
                truncated = self.truncated,
                "imap io"
            ),
            LogKind::ParseError => tracing::error!(
                parser_id = self.parser_id,
                kind = self.kind.as_str(),
                source = %self.source,
                payload = %self.payload,
                truncated = self.truncated,
                "imap parse error"
            ),
            LogKind::MailboxSync | LogKind::Task | LogKind::Message | LogKind::Other => {
                tracing::debug!(
                    parser_id = self.parser_id,
                    kind = self.kind.as_str(),
                    source = %self.source,
                    payload = %self.payload,
                    truncated = self.truncated,
                    "imap event"
                );
            }
        }
    }
}

/// Builds and immediately emits a log record. The common-case entry point
/// for callers that don't need to inspect the record before it's logged.
pub fn emit(parser_id: u64, kind: LogKind, source: impl Into<String>, raw_payload: &str) {
    LogRecord::new(parser_id, kind, source, raw_payload).emit();
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn render_payload_replaces_cr_and_lf_with_visible_glyphs() {
        let (rendered, truncated) = render_payload("A001 LOGIN a b\r\n");
        assert_eq!(rendered, "A001 LOGIN a b\u{240D}\u{240A}");
        assert_eq!(truncated, 0);
    }

    #[test]
    fn render_payload_truncates_long_input_and_reports_the_drop() {
        let raw = "x".repeat(MAX_PAYLOAD_LEN + 100);
        let (rendered, truncated) = render_payload(&raw);
        assert_eq!(rendered.len(), MAX_PAYLOAD_LEN);
        assert_eq!(truncated, 100);
    }

    #[test]
    fn render_payload_truncation_respects_utf8_boundaries() {
        let mut raw = "x".repeat(MAX_PAYLOAD_LEN - 1);
        raw.push('\u{1F600}'); // 4-byte emoji straddling the boundary
        raw.push_str("tail");
        let (rendered, truncated) = render_payload(&raw);
        assert!(rendered.is_char_boundary(rendered.len()));
        assert!(truncated > 0);
    }

    #[test]
    fn log_kind_as_str_matches_the_documented_wire_names() {
        assert_eq!(LogKind::IoRead.as_str(), "IO_READ");
        assert_eq!(LogKind::IoWritten.as_str(), "IO_WRITTEN");
        assert_eq!(LogKind::ParseError.as_str(), "PARSE_ERROR");
        assert_eq!(LogKind::MailboxSync.as_str(), "MAILBOX_SYNC");
        assert_eq!(LogKind::Task.as_str(), "TASK");
        assert_eq!(LogKind::Message.as_str(), "MESSAGE");
        assert_eq!(LogKind::Other.as_str(), "OTHER");
    }

    #[test]
    fn log_record_new_renders_its_payload() {
        let record = LogRecord::new(7, LogKind::IoRead, "socket", "* OK ready\r\n");
        assert_eq!(record.parser_id, 7);
        assert_eq!(record.source, "socket");
        assert!(record.payload.ends_with('\u{240A}'));
        assert_eq!(record.truncated, 0);
    }
}
