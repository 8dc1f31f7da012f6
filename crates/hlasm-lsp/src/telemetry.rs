//! Parse/perf metrics logging (ambient; `spec.md` §4.7 notes a parse task
//! resolves to `(uri, metadata, perf_metrics, errors, warnings)`).
//!
//! Trimmed from the teacher's opt-in JSONL telemetry sink down to structured
//! `tracing` events: this server has no product-analytics surface to feed,
//! only operator-facing logs.

use std::time::Duration;
use tracing::info;

/// The query/parse events worth a structured log line.
#[derive(Debug, Clone, Copy)]
pub enum Event {
    /// A file finished (re-)parsing.
    Parse,
    /// `textDocument/definition`.
    Definition,
    /// `textDocument/references`.
    References,
    /// `textDocument/hover`.
    Hover,
    /// `textDocument/completion`.
    Completion,
    /// `textDocument/documentSymbol`.
    DocumentSymbol,
    /// `textDocument/semanticTokens/full`.
    SemanticTokens,
}

impl Event {
    fn as_str(self) -> &'static str {
        match self {
            Event::Parse => "parse",
            Event::Definition => "definition",
            Event::References => "references",
            Event::Hover => "hover",
            Event::Completion => "completion",
            Event::DocumentSymbol => "document_symbol",
            Event::SemanticTokens => "semantic_tokens",
        }
    }
}

/// Logs one event's wall-clock duration and outcome at `info` level.
pub fn record(event: Event, uri: &str, elapsed: Duration, diagnostic_count: usize) {
    info!(
        event = event.as_str(),
        uri,
        elapsed_us = elapsed.as_micros() as u64,
        diagnostic_count,
        "query completed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_are_snake_case() {
        assert_eq!(Event::SemanticTokens.as_str(), "semantic_tokens");
        assert_eq!(Event::DocumentSymbol.as_str(), "document_symbol");
    }
}
