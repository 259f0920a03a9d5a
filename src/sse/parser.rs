//! Block-to-event interpretation for the streaming wire grammar.
//!
//! A block is a handful of lines classified by a two-token prefix grammar:
//! `event:` declares the kind, `data:` lines contribute payload fragments.
//! The payload is JSON. Everything that fails this grammar is dropped here,
//! in one place, so keep-alive noise never reaches the session fold.

use serde_json::Value;

/// One interpreted block: the declared kind plus its decoded JSON payload.
///
/// Kinds pass through verbatim; mapping them onto typed events is the
/// caller's concern.
#[derive(Debug, Clone, PartialEq)]
pub struct WireEvent {
    pub kind: String,
    pub payload: Value,
}

/// Kind assumed when a block carries data but no `event:` line.
pub const DEFAULT_KIND: &str = "message";

/// Interpret a complete block into a wire event.
///
/// Returns `None` for blocks with no `data:` line (keep-alives) and for
/// payloads that are not valid JSON. Neither case is an error; the stream
/// continues.
pub fn interpret_block(block: &str) -> Option<WireEvent> {
    let mut kind: Option<String> = None;
    let mut data = String::new();

    for line in block.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(rest) = line.strip_prefix("event:") {
            kind = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("data:") {
            // Multiple data: lines concatenate in order, prefix stripped.
            data.push_str(rest.trim());
        }
    }

    if data.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(&data) {
        Ok(payload) => Some(WireEvent {
            kind: kind.unwrap_or_else(|| DEFAULT_KIND.to_string()),
            payload,
        }),
        Err(err) => {
            tracing::debug!(%err, "dropping block with malformed payload");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_interpret_event_and_data() {
        let event = interpret_block("event: token\ndata: {\"token\": \"The \"}").unwrap();
        assert_eq!(event.kind, "token");
        assert_eq!(event.payload, json!({"token": "The "}));
    }

    #[test]
    fn test_interpret_no_space_after_prefix() {
        let event = interpret_block("event:token\ndata:{\"token\":\"applies.\"}").unwrap();
        assert_eq!(event.kind, "token");
        assert_eq!(event.payload, json!({"token": "applies."}));
    }

    #[test]
    fn test_interpret_default_kind() {
        let event = interpret_block("data: {\"token\": \"hi\"}").unwrap();
        assert_eq!(event.kind, DEFAULT_KIND);
    }

    #[test]
    fn test_interpret_multiple_data_lines_concatenate() {
        let event = interpret_block("event: done\ndata: {\"citations\":\ndata: [\"abc\"]}").unwrap();
        assert_eq!(event.payload, json!({"citations": ["abc"]}));
    }

    #[test]
    fn test_interpret_no_data_is_keepalive() {
        // An event: line alone is a no-op, not an error.
        assert!(interpret_block("event: token").is_none());
    }

    #[test]
    fn test_interpret_malformed_json_dropped() {
        // Invalid payloads yield nothing and raise nothing.
        assert!(interpret_block("event: token\ndata: not json").is_none());
    }

    #[test]
    fn test_interpret_unknown_lines_ignored() {
        let event = interpret_block(": keep-alive\nretry: 3000\ndata: {\"x\": 1}").unwrap();
        assert_eq!(event.kind, DEFAULT_KIND);
        assert_eq!(event.payload, json!({"x": 1}));
    }

    #[test]
    fn test_interpret_crlf_lines() {
        let event = interpret_block("event: meta\r\ndata: {\"evidence_found\": true}\r").unwrap();
        assert_eq!(event.kind, "meta");
        assert_eq!(event.payload, json!({"evidence_found": true}));
    }

    #[test]
    fn test_interpret_last_event_line_wins() {
        let event = interpret_block("event: meta\nevent: token\ndata: {}").unwrap();
        assert_eq!(event.kind, "token");
    }
}
