//! Typed stream events from the structured chat endpoint.
//!
//! The interpreter hands over `(kind, payload)` pairs verbatim; this module
//! maps the kinds the backend actually sends onto a typed enum. Unknown
//! kinds are dropped at this boundary, mirroring the drop policy for
//! malformed payloads one layer below.

use serde_json::Value;

use crate::sse::parser::WireEvent;

/// Typed events recognized on the structured chat stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Advisory metadata sent before generation begins. The evidence flag
    /// here may be superseded by `Done`.
    Meta {
        evidence_found: bool,
        scope: Option<String>,
        searched_clients: Vec<String>,
    },
    /// Incremental answer fragment.
    Token { token: String },
    /// Recoverable generation failure; the stream continues after it.
    Error { message: String },
    /// Terminal payload with the authoritative citations and evidence flag.
    Done {
        citations: Vec<String>,
        evidence_found: bool,
        token_count: Option<u64>,
    },
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

impl StreamEvent {
    /// Map a wire event onto a typed event. Unknown kinds yield `None`.
    pub fn from_wire(event: &WireEvent) -> Option<Self> {
        let payload = &event.payload;
        match event.kind.as_str() {
            "meta" => Some(StreamEvent::Meta {
                evidence_found: payload
                    .get("evidence_found")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
                scope: payload
                    .get("scope")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                searched_clients: string_list(payload.get("searched_clients")),
            }),
            "token" => Some(StreamEvent::Token {
                // Missing token is an empty fragment, not an error.
                token: payload
                    .get("token")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            }),
            "error" => Some(StreamEvent::Error {
                message: payload
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string(),
            }),
            "done" => Some(StreamEvent::Done {
                citations: string_list(payload.get("citations")),
                evidence_found: payload
                    .get("evidence_found")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
                token_count: payload.get("token_count").and_then(Value::as_u64),
            }),
            other => {
                tracing::debug!(kind = other, "ignoring unrecognized event kind");
                None
            }
        }
    }

    /// Event kind name, for logging.
    pub fn kind_name(&self) -> &'static str {
        match self {
            StreamEvent::Meta { .. } => "meta",
            StreamEvent::Token { .. } => "token",
            StreamEvent::Error { .. } => "error",
            StreamEvent::Done { .. } => "done",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire(kind: &str, payload: Value) -> WireEvent {
        WireEvent {
            kind: kind.to_string(),
            payload,
        }
    }

    #[test]
    fn test_meta_event() {
        let event = StreamEvent::from_wire(&wire(
            "meta",
            json!({"evidence_found": true, "scope": "ALL", "searched_clients": ["bank-a"]}),
        ))
        .unwrap();
        assert_eq!(
            event,
            StreamEvent::Meta {
                evidence_found: true,
                scope: Some("ALL".to_string()),
                searched_clients: vec!["bank-a".to_string()],
            }
        );
    }

    #[test]
    fn test_meta_event_minimal_payload() {
        let event = StreamEvent::from_wire(&wire("meta", json!({}))).unwrap();
        assert_eq!(
            event,
            StreamEvent::Meta {
                evidence_found: false,
                scope: None,
                searched_clients: Vec::new(),
            }
        );
    }

    #[test]
    fn test_token_event() {
        let event = StreamEvent::from_wire(&wire("token", json!({"token": "The "}))).unwrap();
        assert_eq!(
            event,
            StreamEvent::Token {
                token: "The ".to_string()
            }
        );
    }

    #[test]
    fn test_token_event_missing_fragment() {
        let event = StreamEvent::from_wire(&wire("token", json!({}))).unwrap();
        assert_eq!(
            event,
            StreamEvent::Token {
                token: String::new()
            }
        );
    }

    #[test]
    fn test_error_event_default_message() {
        let event = StreamEvent::from_wire(&wire("error", json!({}))).unwrap();
        assert_eq!(
            event,
            StreamEvent::Error {
                message: "unknown".to_string()
            }
        );
    }

    #[test]
    fn test_done_event() {
        let event = StreamEvent::from_wire(&wire(
            "done",
            json!({"citations": ["abc123"], "evidence_found": true, "token_count": 12}),
        ))
        .unwrap();
        assert_eq!(
            event,
            StreamEvent::Done {
                citations: vec!["abc123".to_string()],
                evidence_found: true,
                token_count: Some(12),
            }
        );
    }

    #[test]
    fn test_done_event_non_string_citations_skipped() {
        let event =
            StreamEvent::from_wire(&wire("done", json!({"citations": ["ok", 7, null]}))).unwrap();
        assert_eq!(
            event,
            StreamEvent::Done {
                citations: vec!["ok".to_string()],
                evidence_found: false,
                token_count: None,
            }
        );
    }

    #[test]
    fn test_unknown_kind_dropped() {
        assert!(StreamEvent::from_wire(&wire("ping", json!({}))).is_none());
        assert!(StreamEvent::from_wire(&wire("message", json!({"x": 1}))).is_none());
    }

    #[test]
    fn test_kind_name() {
        let event = StreamEvent::Token {
            token: String::new(),
        };
        assert_eq!(event.kind_name(), "token");
    }
}
