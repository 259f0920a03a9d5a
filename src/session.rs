//! Per-ask session state and event folding.
//!
//! One user-initiated ask owns one `QuerySession`: the search-phase fields
//! are set once, the chat-phase fields are folded incrementally from stream
//! events. A new ask replaces the session wholesale; it is never patched.

use crate::models::{ClusterResult, StructuredRequest, DEFAULT_TOP_K};
use crate::sse::StreamEvent;

/// Marker appended inline when the server reports a recoverable
/// generation failure.
fn llm_error_marker(message: &str) -> String {
    format!("\n[LLM Error: {}]\n", message)
}

/// Named search filters collected from the user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryInput {
    /// Exact-match clause term, e.g. "Governing Law".
    pub term: String,
    /// Exact-match clause attribute, e.g. "Jurisdiction".
    pub attribute: String,
    /// Free-text clause language.
    pub language: String,
}

impl QueryInput {
    /// Whether the input is sufficient to start an ask.
    ///
    /// Term and attribute are exact-match filters, so any non-empty value
    /// counts. Language is free text; a single character is not a
    /// meaningful query, so it needs at least two.
    pub fn is_askable(&self) -> bool {
        !self.term.trim().is_empty()
            || !self.attribute.trim().is_empty()
            || self.language.trim().len() >= 2
    }

    fn non_empty(field: &str) -> Option<String> {
        let trimmed = field.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Body for the search phase, with the fixed result-count limit.
    pub fn search_request(&self) -> StructuredRequest {
        StructuredRequest {
            top_k: Some(DEFAULT_TOP_K),
            ..self.chat_request()
        }
    }

    /// Body for the chat phase: the same filters, no limit.
    pub fn chat_request(&self) -> StructuredRequest {
        StructuredRequest {
            term: Self::non_empty(&self.term),
            attribute: Self::non_empty(&self.attribute),
            language: Self::non_empty(&self.language),
            top_k: None,
        }
    }
}

/// Status of one ask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AskStatus {
    /// No ask in flight.
    Idle,
    /// Search request issued.
    Searching,
    /// Stream open; answer fields updating.
    Streaming,
    /// Terminal: citations and evidence flag are authoritative.
    Complete,
    /// Terminal: the ask could not be serviced.
    Failed(String),
}

impl AskStatus {
    /// Whether this status ends the ask.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AskStatus::Complete | AskStatus::Failed(_))
    }
}

/// Full client-side state for one search-then-chat ask.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySession {
    /// Monotonic identity; folds tagged with an older epoch are stale.
    pub epoch: u64,
    pub input: QueryInput,
    /// Ordered precedent records from the search phase.
    pub results: Vec<ClusterResult>,
    /// Advisory note from the search phase, displayed verbatim.
    pub note: String,
    /// Accumulated answer text.
    pub answer: String,
    /// Citation identifiers; authoritative only after `done`.
    pub citations: Vec<String>,
    pub evidence_found: bool,
    pub status: AskStatus,
}

impl QuerySession {
    /// Fresh session for a new ask.
    pub fn new(epoch: u64, input: QueryInput) -> Self {
        Self {
            epoch,
            input,
            results: Vec::new(),
            note: String::new(),
            answer: String::new(),
            citations: Vec::new(),
            evidence_found: false,
            status: AskStatus::Idle,
        }
    }

    /// Fold one stream event into the session.
    ///
    /// Folding only happens while `Streaming`; after `done` has made the
    /// session `Complete`, trailing events are ignored.
    pub fn apply(&mut self, event: &StreamEvent) {
        if self.status != AskStatus::Streaming {
            tracing::debug!(
                kind = event.kind_name(),
                status = ?self.status,
                "ignoring event outside streaming state"
            );
            return;
        }

        match event {
            StreamEvent::Meta { evidence_found, .. } => {
                self.evidence_found = *evidence_found;
            }
            StreamEvent::Token { token } => {
                if !token.is_empty() {
                    self.answer.push_str(token);
                }
            }
            StreamEvent::Error { message } => {
                // Recoverable: the failure stays visible inside the answer
                // and the stream keeps going.
                self.answer.push_str(&llm_error_marker(message));
            }
            StreamEvent::Done {
                citations,
                evidence_found,
                ..
            } => {
                self.citations = citations.clone();
                self.evidence_found = *evidence_found;
                self.status = AskStatus::Complete;
            }
        }
    }
}
