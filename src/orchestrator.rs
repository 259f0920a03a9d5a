//! Two-phase ask orchestration.
//!
//! Drives the structured search followed by the structured chat stream and
//! owns the observable `QuerySession`. Observers read cloned snapshots;
//! only the orchestrator mutates the session.
//!
//! Superseding: a new ask bumps the epoch and replaces the session
//! wholesale. Every fold re-checks the epoch under the lock, so events
//! still trickling in from an older stream are no-ops. The superseded
//! transfer itself is not aborted explicitly; its driver notices the stale
//! epoch, stops polling, and the connection drops with it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use futures_util::StreamExt;
use thiserror::Error;

use crate::client::PrecedentApi;
use crate::session::{AskStatus, QueryInput, QuerySession};
use crate::sse::StreamEvent;

/// Errors that prevent an ask from starting at all.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AskError {
    /// No filter was usable: term and attribute empty, language under the
    /// two-character minimum.
    #[error("at least one search filter is required")]
    EmptyInput,
}

/// Owns the current session and sequences the two network phases.
pub struct QueryOrchestrator<A: PrecedentApi> {
    api: A,
    session: Mutex<QuerySession>,
    epoch: AtomicU64,
}

impl<A: PrecedentApi> QueryOrchestrator<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            session: Mutex::new(QuerySession::new(0, QueryInput::default())),
            epoch: AtomicU64::new(0),
        }
    }

    /// Read-only snapshot of the current session.
    pub fn snapshot(&self) -> QuerySession {
        self.session.lock().unwrap().clone()
    }

    /// Mutate the session only if it still belongs to `epoch`.
    ///
    /// Returns false when a newer ask has replaced the session; the caller
    /// must stop driving its stream.
    fn with_current<F>(&self, epoch: u64, f: F) -> bool
    where
        F: FnOnce(&mut QuerySession),
    {
        let mut session = self.session.lock().unwrap();
        if session.epoch != epoch {
            tracing::debug!(stale = epoch, current = session.epoch, "dropping stale update");
            return false;
        }
        f(&mut session);
        true
    }

    fn fail(&self, epoch: u64, message: String) {
        self.with_current(epoch, |session| {
            tracing::warn!(%message, "ask failed");
            session.status = AskStatus::Failed(message);
        });
    }

    /// Run one ask end to end: search, then stream, folding events as they
    /// arrive. Returns the final snapshot for this ask's epoch (which may
    /// show an earlier terminal state if a newer ask superseded it).
    pub async fn ask(&self, input: QueryInput) -> Result<QuerySession, AskError> {
        if !input.is_askable() {
            return Err(AskError::EmptyInput);
        }

        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut session = self.session.lock().unwrap();
            *session = QuerySession::new(epoch, input.clone());
            session.status = AskStatus::Searching;
        }
        tracing::info!(epoch, "ask started");

        // Phase one: structured search.
        match self.api.search(&input.search_request()).await {
            Ok(response) => {
                let superseded = !self.with_current(epoch, |session| {
                    tracing::debug!(results = response.results.len(), "search complete");
                    session.results = response.results;
                    session.note = response.note;
                    session.status = AskStatus::Streaming;
                });
                if superseded {
                    return Ok(self.snapshot());
                }
            }
            Err(err) => {
                self.fail(epoch, err.user_message());
                return Ok(self.snapshot());
            }
        }

        // Phase two: structured chat stream.
        let mut events = match self.api.stream_chat(&input.chat_request()).await {
            Ok(events) => events,
            Err(err) => {
                self.fail(epoch, err.user_message());
                return Ok(self.snapshot());
            }
        };

        while let Some(item) = events.next().await {
            match item {
                Ok(event) => {
                    let applied = self.with_current(epoch, |session| session.apply(&event));
                    if !applied {
                        // Superseded mid-stream: stop polling, drop the transfer.
                        return Ok(self.snapshot());
                    }
                    if matches!(event, StreamEvent::Done { .. }) {
                        // Authoritative terminal event; trailing data is noise.
                        break;
                    }
                }
                Err(err) => {
                    self.fail(epoch, err.user_message());
                    return Ok(self.snapshot());
                }
            }
        }

        // Clean end of transfer without done still completes the ask.
        self.with_current(epoch, |session| {
            if session.status == AskStatus::Streaming {
                session.status = AskStatus::Complete;
            }
            tracing::info!(epoch, status = ?session.status, "ask finished");
        });

        Ok(self.snapshot())
    }
}
