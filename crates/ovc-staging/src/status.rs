//! Transient status line.
//!
//! Messages expire after a fixed delay and never block interaction. Expiry
//! is evaluated lazily against `tokio::time::Instant`, so tests can drive it
//! with a paused clock.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::trace;

/// Severity of a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// An operation is running; stays until replaced.
    Progress,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
    expires_at: Option<Instant>,
}

impl StatusMessage {
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Presentation form of the current message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub text: String,
    pub kind: StatusKind,
}

/// Holds at most one message; posting replaces the previous one.
#[derive(Debug, Default)]
pub struct StatusBoard {
    current: Option<StatusMessage>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Post a message that clears itself after `ttl`.
    pub fn post(&mut self, kind: StatusKind, text: impl Into<String>, ttl: Duration) {
        let text = text.into();
        trace!(?kind, %text, ttl_ms = ttl.as_millis() as u64, "Status posted");
        self.current = Some(StatusMessage {
            text,
            kind,
            expires_at: Some(Instant::now() + ttl),
        });
    }

    /// Post a progress message with no expiry.
    pub fn progress(&mut self, text: impl Into<String>) {
        self.current = Some(StatusMessage {
            text: text.into(),
            kind: StatusKind::Progress,
            expires_at: None,
        });
    }

    /// The live message, if it has not expired.
    pub fn current(&self) -> Option<&StatusMessage> {
        let now = Instant::now();
        self.current.as_ref().filter(|m| !m.is_expired(now))
    }

    pub fn view(&self) -> Option<StatusView> {
        self.current().map(|m| StatusView {
            text: m.text.clone(),
            kind: m.kind,
        })
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
