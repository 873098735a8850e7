// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Pass-scoped message log.
//!
//! Every reconciliation pass owns one [`Messages`]. Entries are emitted through
//! `tracing` as they are recorded and kept so the pass can derive its result from
//! what happened: a pass requeues only while a transient error is pending.

use tracing::{error, info, warn};

/// Severity of a recorded message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A single recorded message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub severity: Severity,
    pub text: String,
    /// Set on errors that a later pass may resolve.
    pub transient: bool,
}

/// What the pass should do once it is finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassResult {
    /// Nothing pending; wait for the next change notification.
    Done,
    /// A transient error is pending; run the pass again.
    Requeue,
}

/// Append-only log of one reconciliation pass.
#[derive(Debug)]
pub struct Messages {
    subject: String,
    entries: Vec<Message>,
}

impl Messages {
    /// Start a log for `subject` (e.g. `Jenkins demo/jenkins`).
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            entries: Vec::new(),
        }
    }

    pub fn info(&mut self, text: impl Into<String>) {
        let text = text.into();
        info!(resource = %self.subject, "{text}");
        self.push(Severity::Info, text, false);
    }

    pub fn warning(&mut self, text: impl Into<String>) {
        let text = text.into();
        warn!(resource = %self.subject, "{text}");
        self.push(Severity::Warning, text, false);
    }

    /// Record an error. `transient` errors make the pass requeue.
    pub fn error(&mut self, text: impl Into<String>, transient: bool) {
        let text = text.into();
        error!(resource = %self.subject, transient, "{text}");
        self.push(Severity::Error, text, transient);
    }

    #[must_use]
    pub fn entries(&self) -> &[Message] {
        &self.entries
    }

    #[must_use]
    pub fn has_transient_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|m| m.severity == Severity::Error && m.transient)
    }

    /// Requeue if and only if a transient error was recorded.
    #[must_use]
    pub fn derive_result(&self) -> PassResult {
        if self.has_transient_errors() {
            PassResult::Requeue
        } else {
            PassResult::Done
        }
    }

    pub fn into_entries(self) -> Vec<Message> {
        self.entries
    }

    fn push(&mut self, severity: Severity, text: String, transient: bool) {
        self.entries.push(Message {
            severity,
            text,
            transient,
        });
    }
}
