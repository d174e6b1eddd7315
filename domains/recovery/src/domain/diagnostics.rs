//! Diagnostics observer for failures the recovery flow absorbs
//!
//! Swallowed failures are reported through an injected observer rather
//! than logged directly, so tests can assert on them.

use std::sync::{Arc, Mutex};

/// Something worth a log line that did not change the outcome of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticEvent {
    InvitationAcceptanceFailed { team_id: String, error: String },
}

pub trait RecoveryDiagnostics: Send + Sync {
    fn record(&self, event: DiagnosticEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl RecoveryDiagnostics for TracingDiagnostics {
    fn record(&self, event: DiagnosticEvent) {
        match event {
            DiagnosticEvent::InvitationAcceptanceFailed { team_id, error } => {
                tracing::error!(team_id = %team_id, error = %error, "Failed to accept team invitation");
            }
        }
    }
}

/// Keeps events in memory for test assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingDiagnostics {
    events: Arc<Mutex<Vec<DiagnosticEvent>>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return all recorded events.
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .expect("diagnostics lock poisoned — prior test panicked")
            .clone()
    }
}

impl RecoveryDiagnostics for RecordingDiagnostics {
    fn record(&self, event: DiagnosticEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(e) => tracing::error!(error = %e, ?event, "Diagnostics lock poisoned, event dropped"),
        }
    }
}
