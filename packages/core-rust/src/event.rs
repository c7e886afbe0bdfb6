//! Execution events reported by engines.
//!
//! Engines classify every submission outcome into an [`ExecutionEvent`] and
//! report it to an [`EventSink`]. [`CommandLog`] is the in-memory sink used
//! by tests and the reference engine; production engines typically feed
//! their metrics pipeline instead.

use parking_lot::Mutex;

use crate::keys::CommandKey;

// ---------------------------------------------------------------------------
// ExecutionEvent
// ---------------------------------------------------------------------------

/// Outcome classification of one command execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionEvent {
    /// The primary body completed successfully.
    Success,
    /// The primary body failed (a fallback may still run afterwards).
    Failure,
    /// The bound fallback supplied the result after a primary failure.
    FallbackSuccess,
    /// The bound fallback failed too.
    FallbackFailure,
    /// The circuit was open; execution was skipped.
    ShortCircuited,
    /// Admission control refused the submission.
    Rejected,
}

// ---------------------------------------------------------------------------
// EventSink
// ---------------------------------------------------------------------------

/// Receiver for per-command execution events.
pub trait EventSink: Send + Sync {
    /// Record one event for the given command key.
    fn record(&self, key: &CommandKey, event: ExecutionEvent);
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&self, _key: &CommandKey, _event: ExecutionEvent) {}
}

// ---------------------------------------------------------------------------
// CommandLog
// ---------------------------------------------------------------------------

/// In-memory event log, keyed by command key.
///
/// Answers the question a caller asks after a request: which commands
/// executed and which outcome events each produced, in order.
#[derive(Debug, Default)]
pub struct CommandLog {
    entries: Mutex<Vec<(CommandKey, ExecutionEvent)>>,
}

impl CommandLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded `(key, event)` entries, in recording order.
    #[must_use]
    pub fn entries(&self) -> Vec<(CommandKey, ExecutionEvent)> {
        self.entries.lock().clone()
    }

    /// Events recorded for one command key, in recording order.
    #[must_use]
    pub fn events_for(&self, key: &CommandKey) -> Vec<ExecutionEvent> {
        self.entries
            .lock()
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, event)| *event)
            .collect()
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop all recorded events.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl EventSink for CommandLog {
    fn record(&self, key: &CommandKey, event: ExecutionEvent) {
        tracing::debug!(command = %key, ?event, "execution event");
        self.entries.lock().push((key.clone(), event));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::keys::CommandKeys;

    use super::*;

    #[test]
    fn events_are_kept_in_recording_order() {
        let log = CommandLog::new();
        let keys = CommandKeys::derive("get_user");
        log.record(&keys.command, ExecutionEvent::Failure);
        log.record(&keys.command, ExecutionEvent::FallbackSuccess);

        assert_eq!(
            log.events_for(&keys.command),
            vec![ExecutionEvent::Failure, ExecutionEvent::FallbackSuccess],
        );
    }

    #[test]
    fn events_are_filtered_by_key() {
        let log = CommandLog::new();
        let a = CommandKeys::derive("a");
        let b = CommandKeys::derive("b");
        log.record(&a.command, ExecutionEvent::Success);
        log.record(&b.command, ExecutionEvent::Rejected);

        assert_eq!(log.events_for(&a.command), vec![ExecutionEvent::Success]);
        assert_eq!(log.events_for(&b.command), vec![ExecutionEvent::Rejected]);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn clear_empties_the_log() {
        let log = CommandLog::new();
        let keys = CommandKeys::derive("a");
        log.record(&keys.command, ExecutionEvent::Success);
        log.clear();
        assert!(log.is_empty());
    }
}
