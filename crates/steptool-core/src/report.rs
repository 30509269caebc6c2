//! Reporting of recoverable, per-item failures.
//!
//! Parse failures and rejected decorator arguments are not fatal: the engine
//! hands a pre-formatted, human-readable message (always naming the offending
//! file) to a [`Reporter`] and carries on. Production code uses
//! [`TracingReporter`]; tests inject a [`CollectingReporter`] to assert on the
//! exact messages produced.

use std::cell::RefCell;

/// Sink for human-readable error messages.
pub trait Reporter {
    /// Report one message. Implementations must not fail.
    fn report(&self, message: &str);
}

impl<R: Reporter + ?Sized> Reporter for &R {
    fn report(&self, message: &str) {
        (**self).report(message)
    }
}

/// Forwards every message to `tracing` at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, message: &str) {
        tracing::error!("{}", message);
    }
}

/// Discards every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _message: &str) {}
}

/// Records messages in memory, in order.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    messages: RefCell<Vec<String>>,
}

impl CollectingReporter {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the messages reported so far.
    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }

    /// Number of messages reported so far.
    pub fn len(&self) -> usize {
        self.messages.borrow().len()
    }

    /// True if nothing has been reported.
    pub fn is_empty(&self) -> bool {
        self.messages.borrow().is_empty()
    }

    /// Remove and return all recorded messages.
    pub fn take(&self) -> Vec<String> {
        self.messages.take()
    }
}

impl Reporter for CollectingReporter {
    fn report(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_twice(reporter: &dyn Reporter) {
        reporter.report("first");
        reporter.report("second");
    }

    #[test]
    fn collecting_reporter_keeps_order() {
        let reporter = CollectingReporter::new();
        report_twice(&reporter);
        assert_eq!(reporter.messages(), vec!["first", "second"]);
        assert_eq!(reporter.len(), 2);
    }

    #[test]
    fn take_drains() {
        let reporter = CollectingReporter::new();
        reporter.report("x");
        assert_eq!(reporter.take(), vec!["x"]);
        assert!(reporter.is_empty());
    }

    #[test]
    fn reference_forwards() {
        let reporter = CollectingReporter::new();
        let by_ref = &reporter;
        Reporter::report(&by_ref, "via ref");
        assert_eq!(reporter.messages(), vec!["via ref"]);
    }
}
