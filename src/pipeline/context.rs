//! Shared run state: counters, the abort flag, and the cancel flag.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::RunSummary;

/// State shared by every task of one run. Configuration lives in [`crate::RunConfig`];
/// this only holds what tasks report back.
pub struct RunContext {
    written: AtomicUsize,
    errors: AtomicUsize,
    /// Set once a branch raised; dispatchers stop handing out new work.
    aborted: AtomicBool,
    cancel: Option<Arc<AtomicBool>>,
}

impl RunContext {
    pub fn new(cancel: Option<Arc<AtomicBool>>) -> Self {
        Self {
            written: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
            aborted: AtomicBool::new(false),
            cancel,
        }
    }

    pub fn record_written(&self) {
        self.written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn written(&self) -> usize {
        self.written.load(Ordering::Relaxed)
    }

    pub fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// True when no new work should be started.
    pub fn should_stop(&self) -> bool {
        self.aborted.load(Ordering::Relaxed) || self.cancelled()
    }

    /// Stop new submissions after a raised error. The error itself travels back through
    /// the task results.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::Relaxed);
    }

    pub fn summary(&self, inputs: usize) -> RunSummary {
        RunSummary {
            inputs,
            schemas_written: self.written(),
            errors: self.errors(),
        }
    }
}
