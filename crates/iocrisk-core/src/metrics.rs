//! Global atomic counters for iocrisk observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. before the CLI exits).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters, lock-free.
pub struct Metrics {
    submissions_started: AtomicU64,
    submissions_failed: AtomicU64,
    records_dropped: AtomicU64,
    source_fallbacks: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            submissions_started: AtomicU64::new(0),
            submissions_failed: AtomicU64::new(0),
            records_dropped: AtomicU64::new(0),
            source_fallbacks: AtomicU64::new(0),
        }
    }

    /// Increment the submissions-started counter by one.
    pub fn inc_submissions_started(&self) {
        self.submissions_started.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "submissions_started", "counter incremented");
    }

    /// Increment the submissions-failed counter by one.
    pub fn inc_submissions_failed(&self) {
        self.submissions_failed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "submissions_failed", "counter incremented");
    }

    /// Add `n` malformed result records to the dropped counter.
    pub fn add_records_dropped(&self, n: u64) {
        if n == 0 {
            return;
        }
        self.records_dropped.fetch_add(n, Ordering::Relaxed);
        tracing::trace!(metric = "records_dropped", n, "counter incremented");
    }

    /// Add `n` decoded source records that render in the fallback shape.
    pub fn add_source_fallbacks(&self, n: u64) {
        if n == 0 {
            return;
        }
        self.source_fallbacks.fetch_add(n, Ordering::Relaxed);
        tracing::trace!(metric = "source_fallbacks", n, "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            submissions_started = self.submissions_started(),
            submissions_failed = self.submissions_failed(),
            records_dropped = self.records_dropped(),
            source_fallbacks = self.source_fallbacks(),
        );
    }

    pub fn submissions_started(&self) -> u64 {
        self.submissions_started.load(Ordering::Relaxed)
    }

    pub fn submissions_failed(&self) -> u64 {
        self.submissions_failed.load(Ordering::Relaxed)
    }

    pub fn records_dropped(&self) -> u64 {
        self.records_dropped.load(Ordering::Relaxed)
    }

    pub fn source_fallbacks(&self) -> u64 {
        self.source_fallbacks.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.submissions_started.store(0, Ordering::Relaxed);
        self.submissions_failed.store(0, Ordering::Relaxed);
        self.records_dropped.store(0, Ordering::Relaxed);
        self.source_fallbacks.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let m = Metrics::new();
        assert_eq!(m.submissions_started(), 0);
        m.inc_submissions_started();
        m.inc_submissions_started();
        assert_eq!(m.submissions_started(), 2);

        m.inc_submissions_failed();
        assert_eq!(m.submissions_failed(), 1);

        m.add_records_dropped(3);
        m.add_records_dropped(0);
        assert_eq!(m.records_dropped(), 3);

        m.add_source_fallbacks(1);
        assert_eq!(m.source_fallbacks(), 1);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.inc_submissions_started();
        m.inc_submissions_failed();
        m.add_records_dropped(2);
        m.add_source_fallbacks(1);
        m.reset();
        assert_eq!(m.submissions_started(), 0);
        assert_eq!(m.submissions_failed(), 0);
        assert_eq!(m.records_dropped(), 0);
        assert_eq!(m.source_fallbacks(), 0);
    }
}
