//! Request counters
//!
//! `RequestMetrics` is created by whoever drives fetches and shared through
//! an `Arc`; nothing in this workspace keeps process-wide counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe request counters
#[derive(Debug, Default)]
pub struct RequestMetrics {
    pub total_requests: AtomicU64,
    pub successful_requests: AtomicU64,
    pub failed_requests: AtomicU64,
    pub active_requests: AtomicU64,
}

impl RequestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a new request and mark it active until the guard is dropped
    pub fn begin(&self) -> ActiveRequestGuard<'_> {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.active_requests.fetch_add(1, Ordering::Relaxed);
        ActiveRequestGuard { metrics: self }
    }

    pub fn record_success(&self) {
        self.successful_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            active_requests: self.active_requests.load(Ordering::Relaxed),
        }
    }
}

/// Decrements `active_requests` on drop
#[derive(Debug)]
pub struct ActiveRequestGuard<'a> {
    metrics: &'a RequestMetrics,
}

impl Drop for ActiveRequestGuard<'_> {
    fn drop(&mut self) {
        self.metrics.active_requests.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Immutable metrics snapshot for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub active_requests: u64,
}
