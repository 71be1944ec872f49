//! Shared counters for the /health endpoint. Updated by the request handler.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct HealthState {
    pub requests_total: AtomicU64,
    /// Responses whose records were substituted with sample data.
    pub fallbacks_served: AtomicU64,
    /// 5xx responses (transport failures, GraphQL errors, bad bodies).
    pub upstream_failures: AtomicU64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_requests(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_fallbacks(&self) {
        self.fallbacks_served.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_upstream_failures(&self) {
        self.upstream_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    pub fn fallbacks_served(&self) -> u64 {
        self.fallbacks_served.load(Ordering::Relaxed)
    }

    pub fn upstream_failures(&self) -> u64 {
        self.upstream_failures.load(Ordering::Relaxed)
    }
}
