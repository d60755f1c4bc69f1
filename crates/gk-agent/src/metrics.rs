use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use chrono::{DateTime, Utc};

/// Per-agent counters, published on every heartbeat. Mirrors the
/// `_metrics` dict the original `BaseAgent` carried.
#[derive(Default)]
pub struct AgentMetrics {
    messages_received: AtomicU64,
    messages_sent: AtomicU64,
    errors: AtomicU64,
    last_heartbeat_millis: AtomicI64,
}

impl AgentMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_heartbeat(&self, at: DateTime<Utc>) {
        self.last_heartbeat_millis
            .store(at.timestamp_millis(), Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

pub struct MetricsSnapshot {
    pub messages_received: u64,
    pub messages_sent: u64,
    pub errors: u64,
}
