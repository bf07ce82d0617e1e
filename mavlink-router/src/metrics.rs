//! Router-wide counters: messages received/routed/dropped, bytes routed, with an optional
//! periodic stats log. Grounded on `K4HVH-mav-lite`'s `metrics.rs` (same field set, same
//! atomics-plus-snapshot shape), adapted from that router's single-dialect loop to this
//! one's actor (`record_*` calls are made from `Router::run`'s event loop instead of a
//! dedicated send/recv task).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::interval;
use tracing::{info, warn};

/// Process-wide counters for one running router. Cheap to clone — every clone shares the
/// same atomics, so a stats-logging task and the router actor observe the same numbers.
#[derive(Debug, Clone)]
pub struct Metrics {
    messages_received: Arc<AtomicU64>,
    messages_routed: Arc<AtomicU64>,
    messages_dropped: Arc<AtomicU64>,
    bytes_routed: Arc<AtomicU64>,
    start_time: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            messages_received: Arc::new(AtomicU64::new(0)),
            messages_routed: Arc::new(AtomicU64::new(0)),
            messages_dropped: Arc::new(AtomicU64::new(0)),
            bytes_routed: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    /// Counts one frame accepted off a connection (known or unknown message id alike).
    pub fn record_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts one frame successfully forwarded to a connection or delivered to a subscriber.
    pub fn record_routed(&self, bytes: usize) {
        self.messages_routed.fetch_add(1, Ordering::Relaxed);
        self.bytes_routed.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Counts a frame dropped for backpressure (an adapter's outbound channel was closed or
    /// full). Does not cover the targeted-before-learned silent drop, which spec.md §7
    /// treats as an expected transient rather than a fault.
    pub fn record_dropped(&self) {
        self.messages_dropped.fetch_add(1, Ordering::Relaxed);
        warn!("message dropped due to backpressure");
    }

    pub fn get_stats(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_routed: self.messages_routed.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            bytes_routed: self.bytes_routed.load(Ordering::Relaxed),
            uptime: self.start_time.elapsed(),
        }
    }

    /// Spawns a background task that logs a stats snapshot every `interval_secs`.
    pub fn start_stats_logger(self, interval_secs: u64) {
        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(interval_secs));
            let mut last_stats = self.get_stats();

            loop {
                ticker.tick().await;
                let current_stats = self.get_stats();
                let delta = current_stats.delta(&last_stats, interval_secs);

                info!(
                    uptime_s = current_stats.uptime.as_secs(),
                    received = current_stats.messages_received,
                    routed = current_stats.messages_routed,
                    dropped = current_stats.messages_dropped,
                    msg_per_sec = delta.messages_per_sec,
                    kbytes_per_sec = delta.kbytes_per_sec,
                    "router stats"
                );

                last_stats = current_stats;
            }
        });
    }
}

#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub messages_received: u64,
    pub messages_routed: u64,
    pub messages_dropped: u64,
    pub bytes_routed: u64,
    pub uptime: Duration,
}

impl MetricsSnapshot {
    pub fn delta(&self, previous: &MetricsSnapshot, interval_secs: u64) -> MetricsDelta {
        let messages_diff = self.messages_routed.saturating_sub(previous.messages_routed);
        let bytes_diff = self.bytes_routed.saturating_sub(previous.bytes_routed);

        MetricsDelta {
            messages_per_sec: messages_diff as f64 / interval_secs as f64,
            kbytes_per_sec: (bytes_diff as f64 / 1024.0) / interval_secs as f64,
        }
    }
}

#[derive(Debug)]
pub struct MetricsDelta {
    pub messages_per_sec: f64,
    pub kbytes_per_sec: f64,
}
