//! Metrics collection for control sessions
//!
//! Counts exchanges, signals and authentication attempts, and keeps a bounded
//! latency histogram of command round trips. Metrics are observational only.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Metrics collector shared by one control session
pub struct ControlMetrics {
    start_time: Instant,

    /// Command/reply exchanges attempted
    pub commands_total: AtomicU64,
    /// Exchanges that ended in a transport, framing or status error
    pub commands_failed: AtomicU64,

    /// Signals sent to the peer
    pub signals_dispatched: AtomicU64,
    /// Signals answered locally by the debounce
    pub signals_suppressed: AtomicU64,

    pub auth_attempts: AtomicU64,
    pub auth_failures: AtomicU64,

    /// Round-trip latencies (microseconds)
    exchange_latencies: RwLock<LatencyHistogram>,
}

impl ControlMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            commands_total: AtomicU64::new(0),
            commands_failed: AtomicU64::new(0),
            signals_dispatched: AtomicU64::new(0),
            signals_suppressed: AtomicU64::new(0),
            auth_attempts: AtomicU64::new(0),
            auth_failures: AtomicU64::new(0),
            exchange_latencies: RwLock::new(LatencyHistogram::new()),
        }
    }

    /// Record one command/reply exchange
    pub fn record_exchange(&self, success: bool, latency: Duration) {
        self.commands_total.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.commands_failed.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut hist) = self.exchange_latencies.write() {
            hist.record(latency.as_micros() as u64);
        }
    }

    pub fn record_signal(&self, suppressed: bool) {
        if suppressed {
            self.signals_suppressed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.signals_dispatched.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_auth(&self, success: bool) {
        self.auth_attempts.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.auth_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Export metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        let hist = self.exchange_latencies.read().ok();

        MetricsSnapshot {
            uptime_seconds: self.uptime_seconds(),
            commands_total: self.commands_total.load(Ordering::Relaxed),
            commands_failed: self.commands_failed.load(Ordering::Relaxed),
            signals_dispatched: self.signals_dispatched.load(Ordering::Relaxed),
            signals_suppressed: self.signals_suppressed.load(Ordering::Relaxed),
            auth_attempts: self.auth_attempts.load(Ordering::Relaxed),
            auth_failures: self.auth_failures.load(Ordering::Relaxed),
            exchange_latency_p50_us: hist.as_ref().map(|h| h.percentile(50)).unwrap_or(0),
            exchange_latency_p95_us: hist.as_ref().map(|h| h.percentile(95)).unwrap_or(0),
            exchange_latency_p99_us: hist.as_ref().map(|h| h.percentile(99)).unwrap_or(0),
        }
    }
}

impl Default for ControlMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the session metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub uptime_seconds: u64,

    pub commands_total: u64,
    pub commands_failed: u64,

    pub signals_dispatched: u64,
    pub signals_suppressed: u64,

    pub auth_attempts: u64,
    pub auth_failures: u64,

    pub exchange_latency_p50_us: u64,
    pub exchange_latency_p95_us: u64,
    pub exchange_latency_p99_us: u64,
}

impl MetricsSnapshot {
    /// Format as Prometheus text exposition format
    pub fn to_prometheus(&self) -> String {
        let mut lines = Vec::new();

        lines.push("# HELP torctl_uptime_seconds Session uptime in seconds".to_string());
        lines.push("# TYPE torctl_uptime_seconds gauge".to_string());
        lines.push(format!("torctl_uptime_seconds {}", self.uptime_seconds));

        lines.push("# HELP torctl_commands_total Control commands sent".to_string());
        lines.push("# TYPE torctl_commands_total counter".to_string());
        lines.push(format!(
            "torctl_commands_total{{status=\"success\"}} {}",
            self.commands_total.saturating_sub(self.commands_failed)
        ));
        lines.push(format!(
            "torctl_commands_total{{status=\"failed\"}} {}",
            self.commands_failed
        ));

        lines.push("# HELP torctl_signals_total Signals requested".to_string());
        lines.push("# TYPE torctl_signals_total counter".to_string());
        lines.push(format!(
            "torctl_signals_total{{outcome=\"dispatched\"}} {}",
            self.signals_dispatched
        ));
        lines.push(format!(
            "torctl_signals_total{{outcome=\"suppressed\"}} {}",
            self.signals_suppressed
        ));

        lines.push("# HELP torctl_auth_attempts_total Authentication attempts".to_string());
        lines.push("# TYPE torctl_auth_attempts_total counter".to_string());
        lines.push(format!(
            "torctl_auth_attempts_total{{status=\"success\"}} {}",
            self.auth_attempts.saturating_sub(self.auth_failures)
        ));
        lines.push(format!(
            "torctl_auth_attempts_total{{status=\"failed\"}} {}",
            self.auth_failures
        ));

        lines.push(
            "# HELP torctl_exchange_latency_us Command round-trip latency in microseconds"
                .to_string(),
        );
        lines.push("# TYPE torctl_exchange_latency_us summary".to_string());
        lines.push(format!(
            "torctl_exchange_latency_us{{quantile=\"0.5\"}} {}",
            self.exchange_latency_p50_us
        ));
        lines.push(format!(
            "torctl_exchange_latency_us{{quantile=\"0.95\"}} {}",
            self.exchange_latency_p95_us
        ));
        lines.push(format!(
            "torctl_exchange_latency_us{{quantile=\"0.99\"}} {}",
            self.exchange_latency_p99_us
        ));

        lines.join("\n")
    }
}

/// Bounded latency sample window
struct LatencyHistogram {
    values: Vec<u64>,
    max_size: usize,
}

impl LatencyHistogram {
    fn new() -> Self {
        Self {
            values: Vec::with_capacity(256),
            max_size: 4096,
        }
    }

    fn record(&mut self, value: u64) {
        if self.values.len() >= self.max_size {
            self.values.remove(0);
        }
        self.values.push(value);
    }

    fn percentile(&self, p: u8) -> u64 {
        if self.values.is_empty() {
            return 0;
        }

        let mut sorted = self.values.clone();
        sorted.sort_unstable();

        let idx = ((p as f64 / 100.0) * (sorted.len() - 1) as f64).round() as usize;
        sorted[idx.min(sorted.len() - 1)]
    }
}
