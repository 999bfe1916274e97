//! Per-source health metrics
//!
//! Every aggregation source fetch is recorded with its latency and outcome in a
//! rolling window, from which latency percentiles and success rates are derived.

use crate::types::SourceKind;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::RwLock;

/// Maximum number of samples to keep per source
const MAX_SAMPLES: usize = 100;

/// Metrics for a single source
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMetrics {
    pub source: SourceKind,
    /// 50th percentile latency of successful fetches in milliseconds
    pub latency_p50_ms: f64,
    /// 99th percentile latency of successful fetches in milliseconds
    pub latency_p99_ms: f64,
    /// Success rate (0.0 to 1.0) over the lifetime of the collector
    pub success_rate: f64,
    pub total_requests: u64,
    pub failed_requests: u64,
}

impl SourceMetrics {
    /// Metrics with no data
    pub fn empty(source: SourceKind) -> Self {
        Self {
            source,
            latency_p50_ms: 0.0,
            latency_p99_ms: 0.0,
            success_rate: 1.0,
            total_requests: 0,
            failed_requests: 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct LatencySample {
    duration_ms: f64,
    success: bool,
}

#[derive(Debug, Default)]
struct SourceStats {
    samples: VecDeque<LatencySample>,
    total: u64,
    failed: u64,
}

/// Collects fetch samples for every source
#[derive(Debug, Default)]
pub struct MetricsCollector {
    stats: RwLock<HashMap<SourceKind, SourceStats>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one fetch of `source`
    pub async fn record(&self, source: SourceKind, duration: Duration, success: bool) {
        let mut stats = self.stats.write().await;
        let entry = stats.entry(source).or_default();

        entry.total += 1;
        if !success {
            entry.failed += 1;
        }

        if entry.samples.len() >= MAX_SAMPLES {
            entry.samples.pop_front();
        }
        entry.samples.push_back(LatencySample {
            duration_ms: duration.as_secs_f64() * 1000.0,
            success,
        });
    }

    /// Current metrics of one source
    pub async fn source_metrics(&self, source: SourceKind) -> SourceMetrics {
        let stats = self.stats.read().await;
        let Some(entry) = stats.get(&source) else {
            return SourceMetrics::empty(source);
        };

        let mut latencies: Vec<f64> = entry
            .samples
            .iter()
            .filter(|s| s.success)
            .map(|s| s.duration_ms)
            .collect();
        latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let success_rate = if entry.total > 0 {
            (entry.total - entry.failed) as f64 / entry.total as f64
        } else {
            1.0
        };

        SourceMetrics {
            source,
            latency_p50_ms: percentile(&latencies, 50.0),
            latency_p99_ms: percentile(&latencies, 99.0),
            success_rate,
            total_requests: entry.total,
            failed_requests: entry.failed,
        }
    }

    /// Metrics of every source, in merge order
    pub async fn all(&self) -> Vec<SourceMetrics> {
        let mut out = Vec::with_capacity(SourceKind::all().len());
        for source in SourceKind::all() {
            out.push(self.source_metrics(*source).await);
        }
        out
    }
}

/// Calculate percentile from sorted values
fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }

    let idx = (p / 100.0 * (sorted_values.len() - 1) as f64).round() as usize;
    sorted_values[idx.min(sorted_values.len() - 1)]
}
