//! Running counters and latency averages for completed queries.

use relay_core::{IgnoreLock as _, ModelProvider};
use serde::Serialize;
use std::sync::Mutex;
use std::time::Duration;

/// Weight kept from the previous average on each EWMA update.
const EWMA_DECAY: f64 = 0.9;
/// Weight given to the new sample.
const EWMA_WEIGHT: f64 = 0.1;

/// Mutable aggregate behind the tracker. Only successful calls are recorded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryMetrics {
    /// Completed queries on either tier.
    pub total_queries: u64,
    /// Completed local queries.
    pub local_queries: u64,
    /// Completed external queries.
    pub external_queries: u64,
    /// Accumulated usage-derived cost of external calls.
    pub total_cost: f64,
    /// EWMA of local call latency.
    pub avg_local_latency: Duration,
    /// EWMA of external call latency.
    pub avg_external_latency: Duration,
}

impl QueryMetrics {
    fn record(&mut self, provider: ModelProvider, latency: Duration, cost: f64) {
        let (count, average) = match provider {
            ModelProvider::Local => (&mut self.local_queries, &mut self.avg_local_latency),
            ModelProvider::External => (&mut self.external_queries, &mut self.avg_external_latency),
        };

        *average = if *count == 0 {
            latency
        } else {
            average.mul_f64(EWMA_DECAY) + latency.mul_f64(EWMA_WEIGHT)
        };
        *count += 1;
        self.total_queries += 1;

        if provider == ModelProvider::External {
            self.total_cost += cost;
        }
    }

    /// Share of completed queries served locally, 0-100.
    pub fn local_percentage(&self) -> f64 {
        self.local_queries as f64 / self.total_queries.max(1) as f64 * 100.0
    }
}

/// Read-only view of the metrics at one point in time.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Completed queries on either tier.
    pub total_queries: u64,
    /// Completed local queries.
    pub local_queries: u64,
    /// Completed external queries.
    pub external_queries: u64,
    /// Local share, 0-100.
    pub local_pct: f64,
    /// External share, 0-100.
    pub external_pct: f64,
    /// External spend so far (USD).
    pub total_cost: f64,
    /// Spend divided by all completed queries.
    pub avg_cost_per_query: f64,
    /// Local latency EWMA in milliseconds.
    pub avg_local_latency_ms: f64,
    /// External latency EWMA in milliseconds.
    pub avg_external_latency_ms: f64,
    /// Configured local share target.
    pub target_local_pct: f64,
    /// Whether the local share meets the target.
    pub on_target: bool,
}

/// Thread-safe owner of the [`QueryMetrics`] aggregate.
///
/// Every update happens inside one lock region; the lock is never held
/// across an await.
#[derive(Debug, Default)]
pub struct MetricsTracker {
    inner: Mutex<QueryMetrics>,
}

impl MetricsTracker {
    /// Tracker with every counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one successful call. `cost` only counts for external calls.
    pub fn record_success(&self, provider: ModelProvider, latency: Duration, cost: f64) {
        self.inner
            .lock_ignore_poison()
            .record(provider, latency, cost);
    }

    /// Share of completed queries served locally, 0-100.
    pub fn local_percentage(&self) -> f64 {
        self.inner.lock_ignore_poison().local_percentage()
    }

    /// Copy of the raw aggregate.
    pub fn current(&self) -> QueryMetrics {
        self.inner.lock_ignore_poison().clone()
    }

    /// Derived view of the aggregate against `target_local_pct`.
    pub fn snapshot(&self, target_local_pct: f64) -> MetricsSnapshot {
        let metrics = self.current();
        let divisor = metrics.total_queries.max(1) as f64;
        let local_pct = metrics.local_percentage();

        MetricsSnapshot {
            total_queries: metrics.total_queries,
            local_queries: metrics.local_queries,
            external_queries: metrics.external_queries,
            local_pct,
            external_pct: metrics.external_queries as f64 / divisor * 100.0,
            total_cost: metrics.total_cost,
            avg_cost_per_query: metrics.total_cost / divisor,
            avg_local_latency_ms: metrics.avg_local_latency.as_secs_f64() * 1000.0,
            avg_external_latency_ms: metrics.avg_external_latency.as_secs_f64() * 1000.0,
            target_local_pct,
            on_target: local_pct >= target_local_pct,
        }
    }
}
