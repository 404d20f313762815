//! Runtime statistics for the risk engine.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Latency samples kept before the oldest half is dropped
const MAX_LATENCY_SAMPLES: usize = 10_000;

/// Metrics collector shared by the orchestrator and the transport
pub struct PipelineMetrics {
    /// Transactions analysed
    pub transactions_analyzed: AtomicU64,
    /// Transactions flagged for review
    pub flagged_for_review: AtomicU64,
    /// Narrative analyses that fell back to the service-unavailable signal
    pub narrative_fallbacks: AtomicU64,
    /// Batches processed
    pub batches_processed: AtomicU64,
    /// Incident reports generated
    pub reports_generated: AtomicU64,
    /// Incident reports that fell back to the failure sentinel
    pub report_failures: AtomicU64,
    /// Requests rejected as invalid
    pub rejected_requests: AtomicU64,
    /// Analysis latencies (in microseconds)
    latencies: RwLock<Vec<u64>>,
    /// Combined score distribution buckets
    score_buckets: RwLock<[u64; 10]>,
    start_time: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            transactions_analyzed: AtomicU64::new(0),
            flagged_for_review: AtomicU64::new(0),
            narrative_fallbacks: AtomicU64::new(0),
            batches_processed: AtomicU64::new(0),
            reports_generated: AtomicU64::new(0),
            report_failures: AtomicU64::new(0),
            rejected_requests: AtomicU64::new(0),
            latencies: RwLock::new(Vec::with_capacity(1000)),
            score_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a completed single-transaction analysis
    pub fn record_analysis(
        &self,
        latency: Duration,
        combined_score: f64,
        needs_review: bool,
        narrative_fallback: bool,
    ) {
        self.transactions_analyzed.fetch_add(1, Ordering::Relaxed);
        if needs_review {
            self.flagged_for_review.fetch_add(1, Ordering::Relaxed);
        }
        if narrative_fallback {
            self.narrative_fallbacks.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut samples) = self.latencies.write() {
            samples.push(latency.as_micros() as u64);
            if samples.len() > MAX_LATENCY_SAMPLES {
                samples.drain(0..MAX_LATENCY_SAMPLES / 2);
            }
        }

        let bucket = (combined_score.clamp(0.0, 1.0) * 10.0).min(9.0) as usize;
        if let Ok(mut buckets) = self.score_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record a completed batch
    pub fn record_batch(&self, report_generated: bool) {
        self.batches_processed.fetch_add(1, Ordering::Relaxed);
        if report_generated {
            self.reports_generated.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record an incident report that could not be generated
    pub fn record_report_failure(&self) {
        self.report_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request rejected before analysis
    pub fn record_rejection(&self) {
        self.rejected_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Latency statistics over the retained samples
    pub fn latency_stats(&self) -> LatencyStats {
        let samples = match self.latencies.read() {
            Ok(samples) => samples.clone(),
            Err(_) => return LatencyStats::default(),
        };
        if samples.is_empty() {
            return LatencyStats::default();
        }

        let mut sorted = samples;
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let percentile = |p: f64| sorted[((count as f64 * p) as usize).min(count - 1)];

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: percentile(0.50),
            p95_us: percentile(0.95),
            p99_us: percentile(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Share of analysed transactions flagged for review, in percent
    pub fn flagged_rate(&self) -> f64 {
        let analyzed = self.transactions_analyzed.load(Ordering::Relaxed);
        if analyzed == 0 {
            return 0.0;
        }
        self.flagged_for_review.load(Ordering::Relaxed) as f64 / analyzed as f64 * 100.0
    }

    /// Transactions per second since start
    pub fn throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.transactions_analyzed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn score_distribution(&self) -> [u64; 10] {
        self.score_buckets.read().map(|b| *b).unwrap_or([0; 10])
    }

    /// Log a summary of the collected statistics
    pub fn print_summary(&self) {
        let latency = self.latency_stats();

        info!(
            analyzed = self.transactions_analyzed.load(Ordering::Relaxed),
            flagged = self.flagged_for_review.load(Ordering::Relaxed),
            flagged_rate = format!("{:.1}%", self.flagged_rate()),
            narrative_fallbacks = self.narrative_fallbacks.load(Ordering::Relaxed),
            batches = self.batches_processed.load(Ordering::Relaxed),
            reports = self.reports_generated.load(Ordering::Relaxed),
            report_failures = self.report_failures.load(Ordering::Relaxed),
            rejected = self.rejected_requests.load(Ordering::Relaxed),
            throughput = format!("{:.2} tx/s", self.throughput()),
            "Risk engine summary"
        );
        info!(
            mean_us = latency.mean_us,
            p50_us = latency.p50_us,
            p95_us = latency.p95_us,
            p99_us = latency.p99_us,
            max_us = latency.max_us,
            "Analysis latency"
        );

        let distribution = self.score_distribution();
        let total: u64 = distribution.iter().sum();
        for (i, &count) in distribution.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let pct = count as f64 / total as f64 * 100.0;
            info!(
                "  {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                "█".repeat(((pct / 5.0) as usize).min(20))
            );
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Analysis latency statistics
#[derive(Debug, Default)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Periodic metrics summary logger
pub struct MetricsReporter {
    metrics: Arc<PipelineMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<PipelineMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs: interval_secs.max(1),
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // First tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
