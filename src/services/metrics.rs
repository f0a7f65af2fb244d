//! Prometheus metrics for the reconciliation core.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_histogram, Counter, CounterVec, Encoder,
    Histogram, TextEncoder,
};

/// Counter for reconciliation runs by outcome.
pub static RECONCILIATION_RUNS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "recon_runs_total",
        "Total number of reconciliation runs",
        &["status"]
    )
    .expect("Failed to register RECONCILIATION_RUNS")
});

/// Histogram for run duration.
pub static RUN_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "recon_run_duration_seconds",
        "Reconciliation run duration in seconds",
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("Failed to register RUN_DURATION")
});

/// Counter for generated candidate pairs.
pub static CANDIDATE_PAIRS: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "recon_candidate_pairs_total",
        "Total number of candidate pairs generated"
    )
    .expect("Failed to register CANDIDATE_PAIRS")
});

/// Counter for committed assignments by tier.
pub static MATCH_TIERS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "recon_assignments_total",
        "Total number of committed assignments",
        &["tier"]
    )
    .expect("Failed to register MATCH_TIERS")
});

/// Counter for records rejected by the normalizer.
pub static UNPROCESSABLE_RECORDS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "recon_unprocessable_records_total",
        "Total number of records rejected during normalization",
        &["kind"]
    )
    .expect("Failed to register UNPROCESSABLE_RECORDS")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&RECONCILIATION_RUNS);
    Lazy::force(&RUN_DURATION);
    Lazy::force(&CANDIDATE_PAIRS);
    Lazy::force(&MATCH_TIERS);
    Lazy::force(&UNPROCESSABLE_RECORDS);
}

/// Get all metrics as Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Record a finished run.
pub fn record_run(status: &str) {
    RECONCILIATION_RUNS.with_label_values(&[status]).inc();
}

/// Record run duration.
pub fn record_run_duration(duration_secs: f64) {
    RUN_DURATION.observe(duration_secs);
}

/// Record generated candidate pairs.
pub fn record_candidates(count: usize) {
    CANDIDATE_PAIRS.inc_by(count as f64);
}

/// Record a committed assignment.
pub fn record_assignment(tier: &str) {
    MATCH_TIERS.with_label_values(&[tier]).inc();
}

/// Record a record rejected by the normalizer.
pub fn record_unprocessable(kind: &str) {
    UNPROCESSABLE_RECORDS.with_label_values(&[kind]).inc();
}
