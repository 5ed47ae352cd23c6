//! Metrics module for commission-service.
//! Provides Prometheus metrics for commission accrual and payout tracking.

use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, opts, register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec,
    IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;

/// Database query duration histogram
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!(
            "commission_db_query_duration_seconds",
            "Database query duration"
        ),
        &["operation"]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// Commission operations counter (per-clinic metering)
pub static COMMISSION_OPERATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Accrued amount counter by clinic and status (monetary tracking)
pub static COMMISSION_AMOUNT_TOTAL: OnceLock<prometheus::CounterVec> = OnceLock::new();

/// Error counter for alerting
pub static ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Call once at startup.
pub fn init_metrics() {
    COMMISSION_OPERATIONS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "commission_operations_total",
                "Total commission operations by clinic and operation type"
            ),
            &["clinic_id", "operation"]
        )
        .expect("Failed to register COMMISSION_OPERATIONS_TOTAL")
    });

    COMMISSION_AMOUNT_TOTAL.get_or_init(|| {
        prometheus::register_counter_vec!(
            prometheus::opts!(
                "commission_amount_total",
                "Total commission amount by clinic and operation"
            ),
            &["clinic_id", "operation"]
        )
        .expect("Failed to register COMMISSION_AMOUNT_TOTAL")
    });

    ERRORS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "commission_errors_total",
                "Total errors by type for alerting"
            ),
            &["error_type", "operation"]
        )
        .expect("Failed to register ERRORS_TOTAL")
    });

    // Force initialization of lazy statics
    let _ = &*DB_QUERY_DURATION;
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");
    String::from_utf8(buffer).expect("Failed to convert metrics to string")
}

/// Record a commission operation.
pub fn record_commission_operation(clinic_id: &str, operation: &str) {
    if let Some(counter) = COMMISSION_OPERATIONS_TOTAL.get() {
        counter.with_label_values(&[clinic_id, operation]).inc();
    }
}

/// Record an accrued or settled amount for financial tracking.
pub fn record_commission_amount(clinic_id: &str, operation: &str, amount: f64) {
    if let Some(counter) = COMMISSION_AMOUNT_TOTAL.get() {
        counter
            .with_label_values(&[clinic_id, operation])
            .inc_by(amount.abs());
    }
}

/// Record an error for alerting.
pub fn record_error(error_type: &str, operation: &str) {
    if let Some(counter) = ERRORS_TOTAL.get() {
        counter.with_label_values(&[error_type, operation]).inc();
    }
}
