//! Services module for billing-service.

pub mod database;
pub mod metrics;

pub use database::Database;
pub use metrics::{
    get_metrics, init_metrics, record_error, record_invoice_amount, record_invoice_operation,
    record_payment_amount, record_payment_operation,
};
