//! Services module for commission-service.

pub mod database;
pub mod metrics;

pub use database::Database;
pub use metrics::{
    get_metrics, init_metrics, record_commission_amount, record_commission_operation, record_error,
};
