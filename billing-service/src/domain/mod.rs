//! Pure billing computations.
//!
//! Nothing in this module touches the database or the clock: callers
//! materialize the rows and pass an explicit "as of" instant, and every
//! function returns plain derived data.

mod reconcile;
mod stats;

pub use reconcile::{reconcile, ReconciledInvoice};
pub use stats::{aggregate, aggregate_strict, BillingStats};

use clinic_core::error::AppError;
use thiserror::Error;
use uuid::Uuid;

/// Failures of the pure billing computations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Two source payments share an identifier.
    #[error("duplicate payment {payment_id} for invoice {invoice_id}")]
    DuplicatePayment { payment_id: Uuid, invoice_id: Uuid },

    /// A payment references a different invoice than the one being
    /// reconciled.
    #[error("payment {payment_id} does not belong to invoice {invoice_id}")]
    ForeignPayment { payment_id: Uuid, invoice_id: Uuid },

    /// The caller required a non-empty snapshot.
    #[error("no invoices in dataset")]
    EmptyDataset,
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::DuplicatePayment { .. } | DomainError::ForeignPayment { .. } => {
                AppError::Conflict(anyhow::Error::new(err))
            }
            DomainError::EmptyDataset => AppError::NotFound(anyhow::Error::new(err)),
        }
    }
}
