//! Pure commission computations.
//!
//! The accrual math and the status state machine live here, free of
//! database and clock access; callers pass rows and explicit instants.

mod engine;
mod summary;

pub use engine::{
    accrue, approve, cancel, dispute, mark_paid, recalculate, reopen, round_currency,
};
pub use summary::{summarize, CommissionSummary};

use crate::models::CommissionStatus;
use clinic_core::error::AppError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Failures of the pure commission computations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Base amount outside the accepted range.
    #[error("invalid base amount {0}: must be non-negative")]
    InvalidAmount(Decimal),

    /// Commission rate outside `[0, 1]`.
    #[error("invalid commission rate {0}: must be a fraction between 0 and 1")]
    InvalidRate(Decimal),

    /// Illegal state-machine move.
    #[error("illegal commission transition from {from} to {to}")]
    InvalidTransition {
        from: CommissionStatus,
        to: CommissionStatus,
    },

    /// The commission amount can no longer be recomputed.
    #[error("commission amount is frozen in status {0}")]
    AmountFrozen(CommissionStatus),
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidAmount(_) | DomainError::InvalidRate(_) => {
                AppError::BadRequest(anyhow::Error::new(err))
            }
            DomainError::InvalidTransition { .. } | DomainError::AmountFrozen(_) => {
                AppError::Conflict(anyhow::Error::new(err))
            }
        }
    }
}
