//! Domain models for commission-service.

mod detail;
mod settings;

pub use detail::{
    CommissionDetail, CommissionStatus, CreateCommission, ListCommissionsFilter, ReferenceType,
};
pub use settings::{CommissionSettings, PaymentPeriod, UpsertCommissionSettings};
