//! Commission accrual model for commission-service.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Commission status.
///
/// `paid` and `cancelled` are terminal; everything else can still move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
    Pending,
    Approved,
    Paid,
    Cancelled,
    Disputed,
}

impl CommissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommissionStatus::Pending => "pending",
            CommissionStatus::Approved => "approved",
            CommissionStatus::Paid => "paid",
            CommissionStatus::Cancelled => "cancelled",
            CommissionStatus::Disputed => "disputed",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "approved" => CommissionStatus::Approved,
            "paid" => CommissionStatus::Paid,
            "cancelled" => CommissionStatus::Cancelled,
            "disputed" => CommissionStatus::Disputed,
            _ => CommissionStatus::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CommissionStatus::Paid | CommissionStatus::Cancelled)
    }
}

impl fmt::Display for CommissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of revenue event a commission accrues from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    Session,
    Sale,
    InvoiceLine,
}

impl ReferenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceType::Session => "session",
            ReferenceType::Sale => "sale",
            ReferenceType::InvoiceLine => "invoice_line",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "sale" => ReferenceType::Sale,
            "invoice_line" => ReferenceType::InvoiceLine,
            _ => ReferenceType::Session,
        }
    }
}

/// One commission accrual tied to a reference transaction.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CommissionDetail {
    pub commission_id: Uuid,
    pub clinic_id: Uuid,
    pub professional_id: Uuid,
    pub professional_name: String,
    pub reference_type: String,
    pub reference_id: Uuid,
    pub base_amount: Decimal,
    pub rate: Decimal,
    pub commission_amount: Decimal,
    pub status: String,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub approved_utc: Option<DateTime<Utc>>,
    pub paid_utc: Option<DateTime<Utc>>,
}

impl CommissionDetail {
    pub fn status(&self) -> CommissionStatus {
        CommissionStatus::from_string(&self.status)
    }
}

/// Input for accruing a commission.
#[derive(Debug, Clone)]
pub struct CreateCommission {
    pub clinic_id: Uuid,
    pub professional_id: Uuid,
    pub professional_name: String,
    pub reference_type: ReferenceType,
    pub reference_id: Uuid,
    pub base_amount: Decimal,
    /// Explicit rate; falls back to the clinic's default when absent.
    pub rate: Option<Decimal>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Filter parameters for listing commissions.
#[derive(Debug, Clone, Default)]
pub struct ListCommissionsFilter {
    pub professional_id: Option<Uuid>,
    pub status: Option<CommissionStatus>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub page_size: i32,
    pub page_token: Option<Uuid>,
}
