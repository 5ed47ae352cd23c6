//! Per-clinic commission settings.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Payout cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentPeriod {
    Weekly,
    Biweekly,
    Monthly,
}

impl PaymentPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentPeriod::Weekly => "weekly",
            PaymentPeriod::Biweekly => "biweekly",
            PaymentPeriod::Monthly => "monthly",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "weekly" => PaymentPeriod::Weekly,
            "biweekly" => PaymentPeriod::Biweekly,
            _ => PaymentPeriod::Monthly,
        }
    }
}

/// Commission configuration, one row per clinic.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CommissionSettings {
    pub clinic_id: Uuid,
    pub default_rate: Decimal,
    pub auto_calculate: bool,
    pub auto_approve: bool,
    pub payment_period: String,
    pub payment_day: i16,
    pub notify_on_approval: bool,
    pub notify_on_payment: bool,
    pub updated_utc: DateTime<Utc>,
}

impl CommissionSettings {
    /// Settings used for clinics that have never saved any: a 10%
    /// default rate, monthly payout on the 1st, no auto-approval.
    pub fn default_for(clinic_id: Uuid) -> Self {
        Self {
            clinic_id,
            default_rate: Decimal::new(10, 2),
            auto_calculate: true,
            auto_approve: false,
            payment_period: PaymentPeriod::Monthly.as_str().to_string(),
            payment_day: 1,
            notify_on_approval: true,
            notify_on_payment: true,
            updated_utc: Utc::now(),
        }
    }
}

/// Input for creating or replacing a clinic's settings.
#[derive(Debug, Clone)]
pub struct UpsertCommissionSettings {
    pub clinic_id: Uuid,
    pub default_rate: Decimal,
    pub auto_calculate: bool,
    pub auto_approve: bool,
    pub payment_period: PaymentPeriod,
    pub payment_day: i16,
    pub notify_on_approval: bool,
    pub notify_on_payment: bool,
}
