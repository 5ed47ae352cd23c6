//! Request/response types for the commission HTTP API.

use crate::models::{CommissionDetail, CommissionSettings};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommissionRequest {
    pub professional_id: Uuid,
    #[validate(length(min = 1))]
    pub professional_name: String,
    #[validate(length(min = 1))]
    pub reference_type: String,
    pub reference_id: Uuid,
    pub base_amount: Decimal,
    pub rate: Option<Decimal>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DisputeCommissionRequest {
    #[validate(length(min = 1))]
    pub note: String,
}

#[derive(Debug, Deserialize)]
pub struct RecalculateCommissionRequest {
    pub base_amount: Decimal,
    pub rate: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct ListCommissionsQuery {
    pub professional_id: Option<Uuid>,
    pub status: Option<String>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub page_size: Option<i32>,
    pub page_token: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub professional_id: Uuid,
    /// Any date inside the month to summarize; omit for all-time.
    pub period_month: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct UpsertSettingsRequest {
    pub default_rate: Decimal,
    pub auto_calculate: bool,
    pub auto_approve: bool,
    pub payment_period: String,
    pub payment_day: i16,
    pub notify_on_approval: bool,
    pub notify_on_payment: bool,
}

#[derive(Debug, Serialize)]
pub struct CommissionResponse {
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

impl From<CommissionDetail> for CommissionResponse {
    fn from(d: CommissionDetail) -> Self {
        Self {
            commission_id: d.commission_id,
            clinic_id: d.clinic_id,
            professional_id: d.professional_id,
            professional_name: d.professional_name,
            reference_type: d.reference_type,
            reference_id: d.reference_id,
            base_amount: d.base_amount,
            rate: d.rate,
            commission_amount: d.commission_amount,
            status: d.status,
            period_start: d.period_start,
            period_end: d.period_end,
            notes: d.notes,
            created_utc: d.created_utc,
            approved_utc: d.approved_utc,
            paid_utc: d.paid_utc,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListCommissionsResponse {
    pub commissions: Vec<CommissionResponse>,
    pub next_page_token: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
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

impl From<CommissionSettings> for SettingsResponse {
    fn from(s: CommissionSettings) -> Self {
        Self {
            clinic_id: s.clinic_id,
            default_rate: s.default_rate,
            auto_calculate: s.auto_calculate,
            auto_approve: s.auto_approve,
            payment_period: s.payment_period,
            payment_day: s.payment_day,
            notify_on_approval: s.notify_on_approval,
            notify_on_payment: s.notify_on_payment,
            updated_utc: s.updated_utc,
        }
    }
}
