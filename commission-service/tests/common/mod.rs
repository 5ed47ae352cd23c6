//! Test helper module for commission-service tests.
//!
//! Provides fixture builders for commission inputs and settings.

#![allow(dead_code)]

use chrono::NaiveDate;
use commission_service::models::{CommissionSettings, CreateCommission, ReferenceType};
use rust_decimal::Decimal;
use uuid::Uuid;

pub const TEST_CLINIC_ID: &str = "11111111-1111-1111-1111-111111111111";
pub const TEST_PROFESSIONAL_ID: &str = "33333333-3333-3333-3333-333333333333";

pub fn clinic_id() -> Uuid {
    Uuid::parse_str(TEST_CLINIC_ID).unwrap()
}

pub fn professional_id() -> Uuid {
    Uuid::parse_str(TEST_PROFESSIONAL_ID).unwrap()
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// February 2026 payout period.
pub fn february_period() -> (Option<NaiveDate>, Option<NaiveDate>) {
    (Some(date(2026, 2, 1)), Some(date(2026, 2, 28)))
}

/// Build an accrual input for the fixture professional.
pub fn accrual_input(base_amount: Decimal, rate: Option<Decimal>) -> CreateCommission {
    let (period_start, period_end) = february_period();
    CreateCommission {
        clinic_id: clinic_id(),
        professional_id: professional_id(),
        professional_name: "Dr. Ada Vargas".to_string(),
        reference_type: ReferenceType::Session,
        reference_id: Uuid::new_v4(),
        base_amount,
        rate,
        period_start,
        period_end,
        notes: None,
    }
}

/// Clinic settings with no auto-approval and a 10% default rate.
pub fn default_settings() -> CommissionSettings {
    CommissionSettings::default_for(clinic_id())
}

/// Clinic settings with auto-approval switched on.
pub fn auto_approve_settings() -> CommissionSettings {
    let mut settings = default_settings();
    settings.auto_approve = true;
    settings
}
