//! Test helper module for billing-service tests.
//!
//! Provides fixture builders for invoices and payments.

#![allow(dead_code)]

use billing_service::models::{Invoice, Payment};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

pub const TEST_CLINIC_ID: &str = "11111111-1111-1111-1111-111111111111";
pub const TEST_PATIENT_ID: &str = "22222222-2222-2222-2222-222222222222";

pub fn clinic_id() -> Uuid {
    Uuid::parse_str(TEST_CLINIC_ID).unwrap()
}

pub fn patient_id() -> Uuid {
    Uuid::parse_str(TEST_PATIENT_ID).unwrap()
}

/// Fixed reference instant for deterministic month/overdue boundaries.
pub fn as_of() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 15, 12, 0, 0).unwrap()
}

pub fn today() -> NaiveDate {
    as_of().date_naive()
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Build an invoice with the given total, issued on `issue_date`.
pub fn invoice(total: Decimal, issue_date: NaiveDate, due_date: Option<NaiveDate>) -> Invoice {
    Invoice {
        invoice_id: Uuid::new_v4(),
        clinic_id: clinic_id(),
        branch_id: None,
        patient_id: Some(patient_id()),
        invoice_number: format!("FAC-2026-{:06}", 1),
        receipt_number: None,
        receipt_type: None,
        issue_date,
        due_date,
        subtotal: total,
        tax_amount: Decimal::ZERO,
        discount_amount: Decimal::ZERO,
        total,
        currency: "USD".to_string(),
        status: "pending".to_string(),
        notes: None,
        created_utc: as_of(),
        cancelled_utc: None,
    }
}

/// Build a payment of `amount` against `invoice`.
pub fn payment(invoice: &Invoice, amount: Decimal) -> Payment {
    Payment {
        payment_id: Uuid::new_v4(),
        invoice_id: invoice.invoice_id,
        clinic_id: invoice.clinic_id,
        amount,
        method: "cash".to_string(),
        reference: None,
        payment_date: today(),
        notes: None,
        created_utc: as_of(),
    }
}
