//! Request/response types for the billing HTTP API.
//!
//! Monetary values cross the wire as decimal strings.

use crate::domain::{BillingStats, ReconciledInvoice};
use crate::models::{Invoice, Payment};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    pub branch_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub receipt_number: Option<String>,
    pub receipt_type: Option<String>,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
    #[validate(length(min = 3, max = 3))]
    pub currency: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordPaymentRequest {
    pub amount: Decimal,
    #[validate(length(min = 1))]
    pub method: String,
    pub reference: Option<String>,
    pub payment_date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListInvoicesQuery {
    pub status: Option<String>,
    pub patient_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub page_size: Option<i32>,
    pub page_token: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct BillingStatsQuery {
    pub as_of: Option<DateTime<Utc>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// When set, an empty snapshot is reported as an error instead of
    /// all-zero stats.
    pub require_activity: Option<bool>,
}

/// Invoice together with its derived figures.
#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub invoice_id: Uuid,
    pub clinic_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub invoice_number: String,
    pub receipt_number: Option<String>,
    pub receipt_type: Option<String>,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
    pub currency: String,
    pub status: String,
    pub paid_amount: Decimal,
    pub amount_due: Decimal,
    pub balance: Decimal,
    pub notes: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub cancelled_utc: Option<DateTime<Utc>>,
}

impl InvoiceResponse {
    pub fn from_reconciled(invoice: Invoice, reconciled: &ReconciledInvoice) -> Self {
        Self {
            invoice_id: invoice.invoice_id,
            clinic_id: invoice.clinic_id,
            branch_id: invoice.branch_id,
            patient_id: invoice.patient_id,
            invoice_number: invoice.invoice_number,
            receipt_number: invoice.receipt_number,
            receipt_type: invoice.receipt_type,
            issue_date: invoice.issue_date,
            due_date: invoice.due_date,
            subtotal: invoice.subtotal,
            tax_amount: invoice.tax_amount,
            discount_amount: invoice.discount_amount,
            total: invoice.total,
            currency: invoice.currency,
            status: reconciled.status.as_str().to_string(),
            paid_amount: reconciled.paid_amount,
            amount_due: reconciled.amount_due(),
            balance: reconciled.balance,
            notes: invoice.notes,
            created_utc: invoice.created_utc,
            cancelled_utc: invoice.cancelled_utc,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub payment_id: Uuid,
    pub invoice_id: Uuid,
    pub amount: Decimal,
    pub method: String,
    pub reference: Option<String>,
    pub payment_date: NaiveDate,
    pub notes: Option<String>,
    pub created_utc: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(p: Payment) -> Self {
        Self {
            payment_id: p.payment_id,
            invoice_id: p.invoice_id,
            amount: p.amount,
            method: p.method,
            reference: p.reference,
            payment_date: p.payment_date,
            notes: p.notes,
            created_utc: p.created_utc,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecordPaymentResponse {
    pub payment: PaymentResponse,
    pub invoice: InvoiceResponse,
}

#[derive(Debug, Serialize)]
pub struct ListInvoicesResponse {
    pub invoices: Vec<InvoiceResponse>,
    pub next_page_token: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ListPaymentsResponse {
    pub payments: Vec<PaymentResponse>,
}

#[derive(Debug, Serialize)]
pub struct BillingStatsResponse {
    pub as_of: DateTime<Utc>,
    #[serde(flatten)]
    pub stats: BillingStats,
}
