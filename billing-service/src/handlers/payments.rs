//! Payment handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use clinic_core::error::AppError;
use rust_decimal::prelude::ToPrimitive;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::{
    InvoiceResponse, ListPaymentsResponse, PaymentResponse, RecordPaymentRequest,
    RecordPaymentResponse,
};
use crate::middleware::ClinicContext;
use crate::models::{CreatePayment, PaymentMethod};
use crate::services::{record_payment_amount, record_payment_operation};
use crate::startup::AppState;

/// Record a payment against an invoice.
///
/// Overpayment is accepted and reported back as a negative balance; it
/// signals a refund-owed condition, not an error.
pub async fn record_payment(
    State(state): State<AppState>,
    clinic: ClinicContext,
    Path(invoice_id): Path<Uuid>,
    Json(payload): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<RecordPaymentResponse>), AppError> {
    payload.validate()?;

    let input = CreatePayment {
        clinic_id: clinic.clinic_id,
        invoice_id,
        amount: payload.amount,
        method: PaymentMethod::from_string(&payload.method),
        reference: payload.reference,
        payment_date: payload.payment_date,
        notes: payload.notes,
    };

    let (payment, invoice, reconciled) = state
        .db
        .record_payment(&input, Utc::now().date_naive())
        .await?;

    record_payment_operation(&clinic.clinic_id.to_string(), "record");
    record_payment_amount(
        &clinic.clinic_id.to_string(),
        &invoice.currency,
        &payment.method,
        payment.amount.to_f64().unwrap_or(0.0),
    );

    tracing::info!(
        payment_id = %payment.payment_id,
        invoice_id = %invoice_id,
        clinic_id = %clinic.clinic_id,
        amount = %payment.amount,
        "Payment recorded"
    );

    Ok((
        StatusCode::CREATED,
        Json(RecordPaymentResponse {
            payment: PaymentResponse::from(payment),
            invoice: InvoiceResponse::from_reconciled(invoice, &reconciled),
        }),
    ))
}

/// List the payments recorded against an invoice.
pub async fn list_payments(
    State(state): State<AppState>,
    clinic: ClinicContext,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<ListPaymentsResponse>, AppError> {
    // Listing against a missing invoice is a 404, not an empty list.
    state
        .db
        .get_invoice(clinic.clinic_id, invoice_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

    let payments = state.db.list_payments(clinic.clinic_id, invoice_id).await?;

    Ok(Json(ListPaymentsResponse {
        payments: payments.into_iter().map(PaymentResponse::from).collect(),
    }))
}
