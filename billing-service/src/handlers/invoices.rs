//! Invoice handlers.
//!
//! Every read passes the stored rows through reconciliation before they
//! leave the service; the stored status column is never returned as-is.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use clinic_core::error::AppError;
use rust_decimal::prelude::ToPrimitive;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::domain;
use crate::dtos::{
    CreateInvoiceRequest, InvoiceResponse, ListInvoicesQuery, ListInvoicesResponse,
};
use crate::middleware::ClinicContext;
use crate::models::{CreateInvoice, InvoiceStatus, ListInvoicesFilter, Payment};
use crate::services::{record_invoice_amount, record_invoice_operation};
use crate::startup::AppState;

/// Create a new invoice for the clinic.
pub async fn create_invoice(
    State(state): State<AppState>,
    clinic: ClinicContext,
    Json(payload): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<InvoiceResponse>), AppError> {
    payload.validate()?;

    let input = CreateInvoice {
        clinic_id: clinic.clinic_id,
        branch_id: payload.branch_id,
        patient_id: payload.patient_id,
        receipt_number: payload.receipt_number,
        receipt_type: payload.receipt_type,
        issue_date: payload.issue_date,
        due_date: payload.due_date,
        subtotal: payload.subtotal,
        tax_amount: payload.tax_amount,
        discount_amount: payload.discount_amount,
        total: payload.total,
        currency: payload.currency,
        notes: payload.notes,
    };

    let invoice = state.db.create_invoice(&input).await?;

    record_invoice_operation(&clinic.clinic_id.to_string(), "create");
    record_invoice_amount(
        &clinic.clinic_id.to_string(),
        &invoice.currency,
        invoice.total.to_f64().unwrap_or(0.0),
    );

    tracing::info!(
        invoice_id = %invoice.invoice_id,
        clinic_id = %clinic.clinic_id,
        "Invoice created"
    );

    let reconciled = domain::reconcile(&invoice, &[], Utc::now().date_naive())?;
    Ok((
        StatusCode::CREATED,
        Json(InvoiceResponse::from_reconciled(invoice, &reconciled)),
    ))
}

/// Get one invoice with its derived paid/due/status figures.
pub async fn get_invoice(
    State(state): State<AppState>,
    clinic: ClinicContext,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let invoice = state
        .db
        .get_invoice(clinic.clinic_id, invoice_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

    let payments = state.db.list_payments(clinic.clinic_id, invoice_id).await?;
    let reconciled = domain::reconcile(&invoice, &payments, Utc::now().date_naive())?;

    Ok(Json(InvoiceResponse::from_reconciled(invoice, &reconciled)))
}

/// List invoices for the clinic, reconciled.
pub async fn list_invoices(
    State(state): State<AppState>,
    clinic: ClinicContext,
    Query(query): Query<ListInvoicesQuery>,
) -> Result<Json<ListInvoicesResponse>, AppError> {
    let filter = ListInvoicesFilter {
        status: query.status.as_deref().map(InvoiceStatus::from_string),
        patient_id: query.patient_id,
        start_date: query.start_date,
        end_date: query.end_date,
        page_size: query.page_size.unwrap_or(50),
        page_token: query.page_token,
    };

    let invoices = state.db.list_invoices(clinic.clinic_id, &filter).await?;
    let invoice_ids: Vec<Uuid> = invoices.iter().map(|i| i.invoice_id).collect();
    let payments = state
        .db
        .list_payments_for_stats(clinic.clinic_id, &invoice_ids)
        .await?;

    let mut by_invoice: HashMap<Uuid, Vec<Payment>> = HashMap::new();
    for payment in payments {
        by_invoice
            .entry(payment.invoice_id)
            .or_default()
            .push(payment);
    }

    let today = Utc::now().date_naive();
    let next_page_token = invoices.last().map(|i| i.invoice_id);
    let mut responses = Vec::with_capacity(invoices.len());
    for invoice in invoices {
        let empty = Vec::new();
        let invoice_payments = by_invoice.get(&invoice.invoice_id).unwrap_or(&empty);
        let reconciled = domain::reconcile(&invoice, invoice_payments, today)?;
        responses.push(InvoiceResponse::from_reconciled(invoice, &reconciled));
    }

    Ok(Json(ListInvoicesResponse {
        invoices: responses,
        next_page_token,
    }))
}

/// Cancel an invoice.
pub async fn cancel_invoice(
    State(state): State<AppState>,
    clinic: ClinicContext,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let invoice = state.db.cancel_invoice(clinic.clinic_id, invoice_id).await?;

    record_invoice_operation(&clinic.clinic_id.to_string(), "cancel");
    tracing::info!(
        invoice_id = %invoice_id,
        clinic_id = %clinic.clinic_id,
        "Invoice cancelled"
    );

    let payments = state.db.list_payments(clinic.clinic_id, invoice_id).await?;
    let reconciled = domain::reconcile(&invoice, &payments, Utc::now().date_naive())?;

    Ok(Json(InvoiceResponse::from_reconciled(invoice, &reconciled)))
}
