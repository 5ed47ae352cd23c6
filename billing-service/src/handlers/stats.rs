//! Billing statistics handler.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use clinic_core::error::AppError;
use uuid::Uuid;

use crate::domain;
use crate::dtos::{BillingStatsQuery, BillingStatsResponse};
use crate::middleware::ClinicContext;
use crate::startup::AppState;

/// Compute clinic-wide billing statistics over a snapshot.
pub async fn billing_stats(
    State(state): State<AppState>,
    clinic: ClinicContext,
    Query(query): Query<BillingStatsQuery>,
) -> Result<Json<BillingStatsResponse>, AppError> {
    let as_of = query.as_of.unwrap_or_else(Utc::now);

    let invoices = state
        .db
        .list_invoices_for_stats(clinic.clinic_id, query.start_date, query.end_date)
        .await?;
    let invoice_ids: Vec<Uuid> = invoices.iter().map(|i| i.invoice_id).collect();
    let payments = state
        .db
        .list_payments_for_stats(clinic.clinic_id, &invoice_ids)
        .await?;

    let stats = if query.require_activity.unwrap_or(false) {
        domain::aggregate_strict(&invoices, &payments, as_of)?
    } else {
        domain::aggregate(&invoices, &payments, as_of)?
    };

    tracing::debug!(
        clinic_id = %clinic.clinic_id,
        total_invoiced = %stats.total_invoiced,
        "Billing stats computed"
    );

    Ok(Json(BillingStatsResponse { as_of, stats }))
}
