//! Commission summary handler.

use axum::{
    extract::{Query, State},
    Json,
};
use clinic_core::error::AppError;

use crate::domain::{summarize, CommissionSummary};
use crate::dtos::SummaryQuery;
use crate::middleware::ClinicContext;
use crate::startup::AppState;

/// Summarize one professional's commissions, optionally scoped to a
/// calendar month.
pub async fn commission_summary(
    State(state): State<AppState>,
    clinic: ClinicContext,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<CommissionSummary>, AppError> {
    let details = state
        .db
        .list_commissions_for_summary(clinic.clinic_id, query.professional_id)
        .await?;

    let summary = summarize(&details, query.professional_id, query.period_month);

    tracing::debug!(
        clinic_id = %clinic.clinic_id,
        professional_id = %query.professional_id,
        total = %summary.total_amount,
        "Commission summary computed"
    );

    Ok(Json(summary))
}
