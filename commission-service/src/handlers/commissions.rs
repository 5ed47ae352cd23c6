//! Commission lifecycle handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use clinic_core::error::AppError;
use rust_decimal::prelude::ToPrimitive;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::{
    CommissionResponse, CreateCommissionRequest, DisputeCommissionRequest, ListCommissionsQuery,
    ListCommissionsResponse, RecalculateCommissionRequest,
};
use crate::middleware::ClinicContext;
use crate::models::{CommissionStatus, CreateCommission, ListCommissionsFilter, ReferenceType};
use crate::services::{record_commission_amount, record_commission_operation};
use crate::startup::AppState;

/// Accrue a commission from a revenue event.
pub async fn create_commission(
    State(state): State<AppState>,
    clinic: ClinicContext,
    Json(payload): Json<CreateCommissionRequest>,
) -> Result<(StatusCode, Json<CommissionResponse>), AppError> {
    payload.validate()?;

    let input = CreateCommission {
        clinic_id: clinic.clinic_id,
        professional_id: payload.professional_id,
        professional_name: payload.professional_name,
        reference_type: ReferenceType::from_string(&payload.reference_type),
        reference_id: payload.reference_id,
        base_amount: payload.base_amount,
        rate: payload.rate,
        period_start: payload.period_start,
        period_end: payload.period_end,
        notes: payload.notes,
    };

    let detail = state.db.create_commission(&input, Utc::now()).await?;

    record_commission_operation(&clinic.clinic_id.to_string(), "accrue");
    record_commission_amount(
        &clinic.clinic_id.to_string(),
        "accrue",
        detail.commission_amount.to_f64().unwrap_or(0.0),
    );

    tracing::info!(
        commission_id = %detail.commission_id,
        clinic_id = %clinic.clinic_id,
        professional_id = %detail.professional_id,
        "Commission accrued"
    );

    Ok((StatusCode::CREATED, Json(CommissionResponse::from(detail))))
}

/// Get one commission.
pub async fn get_commission(
    State(state): State<AppState>,
    clinic: ClinicContext,
    Path(commission_id): Path<Uuid>,
) -> Result<Json<CommissionResponse>, AppError> {
    let detail = state
        .db
        .get_commission(clinic.clinic_id, commission_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Commission not found")))?;

    Ok(Json(CommissionResponse::from(detail)))
}

/// List commissions for the clinic.
pub async fn list_commissions(
    State(state): State<AppState>,
    clinic: ClinicContext,
    Query(query): Query<ListCommissionsQuery>,
) -> Result<Json<ListCommissionsResponse>, AppError> {
    let filter = ListCommissionsFilter {
        professional_id: query.professional_id,
        status: query.status.as_deref().map(CommissionStatus::from_string),
        period_start: query.period_start,
        period_end: query.period_end,
        page_size: query.page_size.unwrap_or(50),
        page_token: query.page_token,
    };

    let details = state.db.list_commissions(clinic.clinic_id, &filter).await?;
    let next_page_token = details.last().map(|d| d.commission_id);

    Ok(Json(ListCommissionsResponse {
        commissions: details.into_iter().map(CommissionResponse::from).collect(),
        next_page_token,
    }))
}

/// Approve a pending or disputed commission.
pub async fn approve_commission(
    State(state): State<AppState>,
    clinic: ClinicContext,
    Path(commission_id): Path<Uuid>,
) -> Result<Json<CommissionResponse>, AppError> {
    let detail = state
        .db
        .approve_commission(clinic.clinic_id, commission_id, Utc::now())
        .await?;

    record_commission_operation(&clinic.clinic_id.to_string(), "approve");
    tracing::info!(commission_id = %commission_id, "Commission approved");

    Ok(Json(CommissionResponse::from(detail)))
}

/// Mark an approved commission as paid.
pub async fn pay_commission(
    State(state): State<AppState>,
    clinic: ClinicContext,
    Path(commission_id): Path<Uuid>,
) -> Result<Json<CommissionResponse>, AppError> {
    let detail = state
        .db
        .mark_commission_paid(clinic.clinic_id, commission_id, Utc::now())
        .await?;

    record_commission_operation(&clinic.clinic_id.to_string(), "pay");
    record_commission_amount(
        &clinic.clinic_id.to_string(),
        "pay",
        detail.commission_amount.to_f64().unwrap_or(0.0),
    );
    tracing::info!(commission_id = %commission_id, "Commission paid");

    Ok(Json(CommissionResponse::from(detail)))
}

/// Dispute a pending or approved commission.
pub async fn dispute_commission(
    State(state): State<AppState>,
    clinic: ClinicContext,
    Path(commission_id): Path<Uuid>,
    Json(payload): Json<DisputeCommissionRequest>,
) -> Result<Json<CommissionResponse>, AppError> {
    payload.validate()?;

    let detail = state
        .db
        .dispute_commission(clinic.clinic_id, commission_id, &payload.note)
        .await?;

    record_commission_operation(&clinic.clinic_id.to_string(), "dispute");
    tracing::info!(commission_id = %commission_id, "Commission disputed");

    Ok(Json(CommissionResponse::from(detail)))
}

/// Reopen a disputed commission for recalculation.
pub async fn reopen_commission(
    State(state): State<AppState>,
    clinic: ClinicContext,
    Path(commission_id): Path<Uuid>,
) -> Result<Json<CommissionResponse>, AppError> {
    let detail = state
        .db
        .reopen_commission(clinic.clinic_id, commission_id)
        .await?;

    record_commission_operation(&clinic.clinic_id.to_string(), "reopen");
    tracing::info!(commission_id = %commission_id, "Commission reopened");

    Ok(Json(CommissionResponse::from(detail)))
}

/// Cancel a pending or approved commission.
pub async fn cancel_commission(
    State(state): State<AppState>,
    clinic: ClinicContext,
    Path(commission_id): Path<Uuid>,
) -> Result<Json<CommissionResponse>, AppError> {
    let detail = state
        .db
        .cancel_commission(clinic.clinic_id, commission_id)
        .await?;

    record_commission_operation(&clinic.clinic_id.to_string(), "cancel");
    tracing::info!(commission_id = %commission_id, "Commission cancelled");

    Ok(Json(CommissionResponse::from(detail)))
}

/// Recompute a commission's amount from a new base or rate.
pub async fn recalculate_commission(
    State(state): State<AppState>,
    clinic: ClinicContext,
    Path(commission_id): Path<Uuid>,
    Json(payload): Json<RecalculateCommissionRequest>,
) -> Result<Json<CommissionResponse>, AppError> {
    let detail = state
        .db
        .recalculate_commission(
            clinic.clinic_id,
            commission_id,
            payload.base_amount,
            payload.rate,
        )
        .await?;

    record_commission_operation(&clinic.clinic_id.to_string(), "recalculate");
    tracing::info!(
        commission_id = %commission_id,
        amount = %detail.commission_amount,
        "Commission recalculated"
    );

    Ok(Json(CommissionResponse::from(detail)))
}
