//! Commission settings handlers.

use axum::{extract::State, Json};
use clinic_core::error::AppError;

use crate::dtos::{SettingsResponse, UpsertSettingsRequest};
use crate::middleware::ClinicContext;
use crate::models::{PaymentPeriod, UpsertCommissionSettings};
use crate::startup::AppState;

/// Get the clinic's commission settings.
///
/// Clinics that never saved settings see the platform defaults.
pub async fn get_settings(
    State(state): State<AppState>,
    clinic: ClinicContext,
) -> Result<Json<SettingsResponse>, AppError> {
    let settings = state.db.get_settings_or_default(clinic.clinic_id).await?;
    Ok(Json(SettingsResponse::from(settings)))
}

/// Create or replace the clinic's commission settings.
pub async fn put_settings(
    State(state): State<AppState>,
    clinic: ClinicContext,
    Json(payload): Json<UpsertSettingsRequest>,
) -> Result<Json<SettingsResponse>, AppError> {
    let input = UpsertCommissionSettings {
        clinic_id: clinic.clinic_id,
        default_rate: payload.default_rate,
        auto_calculate: payload.auto_calculate,
        auto_approve: payload.auto_approve,
        payment_period: PaymentPeriod::from_string(&payload.payment_period),
        payment_day: payload.payment_day,
        notify_on_approval: payload.notify_on_approval,
        notify_on_payment: payload.notify_on_payment,
    };

    let settings = state.db.upsert_settings(&input).await?;

    tracing::info!(clinic_id = %clinic.clinic_id, "Commission settings updated");

    Ok(Json(SettingsResponse::from(settings)))
}
