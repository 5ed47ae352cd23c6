//! Clinic context extraction for multi-clinic scoping.
//!
//! Every data-bearing request is scoped to one clinic. The clinic id is
//! carried in the `x-clinic-id` header, set by the web frontend after it
//! has authenticated the user and resolved their clinic membership.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use clinic_core::error::AppError;
use uuid::Uuid;

pub const CLINIC_ID_HEADER: &str = "x-clinic-id";

/// Clinic scope extracted from request headers.
#[derive(Debug, Clone, Copy)]
pub struct ClinicContext {
    pub clinic_id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for ClinicContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(CLINIC_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::BadRequest(anyhow::anyhow!("Missing {} header", CLINIC_ID_HEADER))
            })?;

        let clinic_id = Uuid::parse_str(raw).map_err(|_| {
            AppError::BadRequest(anyhow::anyhow!("Invalid {} header", CLINIC_ID_HEADER))
        })?;

        tracing::Span::current().record("clinic_id", clinic_id.to_string());

        Ok(ClinicContext { clinic_id })
    }
}
