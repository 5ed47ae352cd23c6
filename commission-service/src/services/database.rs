//! Database service for commission-service.
//!
//! The only module that knows the commission schema. Status transitions
//! run through the domain state machine, and every transition UPDATE is
//! guarded by the prior status so two concurrent moves from the same
//! state cannot both succeed.

use crate::domain;
use crate::models::{
    CommissionDetail, CommissionSettings, CreateCommission, ListCommissionsFilter,
    UpsertCommissionSettings,
};
use crate::services::metrics::DB_QUERY_DURATION;
use chrono::{DateTime, Utc};
use clinic_core::error::AppError;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

const DETAIL_COLUMNS: &str = "commission_id, clinic_id, professional_id, professional_name, \
    reference_type, reference_id, base_amount, rate, commission_amount, status, period_start, \
    period_end, notes, created_utc, approved_utc, paid_utc";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "commission-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["health_check"])
            .start_timer();

        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;

        timer.observe_duration();
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // =========================================================================
    // Commission Operations
    // =========================================================================

    /// Accrue a new commission.
    ///
    /// The clinic's settings decide the fallback rate and whether the
    /// record is born approved.
    #[instrument(skip(self, input), fields(clinic_id = %input.clinic_id, professional_id = %input.professional_id))]
    pub async fn create_commission(
        &self,
        input: &CreateCommission,
        now: DateTime<Utc>,
    ) -> Result<CommissionDetail, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_commission"])
            .start_timer();

        let settings = self.get_settings_or_default(input.clinic_id).await?;
        let detail = domain::accrue(input, &settings, now).map_err(AppError::from)?;

        let query = format!(
            r#"
            INSERT INTO commission_details (
                commission_id, clinic_id, professional_id, professional_name, reference_type,
                reference_id, base_amount, rate, commission_amount, status, period_start,
                period_end, notes, created_utc, approved_utc, paid_utc
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {}
            "#,
            DETAIL_COLUMNS
        );
        let detail = sqlx::query_as::<_, CommissionDetail>(&query)
            .bind(detail.commission_id)
            .bind(detail.clinic_id)
            .bind(detail.professional_id)
            .bind(&detail.professional_name)
            .bind(&detail.reference_type)
            .bind(detail.reference_id)
            .bind(detail.base_amount)
            .bind(detail.rate)
            .bind(detail.commission_amount)
            .bind(&detail.status)
            .bind(detail.period_start)
            .bind(detail.period_end)
            .bind(&detail.notes)
            .bind(detail.created_utc)
            .bind(detail.approved_utc)
            .bind(detail.paid_utc)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to create commission: {}", e))
            })?;

        timer.observe_duration();
        info!(
            commission_id = %detail.commission_id,
            amount = %detail.commission_amount,
            status = %detail.status,
            "Commission accrued"
        );

        Ok(detail)
    }

    /// Get a commission by ID.
    #[instrument(skip(self), fields(clinic_id = %clinic_id, commission_id = %commission_id))]
    pub async fn get_commission(
        &self,
        clinic_id: Uuid,
        commission_id: Uuid,
    ) -> Result<Option<CommissionDetail>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_commission"])
            .start_timer();

        let query = format!(
            "SELECT {} FROM commission_details WHERE clinic_id = $1 AND commission_id = $2",
            DETAIL_COLUMNS
        );
        let detail = sqlx::query_as::<_, CommissionDetail>(&query)
            .bind(clinic_id)
            .bind(commission_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to get commission: {}", e))
            })?;

        timer.observe_duration();

        Ok(detail)
    }

    /// List commissions for a clinic.
    #[instrument(skip(self, filter), fields(clinic_id = %clinic_id))]
    pub async fn list_commissions(
        &self,
        clinic_id: Uuid,
        filter: &ListCommissionsFilter,
    ) -> Result<Vec<CommissionDetail>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_commissions"])
            .start_timer();

        let limit = filter.page_size.clamp(1, 100) as i64;
        let status = filter.status.map(|s| s.as_str().to_string());

        let query = format!(
            r#"
            SELECT {}
            FROM commission_details
            WHERE clinic_id = $1
              AND ($2::uuid IS NULL OR professional_id = $2)
              AND ($3::text IS NULL OR status = $3)
              AND ($4::date IS NULL OR period_start >= $4)
              AND ($5::date IS NULL OR period_end <= $5)
              AND ($6::uuid IS NULL OR commission_id > $6)
            ORDER BY commission_id
            LIMIT $7
            "#,
            DETAIL_COLUMNS
        );
        let details = sqlx::query_as::<_, CommissionDetail>(&query)
            .bind(clinic_id)
            .bind(filter.professional_id)
            .bind(&status)
            .bind(filter.period_start)
            .bind(filter.period_end)
            .bind(filter.page_token)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to list commissions: {}", e))
            })?;

        timer.observe_duration();

        Ok(details)
    }

    /// Fetch every commission of one professional for summarization.
    #[instrument(skip(self), fields(clinic_id = %clinic_id, professional_id = %professional_id))]
    pub async fn list_commissions_for_summary(
        &self,
        clinic_id: Uuid,
        professional_id: Uuid,
    ) -> Result<Vec<CommissionDetail>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_commissions_for_summary"])
            .start_timer();

        let query = format!(
            "SELECT {} FROM commission_details WHERE clinic_id = $1 AND professional_id = $2",
            DETAIL_COLUMNS
        );
        let details = sqlx::query_as::<_, CommissionDetail>(&query)
            .bind(clinic_id)
            .bind(professional_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to fetch commissions: {}", e))
            })?;

        timer.observe_duration();

        Ok(details)
    }

    /// Persist a state-machine step.
    ///
    /// The UPDATE is conditioned on the status the transition started
    /// from; losing a race surfaces as a conflict rather than a silent
    /// double-apply.
    async fn persist_transition(
        &self,
        prev_status: &str,
        next: CommissionDetail,
        operation: &str,
    ) -> Result<CommissionDetail, AppError> {
        let timer = DB_QUERY_DURATION.with_label_values(&[operation]).start_timer();

        let query = format!(
            r#"
            UPDATE commission_details
            SET base_amount = $4, rate = $5, commission_amount = $6, status = $7, notes = $8,
                approved_utc = $9, paid_utc = $10
            WHERE clinic_id = $1 AND commission_id = $2 AND status = $3
            RETURNING {}
            "#,
            DETAIL_COLUMNS
        );
        let updated = sqlx::query_as::<_, CommissionDetail>(&query)
            .bind(next.clinic_id)
            .bind(next.commission_id)
            .bind(prev_status)
            .bind(next.base_amount)
            .bind(next.rate)
            .bind(next.commission_amount)
            .bind(&next.status)
            .bind(&next.notes)
            .bind(next.approved_utc)
            .bind(next.paid_utc)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to update commission: {}", e))
            })?
            .ok_or_else(|| {
                AppError::Conflict(anyhow::anyhow!("Commission was modified concurrently"))
            })?;

        timer.observe_duration();
        info!(
            commission_id = %updated.commission_id,
            status = %updated.status,
            operation = operation,
            "Commission transition persisted"
        );

        Ok(updated)
    }

    async fn load_commission(
        &self,
        clinic_id: Uuid,
        commission_id: Uuid,
    ) -> Result<CommissionDetail, AppError> {
        self.get_commission(clinic_id, commission_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Commission not found")))
    }

    /// Approve a pending or disputed commission.
    #[instrument(skip(self), fields(clinic_id = %clinic_id, commission_id = %commission_id))]
    pub async fn approve_commission(
        &self,
        clinic_id: Uuid,
        commission_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<CommissionDetail, AppError> {
        let detail = self.load_commission(clinic_id, commission_id).await?;
        let next = domain::approve(&detail, now).map_err(AppError::from)?;
        self.persist_transition(&detail.status, next, "approve_commission")
            .await
    }

    /// Mark an approved commission as paid.
    #[instrument(skip(self), fields(clinic_id = %clinic_id, commission_id = %commission_id))]
    pub async fn mark_commission_paid(
        &self,
        clinic_id: Uuid,
        commission_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<CommissionDetail, AppError> {
        let detail = self.load_commission(clinic_id, commission_id).await?;
        let next = domain::mark_paid(&detail, now).map_err(AppError::from)?;
        self.persist_transition(&detail.status, next, "mark_commission_paid")
            .await
    }

    /// Dispute a pending or approved commission.
    #[instrument(skip(self, note), fields(clinic_id = %clinic_id, commission_id = %commission_id))]
    pub async fn dispute_commission(
        &self,
        clinic_id: Uuid,
        commission_id: Uuid,
        note: &str,
    ) -> Result<CommissionDetail, AppError> {
        let detail = self.load_commission(clinic_id, commission_id).await?;
        let next = domain::dispute(&detail, note).map_err(AppError::from)?;
        self.persist_transition(&detail.status, next, "dispute_commission")
            .await
    }

    /// Reopen a disputed commission for recalculation.
    #[instrument(skip(self), fields(clinic_id = %clinic_id, commission_id = %commission_id))]
    pub async fn reopen_commission(
        &self,
        clinic_id: Uuid,
        commission_id: Uuid,
    ) -> Result<CommissionDetail, AppError> {
        let detail = self.load_commission(clinic_id, commission_id).await?;
        let next = domain::reopen(&detail).map_err(AppError::from)?;
        self.persist_transition(&detail.status, next, "reopen_commission")
            .await
    }

    /// Cancel a pending or approved commission.
    #[instrument(skip(self), fields(clinic_id = %clinic_id, commission_id = %commission_id))]
    pub async fn cancel_commission(
        &self,
        clinic_id: Uuid,
        commission_id: Uuid,
    ) -> Result<CommissionDetail, AppError> {
        let detail = self.load_commission(clinic_id, commission_id).await?;
        let next = domain::cancel(&detail).map_err(AppError::from)?;
        self.persist_transition(&detail.status, next, "cancel_commission")
            .await
    }

    /// Recompute a commission's derived amount from a new base or rate.
    #[instrument(skip(self), fields(clinic_id = %clinic_id, commission_id = %commission_id))]
    pub async fn recalculate_commission(
        &self,
        clinic_id: Uuid,
        commission_id: Uuid,
        base_amount: Decimal,
        rate: Decimal,
    ) -> Result<CommissionDetail, AppError> {
        let detail = self.load_commission(clinic_id, commission_id).await?;
        let next = domain::recalculate(&detail, base_amount, rate).map_err(AppError::from)?;
        self.persist_transition(&detail.status, next, "recalculate_commission")
            .await
    }

    // =========================================================================
    // Settings Operations
    // =========================================================================

    /// Get a clinic's commission settings.
    #[instrument(skip(self), fields(clinic_id = %clinic_id))]
    pub async fn get_settings(
        &self,
        clinic_id: Uuid,
    ) -> Result<Option<CommissionSettings>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_settings"])
            .start_timer();

        let settings = sqlx::query_as::<_, CommissionSettings>(
            r#"
            SELECT clinic_id, default_rate, auto_calculate, auto_approve, payment_period,
                payment_day, notify_on_approval, notify_on_payment, updated_utc
            FROM commission_settings
            WHERE clinic_id = $1
            "#,
        )
        .bind(clinic_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get settings: {}", e)))?;

        timer.observe_duration();

        Ok(settings)
    }

    /// Get a clinic's settings, falling back to platform defaults for
    /// clinics that never saved any.
    pub async fn get_settings_or_default(
        &self,
        clinic_id: Uuid,
    ) -> Result<CommissionSettings, AppError> {
        Ok(self
            .get_settings(clinic_id)
            .await?
            .unwrap_or_else(|| CommissionSettings::default_for(clinic_id)))
    }

    /// Create or replace a clinic's commission settings.
    #[instrument(skip(self, input), fields(clinic_id = %input.clinic_id))]
    pub async fn upsert_settings(
        &self,
        input: &UpsertCommissionSettings,
    ) -> Result<CommissionSettings, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["upsert_settings"])
            .start_timer();

        if input.default_rate < Decimal::ZERO || input.default_rate > Decimal::ONE {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Default commission rate {} must be a fraction between 0 and 1",
                input.default_rate
            )));
        }
        if !(1..=28).contains(&input.payment_day) {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Payment day {} must fall between 1 and 28",
                input.payment_day
            )));
        }

        let settings = sqlx::query_as::<_, CommissionSettings>(
            r#"
            INSERT INTO commission_settings (
                clinic_id, default_rate, auto_calculate, auto_approve, payment_period,
                payment_day, notify_on_approval, notify_on_payment, updated_utc
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
            ON CONFLICT (clinic_id)
            DO UPDATE SET default_rate = $2, auto_calculate = $3, auto_approve = $4,
                payment_period = $5, payment_day = $6, notify_on_approval = $7,
                notify_on_payment = $8, updated_utc = NOW()
            RETURNING clinic_id, default_rate, auto_calculate, auto_approve, payment_period,
                payment_day, notify_on_approval, notify_on_payment, updated_utc
            "#,
        )
        .bind(input.clinic_id)
        .bind(input.default_rate)
        .bind(input.auto_calculate)
        .bind(input.auto_approve)
        .bind(input.payment_period.as_str())
        .bind(input.payment_day)
        .bind(input.notify_on_approval)
        .bind(input.notify_on_payment)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to upsert settings: {}", e))
        })?;

        timer.observe_duration();
        info!(clinic_id = %settings.clinic_id, "Commission settings saved");

        Ok(settings)
    }
}
