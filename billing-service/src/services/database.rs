//! Database service for billing-service.
//!
//! The only module that knows the billing schema. Rows come back as the
//! model structs; every derived figure is computed by the domain layer.

use crate::domain::{self, ReconciledInvoice};
use crate::models::{CreateInvoice, CreatePayment, Invoice, ListInvoicesFilter, Payment};
use crate::services::metrics::DB_QUERY_DURATION;
use chrono::NaiveDate;
use clinic_core::error::AppError;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "billing-service"))]
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
    // Invoice Operations
    // =========================================================================

    /// Create a new invoice.
    ///
    /// The monetary invariant `total = subtotal + tax - discount` is
    /// enforced here, at the write boundary.
    #[instrument(skip(self, input), fields(clinic_id = %input.clinic_id))]
    pub async fn create_invoice(&self, input: &CreateInvoice) -> Result<Invoice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_invoice"])
            .start_timer();

        if input.subtotal < Decimal::ZERO
            || input.tax_amount < Decimal::ZERO
            || input.discount_amount < Decimal::ZERO
            || input.total < Decimal::ZERO
        {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Invoice amounts must be non-negative"
            )));
        }

        let expected_total = input.subtotal + input.tax_amount - input.discount_amount;
        if input.total != expected_total {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Invoice total {} does not match subtotal + tax - discount = {}",
                input.total,
                expected_total
            )));
        }

        let invoice_id = Uuid::new_v4();
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (
                invoice_id, clinic_id, branch_id, patient_id, invoice_number, receipt_number,
                receipt_type, issue_date, due_date, subtotal, tax_amount, discount_amount, total,
                currency, status, notes
            )
            VALUES ($1, $2, $3, $4, next_invoice_number($2), $5, $6, $7, $8, $9, $10, $11, $12, $13, 'pending', $14)
            RETURNING invoice_id, clinic_id, branch_id, patient_id, invoice_number, receipt_number,
                receipt_type, issue_date, due_date, subtotal, tax_amount, discount_amount, total,
                currency, status, notes, created_utc, cancelled_utc
            "#,
        )
        .bind(invoice_id)
        .bind(input.clinic_id)
        .bind(input.branch_id)
        .bind(input.patient_id)
        .bind(&input.receipt_number)
        .bind(&input.receipt_type)
        .bind(input.issue_date)
        .bind(input.due_date)
        .bind(input.subtotal)
        .bind(input.tax_amount)
        .bind(input.discount_amount)
        .bind(input.total)
        .bind(&input.currency)
        .bind(&input.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create invoice: {}", e)))?;

        timer.observe_duration();
        info!(
            invoice_id = %invoice.invoice_id,
            invoice_number = %invoice.invoice_number,
            total = %invoice.total,
            "Invoice created"
        );

        Ok(invoice)
    }

    /// Get an invoice by ID.
    #[instrument(skip(self), fields(clinic_id = %clinic_id, invoice_id = %invoice_id))]
    pub async fn get_invoice(
        &self,
        clinic_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT invoice_id, clinic_id, branch_id, patient_id, invoice_number, receipt_number,
                receipt_type, issue_date, due_date, subtotal, tax_amount, discount_amount, total,
                currency, status, notes, created_utc, cancelled_utc
            FROM invoices
            WHERE clinic_id = $1 AND invoice_id = $2
            "#,
        )
        .bind(clinic_id)
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))?;

        timer.observe_duration();

        Ok(invoice)
    }

    /// List invoices for a clinic.
    #[instrument(skip(self, filter), fields(clinic_id = %clinic_id))]
    pub async fn list_invoices(
        &self,
        clinic_id: Uuid,
        filter: &ListInvoicesFilter,
    ) -> Result<Vec<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoices"])
            .start_timer();

        let limit = filter.page_size.clamp(1, 100) as i64;
        let status = filter.status.map(|s| s.as_str().to_string());

        let invoices = if let Some(cursor) = filter.page_token {
            sqlx::query_as::<_, Invoice>(
                r#"
                SELECT invoice_id, clinic_id, branch_id, patient_id, invoice_number, receipt_number,
                    receipt_type, issue_date, due_date, subtotal, tax_amount, discount_amount, total,
                    currency, status, notes, created_utc, cancelled_utc
                FROM invoices
                WHERE clinic_id = $1
                  AND ($2::text IS NULL OR status = $2)
                  AND ($3::uuid IS NULL OR patient_id = $3)
                  AND ($4::date IS NULL OR issue_date >= $4)
                  AND ($5::date IS NULL OR issue_date <= $5)
                  AND invoice_id > $6
                ORDER BY invoice_id
                LIMIT $7
                "#,
            )
            .bind(clinic_id)
            .bind(&status)
            .bind(filter.patient_id)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .bind(cursor)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, Invoice>(
                r#"
                SELECT invoice_id, clinic_id, branch_id, patient_id, invoice_number, receipt_number,
                    receipt_type, issue_date, due_date, subtotal, tax_amount, discount_amount, total,
                    currency, status, notes, created_utc, cancelled_utc
                FROM invoices
                WHERE clinic_id = $1
                  AND ($2::text IS NULL OR status = $2)
                  AND ($3::uuid IS NULL OR patient_id = $3)
                  AND ($4::date IS NULL OR issue_date >= $4)
                  AND ($5::date IS NULL OR issue_date <= $5)
                ORDER BY invoice_id
                LIMIT $6
                "#,
            )
            .bind(clinic_id)
            .bind(&status)
            .bind(filter.patient_id)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list invoices: {}", e)))?;

        timer.observe_duration();

        Ok(invoices)
    }

    /// Cancel an invoice. Invoices are never deleted.
    #[instrument(skip(self), fields(clinic_id = %clinic_id, invoice_id = %invoice_id))]
    pub async fn cancel_invoice(
        &self,
        clinic_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<Invoice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["cancel_invoice"])
            .start_timer();

        let invoice = self
            .get_invoice(clinic_id, invoice_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

        if invoice.is_cancelled() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Invoice is already cancelled"
            )));
        }

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices
            SET status = 'cancelled', cancelled_utc = NOW()
            WHERE clinic_id = $1 AND invoice_id = $2 AND cancelled_utc IS NULL
            RETURNING invoice_id, clinic_id, branch_id, patient_id, invoice_number, receipt_number,
                receipt_type, issue_date, due_date, subtotal, tax_amount, discount_amount, total,
                currency, status, notes, created_utc, cancelled_utc
            "#,
        )
        .bind(clinic_id)
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to cancel invoice: {}", e)))?
        .ok_or_else(|| AppError::Conflict(anyhow::anyhow!("Invoice was cancelled concurrently")))?;

        timer.observe_duration();
        info!(invoice_id = %invoice.invoice_id, "Invoice cancelled");

        Ok(invoice)
    }

    // =========================================================================
    // Payment Operations
    // =========================================================================

    /// Record a payment against an invoice and refresh the invoice's
    /// derived status cache.
    ///
    /// The invoice row is locked for the duration of the transaction so
    /// concurrent writes against the same invoice serialize.
    #[instrument(skip(self, input), fields(clinic_id = %input.clinic_id, invoice_id = %input.invoice_id))]
    pub async fn record_payment(
        &self,
        input: &CreatePayment,
        as_of: NaiveDate,
    ) -> Result<(Payment, Invoice, ReconciledInvoice), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["record_payment"])
            .start_timer();

        if input.amount <= Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Payment amount must be positive"
            )));
        }

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT invoice_id, clinic_id, branch_id, patient_id, invoice_number, receipt_number,
                receipt_type, issue_date, due_date, subtotal, tax_amount, discount_amount, total,
                currency, status, notes, created_utc, cancelled_utc
            FROM invoices
            WHERE clinic_id = $1 AND invoice_id = $2
            FOR UPDATE
            "#,
        )
        .bind(input.clinic_id)
        .bind(input.invoice_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

        if invoice.is_cancelled() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Cannot record payments against a cancelled invoice"
            )));
        }

        let payment_id = Uuid::new_v4();
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (
                payment_id, invoice_id, clinic_id, amount, method, reference, payment_date, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING payment_id, invoice_id, clinic_id, amount, method, reference, payment_date,
                notes, created_utc
            "#,
        )
        .bind(payment_id)
        .bind(input.invoice_id)
        .bind(input.clinic_id)
        .bind(input.amount)
        .bind(input.method.as_str())
        .bind(&input.reference)
        .bind(input.payment_date)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to record payment: {}", e)))?;

        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT payment_id, invoice_id, clinic_id, amount, method, reference, payment_date,
                notes, created_utc
            FROM payments
            WHERE clinic_id = $1 AND invoice_id = $2
            "#,
        )
        .bind(input.clinic_id)
        .bind(input.invoice_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get payments: {}", e)))?;

        let reconciled = domain::reconcile(&invoice, &payments, as_of).map_err(AppError::from)?;

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices
            SET status = $3
            WHERE clinic_id = $1 AND invoice_id = $2
            RETURNING invoice_id, clinic_id, branch_id, patient_id, invoice_number, receipt_number,
                receipt_type, issue_date, due_date, subtotal, tax_amount, discount_amount, total,
                currency, status, notes, created_utc, cancelled_utc
            "#,
        )
        .bind(input.clinic_id)
        .bind(input.invoice_id)
        .bind(reconciled.status.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update invoice status: {}", e))
        })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        info!(
            payment_id = %payment.payment_id,
            amount = %payment.amount,
            status = reconciled.status.as_str(),
            "Payment recorded"
        );

        Ok((payment, invoice, reconciled))
    }

    /// List payments for an invoice.
    #[instrument(skip(self), fields(clinic_id = %clinic_id, invoice_id = %invoice_id))]
    pub async fn list_payments(
        &self,
        clinic_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<Vec<Payment>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_payments"])
            .start_timer();

        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT payment_id, invoice_id, clinic_id, amount, method, reference, payment_date,
                notes, created_utc
            FROM payments
            WHERE clinic_id = $1 AND invoice_id = $2
            ORDER BY created_utc
            "#,
        )
        .bind(clinic_id)
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list payments: {}", e)))?;

        timer.observe_duration();

        Ok(payments)
    }

    // =========================================================================
    // Statistics Read Path
    // =========================================================================

    /// Fetch the full invoice snapshot for a clinic, optionally bounded
    /// by issue date.
    #[instrument(skip(self), fields(clinic_id = %clinic_id))]
    pub async fn list_invoices_for_stats(
        &self,
        clinic_id: Uuid,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoices_for_stats"])
            .start_timer();

        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT invoice_id, clinic_id, branch_id, patient_id, invoice_number, receipt_number,
                receipt_type, issue_date, due_date, subtotal, tax_amount, discount_amount, total,
                currency, status, notes, created_utc, cancelled_utc
            FROM invoices
            WHERE clinic_id = $1
              AND ($2::date IS NULL OR issue_date >= $2)
              AND ($3::date IS NULL OR issue_date <= $3)
            "#,
        )
        .bind(clinic_id)
        .bind(start_date)
        .bind(end_date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to fetch invoice snapshot: {}", e))
        })?;

        timer.observe_duration();

        Ok(invoices)
    }

    /// Fetch all payments belonging to a set of invoices.
    #[instrument(skip(self, invoice_ids), fields(clinic_id = %clinic_id))]
    pub async fn list_payments_for_stats(
        &self,
        clinic_id: Uuid,
        invoice_ids: &[Uuid],
    ) -> Result<Vec<Payment>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_payments_for_stats"])
            .start_timer();

        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT payment_id, invoice_id, clinic_id, amount, method, reference, payment_date,
                notes, created_utc
            FROM payments
            WHERE clinic_id = $1 AND invoice_id = ANY($2)
            "#,
        )
        .bind(clinic_id)
        .bind(invoice_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to fetch payment snapshot: {}", e))
        })?;

        timer.observe_duration();

        Ok(payments)
    }
}
