//! Clinic-wide billing statistics.

use super::reconcile::reconcile;
use super::DomainError;
use crate::models::{Invoice, InvoiceStatus, Payment};
use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Aggregated billing figures over a snapshot of invoices and payments.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BillingStats {
    pub total_invoiced: Decimal,
    pub invoiced_this_month: Decimal,
    pub pending_collection: Decimal,
    pub overdue_amount: Decimal,
    pub paid_count: i64,
    pub pending_count: i64,
    pub overdue_count: i64,
}

/// Compute billing statistics over a snapshot.
///
/// Every invoice is first reconciled against its payments; the stored
/// status column is never consulted. The calendar month containing
/// `as_of` bounds `invoiced_this_month`, and `as_of`'s date drives the
/// overdue check. An empty snapshot yields all-zero stats.
pub fn aggregate(
    invoices: &[Invoice],
    payments: &[Payment],
    as_of: DateTime<Utc>,
) -> Result<BillingStats, DomainError> {
    let mut by_invoice: HashMap<Uuid, Vec<Payment>> = HashMap::new();
    for payment in payments {
        by_invoice
            .entry(payment.invoice_id)
            .or_default()
            .push(payment.clone());
    }

    let today = as_of.date_naive();
    let mut stats = BillingStats::default();

    for invoice in invoices {
        let empty = Vec::new();
        let invoice_payments = by_invoice.get(&invoice.invoice_id).unwrap_or(&empty);
        let reconciled = reconcile(invoice, invoice_payments, today)?;

        if reconciled.status == InvoiceStatus::Cancelled {
            continue;
        }

        stats.total_invoiced += invoice.total;
        if invoice.issue_date.year() == today.year() && invoice.issue_date.month() == today.month()
        {
            stats.invoiced_this_month += invoice.total;
        }

        match reconciled.status {
            InvoiceStatus::Paid => {
                stats.paid_count += 1;
            }
            InvoiceStatus::Pending | InvoiceStatus::Partial => {
                stats.pending_collection += reconciled.amount_due();
                stats.pending_count += 1;
            }
            InvoiceStatus::Overdue => {
                stats.overdue_amount += reconciled.amount_due();
                stats.overdue_count += 1;
            }
            InvoiceStatus::Cancelled => unreachable!("cancelled invoices skipped above"),
        }
    }

    Ok(stats)
}

/// Like [`aggregate`], but fails on an empty invoice set so callers can
/// distinguish "zero activity" from "nothing fetched".
pub fn aggregate_strict(
    invoices: &[Invoice],
    payments: &[Payment],
    as_of: DateTime<Utc>,
) -> Result<BillingStats, DomainError> {
    if invoices.is_empty() {
        return Err(DomainError::EmptyDataset);
    }
    aggregate(invoices, payments, as_of)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal_macros::dec;

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 15, 12, 0, 0).unwrap()
    }

    fn invoice(total: Decimal, issue: NaiveDate, due: Option<NaiveDate>) -> Invoice {
        Invoice {
            invoice_id: Uuid::new_v4(),
            clinic_id: Uuid::new_v4(),
            branch_id: None,
            patient_id: None,
            invoice_number: "FAC-2026-000001".to_string(),
            receipt_number: None,
            receipt_type: None,
            issue_date: issue,
            due_date: due,
            subtotal: total,
            tax_amount: dec!(0),
            discount_amount: dec!(0),
            total,
            currency: "USD".to_string(),
            status: "pending".to_string(),
            notes: None,
            created_utc: Utc::now(),
            cancelled_utc: None,
        }
    }

    fn payment(invoice: &Invoice, amount: Decimal) -> Payment {
        Payment {
            payment_id: Uuid::new_v4(),
            invoice_id: invoice.invoice_id,
            clinic_id: invoice.clinic_id,
            amount,
            method: "card".to_string(),
            reference: None,
            payment_date: NaiveDate::from_ymd_opt(2026, 2, 10).unwrap(),
            notes: None,
            created_utc: Utc::now(),
        }
    }

    #[test]
    fn test_empty_snapshot_yields_zero_stats() {
        let stats = aggregate(&[], &[], as_of()).unwrap();
        assert_eq!(stats.total_invoiced, dec!(0));
        assert_eq!(stats.invoiced_this_month, dec!(0));
        assert_eq!(stats.pending_collection, dec!(0));
        assert_eq!(stats.overdue_amount, dec!(0));
        assert_eq!(stats.paid_count, 0);
        assert_eq!(stats.pending_count, 0);
        assert_eq!(stats.overdue_count, 0);
    }

    #[test]
    fn test_strict_aggregate_rejects_empty_snapshot() {
        let err = aggregate_strict(&[], &[], as_of()).unwrap_err();
        assert!(matches!(err, DomainError::EmptyDataset));
    }

    #[test]
    fn test_mixed_statuses_partition_without_overlap() {
        let jan = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let feb = NaiveDate::from_ymd_opt(2026, 2, 5).unwrap();

        let paid = invoice(dec!(100), feb, None);
        let pending = invoice(dec!(200), feb, NaiveDate::from_ymd_opt(2026, 3, 1));
        let overdue = invoice(dec!(300), jan, NaiveDate::from_ymd_opt(2026, 1, 31));

        let payments = vec![payment(&paid, dec!(100))];
        let invoices = vec![paid, pending, overdue];

        let stats = aggregate(&invoices, &payments, as_of()).unwrap();
        assert_eq!(stats.total_invoiced, dec!(600));
        assert_eq!(stats.invoiced_this_month, dec!(300));
        assert_eq!(stats.pending_collection, dec!(200));
        assert_eq!(stats.overdue_amount, dec!(300));
        assert_eq!(stats.paid_count, 1);
        assert_eq!(stats.pending_count, 1);
        assert_eq!(stats.overdue_count, 1);
        // An invoice contributes to exactly one of the two buckets.
        assert_eq!(stats.pending_collection + stats.overdue_amount, dec!(500));
    }

    #[test]
    fn test_cancelled_invoices_are_excluded() {
        let feb = NaiveDate::from_ymd_opt(2026, 2, 5).unwrap();
        let mut cancelled = invoice(dec!(500), feb, None);
        cancelled.cancelled_utc = Some(Utc::now());
        let live = invoice(dec!(100), feb, None);

        let stats = aggregate(&[cancelled, live], &[], as_of()).unwrap();
        assert_eq!(stats.total_invoiced, dec!(100));
        assert_eq!(stats.invoiced_this_month, dec!(100));
        assert_eq!(stats.pending_count, 1);
    }

    #[test]
    fn test_partial_invoice_counts_toward_pending_collection() {
        let feb = NaiveDate::from_ymd_opt(2026, 2, 5).unwrap();
        let inv = invoice(dec!(400), feb, None);
        let payments = vec![payment(&inv, dec!(150))];

        let stats = aggregate(std::slice::from_ref(&inv), &payments, as_of()).unwrap();
        assert_eq!(stats.pending_collection, dec!(250));
        assert_eq!(stats.pending_count, 1);
        assert_eq!(stats.paid_count, 0);
    }

    #[test]
    fn test_overdue_with_partial_payment_is_not_overdue_bucket() {
        // Partial payment keeps an invoice out of the overdue bucket even
        // past its due date.
        let jan = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let inv = invoice(dec!(100), jan, NaiveDate::from_ymd_opt(2026, 1, 20));
        let payments = vec![payment(&inv, dec!(30))];

        let stats = aggregate(std::slice::from_ref(&inv), &payments, as_of()).unwrap();
        assert_eq!(stats.overdue_amount, dec!(0));
        assert_eq!(stats.overdue_count, 0);
        assert_eq!(stats.pending_collection, dec!(70));
    }

    #[test]
    fn test_prior_month_invoice_not_in_monthly_total() {
        let jan = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let inv = invoice(dec!(100), jan, None);

        let stats = aggregate(&[inv], &[], as_of()).unwrap();
        assert_eq!(stats.total_invoiced, dec!(100));
        assert_eq!(stats.invoiced_this_month, dec!(0));
    }
}
