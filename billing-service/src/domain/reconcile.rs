//! Invoice reconciliation.
//!
//! Derives an invoice's true paid/due/status from its payment history
//! rather than trusting a stored flag. The stored status column is a
//! cache; this derivation is the source of truth.

use super::DomainError;
use crate::models::{Invoice, InvoiceStatus, Payment};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

/// Derived view of one invoice against its payments.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciledInvoice {
    pub invoice_id: Uuid,
    pub paid_amount: Decimal,
    /// Signed remainder: `total - paid_amount`. Negative means the
    /// invoice was overpaid and a refund is owed.
    pub balance: Decimal,
    pub status: InvoiceStatus,
}

impl ReconciledInvoice {
    /// Amount still owed by the patient, floored at zero for display.
    pub fn amount_due(&self) -> Decimal {
        self.balance.max(Decimal::ZERO)
    }

    /// Amount owed back to the patient, zero unless overpaid.
    pub fn overpayment(&self) -> Decimal {
        (-self.balance).max(Decimal::ZERO)
    }
}

/// Reconcile one invoice against the complete list of its payments.
///
/// `payments` must be the unfiltered set referencing this invoice; order
/// is irrelevant. `as_of` is the business date used for the overdue
/// check. Overpayment is reported through a negative balance, never
/// rejected.
pub fn reconcile(
    invoice: &Invoice,
    payments: &[Payment],
    as_of: NaiveDate,
) -> Result<ReconciledInvoice, DomainError> {
    let mut seen = HashSet::with_capacity(payments.len());
    let mut paid_amount = Decimal::ZERO;

    for payment in payments {
        if payment.invoice_id != invoice.invoice_id {
            return Err(DomainError::ForeignPayment {
                payment_id: payment.payment_id,
                invoice_id: invoice.invoice_id,
            });
        }
        if !seen.insert(payment.payment_id) {
            return Err(DomainError::DuplicatePayment {
                payment_id: payment.payment_id,
                invoice_id: invoice.invoice_id,
            });
        }
        paid_amount += payment.amount;
    }

    let balance = invoice.total - paid_amount;

    let status = if invoice.is_cancelled() {
        InvoiceStatus::Cancelled
    } else if balance <= Decimal::ZERO {
        InvoiceStatus::Paid
    } else if paid_amount > Decimal::ZERO {
        InvoiceStatus::Partial
    } else if invoice.due_date.is_some_and(|due| due < as_of) {
        InvoiceStatus::Overdue
    } else {
        InvoiceStatus::Pending
    };

    Ok(ReconciledInvoice {
        invoice_id: invoice.invoice_id,
        paid_amount,
        balance,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn invoice(total: Decimal, due_date: Option<NaiveDate>) -> Invoice {
        Invoice {
            invoice_id: Uuid::new_v4(),
            clinic_id: Uuid::new_v4(),
            branch_id: None,
            patient_id: Some(Uuid::new_v4()),
            invoice_number: "FAC-2026-000001".to_string(),
            receipt_number: None,
            receipt_type: None,
            issue_date: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
            due_date,
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
            method: "cash".to_string(),
            reference: None,
            payment_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            notes: None,
            created_utc: Utc::now(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()
    }

    #[test]
    fn test_no_payments_future_due_date_is_pending() {
        let inv = invoice(dec!(100), NaiveDate::from_ymd_opt(2026, 3, 1));
        let r = reconcile(&inv, &[], today()).unwrap();
        assert_eq!(r.status, InvoiceStatus::Pending);
        assert_eq!(r.paid_amount, dec!(0));
        assert_eq!(r.amount_due(), dec!(100));
    }

    #[test]
    fn test_no_payments_no_due_date_is_pending() {
        let inv = invoice(dec!(100), None);
        let r = reconcile(&inv, &[], today()).unwrap();
        assert_eq!(r.status, InvoiceStatus::Pending);
    }

    #[test]
    fn test_full_payment_is_paid() {
        let inv = invoice(dec!(250), None);
        let pays = vec![payment(&inv, dec!(250))];
        let r = reconcile(&inv, &pays, today()).unwrap();
        assert_eq!(r.status, InvoiceStatus::Paid);
        assert_eq!(r.balance, dec!(0));
        assert_eq!(r.amount_due(), dec!(0));
    }

    #[test]
    fn test_partial_payment_is_partial() {
        let inv = invoice(dec!(200), None);
        let pays = vec![payment(&inv, dec!(75))];
        let r = reconcile(&inv, &pays, today()).unwrap();
        assert_eq!(r.status, InvoiceStatus::Partial);
        assert_eq!(r.amount_due(), dec!(125));
    }

    #[test]
    fn test_overpayment_is_paid_with_negative_balance() {
        let inv = invoice(dec!(100), None);
        let pays = vec![payment(&inv, dec!(120))];
        let r = reconcile(&inv, &pays, today()).unwrap();
        assert_eq!(r.status, InvoiceStatus::Paid);
        assert_eq!(r.balance, dec!(-20));
        assert_eq!(r.amount_due(), dec!(0));
        assert_eq!(r.overpayment(), dec!(20));
    }

    #[test]
    fn test_past_due_without_payments_is_overdue() {
        let inv = invoice(dec!(100), NaiveDate::from_ymd_opt(2026, 1, 20));
        let r = reconcile(&inv, &[], today()).unwrap();
        assert_eq!(r.status, InvoiceStatus::Overdue);
    }

    #[test]
    fn test_past_due_with_partial_payment_stays_partial() {
        let inv = invoice(dec!(100), NaiveDate::from_ymd_opt(2026, 1, 20));
        let pays = vec![payment(&inv, dec!(40))];
        let r = reconcile(&inv, &pays, today()).unwrap();
        assert_eq!(r.status, InvoiceStatus::Partial);
    }

    #[test]
    fn test_cancelled_wins_over_everything() {
        let mut inv = invoice(dec!(100), None);
        inv.cancelled_utc = Some(Utc::now());
        inv.status = "cancelled".to_string();
        let pays = vec![payment(&inv, dec!(100))];
        let r = reconcile(&inv, &pays, today()).unwrap();
        assert_eq!(r.status, InvoiceStatus::Cancelled);
    }

    #[test]
    fn test_multiple_payments_accumulate() {
        let inv = invoice(dec!(300), None);
        let pays = vec![
            payment(&inv, dec!(100)),
            payment(&inv, dec!(100)),
            payment(&inv, dec!(100)),
        ];
        let r = reconcile(&inv, &pays, today()).unwrap();
        assert_eq!(r.status, InvoiceStatus::Paid);
        assert_eq!(r.paid_amount, dec!(300));
    }

    #[test]
    fn test_duplicate_payment_id_rejected() {
        let inv = invoice(dec!(100), None);
        let mut pays = vec![payment(&inv, dec!(50))];
        let mut dup = pays[0].clone();
        dup.amount = dec!(25);
        pays.push(dup);
        let err = reconcile(&inv, &pays, today()).unwrap_err();
        assert!(matches!(err, DomainError::DuplicatePayment { .. }));
    }

    #[test]
    fn test_foreign_payment_rejected() {
        let inv = invoice(dec!(100), None);
        let other = invoice(dec!(100), None);
        let pays = vec![payment(&other, dec!(50))];
        let err = reconcile(&inv, &pays, today()).unwrap_err();
        assert!(matches!(err, DomainError::ForeignPayment { .. }));
    }

    #[test]
    fn test_zero_total_invoice_is_paid() {
        let inv = invoice(dec!(0), None);
        let r = reconcile(&inv, &[], today()).unwrap();
        assert_eq!(r.status, InvoiceStatus::Paid);
    }

    #[test]
    fn test_due_today_is_not_overdue() {
        let inv = invoice(dec!(100), Some(today()));
        let r = reconcile(&inv, &[], today()).unwrap();
        assert_eq!(r.status, InvoiceStatus::Pending);
    }
}
