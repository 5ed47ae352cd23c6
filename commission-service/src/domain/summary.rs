//! Per-professional, per-period commission summaries.

use crate::models::{CommissionDetail, CommissionStatus};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Read-only aggregate over a professional's commissions.
///
/// Cancelled and disputed rows sit outside every partition and outside
/// the totals; they are neither owed nor settled.
#[derive(Debug, Clone, Serialize)]
pub struct CommissionSummary {
    pub professional_id: Uuid,
    /// Month the summary is scoped to; `None` means all-time.
    pub period_month: Option<NaiveDate>,
    pub pending_count: i64,
    pub pending_amount: Decimal,
    pub approved_count: i64,
    pub approved_amount: Decimal,
    pub paid_count: i64,
    pub paid_amount: Decimal,
    pub total_count: i64,
    pub total_amount: Decimal,
    pub total_base_amount: Decimal,
}

impl CommissionSummary {
    fn empty(professional_id: Uuid, period_month: Option<NaiveDate>) -> Self {
        Self {
            professional_id,
            period_month,
            pending_count: 0,
            pending_amount: Decimal::ZERO,
            approved_count: 0,
            approved_amount: Decimal::ZERO,
            paid_count: 0,
            paid_amount: Decimal::ZERO,
            total_count: 0,
            total_amount: Decimal::ZERO,
            total_base_amount: Decimal::ZERO,
        }
    }
}

/// Whether a detail belongs to the calendar month of `period_month`.
///
/// Rows missing either period boundary belong to no period; they only
/// surface in the all-time mode.
fn in_period(detail: &CommissionDetail, period_month: NaiveDate) -> bool {
    match (detail.period_start, detail.period_end) {
        (Some(start), Some(_)) => {
            start.year() == period_month.year() && start.month() == period_month.month()
        }
        _ => false,
    }
}

/// Summarize a professional's commissions, optionally scoped to the
/// calendar month containing `period_month`.
pub fn summarize(
    details: &[CommissionDetail],
    professional_id: Uuid,
    period_month: Option<NaiveDate>,
) -> CommissionSummary {
    let mut summary = CommissionSummary::empty(professional_id, period_month);

    for detail in details {
        if detail.professional_id != professional_id {
            continue;
        }
        if let Some(month) = period_month {
            if !in_period(detail, month) {
                continue;
            }
        }

        match detail.status() {
            CommissionStatus::Pending => {
                summary.pending_count += 1;
                summary.pending_amount += detail.commission_amount;
            }
            CommissionStatus::Approved => {
                summary.approved_count += 1;
                summary.approved_amount += detail.commission_amount;
            }
            CommissionStatus::Paid => {
                summary.paid_count += 1;
                summary.paid_amount += detail.commission_amount;
            }
            CommissionStatus::Cancelled | CommissionStatus::Disputed => continue,
        }

        summary.total_count += 1;
        summary.total_amount += detail.commission_amount;
        summary.total_base_amount += detail.base_amount;
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CommissionSettings, CreateCommission, ReferenceType};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn detail(
        professional_id: Uuid,
        amount: Decimal,
        status: CommissionStatus,
        period_start: Option<NaiveDate>,
    ) -> CommissionDetail {
        let input = CreateCommission {
            clinic_id: Uuid::new_v4(),
            professional_id,
            professional_name: "Dr. Demo".to_string(),
            reference_type: ReferenceType::Session,
            reference_id: Uuid::new_v4(),
            base_amount: amount * dec!(10),
            rate: Some(dec!(0.1)),
            period_start,
            period_end: period_start.map(|d| d + chrono::Days::new(27)),
            notes: None,
        };
        let mut d = crate::domain::accrue(
            &input,
            &CommissionSettings::default_for(input.clinic_id),
            Utc::now(),
        )
        .unwrap();
        d.status = status.as_str().to_string();
        d
    }

    fn feb() -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2026, 2, 1)
    }

    #[test]
    fn test_partitions_by_status_with_grand_totals() {
        let pro = Uuid::new_v4();
        let details = vec![
            detail(pro, dec!(100), CommissionStatus::Pending, feb()),
            detail(pro, dec!(200), CommissionStatus::Approved, feb()),
            detail(pro, dec!(300), CommissionStatus::Paid, feb()),
        ];

        let summary = summarize(&details, pro, feb());

        assert_eq!(summary.pending_amount, dec!(100.00));
        assert_eq!(summary.approved_amount, dec!(200.00));
        assert_eq!(summary.paid_amount, dec!(300.00));
        assert_eq!(summary.total_amount, dec!(600.00));
        assert_eq!(summary.total_count, 3);
        assert_eq!(summary.total_base_amount, dec!(6000));
    }

    #[test]
    fn test_other_professionals_are_excluded() {
        let pro = Uuid::new_v4();
        let details = vec![
            detail(pro, dec!(100), CommissionStatus::Pending, feb()),
            detail(Uuid::new_v4(), dec!(999), CommissionStatus::Pending, feb()),
        ];

        let summary = summarize(&details, pro, feb());
        assert_eq!(summary.pending_amount, dec!(100.00));
        assert_eq!(summary.total_count, 1);
    }

    #[test]
    fn test_cancelled_and_disputed_sit_outside_totals() {
        let pro = Uuid::new_v4();
        let details = vec![
            detail(pro, dec!(100), CommissionStatus::Pending, feb()),
            detail(pro, dec!(200), CommissionStatus::Cancelled, feb()),
            detail(pro, dec!(300), CommissionStatus::Disputed, feb()),
        ];

        let summary = summarize(&details, pro, feb());
        assert_eq!(summary.total_amount, dec!(100.00));
        assert_eq!(summary.total_count, 1);
    }

    #[test]
    fn test_period_scoping_excludes_other_months() {
        let pro = Uuid::new_v4();
        let details = vec![
            detail(pro, dec!(100), CommissionStatus::Paid, feb()),
            detail(
                pro,
                dec!(200),
                CommissionStatus::Paid,
                NaiveDate::from_ymd_opt(2026, 1, 1),
            ),
        ];

        let summary = summarize(&details, pro, feb());
        assert_eq!(summary.paid_amount, dec!(100.00));
    }

    #[test]
    fn test_rows_without_period_only_appear_all_time() {
        let pro = Uuid::new_v4();
        let details = vec![
            detail(pro, dec!(100), CommissionStatus::Paid, feb()),
            detail(pro, dec!(200), CommissionStatus::Paid, None),
        ];

        let scoped = summarize(&details, pro, feb());
        assert_eq!(scoped.paid_amount, dec!(100.00));

        let all_time = summarize(&details, pro, None);
        assert_eq!(all_time.paid_amount, dec!(300.00));
        assert_eq!(all_time.total_count, 2);
    }

    #[test]
    fn test_empty_input_yields_empty_summary() {
        let summary = summarize(&[], Uuid::new_v4(), None);
        assert_eq!(summary.total_count, 0);
        assert_eq!(summary.total_amount, dec!(0));
    }
}
