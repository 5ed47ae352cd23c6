//! Commission accrual and the status state machine.
//!
//! Lifecycle: `pending -> approved -> paid`, with `pending|approved ->
//! cancelled`, `pending|approved -> disputed`, and `disputed -> pending`
//! (reopen). A dispute can also be approved directly. `paid` and
//! `cancelled` are terminal.

use super::DomainError;
use crate::models::{CommissionDetail, CommissionSettings, CommissionStatus, CreateCommission};
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

/// Round a monetary amount to currency precision.
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn validate_rate(rate: Decimal) -> Result<Decimal, DomainError> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(DomainError::InvalidRate(rate));
    }
    Ok(rate)
}

/// Accrue a commission from a revenue event.
///
/// The explicit `rate` wins when supplied; otherwise the clinic's
/// default applies. With `auto_approve` set the record is born already
/// approved.
pub fn accrue(
    input: &CreateCommission,
    settings: &CommissionSettings,
    now: DateTime<Utc>,
) -> Result<CommissionDetail, DomainError> {
    if input.base_amount < Decimal::ZERO {
        return Err(DomainError::InvalidAmount(input.base_amount));
    }
    let rate = validate_rate(input.rate.unwrap_or(settings.default_rate))?;

    let (status, approved_utc) = if settings.auto_approve {
        (CommissionStatus::Approved, Some(now))
    } else {
        (CommissionStatus::Pending, None)
    };

    Ok(CommissionDetail {
        commission_id: Uuid::new_v4(),
        clinic_id: input.clinic_id,
        professional_id: input.professional_id,
        professional_name: input.professional_name.clone(),
        reference_type: input.reference_type.as_str().to_string(),
        reference_id: input.reference_id,
        base_amount: input.base_amount,
        rate,
        commission_amount: round_currency(input.base_amount * rate),
        status: status.as_str().to_string(),
        period_start: input.period_start,
        period_end: input.period_end,
        notes: input.notes.clone(),
        created_utc: now,
        approved_utc,
        paid_utc: None,
    })
}

fn transition(
    detail: &CommissionDetail,
    allowed_from: &[CommissionStatus],
    to: CommissionStatus,
) -> Result<CommissionDetail, DomainError> {
    let from = detail.status();
    if !allowed_from.contains(&from) {
        return Err(DomainError::InvalidTransition { from, to });
    }
    let mut next = detail.clone();
    next.status = to.as_str().to_string();
    Ok(next)
}

/// Approve a pending or disputed commission.
pub fn approve(
    detail: &CommissionDetail,
    now: DateTime<Utc>,
) -> Result<CommissionDetail, DomainError> {
    let mut next = transition(
        detail,
        &[CommissionStatus::Pending, CommissionStatus::Disputed],
        CommissionStatus::Approved,
    )?;
    next.approved_utc = Some(now);
    Ok(next)
}

/// Mark an approved commission as paid. Freezes the amount.
pub fn mark_paid(
    detail: &CommissionDetail,
    now: DateTime<Utc>,
) -> Result<CommissionDetail, DomainError> {
    let mut next = transition(detail, &[CommissionStatus::Approved], CommissionStatus::Paid)?;
    next.paid_utc = Some(now);
    Ok(next)
}

/// Dispute a pending or approved commission, recording the reason.
pub fn dispute(detail: &CommissionDetail, note: &str) -> Result<CommissionDetail, DomainError> {
    let mut next = transition(
        detail,
        &[CommissionStatus::Pending, CommissionStatus::Approved],
        CommissionStatus::Disputed,
    )?;
    next.notes = match next.notes.take() {
        Some(existing) => Some(format!("{}\n{}", existing, note)),
        None => Some(note.to_string()),
    };
    Ok(next)
}

/// Reopen a disputed commission for recalculation.
pub fn reopen(detail: &CommissionDetail) -> Result<CommissionDetail, DomainError> {
    let mut next = transition(
        detail,
        &[CommissionStatus::Disputed],
        CommissionStatus::Pending,
    )?;
    next.approved_utc = None;
    Ok(next)
}

/// Cancel a pending or approved commission.
///
/// A paid commission requires a reversal record, not cancellation.
pub fn cancel(detail: &CommissionDetail) -> Result<CommissionDetail, DomainError> {
    transition(
        detail,
        &[CommissionStatus::Pending, CommissionStatus::Approved],
        CommissionStatus::Cancelled,
    )
}

/// Recompute the derived amount after a base or rate change.
///
/// Illegal once the record is terminal: the amount is frozen at payment
/// and meaningless after cancellation.
pub fn recalculate(
    detail: &CommissionDetail,
    base_amount: Decimal,
    rate: Decimal,
) -> Result<CommissionDetail, DomainError> {
    let status = detail.status();
    if status.is_terminal() {
        return Err(DomainError::AmountFrozen(status));
    }
    if base_amount < Decimal::ZERO {
        return Err(DomainError::InvalidAmount(base_amount));
    }
    let rate = validate_rate(rate)?;

    let mut next = detail.clone();
    next.base_amount = base_amount;
    next.rate = rate;
    next.commission_amount = round_currency(base_amount * rate);
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReferenceType;
    use rust_decimal_macros::dec;

    fn settings() -> CommissionSettings {
        CommissionSettings::default_for(Uuid::new_v4())
    }

    fn create_input(base: Decimal, rate: Option<Decimal>) -> CreateCommission {
        CreateCommission {
            clinic_id: Uuid::new_v4(),
            professional_id: Uuid::new_v4(),
            professional_name: "Dr. Demo".to_string(),
            reference_type: ReferenceType::Session,
            reference_id: Uuid::new_v4(),
            base_amount: base,
            rate,
            period_start: None,
            period_end: None,
            notes: None,
        }
    }

    #[test]
    fn test_accrue_computes_amount_from_rate() {
        let detail = accrue(&create_input(dec!(1000), Some(dec!(0.1))), &settings(), Utc::now())
            .unwrap();
        assert_eq!(detail.commission_amount, dec!(100.00));
        assert_eq!(detail.status(), CommissionStatus::Pending);
        assert!(detail.approved_utc.is_none());
    }

    #[test]
    fn test_accrue_falls_back_to_default_rate() {
        let detail = accrue(&create_input(dec!(500), None), &settings(), Utc::now()).unwrap();
        assert_eq!(detail.rate, dec!(0.10));
        assert_eq!(detail.commission_amount, dec!(50.00));
    }

    #[test]
    fn test_accrue_rounds_to_currency_precision() {
        let detail = accrue(
            &create_input(dec!(33.33), Some(dec!(0.15))),
            &settings(),
            Utc::now(),
        )
        .unwrap();
        // 33.33 * 0.15 = 4.9995, rounds away from zero to 5.00
        assert_eq!(detail.commission_amount, dec!(5.00));
    }

    #[test]
    fn test_accrue_rejects_rate_above_one() {
        let err = accrue(&create_input(dec!(1000), Some(dec!(1.5))), &settings(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidRate(_)));
    }

    #[test]
    fn test_accrue_rejects_negative_rate() {
        let err = accrue(&create_input(dec!(1000), Some(dec!(-0.1))), &settings(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidRate(_)));
    }

    #[test]
    fn test_accrue_rejects_negative_base() {
        let err =
            accrue(&create_input(dec!(-10), None), &settings(), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidAmount(_)));
    }

    #[test]
    fn test_accrue_with_auto_approve_starts_approved() {
        let mut cfg = settings();
        cfg.auto_approve = true;
        let detail = accrue(&create_input(dec!(100), None), &cfg, Utc::now()).unwrap();
        assert_eq!(detail.status(), CommissionStatus::Approved);
        assert!(detail.approved_utc.is_some());
    }

    #[test]
    fn test_approve_then_pay_happy_path() {
        let detail = accrue(&create_input(dec!(100), None), &settings(), Utc::now()).unwrap();
        let approved = approve(&detail, Utc::now()).unwrap();
        assert_eq!(approved.status(), CommissionStatus::Approved);
        assert!(approved.approved_utc.is_some());

        let paid = mark_paid(&approved, Utc::now()).unwrap();
        assert_eq!(paid.status(), CommissionStatus::Paid);
        assert!(paid.paid_utc.is_some());
    }

    #[test]
    fn test_mark_paid_from_pending_is_illegal() {
        let detail = accrue(&create_input(dec!(100), None), &settings(), Utc::now()).unwrap();
        let err = mark_paid(&detail, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
    }

    #[test]
    fn test_cancel_paid_commission_is_illegal() {
        let detail = accrue(&create_input(dec!(100), None), &settings(), Utc::now()).unwrap();
        let approved = approve(&detail, Utc::now()).unwrap();
        let paid = mark_paid(&approved, Utc::now()).unwrap();

        let err = cancel(&paid).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
    }

    #[test]
    fn test_cancel_from_pending_and_approved() {
        let detail = accrue(&create_input(dec!(100), None), &settings(), Utc::now()).unwrap();
        assert_eq!(cancel(&detail).unwrap().status(), CommissionStatus::Cancelled);

        let approved = approve(&detail, Utc::now()).unwrap();
        assert_eq!(
            cancel(&approved).unwrap().status(),
            CommissionStatus::Cancelled
        );
    }

    #[test]
    fn test_dispute_records_note_and_reopen_returns_to_pending() {
        let detail = accrue(&create_input(dec!(100), None), &settings(), Utc::now()).unwrap();
        let disputed = dispute(&detail, "rate looks wrong").unwrap();
        assert_eq!(disputed.status(), CommissionStatus::Disputed);
        assert!(disputed.notes.as_deref().unwrap().contains("rate looks wrong"));

        let reopened = reopen(&disputed).unwrap();
        assert_eq!(reopened.status(), CommissionStatus::Pending);
        assert!(reopened.approved_utc.is_none());
    }

    #[test]
    fn test_disputed_commission_can_be_approved_directly() {
        let detail = accrue(&create_input(dec!(100), None), &settings(), Utc::now()).unwrap();
        let disputed = dispute(&detail, "check base").unwrap();
        let approved = approve(&disputed, Utc::now()).unwrap();
        assert_eq!(approved.status(), CommissionStatus::Approved);
    }

    #[test]
    fn test_dispute_paid_commission_is_illegal() {
        let detail = accrue(&create_input(dec!(100), None), &settings(), Utc::now()).unwrap();
        let approved = approve(&detail, Utc::now()).unwrap();
        let paid = mark_paid(&approved, Utc::now()).unwrap();

        let err = dispute(&paid, "too late").unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
    }

    #[test]
    fn test_recalculate_updates_amount_before_payment() {
        let detail = accrue(&create_input(dec!(1000), Some(dec!(0.1))), &settings(), Utc::now())
            .unwrap();
        let updated = recalculate(&detail, dec!(2000), dec!(0.2)).unwrap();
        assert_eq!(updated.commission_amount, dec!(400.00));
    }

    #[test]
    fn test_recalculate_after_payment_is_frozen() {
        let detail = accrue(&create_input(dec!(1000), None), &settings(), Utc::now()).unwrap();
        let approved = approve(&detail, Utc::now()).unwrap();
        let paid = mark_paid(&approved, Utc::now()).unwrap();

        let err = recalculate(&paid, dec!(2000), dec!(0.2)).unwrap_err();
        assert!(matches!(err, DomainError::AmountFrozen(CommissionStatus::Paid)));
    }

    #[test]
    fn test_recalculate_rejects_bad_rate() {
        let detail = accrue(&create_input(dec!(1000), None), &settings(), Utc::now()).unwrap();
        let err = recalculate(&detail, dec!(1000), dec!(2)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidRate(_)));
    }
}
