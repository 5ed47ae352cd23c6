//! Commission state machine tests for commission-service.

mod common;

use chrono::Utc;
use commission_service::domain::{
    accrue, approve, cancel, dispute, mark_paid, recalculate, reopen, DomainError,
};
use commission_service::models::CommissionStatus;
use common::{accrual_input, auto_approve_settings, default_settings};
use rust_decimal_macros::dec;

#[test]
fn accrual_computes_commission_from_base_and_rate() {
    let detail = accrue(
        &accrual_input(dec!(1000), Some(dec!(0.1))),
        &default_settings(),
        Utc::now(),
    )
    .unwrap();

    assert_eq!(detail.commission_amount, dec!(100.00));
    assert_eq!(detail.status(), CommissionStatus::Pending);
    assert!(detail.approved_utc.is_none());
    assert!(detail.paid_utc.is_none());
}

#[test]
fn accrual_uses_clinic_default_rate_when_none_supplied() {
    let detail = accrue(&accrual_input(dec!(800), None), &default_settings(), Utc::now()).unwrap();

    assert_eq!(detail.rate, dec!(0.10));
    assert_eq!(detail.commission_amount, dec!(80.00));
}

#[test]
fn accrual_rejects_rate_outside_unit_interval() {
    let err = accrue(
        &accrual_input(dec!(1000), Some(dec!(1.5))),
        &default_settings(),
        Utc::now(),
    )
    .unwrap_err();
    assert!(matches!(err, DomainError::InvalidRate(_)));

    let err = accrue(
        &accrual_input(dec!(1000), Some(dec!(-0.01))),
        &default_settings(),
        Utc::now(),
    )
    .unwrap_err();
    assert!(matches!(err, DomainError::InvalidRate(_)));
}

#[test]
fn accrual_rejects_negative_base_amount() {
    let err = accrue(
        &accrual_input(dec!(-500), None),
        &default_settings(),
        Utc::now(),
    )
    .unwrap_err();
    assert!(matches!(err, DomainError::InvalidAmount(_)));
}

#[test]
fn auto_approve_setting_creates_approved_records() {
    let detail = accrue(
        &accrual_input(dec!(100), None),
        &auto_approve_settings(),
        Utc::now(),
    )
    .unwrap();

    assert_eq!(detail.status(), CommissionStatus::Approved);
    assert!(detail.approved_utc.is_some());
}

#[test]
fn lifecycle_pending_approved_paid() {
    let detail = accrue(&accrual_input(dec!(100), None), &default_settings(), Utc::now()).unwrap();

    let approved = approve(&detail, Utc::now()).unwrap();
    assert_eq!(approved.status(), CommissionStatus::Approved);

    let paid = mark_paid(&approved, Utc::now()).unwrap();
    assert_eq!(paid.status(), CommissionStatus::Paid);
    assert!(paid.paid_utc.is_some());
}

#[test]
fn paying_a_pending_commission_is_rejected() {
    let detail = accrue(&accrual_input(dec!(100), None), &default_settings(), Utc::now()).unwrap();

    let err = mark_paid(&detail, Utc::now()).unwrap_err();
    assert!(matches!(
        err,
        DomainError::InvalidTransition {
            from: CommissionStatus::Pending,
            to: CommissionStatus::Paid,
        }
    ));
}

#[test]
fn cancelling_a_paid_commission_is_rejected() {
    let detail = accrue(&accrual_input(dec!(100), None), &default_settings(), Utc::now()).unwrap();
    let paid = mark_paid(&approve(&detail, Utc::now()).unwrap(), Utc::now()).unwrap();

    let err = cancel(&paid).unwrap_err();
    assert!(matches!(
        err,
        DomainError::InvalidTransition {
            from: CommissionStatus::Paid,
            to: CommissionStatus::Cancelled,
        }
    ));
}

#[test]
fn approving_twice_is_rejected() {
    let detail = accrue(&accrual_input(dec!(100), None), &default_settings(), Utc::now()).unwrap();
    let approved = approve(&detail, Utc::now()).unwrap();

    let err = approve(&approved, Utc::now()).unwrap_err();
    assert!(matches!(err, DomainError::InvalidTransition { .. }));
}

#[test]
fn dispute_and_reopen_cycle_returns_to_pending() {
    let detail = accrue(&accrual_input(dec!(100), None), &default_settings(), Utc::now()).unwrap();

    let disputed = dispute(&detail, "base amount excludes the follow-up session").unwrap();
    assert_eq!(disputed.status(), CommissionStatus::Disputed);
    assert!(disputed
        .notes
        .as_deref()
        .unwrap()
        .contains("follow-up session"));

    let reopened = reopen(&disputed).unwrap();
    assert_eq!(reopened.status(), CommissionStatus::Pending);

    // A reopened commission can be recalculated and approved again.
    let recalculated = recalculate(&reopened, dec!(1500), dec!(0.1)).unwrap();
    assert_eq!(recalculated.commission_amount, dec!(150.00));
    let approved = approve(&recalculated, Utc::now()).unwrap();
    assert_eq!(approved.status(), CommissionStatus::Approved);
}

#[test]
fn disputing_an_approved_commission_is_allowed() {
    let detail = accrue(&accrual_input(dec!(100), None), &default_settings(), Utc::now()).unwrap();
    let approved = approve(&detail, Utc::now()).unwrap();

    let disputed = dispute(&approved, "duplicate accrual").unwrap();
    assert_eq!(disputed.status(), CommissionStatus::Disputed);
}

#[test]
fn recalculation_is_frozen_after_payment() {
    let detail = accrue(&accrual_input(dec!(1000), None), &default_settings(), Utc::now()).unwrap();
    let paid = mark_paid(&approve(&detail, Utc::now()).unwrap(), Utc::now()).unwrap();

    let err = recalculate(&paid, dec!(2000), dec!(0.1)).unwrap_err();
    assert!(matches!(err, DomainError::AmountFrozen(CommissionStatus::Paid)));
    // The stored amount is untouched.
    assert_eq!(paid.commission_amount, dec!(100.00));
}

#[test]
fn commission_amount_rounds_to_currency_precision() {
    let detail = accrue(
        &accrual_input(dec!(333.33), Some(dec!(0.075))),
        &default_settings(),
        Utc::now(),
    )
    .unwrap();

    // 333.33 * 0.075 = 24.99975 -> 25.00
    assert_eq!(detail.commission_amount, dec!(25.00));
}
