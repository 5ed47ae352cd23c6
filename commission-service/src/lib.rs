//! Commission service for the clinic platform.
//!
//! Accrues professional commissions from revenue-generating events,
//! drives each accrual through its approval/payout state machine, and
//! produces per-professional, per-period summaries.

pub mod config;
pub mod domain;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
