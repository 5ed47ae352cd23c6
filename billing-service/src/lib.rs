//! Billing service for the clinic platform.
//!
//! Owns invoices and payments, derives the reconciled state of every
//! invoice from its payment history, and computes clinic-wide billing
//! statistics. Presentation concerns live elsewhere; callers receive
//! plain data.

pub mod config;
pub mod domain;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
