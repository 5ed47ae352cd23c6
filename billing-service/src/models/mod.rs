//! Domain models for billing-service.

mod invoice;
mod payment;

pub use invoice::{CreateInvoice, Invoice, InvoiceStatus, ListInvoicesFilter};
pub use payment::{CreatePayment, Payment, PaymentMethod};
