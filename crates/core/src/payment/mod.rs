//! Payment ledger.
//!
//! Records payments against invoices. The sum of all recorded payments
//! (pending and confirmed) never exceeds the invoice total; the check and
//! the insert happen in one atomic store operation. Every payment posts a
//! pending journal entry moving the amount from receivables to cash.

pub mod error;
pub mod rules;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::PaymentError;
pub use rules::{PaymentAdmission, admit_payment, outstanding_balance};
pub use service::PaymentLedger;
pub use types::{
    MethodStats, MethodTotal, NewPayment, Payment, PaymentFilter, PaymentState, PaymentSummary,
};
