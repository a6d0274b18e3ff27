//! `SeaORM` entity definitions.
//!
//! One module per table created by the initial migration.

pub mod business_settings;
pub mod document_counters;
pub mod invoices;
pub mod journal_entries;
pub mod notifications;
pub mod payments;
pub mod quotes;
pub mod users;
