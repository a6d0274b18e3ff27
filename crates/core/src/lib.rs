//! Core business logic for Tally.
//!
//! This crate contains the domain with ZERO web or database dependencies.
//! Persistence is reached only through the traits in [`store`].
//!
//! # Modules
//!
//! - `billing` - Line-item pricing, tax and totals
//! - `numbering` - Sequential per-year document numbers
//! - `quote` - Quote lifecycle
//! - `invoice` - Invoice lifecycle and payment status
//! - `payment` - Payment ledger with the outstanding-balance cap
//! - `journal` - Double-entry journal and financial statements
//! - `reporting` - Dashboards, analyses and CSV exports
//! - `settings` - Business profile, terms and branding
//! - `notification` - Per-user notifications and live feed
//! - `auth` - Users, passwords and login
//! - `render` - PDF and CSV output
//! - `storage` - Uploaded files over OpenDAL

pub mod auth;
pub mod billing;
pub mod invoice;
pub mod journal;
pub mod notification;
pub mod numbering;
pub mod payment;
pub mod quote;
pub mod render;
pub mod reporting;
pub mod services;
pub mod settings;
pub mod storage;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use services::{BillingDefaults, Services};
