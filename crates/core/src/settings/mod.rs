//! Business settings.
//!
//! A single configuration record holds the company profile printed on
//! documents, quote and invoice terms, the flat tax rate and references to
//! uploaded branding assets.

pub mod error;
pub mod service;
pub mod types;

pub use error::SettingsError;
pub use service::SettingsService;
pub use types::{
    AssetKind, BrandingAssets, BusinessSettings, CompanyProfile, DocumentTerms, InvoiceSettings,
    QuoteSettings, SettingsPatch,
};
