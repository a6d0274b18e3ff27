//! Settings record.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::billing::DEFAULT_TAX_RATE;

/// Company details printed on quotes and invoices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyProfile {
    /// Legal name.
    pub name: String,
    /// Tax identification number.
    pub tax_id: String,
    /// Tax id verifier digit.
    pub verifier_digit: Option<String>,
    /// Phone.
    pub phone: String,
    /// Email.
    pub email: String,
    /// Street address.
    pub address: String,
    /// Legal representative.
    pub representative: Option<String>,
    /// Bank name.
    pub bank_name: Option<String>,
    /// Bank account number.
    pub bank_account: Option<String>,
    /// Bank account type (savings, checking).
    pub bank_account_type: Option<String>,
    /// Mobile payment handle.
    pub mobile_payment: Option<String>,
}

/// Quote defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSettings {
    /// Days a quote stays valid.
    pub validity_days: u32,
    /// Flat tax rate.
    pub tax_rate: Decimal,
    /// Terms printed at the bottom.
    pub terms: Vec<String>,
}

impl Default for QuoteSettings {
    fn default() -> Self {
        Self {
            validity_days: 15,
            tax_rate: DEFAULT_TAX_RATE,
            terms: vec![
                "50% of the total is due when this quote is approved.".to_string(),
                "The balance is due on delivery.".to_string(),
            ],
        }
    }
}

/// Invoice defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSettings {
    /// Terms printed at the bottom.
    pub terms: Vec<String>,
}

impl Default for InvoiceSettings {
    fn default() -> Self {
        Self {
            terms: vec!["Payment is due by the agreed date.".to_string()],
        }
    }
}

/// Stored names of uploaded branding files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrandingAssets {
    /// Company logo.
    pub logo: Option<String>,
    /// Background watermark.
    pub watermark: Option<String>,
    /// Mobile-payment logo.
    pub payment_logo: Option<String>,
}

/// Which branding file to replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// Company logo.
    Logo,
    /// Background watermark.
    Watermark,
    /// Mobile-payment logo.
    PaymentLogo,
}

impl AssetKind {
    /// Parses a path segment.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "logo" => Some(Self::Logo),
            "watermark" => Some(Self::Watermark),
            "payment_logo" => Some(Self::PaymentLogo),
            _ => None,
        }
    }
}

/// Which document's terms to replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentTerms {
    /// Quote terms.
    Quote,
    /// Invoice terms.
    Invoice,
}

/// The singleton settings record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessSettings {
    /// Company profile.
    pub company: CompanyProfile,
    /// Quote defaults.
    pub quote: QuoteSettings,
    /// Invoice defaults.
    pub invoice: InvoiceSettings,
    /// Branding files.
    pub assets: BrandingAssets,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

impl BusinessSettings {
    /// Default settings using the given tax rate and quote validity.
    #[must_use]
    pub fn with_defaults(tax_rate: Decimal, validity_days: u32) -> Self {
        Self {
            company: CompanyProfile::default(),
            quote: QuoteSettings {
                validity_days,
                tax_rate,
                ..QuoteSettings::default()
            },
            invoice: InvoiceSettings::default(),
            assets: BrandingAssets::default(),
            updated_at: Utc::now(),
        }
    }

    /// Returns the stored name of a branding asset.
    #[must_use]
    pub fn asset(&self, kind: AssetKind) -> Option<&str> {
        match kind {
            AssetKind::Logo => self.assets.logo.as_deref(),
            AssetKind::Watermark => self.assets.watermark.as_deref(),
            AssetKind::PaymentLogo => self.assets.payment_logo.as_deref(),
        }
    }

    /// Replaces a branding asset reference, returning the previous one.
    pub fn set_asset(&mut self, kind: AssetKind, stored_name: String) -> Option<String> {
        let slot = match kind {
            AssetKind::Logo => &mut self.assets.logo,
            AssetKind::Watermark => &mut self.assets.watermark,
            AssetKind::PaymentLogo => &mut self.assets.payment_logo,
        };
        slot.replace(stored_name)
    }
}

/// Partial update of the settings record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    /// Replacement company profile.
    pub company: Option<CompanyProfile>,
    /// Replacement quote validity.
    pub quote_validity_days: Option<u32>,
    /// Replacement tax rate.
    pub tax_rate: Option<Decimal>,
    /// Replacement quote terms.
    pub quote_terms: Option<Vec<String>>,
    /// Replacement invoice terms.
    pub invoice_terms: Option<Vec<String>>,
}
