//! Settings service.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use super::error::SettingsError;
use super::types::{AssetKind, BusinessSettings, CompanyProfile, DocumentTerms, SettingsPatch};
use crate::auth::Actor;
use crate::storage::FileStore;
use crate::store::SettingsStore;

/// Reads and changes the business settings record.
#[derive(Clone)]
pub struct SettingsService {
    store: Arc<dyn SettingsStore>,
    files: FileStore,
    default_tax_rate: Decimal,
    default_validity_days: u32,
}

impl std::fmt::Debug for SettingsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsService")
            .field("default_tax_rate", &self.default_tax_rate)
            .field("default_validity_days", &self.default_validity_days)
            .finish_non_exhaustive()
    }
}

impl SettingsService {
    /// Creates the service. The defaults apply until settings are saved.
    #[must_use]
    pub fn new(
        store: Arc<dyn SettingsStore>,
        files: FileStore,
        default_tax_rate: Decimal,
        default_validity_days: u32,
    ) -> Self {
        Self {
            store,
            files,
            default_tax_rate,
            default_validity_days,
        }
    }

    /// Returns the saved settings, or the defaults when none were saved.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Store` if the store fails.
    pub async fn get(&self) -> Result<BusinessSettings, SettingsError> {
        Ok(self.store.load_settings().await?.unwrap_or_else(|| {
            BusinessSettings::with_defaults(self.default_tax_rate, self.default_validity_days)
        }))
    }

    /// The tax rate applied to new quotes.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Store` if the store fails.
    pub async fn tax_rate(&self) -> Result<Decimal, SettingsError> {
        Ok(self.get().await?.quote.tax_rate)
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an out-of-range tax rate, a zero
    /// validity or a blank company name.
    pub async fn update(
        &self,
        actor: &Actor,
        patch: SettingsPatch,
    ) -> Result<BusinessSettings, SettingsError> {
        if let Some(rate) = patch.tax_rate
            && (rate < Decimal::ZERO || rate > Decimal::ONE)
        {
            return Err(SettingsError::InvalidTaxRate(rate));
        }
        if patch.quote_validity_days == Some(0) {
            return Err(SettingsError::InvalidValidity);
        }
        if let Some(company) = &patch.company {
            validate_company(company)?;
        }

        let mut settings = self.get().await?;
        if let Some(company) = patch.company {
            settings.company = company;
        }
        if let Some(days) = patch.quote_validity_days {
            settings.quote.validity_days = days;
        }
        if let Some(rate) = patch.tax_rate {
            settings.quote.tax_rate = rate;
        }
        if let Some(terms) = patch.quote_terms {
            settings.quote.terms = clean_terms(terms);
        }
        if let Some(terms) = patch.invoice_terms {
            settings.invoice.terms = clean_terms(terms);
        }
        self.save(actor, settings).await
    }

    /// Replaces the company profile.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::BlankCompanyName` if the name is blank.
    pub async fn update_company(
        &self,
        actor: &Actor,
        company: CompanyProfile,
    ) -> Result<BusinessSettings, SettingsError> {
        validate_company(&company)?;
        let mut settings = self.get().await?;
        settings.company = company;
        self.save(actor, settings).await
    }

    /// Replaces the terms of one document type. Blank lines are dropped.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Store` if the store fails.
    pub async fn update_terms(
        &self,
        actor: &Actor,
        document: DocumentTerms,
        terms: Vec<String>,
    ) -> Result<BusinessSettings, SettingsError> {
        let mut settings = self.get().await?;
        let terms = clean_terms(terms);
        match document {
            DocumentTerms::Quote => settings.quote.terms = terms,
            DocumentTerms::Invoice => settings.invoice.terms = terms,
        }
        self.save(actor, settings).await
    }

    /// Stores a branding file and points the settings at it. The previous
    /// file, if any, is deleted on a best-effort basis.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Storage` when the upload is rejected or the
    /// file store fails.
    pub async fn attach_asset(
        &self,
        actor: &Actor,
        kind: AssetKind,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<BusinessSettings, SettingsError> {
        let stored = self.files.save(file_name, bytes).await?;
        let mut settings = self.get().await?;
        let previous = settings.set_asset(kind, stored.name);
        let settings = self.save(actor, settings).await?;

        if let Some(previous) = previous
            && let Err(e) = self.files.delete(&previous).await
        {
            tracing::warn!(error = %e, file = %previous, "failed to delete replaced asset");
        }
        Ok(settings)
    }

    /// Reads a branding file, if one is set.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Storage` if the file store fails.
    pub async fn read_asset(&self, kind: AssetKind) -> Result<Option<Vec<u8>>, SettingsError> {
        let settings = self.get().await?;
        match settings.asset(kind) {
            Some(name) => Ok(Some(self.files.read(name).await?)),
            None => Ok(None),
        }
    }

    async fn save(
        &self,
        actor: &Actor,
        mut settings: BusinessSettings,
    ) -> Result<BusinessSettings, SettingsError> {
        settings.updated_at = Utc::now();
        self.store.save_settings(&settings).await?;
        tracing::info!(user_id = %actor.user_id, "business settings updated");
        Ok(settings)
    }
}

fn validate_company(company: &CompanyProfile) -> Result<(), SettingsError> {
    if company.name.trim().is_empty() {
        return Err(SettingsError::BlankCompanyName);
    }
    Ok(())
}

fn clean_terms(terms: Vec<String>) -> Vec<String> {
    terms
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::UserRole;
    use crate::store::memory::MemoryStore;
    use rust_decimal_macros::dec;
    use tally_shared::types::UserId;

    fn service() -> SettingsService {
        SettingsService::new(
            Arc::new(MemoryStore::new()),
            FileStore::memory().unwrap(),
            dec!(0.07),
            15,
        )
    }

    fn admin() -> Actor {
        Actor::new(UserId::new(), "admin@example.com", UserRole::Admin)
    }

    #[tokio::test]
    async fn test_defaults_when_unset() {
        let settings = service().get().await.unwrap();
        assert_eq!(settings.quote.tax_rate, dec!(0.07));
        assert_eq!(settings.quote.validity_days, 15);
        assert!(!settings.quote.terms.is_empty());
    }

    #[tokio::test]
    async fn test_update_tax_rate_feeds_tax_rate() {
        let service = service();
        let patch = SettingsPatch {
            tax_rate: Some(dec!(0.16)),
            ..SettingsPatch::default()
        };
        service.update(&admin(), patch).await.unwrap();
        assert_eq!(service.tax_rate().await.unwrap(), dec!(0.16));
    }

    #[tokio::test]
    async fn test_update_rejects_bad_values() {
        let service = service();
        let bad_rate = SettingsPatch {
            tax_rate: Some(dec!(1.5)),
            ..SettingsPatch::default()
        };
        assert!(matches!(
            service.update(&admin(), bad_rate).await,
            Err(SettingsError::InvalidTaxRate(_))
        ));

        let zero_days = SettingsPatch {
            quote_validity_days: Some(0),
            ..SettingsPatch::default()
        };
        assert!(matches!(
            service.update(&admin(), zero_days).await,
            Err(SettingsError::InvalidValidity)
        ));

        let blank = CompanyProfile::default();
        assert!(matches!(
            service.update_company(&admin(), blank).await,
            Err(SettingsError::BlankCompanyName)
        ));
    }

    #[tokio::test]
    async fn test_update_terms_drops_blank_lines() {
        let service = service();
        let settings = service
            .update_terms(
                &admin(),
                DocumentTerms::Invoice,
                vec!["  Net 30 ".to_string(), "   ".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(settings.invoice.terms, vec!["Net 30".to_string()]);
    }

    #[tokio::test]
    async fn test_attach_asset_replaces_previous() {
        let service = service();
        let first = service
            .attach_asset(&admin(), AssetKind::Logo, "logo.png", vec![1])
            .await
            .unwrap();
        let first_name = first.assets.logo.clone().unwrap();

        let second = service
            .attach_asset(&admin(), AssetKind::Logo, "logo.png", vec![2])
            .await
            .unwrap();
        assert_ne!(second.assets.logo.as_deref(), Some(first_name.as_str()));
        assert!(!service.files.exists(&first_name).await);
        assert_eq!(
            service.read_asset(AssetKind::Logo).await.unwrap(),
            Some(vec![2])
        );
        assert_eq!(service.read_asset(AssetKind::Watermark).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_attach_asset_rejects_disallowed_type() {
        let err = service()
            .attach_asset(&admin(), AssetKind::Logo, "logo.exe", vec![1])
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "DISALLOWED_FILE_TYPE");
    }
}
