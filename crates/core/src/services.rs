//! Wiring of every service over one set of stores.

use std::sync::Arc;

use rust_decimal::Decimal;
use tally_shared::jwt::JwtService;

use crate::auth::AuthService;
use crate::invoice::InvoiceService;
use crate::journal::Journal;
use crate::notification::Notifier;
use crate::numbering::NumberingAuthority;
use crate::payment::PaymentLedger;
use crate::quote::QuoteService;
use crate::render::{DocumentRenderer, PdfRenderer};
use crate::reporting::ReportService;
use crate::settings::SettingsService;
use crate::storage::FileStore;
use crate::store::Stores;

/// Defaults that apply until business settings are saved.
#[derive(Debug, Clone, Copy)]
pub struct BillingDefaults {
    /// Flat tax rate.
    pub tax_rate: Decimal,
    /// Quote validity in days.
    pub quote_validity_days: u32,
}

impl From<&tally_shared::config::BillingConfig> for BillingDefaults {
    fn from(config: &tally_shared::config::BillingConfig) -> Self {
        Self {
            tax_rate: config.tax_rate,
            quote_validity_days: config.quote_validity_days,
        }
    }
}

/// Every domain service, cheap to clone.
#[derive(Clone)]
pub struct Services {
    /// Users and credentials.
    pub auth: AuthService,
    /// Quotes.
    pub quotes: QuoteService,
    /// Invoices.
    pub invoices: InvoiceService,
    /// Payments.
    pub payments: PaymentLedger,
    /// Journal.
    pub journal: Journal,
    /// Reports and exports.
    pub reports: ReportService,
    /// Business settings.
    pub settings: SettingsService,
    /// Notifications.
    pub notifier: Notifier,
    /// PDF and CSV output.
    pub renderer: Arc<dyn DocumentRenderer>,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}

impl Services {
    /// Builds the services with the PDF renderer.
    #[must_use]
    pub fn build(
        stores: &Stores,
        files: FileStore,
        jwt: Arc<JwtService>,
        defaults: BillingDefaults,
    ) -> Self {
        Self::with_renderer(stores, files, jwt, defaults, Arc::new(PdfRenderer::new()))
    }

    /// Builds the services with a custom renderer.
    #[must_use]
    pub fn with_renderer(
        stores: &Stores,
        files: FileStore,
        jwt: Arc<JwtService>,
        defaults: BillingDefaults,
        renderer: Arc<dyn DocumentRenderer>,
    ) -> Self {
        let numbering = NumberingAuthority::new(stores.counters.clone());
        let notifier = Notifier::new(stores.notifications.clone());
        let journal = Journal::new(stores.journal.clone());
        let settings = SettingsService::new(
            stores.settings.clone(),
            files.clone(),
            defaults.tax_rate,
            defaults.quote_validity_days,
        );
        let payments = PaymentLedger::new(
            stores.payments.clone(),
            stores.invoices.clone(),
            files,
            notifier.clone(),
        );

        Self {
            auth: AuthService::new(stores.users.clone(), jwt, notifier.clone()),
            quotes: QuoteService::new(stores.quotes.clone(), numbering.clone(), settings.clone()),
            invoices: InvoiceService::new(
                stores.invoices.clone(),
                stores.quotes.clone(),
                numbering,
                payments.clone(),
                notifier.clone(),
            ),
            reports: ReportService::new(
                stores.quotes.clone(),
                stores.invoices.clone(),
                stores.payments.clone(),
                journal.clone(),
                renderer.clone(),
            ),
            payments,
            journal,
            settings,
            notifier,
            renderer,
        }
    }
}
