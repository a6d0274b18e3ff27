//! Invoice service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use tally_shared::types::{InvoiceId, PageRequest, PageResponse, QuoteId};
use tracing::info;

use super::error::InvoiceError;
use super::types::{Invoice, InvoiceFilter, InvoiceStats, QuoteConversion};
use crate::auth::Actor;
use crate::notification::{NotificationKind, Notifier};
use crate::numbering::{DocumentKind, NumberingAuthority};
use crate::payment::{NewPayment, Payment, PaymentError, PaymentLedger};
use crate::quote::QuoteStatus;
use crate::store::{InvoiceStore, QuoteStore};

/// Derives invoices from approved quotes and tracks their settlement.
#[derive(Clone)]
pub struct InvoiceService {
    invoices: Arc<dyn InvoiceStore>,
    quotes: Arc<dyn QuoteStore>,
    numbering: NumberingAuthority,
    payments: PaymentLedger,
    notifier: Notifier,
}

impl std::fmt::Debug for InvoiceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvoiceService").finish_non_exhaustive()
    }
}

impl InvoiceService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        invoices: Arc<dyn InvoiceStore>,
        quotes: Arc<dyn QuoteStore>,
        numbering: NumberingAuthority,
        payments: PaymentLedger,
        notifier: Notifier,
    ) -> Self {
        Self {
            invoices,
            quotes,
            numbering,
            payments,
            notifier,
        }
    }

    /// Converts an approved quote into a pending invoice.
    ///
    /// The invoice insert and the quote's `approved → invoiced` flip happen
    /// in one store operation; of two concurrent conversions only one wins.
    ///
    /// # Errors
    ///
    /// Returns `QuoteNotFound` or `QuoteNotApproved`.
    pub async fn create_from_quote(
        &self,
        actor: &Actor,
        quote_id: QuoteId,
    ) -> Result<Invoice, InvoiceError> {
        let quote = self
            .quotes
            .get_quote(quote_id)
            .await?
            .ok_or(InvoiceError::QuoteNotFound(quote_id))?;
        if quote.status != QuoteStatus::Approved {
            return Err(InvoiceError::QuoteNotApproved {
                quote_id,
                status: quote.status,
            });
        }

        let number = self.numbering.next_for_today(DocumentKind::Invoice).await?;
        let invoice = Invoice::from_quote(&quote, number.to_string(), actor.user_id, Utc::now());

        match self.invoices.convert_quote(&invoice).await? {
            QuoteConversion::Converted => {}
            QuoteConversion::QuoteMissing => return Err(InvoiceError::QuoteNotFound(quote_id)),
            QuoteConversion::QuoteNotApproved(status) => {
                return Err(InvoiceError::QuoteNotApproved { quote_id, status });
            }
        }

        info!(
            invoice_id = %invoice.id,
            number = %invoice.number,
            quote_number = %invoice.quote_number,
            total = %invoice.total,
            "invoice created"
        );
        self.notifier
            .notify(
                actor.user_id,
                NotificationKind::InvoiceCreated,
                format!("Invoice {} created from quote {}", invoice.number, invoice.quote_number),
                json!({
                    "invoiceId": invoice.id,
                    "invoiceNumber": invoice.number,
                    "quoteId": invoice.quote_id,
                    "total": invoice.total,
                }),
            )
            .await;

        Ok(invoice)
    }

    /// Records a pending payment against an invoice. The invoice becomes
    /// paid only once confirmed payments reach its total.
    ///
    /// # Errors
    ///
    /// See [`PaymentLedger::create`].
    pub async fn register_payment(
        &self,
        actor: &Actor,
        invoice_id: InvoiceId,
        amount: Decimal,
        method: &str,
        reference: Option<String>,
    ) -> Result<Payment, PaymentError> {
        let input = NewPayment {
            invoice_id,
            amount,
            method: method.to_string(),
            reference,
            notes: None,
            paid_at: None,
        };
        self.payments.create(actor, input).await
    }

    /// Recomputes the confirmed-payment sum and derives the status.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::NotFound` for unknown ids.
    pub async fn settle(
        &self,
        id: InvoiceId,
        method: &str,
        at: DateTime<Utc>,
    ) -> Result<Invoice, InvoiceError> {
        self.invoices
            .settle_invoice(id, method, at)
            .await?
            .ok_or(InvoiceError::NotFound(id))
    }

    /// Loads an invoice.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::NotFound` for unknown ids.
    pub async fn get(&self, id: InvoiceId) -> Result<Invoice, InvoiceError> {
        self.invoices
            .get_invoice(id)
            .await?
            .ok_or(InvoiceError::NotFound(id))
    }

    /// Lists invoices matching the filter, newest first, one page at a time.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` or a store failure.
    pub async fn list(
        &self,
        filter: &InvoiceFilter,
        page: PageRequest,
    ) -> Result<PageResponse<Invoice>, InvoiceError> {
        if let (Some(from), Some(to)) = (filter.from, filter.to)
            && from > to
        {
            return Err(InvoiceError::InvalidDateRange);
        }
        let invoices = self.invoices.list_invoices(filter).await?;
        Ok(page.normalized().slice(invoices))
    }

    /// Invoices not yet fully paid, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::Store` if the store fails.
    pub async fn pending(&self) -> Result<Vec<Invoice>, InvoiceError> {
        let filter = InvoiceFilter {
            unpaid_only: true,
            ..InvoiceFilter::default()
        };
        let mut invoices = self.invoices.list_invoices(&filter).await?;
        invoices.sort_by_key(|i| i.created_at);
        Ok(invoices)
    }

    /// Counts per status, total and average amount, total collected.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::Store` if the store fails.
    pub async fn stats(&self) -> Result<InvoiceStats, InvoiceError> {
        let invoices = self.invoices.list_invoices(&InvoiceFilter::default()).await?;
        Ok(InvoiceStats::from_invoices(&invoices))
    }
}
