//! A4 PDF rendering with the built-in Helvetica fonts.
//!
//! Layout positions are whole millimetres measured from the bottom-left
//! corner of the page.

use std::io::BufWriter;

use chrono::{DateTime, Duration, Utc};
use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    Point,
};
use rust_decimal::Decimal;

use super::DocumentRenderer;
use super::error::RenderError;
use crate::billing::{LineItem, round_money};
use crate::invoice::Invoice;
use crate::quote::{Customer, Quote};
use crate::settings::{BusinessSettings, CompanyProfile};

const PAGE_WIDTH: i16 = 210;
const PAGE_HEIGHT: i16 = 297;
const MARGIN: i16 = 15;
const TOP: i16 = 282;
const BOTTOM: i16 = 25;
const MAX_DESCRIPTION_CHARS: usize = 60;

const COL_DESCRIPTION: i16 = MARGIN;
const COL_QUANTITY: i16 = 120;
const COL_UNIT_PRICE: i16 = 140;
const COL_TOTAL: i16 = 170;

/// Renders quotes and invoices with printpdf.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfRenderer;

impl PdfRenderer {
    /// Creates the renderer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DocumentRenderer for PdfRenderer {
    fn render_quote_pdf(
        &self,
        quote: &Quote,
        settings: &BusinessSettings,
    ) -> Result<Vec<u8>, RenderError> {
        let mut page = Page::new(&format!("Quote {}", quote.number))?;
        let valid_until = quote.created_at + Duration::days(i64::from(settings.quote.validity_days));

        page.company_header(&settings.company);
        page.title("QUOTE", &quote.number, quote.created_at);
        page.text_at(
            &format!("Valid until: {}", valid_until.format("%Y-%m-%d")),
            10.0,
            COL_UNIT_PRICE,
            TOP - 20,
        );
        page.customer_block(&quote.customer);
        page.items(&quote.items);
        page.totals(&[
            ("Subtotal", quote.subtotal),
            ("Tax", quote.tax),
            ("TOTAL", quote.total),
        ]);
        page.terms(&settings.quote.terms);
        page.finish()
    }

    fn render_invoice_pdf(
        &self,
        invoice: &Invoice,
        settings: &BusinessSettings,
    ) -> Result<Vec<u8>, RenderError> {
        let mut page = Page::new(&format!("Invoice {}", invoice.number))?;

        page.company_header(&settings.company);
        page.title("INVOICE", &invoice.number, invoice.created_at);
        page.text_at(
            &format!("Quote: {}", invoice.quote_number),
            10.0,
            COL_UNIT_PRICE,
            TOP - 20,
        );
        page.text_at(
            &format!("Status: {}", invoice.status.as_str()),
            10.0,
            COL_UNIT_PRICE,
            TOP - 25,
        );
        page.customer_block(&invoice.customer);
        page.items(&invoice.items);
        page.totals(&[
            ("Subtotal", invoice.subtotal),
            ("Tax", invoice.tax),
            ("TOTAL", invoice.total),
            ("Paid", invoice.amount_paid),
            ("Balance due", invoice.balance_due()),
        ]);
        page.bank_details(&settings.company);
        page.terms(&settings.invoice.terms);
        page.finish()
    }
}

/// Cursor over a document that adds pages as the content grows.
struct Page {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: i16,
}

impl Page {
    fn new(title: &str) -> Result<Self, RenderError> {
        let (doc, page, layer) = PdfDocument::new(
            title,
            Mm(f32::from(PAGE_WIDTH)),
            Mm(f32::from(PAGE_HEIGHT)),
            "Layer 1",
        );
        let layer = doc.get_page(page).get_layer(layer);
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: TOP,
        })
    }

    fn text_at(&self, text: &str, size: f32, x: i16, y: i16) {
        self.layer
            .use_text(text, size, Mm(f32::from(x)), Mm(f32::from(y)), &self.regular);
    }

    fn bold_at(&self, text: &str, size: f32, x: i16, y: i16) {
        self.layer
            .use_text(text, size, Mm(f32::from(x)), Mm(f32::from(y)), &self.bold);
    }

    /// Moves the cursor down, starting a new page when it would pass the
    /// bottom margin.
    fn advance(&mut self, step: i16) {
        self.y -= step;
        if self.y < BOTTOM {
            let (page, layer) = self.doc.add_page(
                Mm(f32::from(PAGE_WIDTH)),
                Mm(f32::from(PAGE_HEIGHT)),
                "Layer 1",
            );
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = TOP;
        }
    }

    fn rule(&self) {
        let y = Mm(f32::from(self.y));
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(f32::from(MARGIN)), y), false),
                (Point::new(Mm(f32::from(PAGE_WIDTH - MARGIN)), y), false),
            ],
            is_closed: false,
        });
    }

    fn company_header(&mut self, company: &CompanyProfile) {
        let name = if company.name.is_empty() {
            "Company"
        } else {
            company.name.as_str()
        };
        self.bold_at(name, 16.0, MARGIN, self.y);
        self.advance(7);

        let tax_id = match &company.verifier_digit {
            Some(dv) if !company.tax_id.is_empty() => format!("Tax ID: {}-{dv}", company.tax_id),
            _ if !company.tax_id.is_empty() => format!("Tax ID: {}", company.tax_id),
            _ => String::new(),
        };
        for line in [tax_id, company.address.clone(), company.phone.clone(), company.email.clone()] {
            if !line.is_empty() {
                self.text_at(&line, 10.0, MARGIN, self.y);
                self.advance(5);
            }
        }
    }

    fn title(&self, label: &str, number: &str, date: DateTime<Utc>) {
        self.bold_at(label, 22.0, COL_UNIT_PRICE, TOP);
        self.bold_at(number, 12.0, COL_UNIT_PRICE, TOP - 8);
        self.text_at(
            &format!("Date: {}", date.format("%Y-%m-%d")),
            10.0,
            COL_UNIT_PRICE,
            TOP - 15,
        );
    }

    fn customer_block(&mut self, customer: &Customer) {
        self.y = self.y.min(TOP - 35);
        self.rule();
        self.advance(8);
        self.bold_at("Customer", 12.0, MARGIN, self.y);
        self.advance(6);

        let mut lines = vec![customer.name.clone()];
        lines.extend(customer.company.clone());
        lines.extend(customer.tax_id.as_ref().map(|t| format!("Tax ID: {t}")));
        lines.push(customer.email.clone());
        lines.push(customer.phone.clone());
        for line in lines {
            self.text_at(&line, 10.0, MARGIN, self.y);
            self.advance(5);
        }
        self.advance(5);
    }

    fn items(&mut self, items: &[LineItem]) {
        self.bold_at("Description", 10.0, COL_DESCRIPTION, self.y);
        self.bold_at("Qty", 10.0, COL_QUANTITY, self.y);
        self.bold_at("Unit price", 10.0, COL_UNIT_PRICE, self.y);
        self.bold_at("Total", 10.0, COL_TOTAL, self.y);
        self.advance(3);
        self.rule();
        self.advance(6);

        for (index, item) in items.iter().enumerate() {
            let description = truncate(&format!("{}. {}", index + 1, item.description));
            self.text_at(&description, 10.0, COL_DESCRIPTION, self.y);
            self.text_at(&item.quantity.to_string(), 10.0, COL_QUANTITY, self.y);
            self.text_at(&money(item.unit_price), 10.0, COL_UNIT_PRICE, self.y);
            self.text_at(&money(item.line_total()), 10.0, COL_TOTAL, self.y);
            self.advance(6);
        }
        self.rule();
        self.advance(8);
    }

    fn totals(&mut self, rows: &[(&str, Decimal)]) {
        for (label, amount) in rows {
            if *label == "TOTAL" {
                self.bold_at(&format!("{label}:"), 12.0, COL_UNIT_PRICE, self.y);
                self.bold_at(&money(*amount), 12.0, COL_TOTAL, self.y);
            } else {
                self.text_at(&format!("{label}:"), 10.0, COL_UNIT_PRICE, self.y);
                self.text_at(&money(*amount), 10.0, COL_TOTAL, self.y);
            }
            self.advance(6);
        }
        self.advance(4);
    }

    fn bank_details(&mut self, company: &CompanyProfile) {
        let lines: Vec<String> = [
            company.bank_name.as_ref().map(|b| format!("Bank: {b}")),
            company.bank_account.as_ref().map(|a| match &company.bank_account_type {
                Some(kind) => format!("Account ({kind}): {a}"),
                None => format!("Account: {a}"),
            }),
            company.mobile_payment.as_ref().map(|m| format!("Mobile payment: {m}")),
        ]
        .into_iter()
        .flatten()
        .collect();
        if lines.is_empty() {
            return;
        }

        self.bold_at("Payment details", 11.0, MARGIN, self.y);
        self.advance(6);
        for line in lines {
            self.text_at(&line, 10.0, MARGIN, self.y);
            self.advance(5);
        }
        self.advance(4);
    }

    fn terms(&mut self, terms: &[String]) {
        if terms.is_empty() {
            return;
        }
        self.bold_at("Terms", 11.0, MARGIN, self.y);
        self.advance(6);
        for term in terms {
            self.text_at(&format!("- {}", truncate(term)), 9.0, MARGIN, self.y);
            self.advance(5);
        }
    }

    fn finish(self) -> Result<Vec<u8>, RenderError> {
        let mut writer = BufWriter::new(Vec::<u8>::new());
        self.doc
            .save(&mut writer)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        writer
            .into_inner()
            .map_err(|e| RenderError::Pdf(e.to_string()))
    }
}

fn money(amount: Decimal) -> String {
    format!("{:.2}", round_money(amount))
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_DESCRIPTION_CHARS {
        text.to_string()
    } else {
        let mut short: String = text.chars().take(MAX_DESCRIPTION_CHARS - 3).collect();
        short.push_str("...");
        short
    }
}
