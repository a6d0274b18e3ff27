//! Initial schema.
//!
//! Creates every table used by the PostgreSQL stores. Money columns are
//! `NUMERIC(14, 2)`; line items and postings are JSONB snapshots.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(SCHEMA_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const SCHEMA_SQL: &str = r"
-- ============================================================
-- USERS
-- ============================================================
CREATE TABLE users (
    id UUID PRIMARY KEY,
    email VARCHAR(255) NOT NULL,
    name VARCHAR(255) NOT NULL,
    password_hash VARCHAR(255) NOT NULL,
    role VARCHAR(20) NOT NULL DEFAULT 'user',
    active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    last_login_at TIMESTAMPTZ,
    reset_token_id UUID,
    CONSTRAINT uq_users_email UNIQUE (email),
    CONSTRAINT chk_users_role CHECK (role IN ('admin', 'user'))
);

-- ============================================================
-- DOCUMENT COUNTERS
-- ============================================================
CREATE TABLE document_counters (
    kind VARCHAR(20) NOT NULL,
    year INTEGER NOT NULL,
    value INTEGER NOT NULL,
    PRIMARY KEY (kind, year),
    CONSTRAINT chk_counter_positive CHECK (value > 0)
);

-- ============================================================
-- QUOTES
-- ============================================================
CREATE TABLE quotes (
    id UUID PRIMARY KEY,
    number VARCHAR(32) NOT NULL,
    customer_name VARCHAR(255) NOT NULL,
    customer_email VARCHAR(255) NOT NULL,
    customer_phone VARCHAR(64) NOT NULL,
    customer_company VARCHAR(255),
    customer_tax_id VARCHAR(64),
    items JSONB NOT NULL,
    subtotal NUMERIC(14, 2) NOT NULL,
    tax NUMERIC(14, 2) NOT NULL,
    total NUMERIC(14, 2) NOT NULL,
    status VARCHAR(20) NOT NULL DEFAULT 'pending',
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_quotes_number UNIQUE (number),
    CONSTRAINT chk_quotes_status CHECK (status IN ('pending', 'approved', 'rejected', 'invoiced'))
);

CREATE INDEX idx_quotes_created ON quotes(created_at DESC);
CREATE INDEX idx_quotes_status ON quotes(status, created_at DESC);

-- ============================================================
-- INVOICES
-- ============================================================
CREATE TABLE invoices (
    id UUID PRIMARY KEY,
    number VARCHAR(32) NOT NULL,
    quote_id UUID NOT NULL REFERENCES quotes(id),
    quote_number VARCHAR(32) NOT NULL,
    customer_name VARCHAR(255) NOT NULL,
    customer_email VARCHAR(255) NOT NULL,
    customer_phone VARCHAR(64) NOT NULL,
    customer_company VARCHAR(255),
    customer_tax_id VARCHAR(64),
    items JSONB NOT NULL,
    subtotal NUMERIC(14, 2) NOT NULL,
    tax NUMERIC(14, 2) NOT NULL,
    total NUMERIC(14, 2) NOT NULL,
    amount_paid NUMERIC(14, 2) NOT NULL DEFAULT 0,
    status VARCHAR(20) NOT NULL DEFAULT 'pending',
    payment_method VARCHAR(64),
    paid_at TIMESTAMPTZ,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_invoices_number UNIQUE (number),
    CONSTRAINT uq_invoices_quote UNIQUE (quote_id),
    CONSTRAINT chk_invoices_status CHECK (status IN ('pending', 'partially_paid', 'paid')),
    CONSTRAINT chk_invoices_paid CHECK (amount_paid >= 0 AND amount_paid <= total)
);

CREATE INDEX idx_invoices_created ON invoices(created_at DESC);
CREATE INDEX idx_invoices_customer ON invoices(lower(customer_email));
CREATE INDEX idx_invoices_unpaid ON invoices(created_at) WHERE status <> 'paid';

-- ============================================================
-- PAYMENTS
-- ============================================================
CREATE TABLE payments (
    id UUID PRIMARY KEY,
    invoice_id UUID NOT NULL REFERENCES invoices(id),
    amount NUMERIC(14, 2) NOT NULL,
    method VARCHAR(64) NOT NULL,
    reference VARCHAR(255),
    notes TEXT,
    state VARCHAR(20) NOT NULL DEFAULT 'pending',
    paid_at TIMESTAMPTZ NOT NULL,
    confirmed_at TIMESTAMPTZ,
    proof_file VARCHAR(255),
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_payments_amount CHECK (amount > 0),
    CONSTRAINT chk_payments_state CHECK (state IN ('pending', 'confirmed'))
);

CREATE INDEX idx_payments_invoice ON payments(invoice_id, created_at);
CREATE INDEX idx_payments_paid ON payments(paid_at);

-- ============================================================
-- JOURNAL
-- ============================================================
CREATE TABLE journal_entries (
    id UUID PRIMARY KEY,
    date TIMESTAMPTZ NOT NULL,
    kind VARCHAR(20) NOT NULL,
    description TEXT NOT NULL,
    reference VARCHAR(255),
    postings JSONB NOT NULL,
    total NUMERIC(14, 2) NOT NULL,
    state VARCHAR(20) NOT NULL DEFAULT 'pending',
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    confirmed_at TIMESTAMPTZ,
    CONSTRAINT chk_journal_kind CHECK (kind IN ('income', 'expense', 'adjustment')),
    CONSTRAINT chk_journal_state CHECK (state IN ('pending', 'confirmed'))
);

CREATE INDEX idx_journal_date ON journal_entries(date, created_at);
CREATE INDEX idx_journal_reference ON journal_entries(reference) WHERE reference IS NOT NULL;

-- ============================================================
-- SETTINGS (single row)
-- ============================================================
CREATE TABLE business_settings (
    id SMALLINT PRIMARY KEY,
    data JSONB NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_settings_singleton CHECK (id = 1)
);

-- ============================================================
-- NOTIFICATIONS
-- ============================================================
CREATE TABLE notifications (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL,
    kind VARCHAR(40) NOT NULL,
    message TEXT NOT NULL,
    data JSONB NOT NULL DEFAULT '{}'::jsonb,
    read BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_notifications_user ON notifications(user_id, created_at DESC);
CREATE INDEX idx_notifications_unread ON notifications(user_id) WHERE NOT read;
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS notifications CASCADE;
DROP TABLE IF EXISTS business_settings CASCADE;
DROP TABLE IF EXISTS journal_entries CASCADE;
DROP TABLE IF EXISTS payments CASCADE;
DROP TABLE IF EXISTS invoices CASCADE;
DROP TABLE IF EXISTS quotes CASCADE;
DROP TABLE IF EXISTS document_counters CASCADE;
DROP TABLE IF EXISTS users CASCADE;
";
