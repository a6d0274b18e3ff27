//! In-memory fixtures shared by the unit tests.

use std::sync::Arc;

use rust_decimal::Decimal;
use tally_shared::jwt::{JwtConfig, JwtService};
use tally_shared::types::UserId;

use crate::auth::{Actor, UserRole};
use crate::billing::{DEFAULT_TAX_RATE, LineItem};
use crate::quote::{Customer, NewQuote};
use crate::services::{BillingDefaults, Services};
use crate::storage::FileStore;
use crate::store::Stores;

pub(crate) struct Fixture {
    pub stores: Stores,
    pub services: Services,
    pub admin: Actor,
    pub staff: Actor,
}

pub(crate) fn fixture() -> Fixture {
    let stores = Stores::memory();
    let files = FileStore::memory().unwrap();
    let jwt = Arc::new(JwtService::new(JwtConfig {
        secret: "test-secret".to_string(),
        access_token_expires_minutes: 15,
    }));
    let defaults = BillingDefaults {
        tax_rate: DEFAULT_TAX_RATE,
        quote_validity_days: 15,
    };
    let services = Services::build(&stores, files, jwt, defaults);

    Fixture {
        stores,
        services,
        admin: Actor::new(UserId::new(), "admin@example.com", UserRole::Admin),
        staff: Actor::new(UserId::new(), "staff@example.com", UserRole::User),
    }
}

pub(crate) fn customer(name: &str, email: &str) -> Customer {
    Customer {
        name: name.to_string(),
        email: email.to_string(),
        phone: "555-0100".to_string(),
        company: None,
        tax_id: None,
    }
}

pub(crate) fn new_quote(items: Vec<LineItem>) -> NewQuote {
    NewQuote {
        customer: customer("Ana Diaz", "ana@example.com"),
        items,
    }
}

pub(crate) fn item(description: &str, unit_price: Decimal, quantity: i32) -> LineItem {
    LineItem::new(description, unit_price, quantity)
}
