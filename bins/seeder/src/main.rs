//! Database seeder for Tally development and testing.
//!
//! Seeds an administrator, a staff account, the business profile and a few
//! sample quotes so a fresh database has something to look at.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use rust_decimal::Decimal;
use tally_core::auth::{Actor, AuthError, UserRole, UserView};
use tally_core::billing::LineItem;
use tally_core::quote::{Customer, NewQuote};
use tally_core::settings::{CompanyProfile, SettingsPatch};
use tally_core::storage::{FileStore, StorageConfig};
use tally_core::store::Stores;
use tally_core::{BillingDefaults, Services};
use tally_shared::jwt::JwtConfig;
use tally_shared::{AppConfig, JwtService};

const ADMIN_EMAIL: &str = "admin@tally.dev";
const STAFF_EMAIL: &str = "staff@tally.dev";
const DEV_PASSWORD: &str = "tally-dev-password";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    anyhow::ensure!(
        !config.database.is_memory(),
        "seeding needs a real database url, not 'memory'"
    );

    println!("Connecting to database...");
    let db = tally_db::connect_with(&config.database)
        .await
        .context("failed to connect to database")?;
    let stores = tally_db::pg_stores(&db);
    let files = FileStore::from_config(StorageConfig::from_settings(&config.storage)?)?;
    let jwt = Arc::new(JwtService::new(JwtConfig::from(&config.jwt)));
    let services = Services::build(&stores, files, jwt, BillingDefaults::from(&config.billing));

    println!("Seeding users...");
    let admin = seed_user(&services, &stores, ADMIN_EMAIL, "Administrator", UserRole::Admin).await?;
    seed_user(&services, &stores, STAFF_EMAIL, "Front Desk", UserRole::User).await?;

    let actor = Actor {
        user_id: admin.id,
        email: admin.email.clone(),
        role: admin.role,
    };

    println!("Seeding business settings...");
    seed_settings(&services, &actor).await?;

    println!("Seeding sample quotes...");
    seed_quotes(&services, &actor).await?;

    println!("Seeding complete!");
    Ok(())
}

/// Creates a user unless the email is already registered.
async fn seed_user(
    services: &Services,
    stores: &Stores,
    email: &str,
    name: &str,
    role: UserRole,
) -> anyhow::Result<UserView> {
    match services
        .auth
        .create_user(email, name, DEV_PASSWORD, role)
        .await
    {
        Ok(user) => {
            println!("  Created {email}");
            Ok(user)
        }
        Err(AuthError::EmailTaken) => {
            println!("  {email} already exists, skipping...");
            let user = stores
                .users
                .find_user_by_email(email)
                .await?
                .context("existing user vanished")?;
            Ok(UserView::from(&user))
        }
        Err(e) => Err(e.into()),
    }
}

async fn seed_settings(services: &Services, actor: &Actor) -> anyhow::Result<()> {
    let current = services.settings.get().await?;
    if !current.company.name.is_empty() {
        println!("  Company profile already set, skipping...");
        return Ok(());
    }

    let company = CompanyProfile {
        name: "Tally Demo Studio".to_string(),
        tax_id: "76.123.456".to_string(),
        verifier_digit: Some("7".to_string()),
        phone: "+56 2 2345 6789".to_string(),
        email: "hello@tally.dev".to_string(),
        address: "Av. Providencia 1234, Santiago".to_string(),
        bank_name: Some("Banco Demo".to_string()),
        bank_account: Some("00-123-45678-9".to_string()),
        bank_account_type: Some("checking".to_string()),
        ..CompanyProfile::default()
    };
    services
        .settings
        .update(
            actor,
            SettingsPatch {
                company: Some(company),
                ..SettingsPatch::default()
            },
        )
        .await?;
    println!("  Saved company profile");
    Ok(())
}

async fn seed_quotes(services: &Services, actor: &Actor) -> anyhow::Result<()> {
    if services.quotes.stats().await?.total > 0 {
        println!("  Quotes already exist, skipping...");
        return Ok(());
    }

    let samples = [
        (
            "Ana Ruiz",
            "ana@example.com",
            Some("Ruiz Arquitectos"),
            vec![
                LineItem::new("Logo design", Decimal::new(45_000, 2), 1),
                LineItem::new("Business cards (box)", Decimal::new(2_500, 2), 4),
            ],
        ),
        (
            "Marco Díaz",
            "marco@example.com",
            None,
            vec![LineItem::new("Website maintenance (hour)", Decimal::new(3_500, 2), 10)],
        ),
    ];

    for (name, email, company, items) in samples {
        let quote = services
            .quotes
            .create(
                actor,
                NewQuote {
                    customer: Customer {
                        name: name.to_string(),
                        email: email.to_string(),
                        phone: "+56 9 1234 5678".to_string(),
                        company: company.map(ToString::to_string),
                        tax_id: None,
                    },
                    items,
                },
            )
            .await?;
        println!("  Created quote {} for {name}", quote.number);
    }
    Ok(())
}
