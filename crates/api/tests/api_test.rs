//! End-to-end tests of the HTTP API over the in-process store.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tally_api::{AppState, create_router};
use tally_core::auth::UserRole;
use tally_core::storage::FileStore;
use tally_core::store::Stores;
use tally_core::{BillingDefaults, Services};
use tally_shared::config::CorsConfig;
use tally_shared::jwt::{JwtConfig, JwtService};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    services: Services,
}

impl TestApp {
    fn new() -> Self {
        let jwt = Arc::new(JwtService::new(JwtConfig {
            secret: "api-test-secret".to_string(),
            access_token_expires_minutes: 15,
        }));
        let services = Services::build(
            &Stores::memory(),
            FileStore::memory().unwrap(),
            jwt.clone(),
            BillingDefaults {
                tax_rate: dec!(0.07),
                quote_validity_days: 15,
            },
        );
        let state = AppState {
            services: services.clone(),
            jwt_service: jwt,
            max_upload_bytes: 1024 * 1024,
        };
        Self {
            router: create_router(state, &CorsConfig::default()),
            services,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(
            Request::get(uri)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    async fn post(&self, uri: &str, token: Option<&str>, body: &Value) -> (StatusCode, Value) {
        let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .post(
                "/api/v1/auth/login",
                None,
                &json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn staff_token(&self) -> String {
        let (status, _) = self
            .post(
                "/api/v1/auth/register",
                None,
                &json!({ "email": "staff@example.com", "name": "Staff", "password": "staff-pass-1" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        self.login("staff@example.com", "staff-pass-1").await
    }

    async fn admin_token(&self) -> String {
        self.services
            .auth
            .create_user("admin@example.com", "Admin", "admin-pass-1", UserRole::Admin)
            .await
            .unwrap();
        self.login("admin@example.com", "admin-pass-1").await
    }
}

fn decimal(value: &Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

fn quote_body() -> Value {
    json!({
        "customer": {
            "name": "Ana Ruiz",
            "email": "ana@example.com",
            "phone": "555-0100"
        },
        "items": [
            { "description": "Consulting", "unitPrice": "50.00", "quantity": 2 }
        ]
    })
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new();
    let (status, body) = app
        .send(Request::get("/api/v1/health").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let app = TestApp::new();
    let (status, body) = app
        .send(Request::get("/api/v1/quotes").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");

    let (status, _) = app.get("/api/v1/quotes", "not-a-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_login_and_me() {
    let app = TestApp::new();
    let token = app.staff_token().await;

    let (status, me) = app.get("/api/v1/auth/me", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "staff@example.com");
    assert_eq!(me["role"], "user");
    assert!(me.get("passwordHash").is_none());

    let (status, body) = app
        .post(
            "/api/v1/auth/login",
            None,
            &json!({ "email": "staff@example.com", "password": "wrong-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_quote_to_paid_invoice_flow() {
    let app = TestApp::new();
    let token = app.staff_token().await;

    let (status, quote) = app.post("/api/v1/quotes", Some(&token), &quote_body()).await;
    assert_eq!(status, StatusCode::CREATED, "{quote}");
    assert_eq!(quote["status"], "pending");
    assert_eq!(decimal(&quote["total"]), dec!(107));
    let quote_id = quote["id"].as_str().unwrap().to_string();

    // Only approved quotes can be invoiced.
    let (status, _) = app
        .post(&format!("/api/v1/quotes/{quote_id}/invoice"), Some(&token), &json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, approved) = app
        .post(&format!("/api/v1/quotes/{quote_id}/approve"), Some(&token), &json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "approved");

    let (status, invoice) = app
        .post(&format!("/api/v1/quotes/{quote_id}/invoice"), Some(&token), &json!({}))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{invoice}");
    assert_eq!(invoice["status"], "pending");
    let invoice_id = invoice["id"].as_str().unwrap().to_string();

    let (status, payment) = app
        .post(
            &format!("/api/v1/invoices/{invoice_id}/payments"),
            Some(&token),
            &json!({ "amount": "107.00", "method": "cash" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{payment}");
    assert_eq!(payment["state"], "pending");
    let payment_id = payment["id"].as_str().unwrap().to_string();

    // The outstanding balance is already claimed by the pending payment.
    let (status, _) = app
        .post(
            "/api/v1/payments",
            Some(&token),
            &json!({ "invoiceId": invoice_id, "amount": "1.00", "method": "cash" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, confirmed) = app
        .post(&format!("/api/v1/payments/{payment_id}/confirm"), Some(&token), &json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["state"], "confirmed");

    let (_, invoice) = app.get(&format!("/api/v1/invoices/{invoice_id}"), &token).await;
    assert_eq!(invoice["status"], "paid");
    assert_eq!(decimal(&invoice["amountPaid"]), dec!(107));

    let (status, entries) = app
        .get(&format!("/api/v1/journal?reference={payment_id}"), &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entries.as_array().unwrap().len(), 1);

    let (status, count) = app.get("/api/v1/notifications/unread-count", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(count["count"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn test_out_of_range_money_is_a_validation_error() {
    let app = TestApp::new();
    let token = app.staff_token().await;

    for (price, quantity) in [("79228162514264337593543950335", 2), ("0.333", 1), ("999999999999.99", 1000)] {
        let mut body = quote_body();
        body["items"][0]["unitPrice"] = json!(price);
        body["items"][0]["quantity"] = json!(quantity);
        let (status, err) = app.post("/api/v1/quotes", Some(&token), &body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{price}: {err}");
        assert_eq!(err["error"], "VALIDATION_ERROR");
    }

    let (status, quote) = app.post("/api/v1/quotes", Some(&token), &quote_body()).await;
    assert_eq!(status, StatusCode::CREATED);
    let quote_id = quote["id"].as_str().unwrap();
    app.post(&format!("/api/v1/quotes/{quote_id}/approve"), Some(&token), &json!({}))
        .await;
    let (_, invoice) = app
        .post(&format!("/api/v1/quotes/{quote_id}/invoice"), Some(&token), &json!({}))
        .await;
    let invoice_id = invoice["id"].as_str().unwrap();

    let (status, _) = app
        .post(
            &format!("/api/v1/invoices/{invoice_id}/payments"),
            Some(&token),
            &json!({ "amount": "0.004", "method": "cash" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_quote_list_rejects_unknown_status() {
    let app = TestApp::new();
    let token = app.staff_token().await;
    let (status, body) = app.get("/api/v1/quotes?status=bogus", &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_quote_list_is_paginated() {
    let app = TestApp::new();
    let token = app.staff_token().await;
    for _ in 0..3 {
        app.post("/api/v1/quotes", Some(&token), &quote_body()).await;
    }

    let (status, page) = app.get("/api/v1/quotes?page=2&perPage=2", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["data"].as_array().unwrap().len(), 1);
    assert_eq!(page["meta"]["total"], 3);
}

#[tokio::test]
async fn test_manual_journal_entry_requires_admin() {
    let app = TestApp::new();
    let staff = app.staff_token().await;
    let admin = app.admin_token().await;
    let draft = json!({
        "kind": "adjustment",
        "description": "Opening balance",
        "postings": [
            { "account": "cash", "side": "debit", "amount": "500.00" },
            { "account": "equity", "side": "credit", "amount": "500.00" }
        ]
    });

    let (status, body) = app.post("/api/v1/journal", Some(&staff), &draft).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");

    let (status, entry) = app.post("/api/v1/journal", Some(&admin), &draft).await;
    assert_eq!(status, StatusCode::CREATED, "{entry}");
    assert_eq!(entry["state"], "pending");
}

#[tokio::test]
async fn test_settings_update_requires_admin() {
    let app = TestApp::new();
    let staff = app.staff_token().await;
    let admin = app.admin_token().await;
    let patch = json!({ "taxRate": "0.10" });

    let request = |token: &str| {
        Request::put("/api/v1/settings")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::from(patch.to_string()))
            .unwrap()
    };

    let (status, _) = app.send(request(&staff)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, settings) = app.send(request(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&settings["quote"]["taxRate"]), dec!(0.10));
}

#[tokio::test]
async fn test_csv_export_download() {
    let app = TestApp::new();
    let token = app.staff_token().await;
    app.post("/api/v1/quotes", Some(&token), &quote_body()).await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::get("/api/v1/reports/export/quotes")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"quotes_"));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("Ana Ruiz"));
}

#[tokio::test]
async fn test_unknown_export_kind() {
    let app = TestApp::new();
    let token = app.staff_token().await;
    let (status, _) = app.get("/api/v1/reports/export/everything", &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_password_recovery_flow() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    app.staff_token().await;

    for email in ["nobody@example.com", "staff@example.com"] {
        let (status, body) = app
            .post("/api/v1/auth/forgot-password", None, &json!({ "email": email }))
            .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert!(body["message"].is_string());
    }

    let (status, notes) = app.get("/api/v1/notifications", &admin).await;
    assert_eq!(status, StatusCode::OK);
    let notes = notes.as_array().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["kind"], "password_recovery_requested");
    let staff_id = notes[0]["data"]["userId"].as_str().unwrap().to_string();

    let (status, reset) = app
        .post(&format!("/api/v1/users/{staff_id}/reset-token"), Some(&admin), &json!({}))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{reset}");
    assert_eq!(reset["expiresIn"], 3600);
    let token = reset["token"].as_str().unwrap().to_string();

    // A reset token is not an access token.
    let (status, _) = app.get("/api/v1/auth/me", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let redeem = json!({ "token": token, "newPassword": "fresh-pass-2" });
    let (status, _) = app.post("/api/v1/auth/reset-password", None, &redeem).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = app.post("/api/v1/auth/reset-password", None, &redeem).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");

    app.login("staff@example.com", "fresh-pass-2").await;
    let (status, _) = app
        .post(
            "/api/v1/auth/login",
            None,
            &json!({ "email": "staff@example.com", "password": "staff-pass-1" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_administration_is_admin_only() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let staff = app.staff_token().await;

    let (status, _) = app.get("/api/v1/users", &staff).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, users) = app.get("/api/v1/users", &admin).await;
    assert_eq!(status, StatusCode::OK);
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("passwordHash").is_none()));
    let staff_id = users
        .iter()
        .find(|u| u["email"] == "staff@example.com")
        .and_then(|u| u["id"].as_str())
        .unwrap()
        .to_string();
    let admin_id = users
        .iter()
        .find(|u| u["email"] == "admin@example.com")
        .and_then(|u| u["id"].as_str())
        .unwrap()
        .to_string();

    let (status, _) = app
        .post(&format!("/api/v1/users/{staff_id}/reset-token"), Some(&staff), &json!({}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Deactivation applies to tokens already issued.
    let (status, user) = app
        .post(&format!("/api/v1/users/{staff_id}/deactivate"), Some(&admin), &json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["active"], false);
    let (status, _) = app.get("/api/v1/auth/me", &staff).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post(&format!("/api/v1/users/{staff_id}/activate"), Some(&admin), &json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get("/api/v1/auth/me", &staff).await;
    assert_eq!(status, StatusCode::OK);

    let promote = Request::put(format!("/api/v1/users/{staff_id}/role"))
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {admin}"))
        .body(Body::from(json!({ "role": "admin" }).to_string()))
        .unwrap();
    let (status, user) = app.send(promote).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["role"], "admin");
    let (status, _) = app.get("/api/v1/users", &staff).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post(&format!("/api/v1/users/{admin_id}/deactivate"), Some(&admin), &json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
}
