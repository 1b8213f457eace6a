//! # Storefront API Library
//!
//! HTTP service for the storefront: catalog prices, per-session carts and
//! checkout submission to the payment gateway.
//!
//! ## Module Organization
//! ```text
//! storefront_api/
//! ├── lib.rs          ◄─── You are here (router, startup, logging)
//! ├── config.rs       ◄─── StoreConfig from environment
//! ├── error.rs        ◄─── ApiError → HTTP status + JSON
//! ├── payment.rs      ◄─── PaymentGateway trait + reqwest client
//! ├── state/
//! │   ├── mod.rs      ◄─── AppState
//! │   └── cart.rs     ◄─── Per-session cart stores + write-through
//! └── routes/
//!     ├── mod.rs      ◄─── Route table
//!     ├── catalog.rs  ◄─── Price info
//!     ├── cart.rs     ◄─── Cart manipulation
//!     └── checkout.rs ◄─── Quote + submission
//! ```

pub mod config;
pub mod error;
pub mod payment;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use config::{ConfigError, StoreConfig};
use payment::{HttpPaymentGateway, PaymentError};
use state::AppState;
use storefront_db::{Database, DbConfig, DbError};

/// Failures that stop the service from starting or keep it from serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
}

/// Builds the router with all routes and state attached.
pub fn build_router(state: AppState) -> Router {
    routes::router().with_state(state)
}

/// Runs the service until Ctrl+C.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  1. Initialize logging (RUST_LOG overrides the default filter)          │
/// │  2. Load StoreConfig from STOREFRONT_* variables                        │
/// │  3. Open SQLite (WAL), run migrations                                   │
/// │  4. Build payment gateway client, AppState, router                      │
/// │  5. Bind, serve, shut down gracefully and flush pending cart writes     │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> Result<(), StartupError> {
    init_tracing();

    let config = StoreConfig::from_env()?;
    info!(store = %config.store_name, currency = %config.currency_code, "Starting storefront API");

    if let Some(parent) = config.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let db = Database::new(DbConfig::new(&config.database_path)).await?;
    info!(path = %config.database_path.display(), "Database connected and migrations applied");

    let gateway = HttpPaymentGateway::new(&config.payment_url, config.payment_timeout())?;
    info!(endpoint = %gateway.endpoint(), "Payment gateway configured");

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(db.clone(), config, Arc::new(gateway));
    let carts = state.carts.clone();
    let app = build_router(state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: bind_addr.clone(),
            source,
        })?;
    info!(addr = %bind_addr, "Storefront API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    carts.flush().await;
    db.close().await;
    info!("Storefront API stopped");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=storefront_api=trace` - Trace for this crate only
/// - Default: INFO, debug for storefront crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,storefront=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::TRACE)
        .init();
}

// =============================================================================
// Router Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::PaymentGateway;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use storefront_core::{ChargeRequest, ChargeResponse, Money, Product, RawVariant};
    use tokio::sync::Notify;
    use tower::ServiceExt;

    // -------------------------------------------------------------------------
    // Test gateway
    // -------------------------------------------------------------------------

    #[derive(Default)]
    struct MockGateway {
        reply: Option<ChargeResponse>,
        requests: Mutex<Vec<ChargeRequest>>,
        /// Notified when a charge starts; the charge then waits on `release`.
        started: Option<Arc<Notify>>,
        release: Option<Arc<Notify>>,
    }

    impl MockGateway {
        fn accepting() -> Self {
            MockGateway {
                reply: Some(ChargeResponse {
                    success: true,
                    payment_url: Some("https://pay.test/session/abc".to_string()),
                    error: None,
                }),
                ..MockGateway::default()
            }
        }

        fn refusing(message: &str) -> Self {
            MockGateway {
                reply: Some(ChargeResponse {
                    success: false,
                    payment_url: None,
                    error: Some(message.to_string()),
                }),
                ..MockGateway::default()
            }
        }

        fn unreachable() -> Self {
            MockGateway::default()
        }

        fn calls(&self) -> Vec<ChargeRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PaymentGateway for MockGateway {
        async fn charge(&self, request: &ChargeRequest) -> Result<ChargeResponse, PaymentError> {
            self.requests.lock().unwrap().push(request.clone());

            if let (Some(started), Some(release)) = (&self.started, &self.release) {
                started.notify_one();
                release.notified().await;
            }

            self.reply
                .clone()
                .ok_or_else(|| PaymentError::Network("connection refused".to_string()))
        }
    }

    // -------------------------------------------------------------------------
    // Fixtures
    // -------------------------------------------------------------------------

    struct TestApp {
        app: Router,
        db: Database,
        state: AppState,
        gateway: Arc<MockGateway>,
    }

    async fn test_app(gateway: MockGateway) -> TestApp {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let gateway = Arc::new(gateway);
        let state = AppState::new(db.clone(), StoreConfig::default(), gateway.clone());
        TestApp {
            app: build_router(state.clone()),
            db,
            state,
            gateway,
        }
    }

    fn product(id: &str, price: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Jersey {}", id),
            slug: format!("jersey-{}", id),
            price: Money::from_major(price),
            compare_price: None,
            images: vec![],
            is_active: true,
            is_featured: false,
            average_rating: 0.0,
            review_count: 0,
            category_id: None,
        }
    }

    /// Base 1200; sized "Edition: Player" M=1400 L=1450; flat Mesh fabric 1300.
    async fn seed_jersey(db: &Database) {
        db.catalog().insert_product(&product("p1", 1200)).await.unwrap();
        db.catalog()
            .insert_variant(
                "p1",
                0,
                &RawVariant {
                    id: "v-player".to_string(),
                    name: Some("Edition".to_string()),
                    value: Some("Player".to_string()),
                    sizes: Some(json!([
                        { "size": "M", "price": 1400 },
                        { "size": "L", "price": "1450" }
                    ])),
                    ..RawVariant::default()
                },
            )
            .await
            .unwrap();
        db.catalog()
            .insert_variant(
                "p1",
                1,
                &RawVariant {
                    id: "v-mesh".to_string(),
                    fabric_type: Some("Mesh".to_string()),
                    price: Some(json!(1300)),
                    ..RawVariant::default()
                },
            )
            .await
            .unwrap();
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).to_string())
            })
        };
        (status, json)
    }

    fn customer() -> Value {
        json!({
            "name": "Rahim Uddin",
            "email": "rahim@example.com",
            "phone": "+880 1711-000000",
            "address": "House 12, Road 5, Dhanmondi",
            "city": "Dhaka"
        })
    }

    /// One line worth 1000.
    async fn cart_worth_1000(t: &TestApp, session: &str) {
        t.db.catalog().insert_product(&product("p-basic", 1000)).await.unwrap();
        let (status, _) = send(
            &t.app,
            "POST",
            &format!("/cart/{}/items", session),
            Some(json!({ "productId": "p-basic" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // -------------------------------------------------------------------------
    // Catalog
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_health() {
        let t = test_app(MockGateway::accepting()).await;
        let (status, body) = send(&t.app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn test_price_info_spans_variant_prices() {
        let t = test_app(MockGateway::accepting()).await;
        seed_jersey(&t.db).await;

        let (status, body) = send(&t.app, "GET", "/products/p1/price-info", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["priceInfo"]["minPrice"], 130_000);
        assert_eq!(body["priceInfo"]["maxPrice"], 145_000);
        assert_eq!(body["priceInfo"]["isRange"], true);
        assert_eq!(body["priceLabel"], "৳1300.00 - ৳1450.00");
        assert_eq!(body["variants"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let t = test_app(MockGateway::accepting()).await;
        let (status, body) = send(&t.app, "GET", "/products/nope/price-info", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_product_listing() {
        let t = test_app(MockGateway::accepting()).await;
        seed_jersey(&t.db).await;
        t.db.catalog().insert_product(&product("p2", 800)).await.unwrap();

        let (status, body) = send(&t.app, "GET", "/products?limit=10", None).await;
        assert_eq!(status, StatusCode::OK);
        let cards = body.as_array().unwrap();
        assert_eq!(cards.len(), 2);

        let plain = cards.iter().find(|c| c["id"] == "p2").unwrap();
        assert_eq!(plain["priceLabel"], "৳800.00");
        assert_eq!(plain["priceInfo"]["isRange"], false);
    }

    // -------------------------------------------------------------------------
    // Cart
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_add_resolves_size_price_and_merges() {
        let t = test_app(MockGateway::accepting()).await;
        seed_jersey(&t.db).await;

        let large = json!({ "productId": "p1", "variantId": "v-player", "size": "L" });
        send(&t.app, "POST", "/cart/s1/items", Some(large.clone())).await;
        let (status, body) = send(&t.app, "POST", "/cart/s1/items", Some(large)).await;
        assert_eq!(status, StatusCode::CREATED);

        let lines = body["lines"].as_array().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["unitPrice"], 145_000);
        assert_eq!(lines[0]["quantity"], 2);
        assert_eq!(lines[0]["variantLabel"], "Edition: Player / L");

        let medium = json!({ "productId": "p1", "variantId": "v-player", "size": "M" });
        let (_, body) = send(&t.app, "POST", "/cart/s1/items", Some(medium)).await;
        assert_eq!(body["lines"].as_array().unwrap().len(), 2);
        assert_eq!(body["totals"]["subtotal"], 430_000);
        assert_eq!(body["subtotalFormatted"], "৳4300.00");
    }

    #[tokio::test]
    async fn test_add_includes_badge_surcharge() {
        let t = test_app(MockGateway::accepting()).await;
        seed_jersey(&t.db).await;

        let (_, body) = send(
            &t.app,
            "POST",
            "/cart/s1/items",
            Some(json!({
                "productId": "p1",
                "variantId": "v-mesh",
                "customOptions": {
                    "embroideryName": "RAHIM",
                    "badges": [{ "name": "League", "price": 15_000 }]
                }
            })),
        )
        .await;

        assert_eq!(body["lines"][0]["unitPrice"], 145_000);
        assert_eq!(body["lines"][0]["variantLabel"], "Fabric: Mesh");
    }

    #[tokio::test]
    async fn test_badge_prices_come_from_the_store() {
        let t = test_app(MockGateway::accepting()).await;
        seed_jersey(&t.db).await;

        let (status, body) = send(
            &t.app,
            "POST",
            "/cart/s1/items",
            Some(json!({
                "productId": "p1",
                "variantId": "v-mesh",
                "customOptions": { "badges": [{ "name": "League", "price": -120_000 }] }
            })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["lines"][0]["unitPrice"], 145_000);
        assert_eq!(body["lines"][0]["customOptions"]["badges"][0]["price"], 15_000);
    }

    #[tokio::test]
    async fn test_too_many_badges_are_refused() {
        let t = test_app(MockGateway::accepting()).await;
        seed_jersey(&t.db).await;

        let badges: Vec<Value> = (0..6)
            .map(|i| json!({ "name": format!("Badge {}", i), "price": 0 }))
            .collect();
        let (status, body) = send(
            &t.app,
            "POST",
            "/cart/s1/items",
            Some(json!({ "productId": "p1", "customOptions": { "badges": badges } })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_add_refuses_unpriced_selection() {
        let t = test_app(MockGateway::accepting()).await;
        t.db.catalog().insert_product(&product("free", 0)).await.unwrap();

        let (status, body) = send(
            &t.app,
            "POST",
            "/cart/s1/items",
            Some(json!({ "productId": "free" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "CART_ERROR");
    }

    #[tokio::test]
    async fn test_update_and_remove_lines() {
        let t = test_app(MockGateway::accepting()).await;
        seed_jersey(&t.db).await;

        let (_, body) = send(
            &t.app,
            "POST",
            "/cart/s1/items",
            Some(json!({ "productId": "p1" })),
        )
        .await;
        let line_id = body["lines"][0]["lineId"].as_str().unwrap().to_string();
        let uri = format!("/cart/s1/items/{}", line_id);

        let (status, body) = send(&t.app, "PATCH", &uri, Some(json!({ "quantity": 3 }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totals"]["subtotal"], 360_000);

        let (status, body) = send(&t.app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["lines"].as_array().unwrap().is_empty());

        let (status, body) = send(&t.app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_bad_line_id_is_validation_error() {
        let t = test_app(MockGateway::accepting()).await;
        let (status, body) = send(
            &t.app,
            "PATCH",
            "/cart/s1/items/not-a-uuid",
            Some(json!({ "quantity": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_cart_is_persisted_and_cleared() {
        let t = test_app(MockGateway::accepting()).await;
        cart_worth_1000(&t, "s1").await;

        t.state.carts.flush().await;
        let saved = t.db.carts().load("s1").await.unwrap();
        assert_eq!(saved.subtotal(), Money::from_major(1000));

        let (status, _) = send(&t.app, "DELETE", "/cart/s1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        t.state.carts.flush().await;
        assert!(t.db.carts().load("s1").await.unwrap().is_empty());
        assert_eq!(t.state.carts.session_count(), 0);
    }

    #[tokio::test]
    async fn test_reading_unknown_carts_keeps_nothing_in_memory() {
        let t = test_app(MockGateway::accepting()).await;

        for i in 0..5 {
            let (status, body) = send(&t.app, "GET", &format!("/cart/visitor-{}", i), None).await;
            assert_eq!(status, StatusCode::OK);
            assert!(body["lines"].as_array().unwrap().is_empty());
        }
        let (status, _) = send(&t.app, "POST", "/checkout/visitor-0/quote", Some(json!({}))).await;
        assert_eq!(status, StatusCode::OK);

        assert_eq!(t.state.carts.session_count(), 0);
    }

    // -------------------------------------------------------------------------
    // Checkout
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_quote_partial_payment_with_preset_tip() {
        let t = test_app(MockGateway::accepting()).await;
        cart_worth_1000(&t, "s1").await;

        let (status, body) = send(
            &t.app,
            "POST",
            "/checkout/s1/quote",
            Some(json!({ "tipPreset": 10_000, "paymentType": "partial" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["amounts"]["deliveryFee"], 10_000);
        assert_eq!(body["amounts"]["total"], 120_000);
        assert_eq!(body["amounts"]["dueNow"], 24_000);
        assert_eq!(body["amounts"]["dueLater"], 96_000);
        assert_eq!(body["formatted"]["dueNow"], "৳240.00");
        assert_eq!(body["remainingForFreeDelivery"], 100_000);
        assert_eq!(body["tipPresets"], json!([5_000, 10_000, 20_000]));
        assert!(body["tipError"].is_null());
    }

    #[tokio::test]
    async fn test_quote_reports_bad_custom_tip() {
        let t = test_app(MockGateway::accepting()).await;
        cart_worth_1000(&t, "s1").await;

        let (status, body) = send(
            &t.app,
            "POST",
            "/checkout/s1/quote",
            Some(json!({ "tipPreset": 10_000, "tipCustom": "abc" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["amounts"]["tip"], 0);
        assert_eq!(body["amounts"]["total"], 110_000);
        assert!(body["tipError"].is_string());
    }

    #[tokio::test]
    async fn test_quote_ignores_presets_the_store_does_not_offer() {
        let t = test_app(MockGateway::accepting()).await;
        cart_worth_1000(&t, "s1").await;

        let (status, body) = send(
            &t.app,
            "POST",
            "/checkout/s1/quote",
            Some(json!({ "tipPreset": 9_223_372_036_854_775_000_i64 })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["amounts"]["tip"], 0);
        assert_eq!(body["amounts"]["total"], 110_000);
        assert!(body["tipError"].is_string());
    }

    #[tokio::test]
    async fn test_checkout_refuses_unoffered_or_oversized_tips() {
        let t = test_app(MockGateway::accepting()).await;
        cart_worth_1000(&t, "s1").await;

        for tip in [
            json!({ "tipPreset": -10_000 }),
            json!({ "tipPreset": 12_345 }),
            json!({ "tipCustom": "92233720368547758" }),
        ] {
            let mut body = tip;
            body["customer"] = customer();

            let (status, reply) = send(&t.app, "POST", "/checkout/s1", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(reply["code"], "VALIDATION_ERROR");
        }

        assert!(t.gateway.calls().is_empty());
        let (_, cart) = send(&t.app, "GET", "/cart/s1", None).await;
        assert_eq!(cart["lines"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_checkout_names_missing_fields_without_calling_gateway() {
        let t = test_app(MockGateway::accepting()).await;
        cart_worth_1000(&t, "s1").await;

        let mut incomplete = customer();
        incomplete["address"] = json!("   ");

        let (status, body) = send(
            &t.app,
            "POST",
            "/checkout/s1",
            Some(json!({ "customer": incomplete, "paymentType": "full" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Missing required fields: address");
        assert!(t.gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_empty_cart_is_refused() {
        let t = test_app(MockGateway::accepting()).await;
        let (status, body) = send(
            &t.app,
            "POST",
            "/checkout/s1",
            Some(json!({ "customer": customer() })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Cart is empty");
        assert!(t.gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_success_clears_cart() {
        let t = test_app(MockGateway::accepting()).await;
        cart_worth_1000(&t, "s1").await;

        let (status, body) = send(
            &t.app,
            "POST",
            "/checkout/s1",
            Some(json!({
                "customer": customer(),
                "tipCustom": "50",
                "paymentType": "partial"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["paymentUrl"], "https://pay.test/session/abc");
        assert_eq!(body["amounts"]["total"], 115_000);

        let calls = t.gateway.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].currency, "BDT");
        assert_eq!(calls[0].delivery_charge, Money::from_major(100));
        assert_eq!(calls[0].tip_amount, Money::from_major(50));
        assert_eq!(calls[0].total_amount, Money::from_major(230));
        assert_eq!(calls[0].remaining_amount, Money::from_major(920));

        let (_, cart) = send(&t.app, "GET", "/cart/s1", None).await;
        assert!(cart["lines"].as_array().unwrap().is_empty());

        t.state.carts.flush().await;
        assert!(t.db.carts().load("s1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_gateway_refusal_keeps_cart() {
        let t = test_app(MockGateway::refusing("Card declined by issuer")).await;
        cart_worth_1000(&t, "s1").await;

        let (status, body) = send(
            &t.app,
            "POST",
            "/checkout/s1",
            Some(json!({ "customer": customer() })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "PAYMENT_ERROR");
        assert_eq!(body["message"], "Card declined by issuer");

        let (_, cart) = send(&t.app, "GET", "/cart/s1", None).await;
        assert_eq!(cart["lines"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_gateway_keeps_cart() {
        let t = test_app(MockGateway::unreachable()).await;
        cart_worth_1000(&t, "s1").await;

        let (status, body) = send(
            &t.app,
            "POST",
            "/checkout/s1",
            Some(json!({ "customer": customer() })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "PAYMENT_ERROR");
        assert_eq!(t.gateway.calls().len(), 1);

        let (_, cart) = send(&t.app, "GET", "/cart/s1", None).await;
        assert_eq!(cart["lines"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_checkout_is_conflict() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let gateway = MockGateway {
            started: Some(started.clone()),
            release: Some(release.clone()),
            ..MockGateway::accepting()
        };
        let t = test_app(gateway).await;
        cart_worth_1000(&t, "s1").await;

        let body = json!({ "customer": customer() });
        let first = {
            let app = t.app.clone();
            let body = body.clone();
            tokio::spawn(async move { send(&app, "POST", "/checkout/s1", Some(body)).await })
        };

        started.notified().await;
        let (status, second) = send(&t.app, "POST", "/checkout/s1", Some(body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(second["code"], "CONFLICT");

        release.notify_one();
        let (status, _) = first.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(t.gateway.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_items_added_during_checkout_stay_in_cart() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let gateway = MockGateway {
            started: Some(started.clone()),
            release: Some(release.clone()),
            ..MockGateway::accepting()
        };
        let t = test_app(gateway).await;
        cart_worth_1000(&t, "s1").await;
        t.db.catalog().insert_product(&product("p-scarf", 450)).await.unwrap();

        let checkout = {
            let app = t.app.clone();
            tokio::spawn(async move {
                send(&app, "POST", "/checkout/s1", Some(json!({ "customer": customer() }))).await
            })
        };

        started.notified().await;
        let (status, _) = send(
            &t.app,
            "POST",
            "/cart/s1/items",
            Some(json!({ "productId": "p-scarf" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        release.notify_one();
        let (status, _) = checkout.await.unwrap();
        assert_eq!(status, StatusCode::OK);

        let calls = t.gateway.calls();
        assert_eq!(calls[0].items.len(), 1);
        assert_eq!(calls[0].items[0].product_id, "p-basic");

        let (_, cart) = send(&t.app, "GET", "/cart/s1", None).await;
        let lines = cart["lines"].as_array().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["productId"], "p-scarf");

        t.state.carts.flush().await;
        let saved = t.db.carts().load("s1").await.unwrap();
        assert_eq!(saved.subtotal(), Money::from_major(450));
    }
}
