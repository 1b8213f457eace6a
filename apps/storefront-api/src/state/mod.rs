//! # State Module
//!
//! Shared state handed to every handler through axum's `State` extractor.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  Router::with_state(AppState)                                          │
//! │          │                                                              │
//! │          ├──► db        Database (SQLite pool, cheap to clone)          │
//! │          ├──► config    Arc<StoreConfig> (read-only)                    │
//! │          ├──► carts     Arc<CartSessions> (per-session stores)          │
//! │          └──► gateway   Arc<dyn PaymentGateway> (swappable in tests)    │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • Database: internal connection pool                                  │
//! │  • CartSessions: short std Mutex sections, never held across .await    │
//! │  • StoreConfig: read-only after initialization                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;

pub use cart::{spawn_idle_sweeper, CartSessions, CheckoutGuard};

use std::sync::Arc;

use storefront_db::Database;

use crate::config::StoreConfig;
use crate::payment::PaymentGateway;

/// Handler state. Clone is cheap; every field is shared.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<StoreConfig>,
    pub carts: Arc<CartSessions>,
    pub gateway: Arc<dyn PaymentGateway>,
}

impl AppState {
    /// Builds the state and starts cart persistence and idle-session eviction.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(db: Database, config: StoreConfig, gateway: Arc<dyn PaymentGateway>) -> Self {
        let carts = Arc::new(CartSessions::new(db.carts()));
        spawn_idle_sweeper(&carts, config.session_idle());
        AppState {
            db,
            config: Arc::new(config),
            carts,
            gateway,
        }
    }
}
