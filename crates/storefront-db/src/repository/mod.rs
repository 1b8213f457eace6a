//! # Repository Module
//!
//! Database repositories for the storefront.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler / persistence task                                       │
//! │       │                                                                 │
//! │       │  db.catalog().list_variants("p-1")                             │
//! │       ▼                                                                 │
//! │  CatalogRepository                  CartRepository                     │
//! │  ├── insert_product / variant       ├── save(session, &Cart)           │
//! │  ├── get_product / by_slug          ├── load(session)                  │
//! │  ├── list_active                    └── delete(session)                │
//! │  └── list_variants                                                     │
//! │       │                                                                 │
//! │       │  SQL (runtime queries + FromRow)                               │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CatalogRepository`](catalog::CatalogRepository) - Products and variants
//! - [`CartRepository`](cart::CartRepository) - Per-session cart snapshots

pub mod cart;
pub mod catalog;
