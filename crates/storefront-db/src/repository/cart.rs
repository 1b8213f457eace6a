//! # Cart Repository
//!
//! Persists each shopper session's cart so it survives restarts.
//!
//! ## Save Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  save(session, &cart)                                                  │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │    UPSERT carts (session_id, created_at, updated_at)                   │
//! │    DELETE cart_lines WHERE session_id = ?                              │
//! │    INSERT cart_lines (position 0..n, every CartLine field)             │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  Either the whole snapshot lands or none of it does.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines load back in the order they were saved, with their frozen names,
//! labels and unit prices untouched.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use storefront_core::{Cart, CartLine, CustomOptions, Money};

#[derive(Debug, FromRow)]
struct CartLineRow {
    line_id: String,
    product_id: String,
    variant_id: Option<String>,
    variant_label: Option<String>,
    name: String,
    unit_price_minor: i64,
    quantity: i64,
    custom_options_json: String,
    added_at: DateTime<Utc>,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = DbError;

    fn try_from(row: CartLineRow) -> DbResult<Self> {
        let custom_options: CustomOptions = serde_json::from_str(&row.custom_options_json)?;

        Ok(CartLine {
            line_id: row.line_id,
            product_id: row.product_id,
            variant_id: row.variant_id,
            variant_label: row.variant_label,
            name: row.name,
            unit_price: Money::from_minor(row.unit_price_minor),
            quantity: row.quantity,
            custom_options,
            added_at: row.added_at,
        })
    }
}

/// Repository for per-session cart snapshots.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Replaces the stored cart for a session in one transaction.
    pub async fn save(&self, session_id: &str, cart: &Cart) -> DbResult<()> {
        debug!(session_id = %session_id, lines = cart.item_count(), "Saving cart");

        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO carts (session_id, created_at, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (session_id) DO UPDATE SET
                created_at = excluded.created_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(session_id)
        .bind(cart.created_at)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM cart_lines WHERE session_id = ?1")
            .bind(session_id)
            .execute(&mut *tx)
            .await?;

        for (position, line) in cart.lines().iter().enumerate() {
            let custom_options_json = serde_json::to_string(&line.custom_options)?;

            sqlx::query(
                r#"
                INSERT INTO cart_lines (
                    session_id, position, line_id, product_id, variant_id, variant_label,
                    name, unit_price_minor, quantity, custom_options_json, added_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
            )
            .bind(session_id)
            .bind(position as i64)
            .bind(&line.line_id)
            .bind(&line.product_id)
            .bind(&line.variant_id)
            .bind(&line.variant_label)
            .bind(&line.name)
            .bind(line.unit_price.minor())
            .bind(line.quantity)
            .bind(custom_options_json)
            .bind(line.added_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Loads a session's cart, or an empty cart if none was saved.
    pub async fn load(&self, session_id: &str) -> DbResult<Cart> {
        let created_at: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT created_at FROM carts WHERE session_id = ?1")
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await?;

        let Some(created_at) = created_at else {
            debug!(session_id = %session_id, "No saved cart, starting empty");
            return Ok(Cart::new());
        };

        let rows = sqlx::query_as::<_, CartLineRow>(
            r#"
            SELECT line_id, product_id, variant_id, variant_label, name,
                   unit_price_minor, quantity, custom_options_json, added_at
            FROM cart_lines
            WHERE session_id = ?1
            ORDER BY position ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        let lines = rows
            .into_iter()
            .map(CartLine::try_from)
            .collect::<DbResult<Vec<_>>>()?;

        debug!(session_id = %session_id, lines = lines.len(), "Loaded cart");
        Ok(Cart::from_lines(lines, created_at))
    }

    /// Deletes a session's cart and its lines.
    pub async fn delete(&self, session_id: &str) -> DbResult<()> {
        debug!(session_id = %session_id, "Deleting cart");

        sqlx::query("DELETE FROM carts WHERE session_id = ?1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
