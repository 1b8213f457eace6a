//! # Catalog Repository
//!
//! Products and their variants.
//!
//! ## Variant Storage
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  variants row                                                          │
//! │  ┌──────────┬────────────┬──────────────────────────────────────────┐  │
//! │  │ id       │ price_text │ sizes_json                               │  │
//! │  ├──────────┼────────────┼──────────────────────────────────────────┤  │
//! │  │ v-home   │ NULL       │ [{"size":"M","price":1450}, ...]         │  │
//! │  │ v-mesh   │ '1600'     │ NULL                                     │  │
//! │  │ v-broken │ NULL       │ '[{"size":"L",'   ← admin saved garbage   │  │
//! │  └──────────┴────────────┴──────────────────────────────────────────┘  │
//! │       │                                                                 │
//! │       ▼  RawVariant (TEXT kept verbatim)                               │
//! │  Variant::from_raw ──► Sized / Flat, malformed rows degrade to Flat    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Prices and size tables are stored as the admin entered them. Reading never
//! fails because of their contents; the core conversion logs and skips.

use chrono::Utc;
use serde_json::Value;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use storefront_core::{Money, Product, RawVariant, Variant};

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, FromRow)]
struct ProductRow {
    id: String,
    name: String,
    slug: String,
    price_minor: i64,
    compare_price_minor: Option<i64>,
    images_json: String,
    is_active: bool,
    is_featured: bool,
    average_rating: f64,
    review_count: i64,
    category_id: Option<String>,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> DbResult<Self> {
        let images: Vec<String> = serde_json::from_str(&row.images_json)?;

        Ok(Product {
            id: row.id,
            name: row.name,
            slug: row.slug,
            price: Money::from_minor(row.price_minor),
            compare_price: row.compare_price_minor.map(Money::from_minor),
            images,
            is_active: row.is_active,
            is_featured: row.is_featured,
            average_rating: row.average_rating as f32,
            review_count: u32::try_from(row.review_count).unwrap_or(0),
            category_id: row.category_id,
        })
    }
}

#[derive(Debug, FromRow)]
struct VariantRow {
    id: String,
    name: Option<String>,
    value: Option<String>,
    fabric_type: Option<String>,
    tracksuit_type: Option<String>,
    price_text: Option<String>,
    sizes_json: Option<String>,
}

impl From<VariantRow> for RawVariant {
    fn from(row: VariantRow) -> Self {
        RawVariant {
            id: row.id,
            name: row.name,
            value: row.value,
            fabric_type: row.fabric_type,
            tracksuit_type: row.tracksuit_type,
            price: row.price_text.map(Value::String),
            sizes: row.sizes_json.map(Value::String),
        }
    }
}

/// Text form of a JSON scalar or document, keeping strings unquoted.
fn column_text(value: &Option<Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

const PRODUCT_COLUMNS: &str = "id, name, slug, price_minor, compare_price_minor, images_json, \
     is_active, is_featured, average_rating, review_count, category_id";

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog reads and admin-side inserts.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.catalog();
/// let product = repo.get_product("p-1").await?;
/// let variants = repo.list_variants("p-1").await?;
/// ```
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::Invalid)` - name, slug or price fails validation
    /// * `Err(DbError::UniqueViolation)` - id or slug already exists
    pub async fn insert_product(&self, product: &Product) -> DbResult<()> {
        debug!(product_id = %product.id, slug = %product.slug, "Inserting product");
        product.validate()?;

        let now = Utc::now();
        let images_json = serde_json::to_string(&product.images)?;

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, slug, price_minor, compare_price_minor, images_json,
                is_active, is_featured, average_rating, review_count, category_id,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(product.price.minor())
        .bind(product.compare_price.map(|p| p.minor()))
        .bind(images_json)
        .bind(product.is_active)
        .bind(product.is_featured)
        .bind(f64::from(product.average_rating))
        .bind(i64::from(product.review_count))
        .bind(&product.category_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a variant for a product, keeping price and size table verbatim.
    ///
    /// `position` orders variants for display.
    pub async fn insert_variant(&self, product_id: &str, position: i64, variant: &RawVariant) -> DbResult<()> {
        debug!(product_id = %product_id, variant_id = %variant.id, "Inserting variant");

        sqlx::query(
            r#"
            INSERT INTO variants (
                id, product_id, position, name, value, fabric_type, tracksuit_type,
                price_text, sizes_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&variant.id)
        .bind(product_id)
        .bind(position)
        .bind(&variant.name)
        .bind(&variant.value)
        .bind(&variant.fabric_type)
        .bind(&variant.tracksuit_type)
        .bind(column_text(&variant.price))
        .bind(column_text(&variant.sizes))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a product by id. Inactive products are returned too.
    pub async fn get_product(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    /// Gets a product by its URL slug.
    pub async fn get_product_by_slug(&self, slug: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE slug = ?1", PRODUCT_COLUMNS);
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    /// Lists active products, featured first, then by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        debug!(limit = %limit, "Listing active products");

        let sql = format!(
            "SELECT {} FROM products WHERE is_active = 1 \
             ORDER BY is_featured DESC, name ASC LIMIT ?1",
            PRODUCT_COLUMNS
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Lists a product's variants in display order, converted to their
    /// closed shape. Malformed rows degrade instead of failing the read.
    pub async fn list_variants(&self, product_id: &str) -> DbResult<Vec<Variant>> {
        let rows = sqlx::query_as::<_, VariantRow>(
            r#"
            SELECT id, name, value, fabric_type, tracksuit_type, price_text, sizes_json
            FROM variants
            WHERE product_id = ?1
            ORDER BY position ASC, id ASC
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(product_id = %product_id, count = rows.len(), "Loaded variants");

        Ok(rows
            .into_iter()
            .map(|row| Variant::from_raw(RawVariant::from(row)))
            .collect())
    }

    /// Gets one variant of a product.
    pub async fn get_variant(&self, product_id: &str, variant_id: &str) -> DbResult<Option<Variant>> {
        let row = sqlx::query_as::<_, VariantRow>(
            r#"
            SELECT id, name, value, fabric_type, tracksuit_type, price_text, sizes_json
            FROM variants
            WHERE product_id = ?1 AND id = ?2
            "#,
        )
        .bind(product_id)
        .bind(variant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Variant::from_raw(RawVariant::from(row))))
    }

    /// Counts active products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use serde_json::json;
    use storefront_core::{resolve_unit_price, VariantKind};

    fn product(id: &str, slug: &str, price: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Jersey {}", id),
            slug: slug.to_string(),
            price: Money::from_major(price),
            compare_price: Some(Money::from_major(price + 200)),
            images: vec!["front.jpg".to_string(), "back.jpg".to_string()],
            is_active: true,
            is_featured: false,
            average_rating: 4.5,
            review_count: 12,
            category_id: Some("jerseys".to_string()),
        }
    }

    async fn catalog() -> CatalogRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().catalog()
    }

    #[tokio::test]
    async fn test_product_round_trip() {
        let repo = catalog().await;
        let original = product("p-1", "home-kit", 1450);
        repo.insert_product(&original).await.unwrap();

        let loaded = repo.get_product("p-1").await.unwrap().unwrap();
        assert_eq!(loaded, original);

        let by_slug = repo.get_product_by_slug("home-kit").await.unwrap().unwrap();
        assert_eq!(by_slug.id, "p-1");

        assert!(repo.get_product("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_rejected() {
        let repo = catalog().await;
        repo.insert_product(&product("p-1", "home-kit", 1450)).await.unwrap();

        let err = repo
            .insert_product(&product("p-2", "home-kit", 1500))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_invalid_product_is_refused() {
        let repo = catalog().await;

        let err = repo
            .insert_product(&product("p-1", "Home Kit", 1450))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Invalid(_)));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_active_skips_inactive() {
        let repo = catalog().await;
        repo.insert_product(&product("p-1", "a-kit", 1000)).await.unwrap();

        let mut hidden = product("p-2", "b-kit", 1000);
        hidden.is_active = false;
        repo.insert_product(&hidden).await.unwrap();

        let mut featured = product("p-3", "c-kit", 1000);
        featured.is_featured = true;
        repo.insert_product(&featured).await.unwrap();

        let listed = repo.list_active(10).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p-3", "p-1"]);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_variants_keep_size_tables() {
        let repo = catalog().await;
        repo.insert_product(&product("p-1", "home-kit", 1000)).await.unwrap();

        let sized = RawVariant {
            id: "v-sized".to_string(),
            name: Some("Edition".to_string()),
            value: Some("Player".to_string()),
            sizes: Some(json!([
                {"size": "M", "price": 1450},
                {"size": "XL", "price": "1550"}
            ])),
            ..RawVariant::default()
        };
        let flat = RawVariant {
            id: "v-flat".to_string(),
            fabric_type: Some("Mesh".to_string()),
            price: Some(json!(1600)),
            ..RawVariant::default()
        };
        repo.insert_variant("p-1", 0, &sized).await.unwrap();
        repo.insert_variant("p-1", 1, &flat).await.unwrap();

        let variants = repo.list_variants("p-1").await.unwrap();
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].price_for_size("XL"), Some(Money::from_major(1550)));
        assert_eq!(variants[1].kind, VariantKind::Flat { price: Some(Money::from_major(1600)) });

        let unit = resolve_unit_price(Money::from_major(1000), Some(&variants[0]), Some("M"));
        assert_eq!(unit, Money::from_major(1450));
    }

    #[tokio::test]
    async fn test_malformed_rows_degrade() {
        let repo = catalog().await;
        repo.insert_product(&product("p-1", "home-kit", 1000)).await.unwrap();

        let broken = RawVariant {
            id: "v-broken".to_string(),
            price: Some(json!("free")),
            sizes: Some(Value::String(r#"[{"size":"L","#.to_string())),
            ..RawVariant::default()
        };
        repo.insert_variant("p-1", 0, &broken).await.unwrap();

        let variant = repo.get_variant("p-1", "v-broken").await.unwrap().unwrap();
        assert_eq!(variant.kind, VariantKind::Flat { price: None });

        let product = repo.get_product("p-1").await.unwrap().unwrap();
        assert_eq!(product.price_info(&[variant]).display_price, Money::from_major(1000));
    }

    #[tokio::test]
    async fn test_variant_for_unknown_product_fails() {
        let repo = catalog().await;
        let orphan = RawVariant {
            id: "v-1".to_string(),
            ..RawVariant::default()
        };

        let err = repo.insert_variant("nope", 0, &orphan).await.unwrap_err();
        assert!(matches!(err, DbError::QueryFailed(_)));
    }
}
