//! Database operations for `pds_gtins_stock`.

use chrono::{DateTime, Utc};
use pds_core::{
    AvailabilityFilter, EanAvailability, EanAvailabilityKey, ItemType, RowChange, SupplierInfo,
};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

const DEFAULT_LIST_LIMIT: i64 = 1000;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `pds_gtins_stock` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GtinStockRow {
    pub ean: String,
    pub retailer_id: String,
    pub retailer_gln: String,
    pub supplier_id: i64,
    pub supplier_gln: String,
    pub supplier_name: String,
    pub quantity: i32,
    pub price: Option<Decimal>,
    pub stock_traffic_light: Option<String>,
    /// `'Pair'` or `'Set'`, enforced by a CHECK constraint.
    pub item_type: String,
    pub stock_timestamp: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<GtinStockRow> for EanAvailability {
    type Error = DbError;

    fn try_from(row: GtinStockRow) -> Result<Self, Self::Error> {
        let item_type = row
            .item_type
            .parse::<ItemType>()
            .map_err(DbError::InvalidRow)?;

        Ok(EanAvailability {
            ean: row.ean,
            supplier: SupplierInfo {
                retailer_id: row.retailer_id,
                retailer_gln: row.retailer_gln,
                supplier_id: row.supplier_id,
                supplier_gln: row.supplier_gln,
                supplier_name: row.supplier_name,
            },
            quantity: row.quantity,
            price: row.price,
            stock_traffic_light: row.stock_traffic_light,
            item_type,
            stock_timestamp: row.stock_timestamp,
        })
    }
}

/// A `(supplier_gln, ean)` pair known to the stock table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct SupplierEanPair {
    pub supplier_gln: String,
    pub ean: String,
}

const STOCK_COLUMNS: &str = "ean, retailer_id, retailer_gln, supplier_id, supplier_gln, \
     supplier_name, quantity, price, stock_traffic_light, item_type, stock_timestamp, \
     created_at, updated_at";

// ---------------------------------------------------------------------------
// Write path
// ---------------------------------------------------------------------------

/// Upserts one availability row keyed on `(ean, retailer_id, supplier_id)`.
///
/// The conflict branch only fires when at least one stored column differs,
/// so an identical resync returns no row and leaves `updated_at` alone.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_gtin_stock(pool: &PgPool, row: &EanAvailability) -> Result<RowChange, DbError> {
    let is_new: Option<bool> = sqlx::query_scalar::<_, bool>(
        "INSERT INTO pds_gtins_stock \
             (ean, retailer_id, retailer_gln, supplier_id, supplier_gln, supplier_name, \
              quantity, price, stock_traffic_light, item_type, stock_timestamp) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         ON CONFLICT (ean, retailer_id, supplier_id) DO UPDATE SET \
             retailer_gln        = EXCLUDED.retailer_gln, \
             supplier_gln        = EXCLUDED.supplier_gln, \
             supplier_name       = EXCLUDED.supplier_name, \
             quantity            = EXCLUDED.quantity, \
             price               = EXCLUDED.price, \
             stock_traffic_light = EXCLUDED.stock_traffic_light, \
             item_type           = EXCLUDED.item_type, \
             stock_timestamp     = EXCLUDED.stock_timestamp, \
             updated_at          = NOW() \
         WHERE (pds_gtins_stock.retailer_gln, pds_gtins_stock.supplier_gln, \
                pds_gtins_stock.supplier_name, pds_gtins_stock.quantity, \
                pds_gtins_stock.price, pds_gtins_stock.stock_traffic_light, \
                pds_gtins_stock.item_type, pds_gtins_stock.stock_timestamp) \
           IS DISTINCT FROM \
               (EXCLUDED.retailer_gln, EXCLUDED.supplier_gln, EXCLUDED.supplier_name, \
                EXCLUDED.quantity, EXCLUDED.price, EXCLUDED.stock_traffic_light, \
                EXCLUDED.item_type, EXCLUDED.stock_timestamp) \
         RETURNING (xmax = 0) AS is_new",
    )
    .bind(&row.ean)
    .bind(&row.supplier.retailer_id)
    .bind(&row.supplier.retailer_gln)
    .bind(row.supplier.supplier_id)
    .bind(&row.supplier.supplier_gln)
    .bind(&row.supplier.supplier_name)
    .bind(row.quantity)
    .bind(row.price)
    .bind(&row.stock_traffic_light)
    .bind(row.item_type.as_str())
    .bind(row.stock_timestamp)
    .fetch_optional(pool)
    .await?;

    Ok(match is_new {
        Some(true) => RowChange::Created,
        Some(false) => RowChange::Updated,
        None => RowChange::Unchanged,
    })
}

// ---------------------------------------------------------------------------
// Read path
// ---------------------------------------------------------------------------

/// Returns the availability row for `key`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if absent, [`DbError::InvalidRow`] if the
/// stored item type is unknown, or [`DbError::Sqlx`] if the query fails.
pub async fn get_gtin_stock(
    pool: &PgPool,
    key: &EanAvailabilityKey,
) -> Result<EanAvailability, DbError> {
    let row = sqlx::query_as::<_, GtinStockRow>(&format!(
        "SELECT {STOCK_COLUMNS} FROM pds_gtins_stock \
         WHERE ean = $1 AND retailer_id = $2 AND supplier_id = $3"
    ))
    .bind(&key.ean)
    .bind(&key.retailer_id)
    .bind(key.supplier_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    EanAvailability::try_from(row)
}

/// Lists availability rows, optionally narrowed to one supplier and/or
/// retailer GLN.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::InvalidRow`]
/// for a row that cannot be converted.
pub async fn list_gtin_stock(
    pool: &PgPool,
    filter: &AvailabilityFilter,
) -> Result<Vec<EanAvailability>, DbError> {
    let rows = sqlx::query_as::<_, GtinStockRow>(&format!(
        "SELECT {STOCK_COLUMNS} FROM pds_gtins_stock \
         WHERE ($1::TEXT IS NULL OR supplier_gln = $1) \
           AND ($2::TEXT IS NULL OR retailer_gln = $2) \
         ORDER BY supplier_gln, ean \
         LIMIT $3"
    ))
    .bind(&filter.supplier_gln)
    .bind(&filter.retailer_gln)
    .bind(filter.limit.unwrap_or(DEFAULT_LIST_LIMIT))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(EanAvailability::try_from).collect()
}

/// Returns the distinct `(supplier_gln, ean)` pairs, ordered for stable paging.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_supplier_ean_pairs(pool: &PgPool) -> Result<Vec<SupplierEanPair>, DbError> {
    let rows = sqlx::query_as::<_, SupplierEanPair>(
        "SELECT DISTINCT supplier_gln, ean \
         FROM pds_gtins_stock \
         ORDER BY supplier_gln, ean",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_distinct_supplier_glns(pool: &PgPool) -> Result<Vec<String>, DbError> {
    let rows = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT supplier_gln FROM pds_gtins_stock ORDER BY supplier_gln",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_distinct_eans(pool: &PgPool) -> Result<Vec<String>, DbError> {
    let rows =
        sqlx::query_scalar::<_, String>("SELECT DISTINCT ean FROM pds_gtins_stock ORDER BY ean")
            .fetch_all(pool)
            .await?;

    Ok(rows)
}

/// Returns the number of rows in `pds_gtins_stock`, optionally for one supplier.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_gtin_stock(pool: &PgPool, supplier_gln: Option<&str>) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM pds_gtins_stock WHERE ($1::TEXT IS NULL OR supplier_gln = $1)",
    )
    .bind(supplier_gln)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
