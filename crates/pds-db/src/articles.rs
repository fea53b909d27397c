//! Database operations for `pds_articles`, `pds_article_attributes`, and
//! `pds_article_images`.

use std::collections::HashMap;

use chrono::{DateTime, SubsecRound, Utc};
use pds_core::{Article, ArticleFilter, Attribute, Image, RowChange};
use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::{PgPool, Postgres, Transaction};

use crate::DbError;

const DEFAULT_LIST_LIMIT: i64 = 500;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `pds_articles` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArticleRow {
    pub article_key: String,
    pub description: String,
    pub ean: Option<String>,
    pub supplier_gln: Option<String>,
    pub manufacturer_gln: Option<String>,
    pub supplier_article_number: Option<String>,
    pub manufacturer_article_number: Option<String>,
    pub brand: Option<String>,
    pub model_name: Option<String>,
    pub season_ecc_id: Option<i64>,
    pub season_name: Option<String>,
    pub currency: Option<String>,
    pub price_pricat: Option<Decimal>,
    pub price_retail: Option<Decimal>,
    pub date_changed: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttributeRow {
    pub article_key: String,
    pub position: i32,
    pub name: String,
    pub value: String,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ImageRow {
    pub article_key: String,
    pub position: i32,
    pub url: String,
    pub image_type: Option<String>,
}

impl ArticleRow {
    /// Assemble the domain article from this row and its owned sub-rows.
    #[must_use]
    pub fn into_article(self, attributes: Vec<AttributeRow>, images: Vec<ImageRow>) -> Article {
        Article {
            article_key: self.article_key,
            description: self.description,
            ean: self.ean,
            supplier_gln: self.supplier_gln,
            manufacturer_gln: self.manufacturer_gln,
            supplier_article_number: self.supplier_article_number,
            manufacturer_article_number: self.manufacturer_article_number,
            brand: self.brand,
            model_name: self.model_name,
            season_ecc_id: self.season_ecc_id,
            season_name: self.season_name,
            currency: self.currency,
            price_pricat: self.price_pricat,
            price_retail: self.price_retail,
            date_changed: self.date_changed,
            attributes: attributes
                .into_iter()
                .map(|a| Attribute {
                    name: a.name,
                    value: a.value,
                    unit: a.unit,
                })
                .collect(),
            images: images
                .into_iter()
                .map(|i| Image {
                    url: i.url,
                    position: i.position,
                    image_type: i.image_type,
                })
                .collect(),
        }
    }
}

const ARTICLE_COLUMNS: &str = "article_key, description, ean, supplier_gln, manufacturer_gln, \
     supplier_article_number, manufacturer_article_number, brand, model_name, \
     season_ecc_id, season_name, currency, price_pricat, price_retail, date_changed, \
     created_at, updated_at";

// ---------------------------------------------------------------------------
// Write path
// ---------------------------------------------------------------------------

/// Upserts an article and replaces its attributes and images, all in one
/// transaction.
///
/// The stored article (row plus sub-rows) is compared with `article` first.
/// When they match, nothing is written and `updated_at` keeps its value.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; the transaction is
/// rolled back on drop.
pub async fn upsert_article(pool: &PgPool, article: &Article) -> Result<RowChange, DbError> {
    let mut tx = pool.begin().await?;

    let existing = sqlx::query_as::<_, ArticleRow>(&format!(
        "SELECT {ARTICLE_COLUMNS} FROM pds_articles WHERE article_key = $1 FOR UPDATE"
    ))
    .bind(&article.article_key)
    .fetch_optional(&mut *tx)
    .await?;

    let change = match existing {
        None => {
            insert_article_row(&mut tx, article).await?;
            RowChange::Created
        }
        Some(row) => {
            let attributes = fetch_attributes(&mut tx, &article.article_key).await?;
            let images = fetch_images(&mut tx, &article.article_key).await?;
            if row.into_article(attributes, images) == as_stored(article) {
                tx.rollback().await?;
                return Ok(RowChange::Unchanged);
            }
            update_article_row(&mut tx, article).await?;
            RowChange::Updated
        }
    };

    replace_sub_rows(&mut tx, article).await?;
    tx.commit().await?;

    Ok(change)
}

/// `article` as it reads back from Postgres: `TIMESTAMPTZ` keeps
/// microseconds and `NUMERIC(12,2)` rounds half away from zero.
fn as_stored(article: &Article) -> Article {
    let money = |d: Option<Decimal>| {
        d.map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    };
    Article {
        price_pricat: money(article.price_pricat),
        price_retail: money(article.price_retail),
        date_changed: article.date_changed.map(|t| t.trunc_subsecs(6)),
        ..article.clone()
    }
}

async fn insert_article_row(
    tx: &mut Transaction<'_, Postgres>,
    article: &Article,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO pds_articles \
             (article_key, description, ean, supplier_gln, manufacturer_gln, \
              supplier_article_number, manufacturer_article_number, brand, model_name, \
              season_ecc_id, season_name, currency, price_pricat, price_retail, date_changed) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
    )
    .bind(&article.article_key)
    .bind(&article.description)
    .bind(&article.ean)
    .bind(&article.supplier_gln)
    .bind(&article.manufacturer_gln)
    .bind(&article.supplier_article_number)
    .bind(&article.manufacturer_article_number)
    .bind(&article.brand)
    .bind(&article.model_name)
    .bind(article.season_ecc_id)
    .bind(&article.season_name)
    .bind(&article.currency)
    .bind(article.price_pricat)
    .bind(article.price_retail)
    .bind(article.date_changed)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn update_article_row(
    tx: &mut Transaction<'_, Postgres>,
    article: &Article,
) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE pds_articles SET \
             description                 = $2, \
             ean                         = $3, \
             supplier_gln                = $4, \
             manufacturer_gln            = $5, \
             supplier_article_number     = $6, \
             manufacturer_article_number = $7, \
             brand                       = $8, \
             model_name                  = $9, \
             season_ecc_id               = $10, \
             season_name                 = $11, \
             currency                    = $12, \
             price_pricat                = $13, \
             price_retail                = $14, \
             date_changed                = $15, \
             updated_at                  = NOW() \
         WHERE article_key = $1",
    )
    .bind(&article.article_key)
    .bind(&article.description)
    .bind(&article.ean)
    .bind(&article.supplier_gln)
    .bind(&article.manufacturer_gln)
    .bind(&article.supplier_article_number)
    .bind(&article.manufacturer_article_number)
    .bind(&article.brand)
    .bind(&article.model_name)
    .bind(article.season_ecc_id)
    .bind(&article.season_name)
    .bind(&article.currency)
    .bind(article.price_pricat)
    .bind(article.price_retail)
    .bind(article.date_changed)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn replace_sub_rows(
    tx: &mut Transaction<'_, Postgres>,
    article: &Article,
) -> Result<(), DbError> {
    sqlx::query("DELETE FROM pds_article_attributes WHERE article_key = $1")
        .bind(&article.article_key)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM pds_article_images WHERE article_key = $1")
        .bind(&article.article_key)
        .execute(&mut **tx)
        .await?;

    for (position, attribute) in article.attributes.iter().enumerate() {
        sqlx::query(
            "INSERT INTO pds_article_attributes (article_key, position, name, value, unit) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&article.article_key)
        .bind(i32::try_from(position).unwrap_or(i32::MAX))
        .bind(&attribute.name)
        .bind(&attribute.value)
        .bind(&attribute.unit)
        .execute(&mut **tx)
        .await?;
    }

    for image in &article.images {
        sqlx::query(
            "INSERT INTO pds_article_images (article_key, position, url, image_type) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&article.article_key)
        .bind(image.position)
        .bind(&image.url)
        .bind(&image.image_type)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

async fn fetch_attributes(
    tx: &mut Transaction<'_, Postgres>,
    article_key: &str,
) -> Result<Vec<AttributeRow>, DbError> {
    let rows = sqlx::query_as::<_, AttributeRow>(
        "SELECT article_key, position, name, value, unit \
         FROM pds_article_attributes \
         WHERE article_key = $1 \
         ORDER BY position, id",
    )
    .bind(article_key)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows)
}

async fn fetch_images(
    tx: &mut Transaction<'_, Postgres>,
    article_key: &str,
) -> Result<Vec<ImageRow>, DbError> {
    let rows = sqlx::query_as::<_, ImageRow>(
        "SELECT article_key, position, url, image_type \
         FROM pds_article_images \
         WHERE article_key = $1 \
         ORDER BY position, id",
    )
    .bind(article_key)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows)
}

// ---------------------------------------------------------------------------
// Read path
// ---------------------------------------------------------------------------

/// Returns the article with `article_key`, including attributes and images.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no such article exists, or
/// [`DbError::Sqlx`] if a query fails.
pub async fn get_article(pool: &PgPool, article_key: &str) -> Result<Article, DbError> {
    let row = sqlx::query_as::<_, ArticleRow>(&format!(
        "SELECT {ARTICLE_COLUMNS} FROM pds_articles WHERE article_key = $1"
    ))
    .bind(article_key)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    let keys = vec![row.article_key.clone()];
    let mut attributes = attributes_by_key(pool, &keys).await?;
    let mut images = images_by_key(pool, &keys).await?;

    Ok(row.into_article(
        attributes.remove(article_key).unwrap_or_default(),
        images.remove(article_key).unwrap_or_default(),
    ))
}

/// Lists articles ordered by key, filtered by supplier GLN and brand.
///
/// Sub-collections for the whole page are loaded with one query each.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails.
pub async fn list_articles(pool: &PgPool, filter: &ArticleFilter) -> Result<Vec<Article>, DbError> {
    let rows = sqlx::query_as::<_, ArticleRow>(&format!(
        "SELECT {ARTICLE_COLUMNS} FROM pds_articles \
         WHERE ($1::TEXT IS NULL OR supplier_gln = $1) \
           AND ($2::TEXT IS NULL OR brand = $2) \
         ORDER BY article_key \
         LIMIT $3 OFFSET $4"
    ))
    .bind(&filter.supplier_gln)
    .bind(&filter.brand)
    .bind(filter.limit.unwrap_or(DEFAULT_LIST_LIMIT))
    .bind(filter.offset.unwrap_or(0))
    .fetch_all(pool)
    .await?;

    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let keys: Vec<String> = rows.iter().map(|r| r.article_key.clone()).collect();
    let mut attributes = attributes_by_key(pool, &keys).await?;
    let mut images = images_by_key(pool, &keys).await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let attrs = attributes.remove(&row.article_key).unwrap_or_default();
            let imgs = images.remove(&row.article_key).unwrap_or_default();
            row.into_article(attrs, imgs)
        })
        .collect())
}

/// Returns the number of rows in `pds_articles`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_articles(pool: &PgPool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM pds_articles")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

async fn attributes_by_key(
    pool: &PgPool,
    keys: &[String],
) -> Result<HashMap<String, Vec<AttributeRow>>, DbError> {
    let rows = sqlx::query_as::<_, AttributeRow>(
        "SELECT article_key, position, name, value, unit \
         FROM pds_article_attributes \
         WHERE article_key = ANY($1::text[]) \
         ORDER BY article_key, position, id",
    )
    .bind(keys)
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<String, Vec<AttributeRow>> = HashMap::new();
    for row in rows {
        let key = row.article_key.clone();
        grouped.entry(key).or_default().push(row);
    }
    Ok(grouped)
}

async fn images_by_key(
    pool: &PgPool,
    keys: &[String],
) -> Result<HashMap<String, Vec<ImageRow>>, DbError> {
    let rows = sqlx::query_as::<_, ImageRow>(
        "SELECT article_key, position, url, image_type \
         FROM pds_article_images \
         WHERE article_key = ANY($1::text[]) \
         ORDER BY article_key, position, id",
    )
    .bind(keys)
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<String, Vec<ImageRow>> = HashMap::new();
    for row in rows {
        let key = row.article_key.clone();
        grouped.entry(key).or_default().push(row);
    }
    Ok(grouped)
}
