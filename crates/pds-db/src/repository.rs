//! Postgres adapters for the [`Repository`] port.

use async_trait::async_trait;
use pds_core::{
    Article, ArticleFilter, AvailabilityFilter, EanAvailability, EanAvailabilityKey,
    PersistenceError, Repository, Upserted,
};
use sqlx::PgPool;

use crate::{articles, gtin_stock, DbError};

/// Translate a [`DbError`] into the port's error, naming `key` on not-found.
fn to_persistence(err: DbError, key: &dyn std::fmt::Display) -> PersistenceError {
    match err {
        DbError::NotFound => PersistenceError::NotFound(key.to_string()),
        other => PersistenceError::from(other),
    }
}

#[derive(Debug, Clone)]
pub struct PgArticleRepository {
    pool: PgPool,
}

impl PgArticleRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PgArticleRepository {
    type Entity = Article;
    type Key = String;
    type Filter = ArticleFilter;

    async fn upsert(&self, entity: &Article) -> Result<Upserted<String>, PersistenceError> {
        let change = articles::upsert_article(&self.pool, entity)
            .await
            .map_err(|e| to_persistence(e, &entity.article_key))?;
        Ok(Upserted {
            key: entity.article_key.clone(),
            change,
        })
    }

    async fn find_by_key(&self, key: &String) -> Result<Article, PersistenceError> {
        articles::get_article(&self.pool, key)
            .await
            .map_err(|e| to_persistence(e, key))
    }

    async fn list(&self, filter: &ArticleFilter) -> Result<Vec<Article>, PersistenceError> {
        articles::list_articles(&self.pool, filter)
            .await
            .map_err(PersistenceError::from)
    }
}

#[derive(Debug, Clone)]
pub struct PgGtinStockRepository {
    pool: PgPool,
}

impl PgGtinStockRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PgGtinStockRepository {
    type Entity = EanAvailability;
    type Key = EanAvailabilityKey;
    type Filter = AvailabilityFilter;

    async fn upsert(
        &self,
        entity: &EanAvailability,
    ) -> Result<Upserted<EanAvailabilityKey>, PersistenceError> {
        let key = entity.key();
        let change = gtin_stock::upsert_gtin_stock(&self.pool, entity)
            .await
            .map_err(|e| to_persistence(e, &key))?;
        Ok(Upserted { key, change })
    }

    async fn find_by_key(
        &self,
        key: &EanAvailabilityKey,
    ) -> Result<EanAvailability, PersistenceError> {
        gtin_stock::get_gtin_stock(&self.pool, key)
            .await
            .map_err(|e| to_persistence(e, key))
    }

    async fn list(
        &self,
        filter: &AvailabilityFilter,
    ) -> Result<Vec<EanAvailability>, PersistenceError> {
        gtin_stock::list_gtin_stock(&self.pool, filter)
            .await
            .map_err(PersistenceError::from)
    }
}
