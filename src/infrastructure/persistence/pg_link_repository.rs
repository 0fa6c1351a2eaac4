//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewLink, ShortLink};
use crate::domain::repositories::{LabelCount, LinkRepository};
use crate::error::AppError;

/// Extracts the host of `original_url`, lowercased and without `www.`.
const HOST_EXPR: &str = r#"regexp_replace(
    lower(substring(original_url from '^[A-Za-z][A-Za-z0-9+.-]*://(?:[^@/]*@)?([^/:?#]+)')),
    '^www\.', '')"#;

#[derive(sqlx::FromRow)]
struct LinkRow {
    id: i64,
    original_url: String,
    short_code: String,
    title: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<LinkRow> for ShortLink {
    fn from(r: LinkRow) -> Self {
        ShortLink::new(r.id, r.original_url, r.short_code, r.title, r.created_at)
    }
}

#[derive(sqlx::FromRow)]
struct LabelRow {
    label: String,
    count: i64,
}

impl From<LabelRow> for LabelCount {
    fn from(r: LabelRow) -> Self {
        LabelCount {
            label: r.label,
            count: r.count,
        }
    }
}

/// PostgreSQL repository for link storage and retrieval.
///
/// All statements are parameterized. Soft-deleted rows (`deleted_at` set) are
/// invisible to every query.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<ShortLink, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(
            r#"
            INSERT INTO links (original_url, short_code, title)
            VALUES ($1, $2, $3)
            RETURNING id, original_url, short_code, title, created_at
            "#,
        )
        .bind(&new_link.original_url)
        .bind(&new_link.short_code)
        .bind(&new_link.title)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<ShortLink>, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(
            r#"
            SELECT id, original_url, short_code, title, created_at
            FROM links
            WHERE short_code = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_by_url(&self, original_url: &str) -> Result<Option<ShortLink>, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(
            r#"
            SELECT id, original_url, short_code, title, created_at
            FROM links
            WHERE original_url = $1 AND deleted_at IS NULL
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(original_url)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn code_exists(&self, code: &str) -> Result<bool, AppError> {
        // Soft-deleted rows still hold the unique constraint.
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM links WHERE short_code = $1)")
                .bind(code)
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(exists)
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<ShortLink>, AppError> {
        let rows = sqlx::query_as::<_, LinkRow>(
            r#"
            SELECT id, original_url, short_code, title, created_at
            FROM links
            WHERE deleted_at IS NULL
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM links WHERE deleted_at IS NULL")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }

    async fn count_created_since(&self, since: DateTime<Utc>) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM links WHERE deleted_at IS NULL AND created_at >= $1",
        )
        .bind(since)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    async fn top_destination_hosts(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<LabelCount>, AppError> {
        let sql = format!(
            r#"
            SELECT host AS label, COUNT(*) AS count
            FROM (
                SELECT {HOST_EXPR} AS host
                FROM links
                WHERE deleted_at IS NULL AND created_at >= $1
            ) hosts
            WHERE host IS NOT NULL AND host <> ''
            GROUP BY host
            ORDER BY count DESC, host
            LIMIT $2
            "#
        );

        let rows = sqlx::query_as::<_, LabelRow>(&sql)
            .bind(since)
            .bind(limit)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}
