//! PostgreSQL implementation of click repository.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::entities::{Click, NewClick};
use crate::domain::repositories::{ClickRepository, DailyClicks, LabelCount};
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct ClickRow {
    id: i64,
    link_id: i64,
    ip_address: String,
    user_agent: String,
    referer: String,
    country: Option<String>,
    city: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ClickRow> for Click {
    fn from(r: ClickRow) -> Self {
        Click {
            id: r.id,
            link_id: r.link_id,
            ip_address: r.ip_address,
            user_agent: r.user_agent,
            referer: r.referer,
            country: r.country,
            city: r.city,
            created_at: r.created_at,
        }
    }
}

/// PostgreSQL repository for click tracking and analytics.
///
/// Rows are append-only; every aggregate is computed on read.
pub struct PgClickRepository {
    pool: Arc<PgPool>,
}

impl PgClickRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn top_labels(
        &self,
        column: &'static str,
        link_id: i64,
        limit: i64,
    ) -> Result<Vec<LabelCount>, AppError> {
        let sql = format!(
            r#"
            SELECT {column} AS label, COUNT(*) AS count
            FROM clicks
            WHERE link_id = $1 AND {column} IS NOT NULL AND {column} <> ''
            GROUP BY {column}
            ORDER BY count DESC, label
            LIMIT $2
            "#
        );

        let rows: Vec<(String, i64)> = sqlx::query_as(&sql)
            .bind(link_id)
            .bind(limit)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(label, count)| LabelCount { label, count })
            .collect())
    }
}

#[async_trait]
impl ClickRepository for PgClickRepository {
    async fn record_click(&self, new_click: NewClick) -> Result<Click, AppError> {
        let row = sqlx::query_as::<_, ClickRow>(
            r#"
            INSERT INTO clicks (link_id, ip_address, user_agent, referer, country, city)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, link_id, ip_address, user_agent, referer, country, city, created_at
            "#,
        )
        .bind(new_click.link_id)
        .bind(&new_click.ip_address)
        .bind(&new_click.user_agent)
        .bind(&new_click.referer)
        .bind(&new_click.country)
        .bind(&new_click.city)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn count_for_link(&self, link_id: i64) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clicks WHERE link_id = $1")
            .bind(link_id)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }

    async fn count_for_links(&self, link_ids: &[i64]) -> Result<HashMap<i64, i64>, AppError> {
        if link_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i64, i64)> = sqlx::query_as(
            r#"
            SELECT link_id, COUNT(*)
            FROM clicks
            WHERE link_id = ANY($1)
            GROUP BY link_id
            "#,
        )
        .bind(link_ids)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().collect())
    }

    async fn daily_clicks(
        &self,
        link_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyClicks>, AppError> {
        let rows: Vec<(NaiveDate, i64)> = sqlx::query_as(
            r#"
            SELECT (created_at AT TIME ZONE 'UTC')::date AS day, COUNT(*)
            FROM clicks
            WHERE link_id = $1 AND created_at >= $2
            GROUP BY day
            ORDER BY day DESC
            "#,
        )
        .bind(link_id)
        .bind(since)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|(date, count)| DailyClicks { date, count })
            .collect())
    }

    async fn top_countries(&self, link_id: i64, limit: i64) -> Result<Vec<LabelCount>, AppError> {
        self.top_labels("country", link_id, limit).await
    }

    async fn top_referers(&self, link_id: i64, limit: i64) -> Result<Vec<LabelCount>, AppError> {
        self.top_labels("referer", link_id, limit).await
    }

    async fn count_all(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clicks")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }

    async fn count_since(&self, since: DateTime<Utc>) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clicks WHERE created_at >= $1")
            .bind(since)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }

    async fn recent(&self, limit: i64) -> Result<Vec<Click>, AppError> {
        let rows = sqlx::query_as::<_, ClickRow>(
            r#"
            SELECT id, link_id, ip_address, user_agent, referer, country, city, created_at
            FROM clicks
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
