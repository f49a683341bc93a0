//! PostgreSQL implementation of the click sink.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::{ClickRepository, VariantClicks};
use crate::error::AppError;

/// PostgreSQL repository for click events.
pub struct PgClickRepository {
    pool: Arc<PgPool>,
}

impl PgClickRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClickRepository for PgClickRepository {
    async fn record_click(&self, event: ClickEvent) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO link_clicks
                (link_id, variant_id, clicked_at, ip, country, city, device, browser, os, referrer)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(event.link_id)
        .bind(event.variant_id)
        .bind(event.timestamp)
        .bind(event.ip)
        .bind(event.country)
        .bind(event.city)
        .bind(event.device)
        .bind(event.browser)
        .bind(event.os)
        .bind(event.referrer)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn count_for_link(&self, link_id: i64) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM link_clicks WHERE link_id = $1")
            .bind(link_id)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }

    async fn count_by_variant(&self, link_id: i64) -> Result<Vec<VariantClicks>, AppError> {
        let rows: Vec<(Option<i64>, i64)> = sqlx::query_as(
            r#"
            SELECT variant_id, COUNT(*)
            FROM link_clicks
            WHERE link_id = $1
            GROUP BY variant_id
            ORDER BY variant_id NULLS FIRST
            "#,
        )
        .bind(link_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|(variant_id, clicks)| VariantClicks { variant_id, clicks })
            .collect())
    }
}
