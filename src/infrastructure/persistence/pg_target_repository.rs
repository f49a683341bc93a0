//! PostgreSQL implementation of target repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{NewTarget, Target, TargetType};
use crate::domain::repositories::TargetRepository;
use crate::error::AppError;

#[derive(Debug, FromRow)]
struct TargetRow {
    id: i64,
    link_id: i64,
    target_type: String,
    value: String,
    destination_url: String,
    priority: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<TargetRow> for Target {
    type Error = AppError;

    fn try_from(row: TargetRow) -> Result<Self, Self::Error> {
        let target_type = row
            .target_type
            .parse::<TargetType>()
            .map_err(|e| AppError::internal("Corrupt target record", json!({ "reason": e })))?;

        Ok(Target {
            id: row.id,
            link_id: row.link_id,
            target_type,
            value: row.value,
            destination_url: row.destination_url,
            priority: row.priority,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

/// PostgreSQL repository for targeting rules.
pub struct PgTargetRepository {
    pool: Arc<PgPool>,
}

impl PgTargetRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TargetRepository for PgTargetRepository {
    async fn list_for_link(&self, link_id: i64) -> Result<Vec<Target>, AppError> {
        let rows: Vec<TargetRow> = sqlx::query_as(
            r#"
            SELECT id, link_id, target_type, value, destination_url, priority, is_active, created_at
            FROM link_targets
            WHERE link_id = $1
            ORDER BY id
            "#,
        )
        .bind(link_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.into_iter().map(Target::try_from).collect()
    }

    async fn create(&self, new_target: NewTarget) -> Result<Target, AppError> {
        let row: TargetRow = sqlx::query_as(
            r#"
            INSERT INTO link_targets (link_id, target_type, value, destination_url, priority, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, link_id, target_type, value, destination_url, priority, is_active, created_at
            "#,
        )
        .bind(new_target.link_id)
        .bind(new_target.target_type.as_str())
        .bind(&new_target.value)
        .bind(&new_target.destination_url)
        .bind(new_target.priority)
        .bind(new_target.is_active)
        .fetch_one(self.pool.as_ref())
        .await?;

        row.try_into()
    }
}
