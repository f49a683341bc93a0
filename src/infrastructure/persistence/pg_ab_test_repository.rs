//! PostgreSQL implementation of the A/B experiment repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{
    AbTest, AbTestStatus, AbVariant, NewAbTest, NewAbVariant, RunningTest,
};
use crate::domain::repositories::AbTestRepository;
use crate::error::AppError;

#[derive(Debug, FromRow)]
struct AbTestRow {
    id: i64,
    link_id: i64,
    name: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AbTestRow> for AbTest {
    type Error = AppError;

    fn try_from(row: AbTestRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<AbTestStatus>()
            .map_err(|e| AppError::internal("Corrupt test record", json!({ "reason": e })))?;

        Ok(AbTest {
            id: row.id,
            link_id: row.link_id,
            name: row.name,
            status,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct AbVariantRow {
    id: i64,
    test_id: i64,
    name: String,
    destination_url: String,
    weight: i32,
}

impl TryFrom<AbVariantRow> for AbVariant {
    type Error = AppError;

    fn try_from(row: AbVariantRow) -> Result<Self, Self::Error> {
        let weight = u32::try_from(row.weight).map_err(|_| {
            AppError::internal("Corrupt variant record", json!({ "weight": row.weight }))
        })?;

        Ok(AbVariant {
            id: row.id,
            test_id: row.test_id,
            name: row.name,
            destination_url: row.destination_url,
            weight,
        })
    }
}

/// PostgreSQL repository for experiments and variants.
pub struct PgAbTestRepository {
    pool: Arc<PgPool>,
}

impl PgAbTestRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AbTestRepository for PgAbTestRepository {
    async fn find_running_for_link(&self, link_id: i64) -> Result<Option<RunningTest>, AppError> {
        let test_row: Option<AbTestRow> = sqlx::query_as(
            r#"
            SELECT id, link_id, name, status, created_at
            FROM ab_tests
            WHERE link_id = $1 AND status = 'RUNNING'
            ORDER BY created_at, id
            LIMIT 1
            "#,
        )
        .bind(link_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        let Some(test_row) = test_row else {
            return Ok(None);
        };
        let test = AbTest::try_from(test_row)?;

        let variant_rows: Vec<AbVariantRow> = sqlx::query_as(
            r#"
            SELECT id, test_id, name, destination_url, weight
            FROM ab_variants
            WHERE test_id = $1
            ORDER BY id
            "#,
        )
        .bind(test.id)
        .fetch_all(self.pool.as_ref())
        .await?;

        let variants = variant_rows
            .into_iter()
            .map(AbVariant::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(RunningTest { test, variants }))
    }

    async fn find_test(&self, test_id: i64) -> Result<Option<AbTest>, AppError> {
        let row: Option<AbTestRow> = sqlx::query_as(
            "SELECT id, link_id, name, status, created_at FROM ab_tests WHERE id = $1",
        )
        .bind(test_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(AbTest::try_from).transpose()
    }

    async fn create_test(&self, new_test: NewAbTest) -> Result<AbTest, AppError> {
        let row: AbTestRow = sqlx::query_as(
            r#"
            INSERT INTO ab_tests (link_id, name)
            VALUES ($1, $2)
            RETURNING id, link_id, name, status, created_at
            "#,
        )
        .bind(new_test.link_id)
        .bind(&new_test.name)
        .fetch_one(self.pool.as_ref())
        .await?;

        row.try_into()
    }

    async fn add_variant(&self, new_variant: NewAbVariant) -> Result<AbVariant, AppError> {
        let weight = i32::try_from(new_variant.weight).map_err(|_| {
            AppError::bad_request("Variant weight is too large", json!({ "weight": new_variant.weight }))
        })?;

        let row: AbVariantRow = sqlx::query_as(
            r#"
            INSERT INTO ab_variants (test_id, name, destination_url, weight)
            VALUES ($1, $2, $3, $4)
            RETURNING id, test_id, name, destination_url, weight
            "#,
        )
        .bind(new_variant.test_id)
        .bind(&new_variant.name)
        .bind(&new_variant.destination_url)
        .bind(weight)
        .fetch_one(self.pool.as_ref())
        .await?;

        row.try_into()
    }

    async fn count_running_for_owner(&self, owner_id: i64) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM ab_tests t
            JOIN links l ON l.id = t.link_id
            WHERE l.owner_id = $1 AND t.status = 'RUNNING'
            "#,
        )
        .bind(owner_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    async fn count_variants(&self, test_id: i64) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ab_variants WHERE test_id = $1")
            .bind(test_id)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }
}
