//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{CloakMode, CloakSettings, Link, NewLink};
use crate::domain::repositories::{LinkFilter, LinkRepository};
use crate::error::AppError;

const LINK_COLUMNS: &str = "id, short_code, custom_alias, destination_url, is_active, \
     expires_at, owner_id, cloak_mode, cloak_title, cloak_favicon_url, created_at, updated_at";

#[derive(Debug, FromRow)]
struct LinkRow {
    id: i64,
    short_code: String,
    custom_alias: Option<String>,
    destination_url: String,
    is_active: bool,
    expires_at: Option<DateTime<Utc>>,
    owner_id: Option<i64>,
    cloak_mode: Option<String>,
    cloak_title: Option<String>,
    cloak_favicon_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LinkRow> for Link {
    type Error = AppError;

    fn try_from(row: LinkRow) -> Result<Self, Self::Error> {
        let cloak = row
            .cloak_mode
            .map(|mode| {
                mode.parse::<CloakMode>()
                    .map(|mode| CloakSettings {
                        mode,
                        title: row.cloak_title,
                        favicon_url: row.cloak_favicon_url,
                    })
                    .map_err(|e| AppError::internal("Corrupt link record", json!({ "reason": e })))
            })
            .transpose()?;

        Ok(Link {
            id: row.id,
            short_code: row.short_code,
            custom_alias: row.custom_alias,
            destination_url: row.destination_url,
            is_active: row.is_active,
            expires_at: row.expires_at,
            owner_id: row.owner_id,
            cloak,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// PostgreSQL repository for link storage and retrieval.
///
/// Uniqueness of short codes and aliases is enforced by the table's UNIQUE
/// constraints; violations surface as [`AppError::Conflict`] or
/// [`AppError::AliasTaken`].
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
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let (cloak_mode, cloak_title, cloak_favicon_url) = match new_link.cloak {
            Some(c) => (Some(c.mode.as_str()), c.title, c.favicon_url),
            None => (None, None, None),
        };

        let row: LinkRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO links (short_code, custom_alias, destination_url, owner_id, expires_at,
                               cloak_mode, cloak_title, cloak_favicon_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {LINK_COLUMNS}
            "#
        ))
        .bind(&new_link.short_code)
        .bind(&new_link.custom_alias)
        .bind(&new_link.destination_url)
        .bind(new_link.owner_id)
        .bind(new_link.expires_at)
        .bind(cloak_mode)
        .bind(cloak_title)
        .bind(cloak_favicon_url)
        .fetch_one(self.pool.as_ref())
        .await?;

        row.try_into()
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        let row: Option<LinkRow> = sqlx::query_as(&format!(
            r#"
            SELECT {LINK_COLUMNS}
            FROM links
            WHERE short_code = $1 OR custom_alias = $1
            ORDER BY (short_code = $1) DESC
            LIMIT 1
            "#
        ))
        .bind(code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(Link::try_from).transpose()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError> {
        let row: Option<LinkRow> =
            sqlx::query_as(&format!("SELECT {LINK_COLUMNS} FROM links WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool.as_ref())
                .await?;

        row.map(Link::try_from).transpose()
    }

    async fn count(&self, filter: LinkFilter) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM links
            WHERE ($1::bigint IS NULL OR owner_id = $1)
              AND (NOT $2 OR is_active)
            "#,
        )
        .bind(filter.owner_id)
        .bind(filter.only_active)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }
}
