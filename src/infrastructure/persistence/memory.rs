//! In-process implementation of every repository.
//!
//! Mirrors the PostgreSQL constraints (unique short code, unique alias,
//! foreign keys) so services behave the same against either backend. Used
//! by tests and when no database is configured; data is lost on restart.
//! Clicks are kept as per-link, per-variant totals so the store does not grow
//! with traffic.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::domain::click_event::ClickEvent;
use crate::domain::entities::{
    AbTest, AbTestStatus, AbVariant, Link, NewAbTest, NewAbVariant, NewLink, NewTarget,
    RunningTest, Target,
};
use crate::domain::repositories::{
    AbTestRepository, ClickRepository, LinkFilter, LinkRepository, TargetRepository,
    VariantClicks,
};
use crate::error::AppError;

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    links: Vec<Link>,
    targets: Vec<Target>,
    tests: Vec<AbTest>,
    variants: Vec<AbVariant>,
    // link id -> variant id -> clicks; events themselves are not retained
    click_totals: BTreeMap<i64, BTreeMap<Option<i64>, i64>>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn link_exists(&self, link_id: i64) -> bool {
        self.links.iter().any(|l| l.id == link_id)
    }
}

/// Repository backend holding all records in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored links.
    pub async fn link_count(&self) -> usize {
        self.tables.read().await.links.len()
    }

    /// Flips a link's active flag. Returns false if the link does not exist.
    pub async fn set_link_active(&self, link_id: i64, active: bool) -> bool {
        let mut tables = self.tables.write().await;
        match tables.links.iter_mut().find(|l| l.id == link_id) {
            Some(link) => {
                link.is_active = active;
                link.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Changes an experiment's status. Returns false if it does not exist.
    pub async fn set_test_status(&self, test_id: i64, status: AbTestStatus) -> bool {
        let mut tables = self.tables.write().await;
        match tables.tests.iter_mut().find(|t| t.id == test_id) {
            Some(test) => {
                test.status = status;
                true
            }
            None => false,
        }
    }
}

fn missing(entity: &str, id: i64) -> AppError {
    AppError::not_found(format!("{entity} not found"), json!({ "id": id }))
}

#[async_trait]
impl LinkRepository for MemoryStore {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let mut tables = self.tables.write().await;

        if tables
            .links
            .iter()
            .any(|l| l.short_code == new_link.short_code)
        {
            return Err(AppError::conflict("Short code already exists", json!({})));
        }

        if let Some(alias) = &new_link.custom_alias
            && tables
                .links
                .iter()
                .any(|l| l.custom_alias.as_deref() == Some(alias.as_str()))
        {
            return Err(AppError::alias_taken(
                "Custom alias is already taken",
                json!({}),
            ));
        }

        let now = Utc::now();
        let link = Link {
            id: tables.next_id(),
            short_code: new_link.short_code,
            custom_alias: new_link.custom_alias,
            destination_url: new_link.destination_url,
            is_active: true,
            expires_at: new_link.expires_at,
            owner_id: new_link.owner_id,
            cloak: new_link.cloak,
            created_at: now,
            updated_at: now,
        };

        tables.links.push(link.clone());
        Ok(link)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        let tables = self.tables.read().await;

        let by_code = tables.links.iter().find(|l| l.short_code == code);
        let by_alias = || {
            tables
                .links
                .iter()
                .find(|l| l.custom_alias.as_deref() == Some(code))
        };

        Ok(by_code.or_else(by_alias).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.links.iter().find(|l| l.id == id).cloned())
    }

    async fn count(&self, filter: LinkFilter) -> Result<i64, AppError> {
        let tables = self.tables.read().await;

        let count = tables
            .links
            .iter()
            .filter(|l| filter.owner_id.is_none_or(|owner| l.owner_id == Some(owner)))
            .filter(|l| !filter.only_active || l.is_active)
            .count();

        Ok(count as i64)
    }
}

#[async_trait]
impl TargetRepository for MemoryStore {
    async fn list_for_link(&self, link_id: i64) -> Result<Vec<Target>, AppError> {
        let tables = self.tables.read().await;

        Ok(tables
            .targets
            .iter()
            .filter(|t| t.link_id == link_id)
            .cloned()
            .collect())
    }

    async fn create(&self, new_target: NewTarget) -> Result<Target, AppError> {
        let mut tables = self.tables.write().await;

        if !tables.link_exists(new_target.link_id) {
            return Err(missing("Link", new_target.link_id));
        }

        let target = Target {
            id: tables.next_id(),
            link_id: new_target.link_id,
            target_type: new_target.target_type,
            value: new_target.value,
            destination_url: new_target.destination_url,
            priority: new_target.priority,
            is_active: new_target.is_active,
            created_at: Utc::now(),
        };

        tables.targets.push(target.clone());
        Ok(target)
    }
}

#[async_trait]
impl AbTestRepository for MemoryStore {
    async fn find_running_for_link(&self, link_id: i64) -> Result<Option<RunningTest>, AppError> {
        let tables = self.tables.read().await;

        let Some(test) = tables
            .tests
            .iter()
            .find(|t| t.link_id == link_id && t.status == AbTestStatus::Running)
        else {
            return Ok(None);
        };

        let variants = tables
            .variants
            .iter()
            .filter(|v| v.test_id == test.id)
            .cloned()
            .collect();

        Ok(Some(RunningTest {
            test: test.clone(),
            variants,
        }))
    }

    async fn find_test(&self, test_id: i64) -> Result<Option<AbTest>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.tests.iter().find(|t| t.id == test_id).cloned())
    }

    async fn create_test(&self, new_test: NewAbTest) -> Result<AbTest, AppError> {
        let mut tables = self.tables.write().await;

        if !tables.link_exists(new_test.link_id) {
            return Err(missing("Link", new_test.link_id));
        }

        let test = AbTest {
            id: tables.next_id(),
            link_id: new_test.link_id,
            name: new_test.name,
            status: AbTestStatus::Running,
            created_at: Utc::now(),
        };

        tables.tests.push(test.clone());
        Ok(test)
    }

    async fn add_variant(&self, new_variant: NewAbVariant) -> Result<AbVariant, AppError> {
        let mut tables = self.tables.write().await;

        if !tables.tests.iter().any(|t| t.id == new_variant.test_id) {
            return Err(missing("Test", new_variant.test_id));
        }

        let variant = AbVariant {
            id: tables.next_id(),
            test_id: new_variant.test_id,
            name: new_variant.name,
            destination_url: new_variant.destination_url,
            weight: new_variant.weight,
        };

        tables.variants.push(variant.clone());
        Ok(variant)
    }

    async fn count_running_for_owner(&self, owner_id: i64) -> Result<i64, AppError> {
        let tables = self.tables.read().await;

        let count = tables
            .tests
            .iter()
            .filter(|t| t.status == AbTestStatus::Running)
            .filter(|t| {
                tables
                    .links
                    .iter()
                    .any(|l| l.id == t.link_id && l.owner_id == Some(owner_id))
            })
            .count();

        Ok(count as i64)
    }

    async fn count_variants(&self, test_id: i64) -> Result<i64, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.variants.iter().filter(|v| v.test_id == test_id).count() as i64)
    }
}

#[async_trait]
impl ClickRepository for MemoryStore {
    async fn record_click(&self, event: ClickEvent) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;

        if !tables.link_exists(event.link_id) {
            return Err(missing("Link", event.link_id));
        }

        *tables
            .click_totals
            .entry(event.link_id)
            .or_default()
            .entry(event.variant_id)
            .or_default() += 1;
        Ok(())
    }

    async fn count_for_link(&self, link_id: i64) -> Result<i64, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .click_totals
            .get(&link_id)
            .map(|totals| totals.values().sum())
            .unwrap_or(0))
    }

    async fn count_by_variant(&self, link_id: i64) -> Result<Vec<VariantClicks>, AppError> {
        let tables = self.tables.read().await;

        Ok(tables
            .click_totals
            .get(&link_id)
            .into_iter()
            .flatten()
            .map(|(&variant_id, &clicks)| VariantClicks { variant_id, clicks })
            .collect())
    }
}
