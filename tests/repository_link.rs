//! PostgreSQL repository tests. Run with a database:
//! `DATABASE_URL=postgres://... cargo test -- --ignored`

use chrono::{Duration, Utc};
use link_router::domain::entities::{CloakMode, CloakSettings, NewLink};
use link_router::domain::repositories::{LinkFilter, LinkRepository};
use link_router::error::AppError;
use link_router::infrastructure::persistence::PgLinkRepository;
use sqlx::PgPool;
use std::sync::Arc;

fn new_link(code: &str) -> NewLink {
    NewLink {
        short_code: code.to_string(),
        custom_alias: None,
        destination_url: "https://example.com/".to_string(),
        owner_id: None,
        expires_at: None,
        cloak: None,
    }
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_create_link(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    let link = repo.create(new_link("test123")).await.unwrap();

    assert_eq!(link.short_code, "test123");
    assert_eq!(link.destination_url, "https://example.com/");
    assert!(link.is_active);
    assert!(link.cloak.is_none());
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_find_by_code(pool: PgPool) {
    sqlx::query("INSERT INTO links (short_code, destination_url) VALUES ($1, $2)")
        .bind("abc123")
        .bind("https://example.com")
        .execute(&pool)
        .await
        .unwrap();

    let repo = PgLinkRepository::new(Arc::new(pool));
    let link = repo.find_by_code("abc123").await.unwrap();

    assert_eq!(link.unwrap().short_code, "abc123");
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_find_by_code_not_found(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    let result = repo.find_by_code("notfound").await.unwrap();

    assert!(result.is_none());
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_find_by_alias(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    let mut aliased = new_link("promo");
    aliased.custom_alias = Some("promo".to_string());
    repo.create(aliased).await.unwrap();

    let link = repo.find_by_code("promo").await.unwrap().unwrap();

    assert_eq!(link.custom_alias.as_deref(), Some("promo"));
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_duplicate_code_conflicts(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    repo.create(new_link("dup1234")).await.unwrap();

    let err = repo.create(new_link("dup1234")).await.unwrap_err();

    assert!(matches!(err, AppError::Conflict { .. }));
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_duplicate_alias_taken(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    let mut first = new_link("code-one");
    first.custom_alias = Some("shared".to_string());
    repo.create(first).await.unwrap();

    let mut second = new_link("code-two");
    second.custom_alias = Some("shared".to_string());
    let err = repo.create(second).await.unwrap_err();

    assert!(matches!(err, AppError::AliasTaken { .. }));
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_cloak_settings_round_trip(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    let mut cloaked = new_link("cloak01");
    cloaked.cloak = Some(CloakSettings {
        mode: CloakMode::MetaRefresh,
        title: Some("Hello".to_string()),
        favicon_url: Some("https://cdn.example.com/icon.png".to_string()),
    });
    let created = repo.create(cloaked).await.unwrap();

    let found = repo.find_by_id(created.id).await.unwrap().unwrap();

    let cloak = found.cloak.unwrap();
    assert_eq!(cloak.mode, CloakMode::MetaRefresh);
    assert_eq!(cloak.title.as_deref(), Some("Hello"));
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_expiry_is_stored(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    let mut expiring = new_link("exp0001");
    expiring.expires_at = Some(Utc::now() - Duration::hours(1));

    let link = repo.create(expiring).await.unwrap();

    assert!(!link.is_resolvable_at(Utc::now()));
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_count_with_filter(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool.clone()));

    let mut owned = new_link("own0001");
    owned.owner_id = Some(7);
    repo.create(owned).await.unwrap();
    let other = repo.create(new_link("any0001")).await.unwrap();

    sqlx::query("UPDATE links SET is_active = FALSE WHERE id = $1")
        .bind(other.id)
        .execute(&pool)
        .await
        .unwrap();

    assert_eq!(repo.count(LinkFilter::default()).await.unwrap(), 2);
    assert_eq!(repo.count(LinkFilter::for_owner(7)).await.unwrap(), 1);
    assert_eq!(
        repo.count(LinkFilter {
            owner_id: None,
            only_active: true,
        })
        .await
        .unwrap(),
        1
    );
}
