//! PostgreSQL tests for targets, experiments and the click sink.
//! Run with a database: `DATABASE_URL=postgres://... cargo test -- --ignored`

use link_router::domain::click_event::ClickEvent;
use link_router::domain::entities::{
    AbTestStatus, Link, NewAbTest, NewAbVariant, NewLink, NewTarget, TargetType,
};
use link_router::domain::repositories::{
    AbTestRepository, ClickRepository, LinkRepository, TargetRepository,
};
use link_router::error::AppError;
use link_router::infrastructure::persistence::{
    PgAbTestRepository, PgClickRepository, PgLinkRepository, PgTargetRepository,
};
use sqlx::PgPool;
use std::sync::Arc;

async fn create_link(pool: &Arc<PgPool>, code: &str, owner_id: Option<i64>) -> Link {
    PgLinkRepository::new(pool.clone())
        .create(NewLink {
            short_code: code.to_string(),
            custom_alias: None,
            destination_url: "https://example.com/".to_string(),
            owner_id,
            expires_at: None,
            cloak: None,
        })
        .await
        .unwrap()
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_targets_listed_in_insertion_order(pool: PgPool) {
    let pool = Arc::new(pool);
    let link = create_link(&pool, "targets", None).await;
    let repo = PgTargetRepository::new(pool);

    for (target_type, value) in [(TargetType::Country, "DE"), (TargetType::Device, "mobile")] {
        repo.create(NewTarget {
            link_id: link.id,
            target_type,
            value: value.to_string(),
            destination_url: "https://example.de/".to_string(),
            priority: 0,
            is_active: true,
        })
        .await
        .unwrap();
    }

    let targets = repo.list_for_link(link.id).await.unwrap();

    assert_eq!(targets.len(), 2);
    assert_eq!(targets[0].target_type, TargetType::Country);
    assert_eq!(targets[1].value, "mobile");
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_target_for_missing_link(pool: PgPool) {
    let repo = PgTargetRepository::new(Arc::new(pool));

    let err = repo
        .create(NewTarget {
            link_id: 999_999,
            target_type: TargetType::Os,
            value: "ios".to_string(),
            destination_url: "https://example.com/".to_string(),
            priority: 0,
            is_active: true,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound { .. }));
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_running_experiment_with_variants(pool: PgPool) {
    let pool = Arc::new(pool);
    let link = create_link(&pool, "abtest1", Some(3)).await;
    let repo = PgAbTestRepository::new(pool.clone());

    let test = repo
        .create_test(NewAbTest {
            link_id: link.id,
            name: "headline".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(test.status, AbTestStatus::Running);

    for (name, weight) in [("A", 70), ("B", 30)] {
        repo.add_variant(NewAbVariant {
            test_id: test.id,
            name: name.to_string(),
            destination_url: format!("https://example.com/{name}"),
            weight,
        })
        .await
        .unwrap();
    }

    let running = repo.find_running_for_link(link.id).await.unwrap().unwrap();
    assert_eq!(running.test.id, test.id);
    assert_eq!(running.variants.len(), 2);
    assert_eq!(running.variants[0].weight, 70);

    assert_eq!(repo.count_variants(test.id).await.unwrap(), 2);
    assert_eq!(repo.count_running_for_owner(3).await.unwrap(), 1);
    assert_eq!(repo.count_running_for_owner(4).await.unwrap(), 0);

    sqlx::query("UPDATE ab_tests SET status = 'COMPLETED' WHERE id = $1")
        .bind(test.id)
        .execute(pool.as_ref())
        .await
        .unwrap();

    assert!(repo.find_running_for_link(link.id).await.unwrap().is_none());
    assert_eq!(repo.count_running_for_owner(3).await.unwrap(), 0);
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_click_counts_by_variant(pool: PgPool) {
    let pool = Arc::new(pool);
    let link = create_link(&pool, "clicks1", None).await;
    let tests = PgAbTestRepository::new(pool.clone());
    let test = tests
        .create_test(NewAbTest {
            link_id: link.id,
            name: "t".to_string(),
        })
        .await
        .unwrap();
    let variant = tests
        .add_variant(NewAbVariant {
            test_id: test.id,
            name: "A".to_string(),
            destination_url: "https://example.com/a".to_string(),
            weight: 1,
        })
        .await
        .unwrap();

    let clicks = PgClickRepository::new(pool);
    clicks.record_click(ClickEvent::new(link.id)).await.unwrap();
    for _ in 0..2 {
        clicks
            .record_click(ClickEvent {
                variant_id: Some(variant.id),
                ip: Some("203.0.113.9".to_string()),
                country: Some("US".to_string()),
                ..ClickEvent::new(link.id)
            })
            .await
            .unwrap();
    }

    assert_eq!(clicks.count_for_link(link.id).await.unwrap(), 3);

    let by_variant = clicks.count_by_variant(link.id).await.unwrap();
    assert_eq!(by_variant.len(), 2);
    assert_eq!(by_variant[0].variant_id, None);
    assert_eq!(by_variant[0].clicks, 1);
    assert_eq!(by_variant[1].variant_id, Some(variant.id));
    assert_eq!(by_variant[1].clicks, 2);
}
