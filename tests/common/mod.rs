#![allow(dead_code)]

use axum::extract::ConnectInfo;
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use link_router::application::services::AdmissionController;
use link_router::domain::ab_selection::SeededEntropy;
use link_router::domain::click_event::ClickEvent;
use link_router::domain::click_recorder::ClickRecorder;
use link_router::domain::entities::{
    CloakSettings, Link, NewAbTest, NewAbVariant, NewLink, NewTarget, TargetType,
};
use link_router::domain::repositories::{AbTestRepository, LinkRepository, TargetRepository};
use link_router::infrastructure::persistence::MemoryStore;
use link_router::routes::router;
use link_router::state::{AppState, Repositories, Settings};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::Layer;

/// Inserts the peer address `axum::serve` would provide.
#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}

/// A running app on the in-memory store.
pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<MemoryStore>,
    pub clicks: mpsc::Receiver<ClickEvent>,
}

pub fn create_test_state(
    settings: Settings,
) -> (AppState, Arc<MemoryStore>, mpsc::Receiver<ClickEvent>) {
    let store = Arc::new(MemoryStore::new());
    let (tx, rx) = mpsc::channel(100);

    let state = AppState::with_entropy(
        Repositories::in_memory(store.clone()),
        Arc::new(AdmissionController::in_memory()),
        ClickRecorder::new(tx),
        settings,
        Arc::new(SeededEntropy::new(42)),
    );

    (state, store, rx)
}

pub fn spawn_app_with(settings: Settings) -> TestApp {
    let (state, store, clicks) = create_test_state(settings);
    let app = router(state).layer(MockConnectInfoLayer);

    TestApp {
        server: TestServer::new(app).unwrap(),
        store,
        clicks,
    }
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(Settings::default())
}

pub async fn create_test_link(store: &MemoryStore, code: &str, url: &str) -> Link {
    create_link_with(store, code, url, |_| {}).await
}

pub async fn create_expired_link(store: &MemoryStore, code: &str, url: &str) -> Link {
    let expired: DateTime<Utc> = Utc::now() - chrono::Duration::hours(1);
    create_link_with(store, code, url, |l| l.expires_at = Some(expired)).await
}

pub async fn create_cloaked_link(
    store: &MemoryStore,
    code: &str,
    url: &str,
    cloak: CloakSettings,
) -> Link {
    create_link_with(store, code, url, |l| l.cloak = Some(cloak)).await
}

async fn create_link_with(
    store: &MemoryStore,
    code: &str,
    url: &str,
    customize: impl FnOnce(&mut NewLink),
) -> Link {
    let mut new_link = NewLink {
        short_code: code.to_string(),
        custom_alias: None,
        destination_url: url.to_string(),
        owner_id: None,
        expires_at: None,
        cloak: None,
    };
    customize(&mut new_link);

    LinkRepository::create(store, new_link).await.unwrap()
}

pub async fn create_test_target(
    store: &MemoryStore,
    link_id: i64,
    target_type: TargetType,
    value: &str,
    url: &str,
    priority: i32,
) {
    TargetRepository::create(
        store,
        NewTarget {
            link_id,
            target_type,
            value: value.to_string(),
            destination_url: url.to_string(),
            priority,
            is_active: true,
        },
    )
    .await
    .unwrap();
}

/// Starts a running experiment with the given `(name, url, weight)` variants.
pub async fn create_test_experiment(
    store: &MemoryStore,
    link_id: i64,
    variants: &[(&str, &str, u32)],
) -> i64 {
    let test = store
        .create_test(NewAbTest {
            link_id,
            name: "experiment".to_string(),
        })
        .await
        .unwrap();

    for (name, url, weight) in variants {
        store
            .add_variant(NewAbVariant {
                test_id: test.id,
                name: name.to_string(),
                destination_url: url.to_string(),
                weight: *weight,
            })
            .await
            .unwrap();
    }

    test.id
}
