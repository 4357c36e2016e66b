//! Shared helpers for router-level tests.

#![allow(dead_code, clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use tower::ServiceExt;

use animeu_ranking::api;
use animeu_ranking::app_state::AppState;
use animeu_ranking::domain::{Cadence, Competitor};
use animeu_ranking::persistence::{CharacterCatalog, MemoryStore, Stores};
use animeu_ranking::rating::EloParams;
use animeu_ranking::service::{
    ActionService, BattleSeeder, JobRunner, LockManager, RankingService, RecomputeJob,
};

/// Test application over a fresh in-memory store.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

/// Builds the app. `grace` is how long finished jobs keep their lock.
pub fn app(with_catalog: bool, grace: Duration) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let stores = Stores::from_backend(Arc::clone(&store));

    let seeder = with_catalog.then(|| {
        let catalog = CharacterCatalog::new(vec![
            Competitor::new("Rem").with_feature("heart_on", 900.0),
            Competitor::new("Ram").with_feature("heart_on", 600.0),
            Competitor::new("Emilia").with_feature("heart_on", 800.0),
        ]);
        let Ok(seeder) = BattleSeeder::new(
            Arc::new(catalog),
            Arc::clone(&stores.games),
            Arc::clone(&stores.accounts),
        ) else {
            panic!("catalog has enough characters");
        };
        Arc::new(seeder.with_cadence(Cadence::every(4)))
    });
    let recompute = RecomputeJob::new(Arc::clone(&stores.games), Arc::clone(&stores.snapshots))
        .with_cadence(Cadence::every(4));
    let runner = JobRunner::new(LockManager::new(Arc::clone(&stores.locks)), Arc::new(recompute))
        .with_seeder(seeder)
        .with_grace(grace);

    let state = AppState {
        actions: Arc::new(ActionService::new(runner, 20, 1000)),
        rankings: Arc::new(RankingService::new(
            stores.games,
            stores.snapshots,
            stores.accounts,
            EloParams::default(),
        )),
    };
    TestApp {
        router: api::build_router().with_state(state),
        store,
    }
}

/// Sends one request and returns the status and body text.
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<(&'static str, String)>,
) -> (StatusCode, String) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some((content_type, body)) => builder
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body)),
        None => builder.body(Body::empty()),
    };
    let Ok(request) = request else {
        panic!("invalid request");
    };
    let Ok(response) = router.clone().oneshot(request).await else {
        panic!("router is infallible");
    };
    let status = response.status();
    let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
        panic!("unreadable body");
    };
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

/// Sends a JSON body.
pub async fn send_json(
    router: &Router,
    method: Method,
    uri: &str,
    json: serde_json::Value,
) -> (StatusCode, String) {
    send(router, method, uri, Some(("application/json", json.to_string()))).await
}

/// Parses a response body as JSON.
pub fn body_json(body: &str) -> serde_json::Value {
    let Ok(value) = serde_json::from_str(body) else {
        panic!("body is not JSON: {body}");
    };
    value
}

/// Polls `GET /action/{lock}` until the lock is released.
pub async fn wait_until_idle(router: &Router, lock: &str) {
    let uri = format!("/action/{lock}");
    for _ in 0..500 {
        let (status, _) = send(router, Method::GET, &uri, None).await;
        if status == StatusCode::NO_CONTENT {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("{lock} never released");
}
