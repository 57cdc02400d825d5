//! Integration tests driving the stash-box client against an in-process
//! registry stand-in.

use axum::extract::{Multipart, State};
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use stash_box::{StashBox, StashBoxError};
use stash_common::config::StashBoxConfig;
use stash_common::db::{self, Repository};

const API_KEY: &str = "test-api-key";

#[derive(Clone, Default)]
struct RegistryState {
    /// JSON request bodies, in arrival order
    requests: Arc<Mutex<Vec<Value>>>,
    /// Multipart parts per draft request: (field name, file name, bytes)
    draft_parts: Arc<Mutex<Vec<Vec<(String, Option<String>, Vec<u8>)>>>>,
}

/// GraphQL stand-in. Echoes one remote scene per queried fingerprint so
/// correlation can be asserted end to end.
async fn graphql_handler(
    State(state): State<RegistryState>,
    headers: HeaderMap,
    Json(request): Json<Value>,
) -> Json<Value> {
    assert_eq!(
        headers.get("ApiKey").and_then(|v| v.to_str().ok()),
        Some(API_KEY),
        "every request must carry the ApiKey header"
    );

    state.requests.lock().await.push(request.clone());
    let query = request["query"].as_str().unwrap_or_default();

    if query.contains("findScenesByFullFingerprints") {
        let fingerprints = request["variables"]["fingerprints"]
            .as_array()
            .cloned()
            .unwrap_or_default();
        assert!(
            fingerprints.len() <= 100,
            "fingerprint batches must stay within the chunk bound"
        );

        let scenes: Vec<Value> = fingerprints
            .iter()
            .map(|fp| {
                json!({
                    "id": format!("remote-{}", fp["hash"].as_str().unwrap_or_default()),
                    "fingerprints": [{
                        "algorithm": fp["algorithm"],
                        "hash": fp["hash"],
                        "duration": 1200,
                    }],
                })
            })
            .collect();
        return Json(json!({ "data": { "findScenesByFullFingerprints": scenes } }));
    }

    if query.contains("submitFingerprint") {
        return Json(json!({ "data": { "submitFingerprint": true } }));
    }

    if query.contains("searchPerformer") {
        let term = request["variables"]["term"].as_str().unwrap_or_default();
        return Json(json!({
            "data": {
                "searchPerformer": [{
                    "id": "remote-p1",
                    "name": term,
                    "images": [
                        { "id": "i1", "url": "https://img.example/1.jpg" },
                        { "id": "i2", "url": "https://img.example/2.jpg" },
                    ],
                }]
            }
        }));
    }

    if query.contains("query Me") {
        return Json(json!({ "data": { "me": { "id": "u1", "name": "tester" } } }));
    }

    panic!("unexpected query: {query}");
}

/// Draft stand-in accepting GraphQL multipart uploads.
async fn draft_handler(
    State(state): State<RegistryState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Json<Value> {
    assert_eq!(
        headers.get("ApiKey").and_then(|v| v.to_str().ok()),
        Some(API_KEY)
    );

    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(|f| f.to_string());
        let bytes = field.bytes().await.unwrap().to_vec();
        parts.push((name, file_name, bytes));
    }

    let operations: Value = serde_json::from_slice(&parts[0].2).unwrap();
    let query = operations["query"].as_str().unwrap_or_default();
    let response = if query.contains("submitPerformerDraft") {
        json!({ "data": { "submitPerformerDraft": { "id": "draft-p1" } } })
    } else {
        json!({ "data": { "submitSceneDraft": { "id": "draft-s1" } } })
    };

    state.draft_parts.lock().await.push(parts);
    Json(response)
}

async fn spawn_server(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn spawn_registry() -> (SocketAddr, RegistryState) {
    let state = RegistryState::default();
    let app = Router::new()
        .route("/graphql", post(graphql_handler))
        .with_state(state.clone());
    (spawn_server(app).await, state)
}

async fn spawn_draft_registry() -> (SocketAddr, RegistryState) {
    let state = RegistryState::default();
    let app = Router::new()
        .route("/graphql", post(draft_handler))
        .with_state(state.clone());
    (spawn_server(app).await, state)
}

async fn setup_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .unwrap();
    db::init_tables(&pool).await.unwrap();
    pool
}

fn stash_box(addr: SocketAddr, pool: SqlitePool) -> StashBox {
    let config = StashBoxConfig {
        name: "test-registry".to_string(),
        endpoint: format!("http://{addr}/graphql"),
        api_key: API_KEY.to_string(),
    };
    StashBox::new(&config, Repository::new(pool)).unwrap()
}

#[tokio::test]
async fn test_find_scenes_by_fingerprints_exact_hit() {
    let (addr, _state) = spawn_registry().await;
    let pool = setup_pool().await;

    let md5 = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    sqlx::query("INSERT INTO scenes (id, checksum) VALUES (10, ?)")
        .bind(md5)
        .execute(&pool)
        .await
        .unwrap();

    let client = stash_box(addr, pool);
    let results = client
        .find_scenes_by_fingerprints(&CancellationToken::new(), &[10])
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].len(), 1);
    assert_eq!(
        results[0][0].remote_site_id.as_deref(),
        Some(format!("remote-{md5}").as_str())
    );
    assert_eq!(results[0][0].fingerprints[0].algorithm, "MD5");
}

#[tokio::test]
async fn test_find_scenes_by_fingerprints_missing_scene_is_error() {
    let (addr, _state) = spawn_registry().await;
    let pool = setup_pool().await;
    let client = stash_box(addr, pool);

    let result = client
        .find_scenes_by_fingerprints(&CancellationToken::new(), &[77])
        .await;

    match result {
        Err(StashBoxError::Common(stash_common::Error::NotFound { entity, id })) => {
            assert_eq!(entity, "scene");
            assert_eq!(id, 77);
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_find_scenes_by_fingerprints_chunks_transparently() {
    let (addr, state) = spawn_registry().await;
    let pool = setup_pool().await;

    // 150 scenes with unique checksums force two fingerprint chunks.
    for i in 1..=150i64 {
        sqlx::query("INSERT INTO scenes (id, checksum) VALUES (?, ?)")
            .bind(i)
            .bind(format!("{i:032x}"))
            .execute(&pool)
            .await
            .unwrap();
    }

    let scene_ids: Vec<i64> = (1..=150).collect();
    let client = stash_box(addr, pool);
    let results = client
        .find_scenes_by_fingerprints(&CancellationToken::new(), &scene_ids)
        .await
        .unwrap();

    assert_eq!(results.len(), 150);
    for (position, matches) in results.iter().enumerate() {
        let expected = format!("remote-{:032x}", position as i64 + 1);
        assert_eq!(matches.len(), 1, "input {position} should have one match");
        assert_eq!(matches[0].remote_site_id.as_deref(), Some(expected.as_str()));
    }

    let requests = state.requests.lock().await;
    let lookups = requests
        .iter()
        .filter(|r| {
            r["query"]
                .as_str()
                .unwrap_or_default()
                .contains("findScenesByFullFingerprints")
        })
        .count();
    assert_eq!(lookups, 2, "150 fingerprints should travel in two chunks");
}

#[tokio::test]
async fn test_find_scenes_by_fingerprints_flat_concatenates() {
    let (addr, _state) = spawn_registry().await;
    let pool = setup_pool().await;

    sqlx::query(
        "INSERT INTO scenes (id, checksum, oshash) VALUES (1, 'aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa', 'bbbbbbbbbbbbbbbb')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let client = stash_box(addr, pool);
    let results = client
        .find_scenes_by_fingerprints_flat(&CancellationToken::new(), &[1])
        .await
        .unwrap();

    // the stand-in echoes one remote scene per queried fingerprint
    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn test_submit_fingerprints_skips_scenes_without_stash_id() {
    let (addr, state) = spawn_registry().await;
    let pool = setup_pool().await;

    for (id, checksum) in [(1i64, "11"), (2, "22"), (3, "33")] {
        sqlx::query(
            "INSERT INTO scenes (id, checksum, oshash, phash, duration) VALUES (?, ?, 'dddddddddddddddd', 15, 600.0)",
        )
        .bind(id)
        .bind(checksum.repeat(16))
        .execute(&pool)
        .await
        .unwrap();
    }

    // only scene 2 is linked to this registry
    sqlx::query(
        "INSERT INTO scene_stash_ids (scene_id, endpoint, stash_id) VALUES (2, ?, 'remote-scene-2')",
    )
    .bind(format!("http://{addr}/graphql"))
    .execute(&pool)
    .await
    .unwrap();

    let client = stash_box(addr, pool);
    let ok = client
        .submit_fingerprints(&CancellationToken::new(), &[1, 2, 3])
        .await
        .unwrap();
    assert!(ok);

    let requests = state.requests.lock().await;
    let submissions: Vec<&Value> = requests
        .iter()
        .filter(|r| {
            r["query"]
                .as_str()
                .unwrap_or_default()
                .contains("submitFingerprint")
        })
        .collect();

    // one RPC per populated algorithm of scene 2, none for scenes 1 and 3
    assert_eq!(submissions.len(), 3);
    for submission in submissions {
        assert_eq!(
            submission["variables"]["input"]["scene_id"].as_str(),
            Some("remote-scene-2")
        );
        assert_eq!(
            submission["variables"]["input"]["fingerprint"]["duration"],
            json!(600)
        );
    }
}

#[tokio::test]
async fn test_query_performers_keys_by_local_id() {
    let (addr, _state) = spawn_registry().await;
    let pool = setup_pool().await;

    sqlx::query("INSERT INTO performers (id, name) VALUES (100, 'Jane Example')")
        .execute(&pool)
        .await
        .unwrap();

    let client = stash_box(addr, pool);
    let results = client
        .query_performers(&CancellationToken::new(), &[100])
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].query, "100");
    assert_eq!(results[0].results.len(), 1);

    let performer = &results[0].results[0];
    assert_eq!(performer.name.as_deref(), Some("Jane Example"));
    assert_eq!(performer.images.len(), 2);
    // deprecated single-image field carries the first image
    assert_eq!(performer.image.as_deref(), Some("https://img.example/1.jpg"));
}

#[tokio::test]
async fn test_me_probe() {
    let (addr, _state) = spawn_registry().await;
    let pool = setup_pool().await;
    let client = stash_box(addr, pool);

    let user = client.me(&CancellationToken::new()).await.unwrap().unwrap();
    assert_eq!(user.name, "tester");
}

#[tokio::test]
async fn test_cancelled_token_aborts_before_sending() {
    let (addr, state) = spawn_registry().await;
    let pool = setup_pool().await;
    let client = stash_box(addr, pool);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = client.me(&cancel).await;
    assert!(matches!(result, Err(StashBoxError::Cancelled)));
    assert!(state.requests.lock().await.is_empty());
}

#[tokio::test]
async fn test_graphql_error_is_surfaced() {
    async fn failing_handler() -> Json<Value> {
        Json(json!({ "data": null, "errors": [{ "message": "access denied" }] }))
    }
    let app = Router::new().route("/graphql", post(failing_handler));
    let addr = spawn_server(app).await;

    let pool = setup_pool().await;
    let client = stash_box(addr, pool);

    let result = client.me(&CancellationToken::new()).await;
    match result {
        Err(StashBoxError::GraphQl(message)) => assert_eq!(message, "access denied"),
        other => panic!("expected GraphQl error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_http_error_is_surfaced() {
    async fn failing_handler() -> (axum::http::StatusCode, &'static str) {
        (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom")
    }
    let app = Router::new().route("/graphql", post(failing_handler));
    let addr = spawn_server(app).await;

    let pool = setup_pool().await;
    let client = stash_box(addr, pool);

    let result = client.me(&CancellationToken::new()).await;
    match result {
        Err(StashBoxError::Remote { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected Remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_scene_draft_with_unreadable_image_degrades() {
    let (addr, state) = spawn_draft_registry().await;
    let pool = setup_pool().await;

    sqlx::query("INSERT INTO scenes (id, title) VALUES (10, 'First Scene')")
        .execute(&pool)
        .await
        .unwrap();

    let client = stash_box(addr, pool);
    let draft_id = client
        .submit_scene_draft(
            &CancellationToken::new(),
            10,
            Some(std::path::Path::new("/nonexistent/image.jpg")),
        )
        .await
        .unwrap();
    assert_eq!(draft_id.as_deref(), Some("draft-s1"));

    let recorded = state.draft_parts.lock().await;
    let parts = &recorded[0];
    let names: Vec<&str> = parts.iter().map(|(name, _, _)| name.as_str()).collect();
    assert_eq!(names, vec!["operations", "map"]);
    assert_eq!(parts[1].2, b"{}");

    let operations: Value = serde_json::from_slice(&parts[0].2).unwrap();
    assert_eq!(operations["operationName"], json!(""));
    assert_eq!(operations["variables"]["input"]["title"], json!("First Scene"));
    assert!(operations["variables"]["input"]["image"].is_null());
}

#[tokio::test]
async fn test_scene_draft_with_image_uploads_multipart() {
    let (addr, state) = spawn_draft_registry().await;
    let pool = setup_pool().await;

    sqlx::query("INSERT INTO scenes (id, title) VALUES (10, 'First Scene')")
        .execute(&pool)
        .await
        .unwrap();

    let mut image = tempfile::NamedTempFile::new().unwrap();
    image.write_all(b"fake image bytes").unwrap();
    image.flush().unwrap();

    let client = stash_box(addr, pool);
    let draft_id = client
        .submit_scene_draft(&CancellationToken::new(), 10, Some(image.path()))
        .await
        .unwrap();
    assert_eq!(draft_id.as_deref(), Some("draft-s1"));

    let recorded = state.draft_parts.lock().await;
    let parts = &recorded[0];
    let names: Vec<&str> = parts.iter().map(|(name, _, _)| name.as_str()).collect();
    assert_eq!(names, vec!["operations", "map", "0"]);

    let map: Value = serde_json::from_slice(&parts[1].2).unwrap();
    assert_eq!(map, json!({ "0": ["variables.input.image"] }));

    assert_eq!(parts[2].1.as_deref(), Some("draft"));
    assert_eq!(parts[2].2, b"fake image bytes");
}

#[tokio::test]
async fn test_performer_draft_uses_stored_image() {
    let (addr, state) = spawn_draft_registry().await;
    let pool = setup_pool().await;

    sqlx::query("INSERT INTO performers (id, name, image) VALUES (100, 'Jane Example', X'01020304')")
        .execute(&pool)
        .await
        .unwrap();

    let performer = stash_common::models::Performer {
        id: 100,
        name: "Jane Example".to_string(),
        ..Default::default()
    };

    let client = stash_box(addr, pool);
    let draft_id = client
        .submit_performer_draft(&CancellationToken::new(), &performer)
        .await
        .unwrap();
    assert_eq!(draft_id.as_deref(), Some("draft-p1"));

    let recorded = state.draft_parts.lock().await;
    let parts = &recorded[0];
    let names: Vec<&str> = parts.iter().map(|(name, _, _)| name.as_str()).collect();
    assert_eq!(names, vec!["operations", "map", "0"]);
    assert_eq!(parts[2].2, vec![1, 2, 3, 4]);

    let operations: Value = serde_json::from_slice(&parts[0].2).unwrap();
    assert_eq!(
        operations["variables"]["input"]["name"],
        json!("Jane Example")
    );
}
