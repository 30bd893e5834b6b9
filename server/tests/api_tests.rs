//! End-to-end tests of the HTTP API against in-process routers

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use pokedex_core::core::{AppState, Config, StorageType};
use pokedex_core::storage::{DiskBackend, MemoryBackend};
use pokedex_core::{KvBackend, KvKey};
use pokedex_server::api::create_router;

fn test_config() -> Config {
    let mut config = Config::default();
    config.storage.storage_type = StorageType::Memory;
    config.server.static_dir = None;
    config
}

fn memory_app() -> Router {
    let state = AppState::new(Arc::new(MemoryBackend::new()), test_config());
    create_router(Arc::new(state))
}

fn form_encode(raw: &str) -> String {
    let mut out = String::new();
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            other => out.push_str(&format!("%{:02X}", other)),
        }
    }
    out
}

fn form_request(method: Method, uri: &str, record: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("record={}", form_encode(&record.to_string()))))
        .unwrap()
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn create(app: &Router, record: Value) -> u64 {
    let response = send(app, form_request(Method::POST, "/api/pokemons", &record)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["record"]["id"].as_u64().unwrap()
}

#[tokio::test]
async fn create_returns_stamped_record_and_location() {
    let app = memory_app();
    let response = send(
        &app,
        form_request(Method::POST, "/api/pokemons", &json!({"name": "Pikachu", "type": "electric"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/api/pokemons/1"
    );
    let body = body_json(response).await;
    let record = &body["record"];
    assert_eq!(record["id"], json!(1));
    assert_eq!(record["name"], json!("Pikachu"));
    assert_eq!(record["type"], json!("electric"));
    let created_at = record["createdAt"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(created_at).is_ok());
}

#[tokio::test]
async fn created_record_reads_back_identically() {
    let app = memory_app();
    let response = send(
        &app,
        form_request(Method::POST, "/api/pokemons", &json!({"name": "Eevee", "level": 5})),
    )
    .await;
    let created = body_json(response).await["record"].clone();

    let response = send(&app, empty_request(Method::GET, "/api/pokemons/1")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, created);
}

#[tokio::test]
async fn list_is_not_found_when_empty_and_ordered_otherwise() {
    let app = memory_app();

    let response = send(&app, empty_request(Method::GET, "/api/pokemons")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_json(response).await["message"].is_string());

    for name in ["Bulbasaur", "Charmander", "Squirtle"] {
        create(&app, json!({ "name": name })).await;
    }

    let response = send(&app, empty_request(Method::GET, "/api/pokemons")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(response).await;
    let ids: Vec<u64> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|record| record["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn get_of_missing_or_malformed_id_is_not_found() {
    let app = memory_app();
    create(&app, json!({"name": "Onix"})).await;

    for uri in ["/api/pokemons/2", "/api/pokemons/abc", "/api/pokemons/-1"] {
        let response = send(&app, empty_request(Method::GET, uri)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
        assert!(body_json(response).await["message"].is_string());
    }
}

#[tokio::test]
async fn undecodable_path_id_is_bad_request_with_message() {
    let app = memory_app();
    create(&app, json!({"name": "Porygon"})).await;

    let requests = [
        empty_request(Method::GET, "/api/pokemons/%FF"),
        form_request(Method::PUT, "/api/pokemons/%FF", &json!({"name": "Porygon2"})),
        empty_request(Method::DELETE, "/api/pokemons/%FF"),
    ];
    for request in requests {
        let method = request.method().clone();
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", method);
        assert!(body_json(response).await["message"].is_string(), "{}", method);
    }

    let response = send(&app, empty_request(Method::GET, "/api/pokemons/1")).await;
    assert_eq!(body_json(response).await["name"], json!("Porygon"));
}

#[tokio::test]
async fn broken_counter_fails_create_without_writing() {
    let backend = Arc::new(MemoryBackend::new());
    backend.set(&KvKey::counter(), json!("not a number")).unwrap();
    let app = create_router(Arc::new(AppState::new(Arc::clone(&backend), test_config())));

    let response = send(
        &app,
        form_request(Method::POST, "/api/pokemons", &json!({"name": "Missingno"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_json(response).await["message"].is_string());

    let response = send(&app, empty_request(Method::GET, "/api/pokemons")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(backend.list(&KvKey::collection()).unwrap().is_empty());
    assert_eq!(backend.get(&KvKey::counter()).unwrap(), Some(json!("not a number")));
}

#[tokio::test]
async fn update_of_missing_id_is_not_found_and_creates_nothing() {
    let app = memory_app();
    for i in 0..5 {
        create(&app, json!({ "name": format!("mon-{}", i) })).await;
    }

    let response = send(
        &app,
        form_request(Method::PUT, "/api/pokemons/9999", &json!({"name": "ghost"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, empty_request(Method::GET, "/api/pokemons/9999")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, empty_request(Method::GET, "/api/pokemons")).await;
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn update_with_malformed_id_is_bad_request_before_body() {
    let app = memory_app();
    create(&app, json!({"name": "Jigglypuff"})).await;

    // No body at all: the id is rejected first.
    let response = send(&app, empty_request(Method::PUT, "/api/pokemons/abc")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["message"].is_string());

    let response = send(&app, empty_request(Method::GET, "/api/pokemons")).await;
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn update_replaces_fields_and_keeps_identity() {
    let app = memory_app();
    let response = send(
        &app,
        form_request(Method::POST, "/api/pokemons", &json!({"name": "Magikarp", "level": 10})),
    )
    .await;
    let created = body_json(response).await["record"].clone();

    let response = send(
        &app,
        form_request(
            Method::PUT,
            "/api/pokemons/1",
            &json!({"name": "Gyarados", "id": 77, "createdAt": "yesterday"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.is_empty());

    let response = send(&app, empty_request(Method::GET, "/api/pokemons/1")).await;
    let stored = body_json(response).await;
    assert_eq!(stored["name"], json!("Gyarados"));
    assert_eq!(stored["id"], json!(1));
    assert_eq!(stored["createdAt"], created["createdAt"]);
    assert!(stored.get("level").is_none());
}

#[tokio::test]
async fn update_of_existing_id_with_bad_payload_is_bad_request() {
    let app = memory_app();
    create(&app, json!({"name": "Psyduck"})).await;

    let request = Request::builder()
        .method(Method::PUT)
        .uri("/api/pokemons/1")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("record=%5B1%2C2%5D"))
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, empty_request(Method::GET, "/api/pokemons/1")).await;
    assert_eq!(body_json(response).await["name"], json!("Psyduck"));
}

#[tokio::test]
async fn delete_removes_then_reports_missing() {
    let app = memory_app();
    create(&app, json!({"name": "Voltorb"})).await;

    let response = send(&app, empty_request(Method::DELETE, "/api/pokemons/1")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, empty_request(Method::GET, "/api/pokemons/1")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, empty_request(Method::DELETE, "/api/pokemons/1")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, empty_request(Method::DELETE, "/api/pokemons/xyz")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_rejects_missing_or_invalid_record_field() {
    let app = memory_app();

    let bodies = [
        "name=Mew",
        "record=not-json",
        "record=%2242%22",
    ];
    for body in bodies {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/pokemons")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", body);
        assert!(body_json(response).await["message"].is_string());
    }

    // Rejected creates must not consume ids.
    assert_eq!(create(&app, json!({"name": "Mew"})).await, 1);
}

#[tokio::test]
async fn create_accepts_multipart_form() {
    let app = memory_app();
    let boundary = "pokedex-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"record\"\r\n\r\n{record}\r\n--{b}--\r\n",
        b = boundary,
        record = json!({"name": "Snorlax"}),
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/pokemons")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["record"]["name"], json!("Snorlax"));
    assert_eq!(body["record"]["id"], json!(1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_get_distinct_ids() {
    let app = memory_app();
    let tasks: Vec<_> = (0..50)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move { create(&app, json!({ "name": format!("mon-{}", i) })).await })
        })
        .collect();

    let mut ids = HashSet::new();
    for task in tasks {
        assert!(ids.insert(task.await.unwrap()), "duplicate id handed out");
    }
    assert_eq!(ids.len(), 50);
    assert_eq!(ids.iter().max(), Some(&50));

    let response = send(&app, empty_request(Method::GET, "/api/pokemons")).await;
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 50);
}

#[tokio::test]
async fn delete_all_empties_collection_but_ids_keep_counting() {
    let app = memory_app();
    create(&app, json!({"name": "Geodude"})).await;
    create(&app, json!({"name": "Graveler"})).await;

    let response = send(&app, empty_request(Method::DELETE, "/api/pokemons")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, empty_request(Method::GET, "/api/pokemons")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert_eq!(create(&app, json!({"name": "Golem"})).await, 3);
}

#[tokio::test]
async fn disk_backed_router_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config();
    config.storage.storage_type = StorageType::Disk;
    config.storage.data_dir = dir.path().to_path_buf();

    {
        let backend = Arc::new(DiskBackend::open(dir.path(), true).unwrap());
        let app = create_router(Arc::new(AppState::new(backend, config.clone())));
        create(&app, json!({"name": "Lapras"})).await;
        create(&app, json!({"name": "Dratini"})).await;
        let response = send(&app, empty_request(Method::DELETE, "/api/pokemons/1")).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    let backend = Arc::new(DiskBackend::open(dir.path(), true).unwrap());
    let app = create_router(Arc::new(AppState::new(backend, config)));

    let response = send(&app, empty_request(Method::GET, "/api/pokemons")).await;
    let listed = body_json(response).await;
    let names: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|record| record["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Dratini"]);
    assert_eq!(create(&app, json!({"name": "Dragonair"})).await, 3);
}

#[tokio::test]
async fn health_and_static_fallback() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>Pokedex</h1>").unwrap();

    let mut config = test_config();
    config.server.static_dir = Some(dir.path().to_path_buf());
    let app = create_router(Arc::new(AppState::new(Arc::new(MemoryBackend::new()), config)));

    let response = send(&app, empty_request(Method::GET, "/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], json!("healthy"));

    let response = send(&app, empty_request(Method::GET, "/index.html")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"<h1>Pokedex</h1>");

    let response = send(&app, empty_request(Method::GET, "/missing.css")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
