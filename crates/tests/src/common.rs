use std::path::PathBuf;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use shared_types::AppConfig;
use sqlx::{Pool, Postgres};
use tokio::sync::Mutex;
use tower::ServiceExt;

use server::storage::{LocalStore, PictureStore};

/// Global mutex ensuring tests run sequentially against the shared database.
/// Each test acquires this lock before truncating, so concurrent tests never
/// see each other's rows or pictures.
static TEST_MUTEX: std::sync::LazyLock<Mutex<()>> = std::sync::LazyLock::new(|| Mutex::new(()));

const BOUNDARY: &str = "evidence-test-boundary";

/// Directory the test router stores pictures under.
pub fn media_root() -> PathBuf {
    std::env::temp_dir().join("evidence-server-tests").join("media")
}

/// Build a test router backed by a real Postgres pool and a local picture
/// store. Acquires a global lock, truncates both tables and clears the
/// media directory. The returned `MutexGuard` must be held for the
/// duration of the test.
pub async fn test_app() -> (Router, Pool<Postgres>, tokio::sync::MutexGuard<'static, ()>) {
    let guard = TEST_MUTEX.lock().await;

    let _ = dotenvy::dotenv();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("TEST_DATABASE_URL or DATABASE_URL must be set for tests");

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    server::db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    sqlx::query("TRUNCATE items, cases CASCADE")
        .execute(&pool)
        .await
        .expect("Failed to truncate");

    let root = media_root();
    let _ = std::fs::remove_dir_all(&root);

    let config = AppConfig::default();
    let pictures = PictureStore::local(
        LocalStore::new(&root, &config.storage.media_url),
        config.storage.max_picture_bytes,
    );
    let state = server::db::AppState {
        pool: pool.clone(),
        pictures,
    };
    let router = server::openapi::app_router(state, &config);

    (router, pool, guard)
}

/// POST JSON to a route.
pub async fn post_json(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    send(app, req).await
}

/// GET a route.
pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, req).await
}

/// PUT JSON to a route.
pub async fn put_json(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    send(app, req).await
}

/// DELETE a route.
pub async fn delete(app: &Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, req).await
}

/// A file part for [`send_multipart`].
pub struct FilePart<'a> {
    pub name: &'a str,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub bytes: &'a [u8],
}

/// Encode text fields and file parts as a `multipart/form-data` body.
pub fn multipart_body(fields: &[(&str, &str)], files: &[FilePart<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for file in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                file.name, file.file_name, file.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(file.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Send a multipart form with the given method.
pub async fn send_multipart(
    app: &Router,
    method: &str,
    uri: &str,
    fields: &[(&str, &str)],
    files: &[FilePart<'_>],
) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(fields, files)))
        .unwrap();

    send(app, req).await
}

/// Send a request through the router and parse the response.
pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, body_bytes) = send_raw(app, req).await;

    let body: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&body_bytes).to_string(),
        ))
    };

    (status, body)
}

/// Send a request and return the status and raw body bytes.
pub async fn send_raw(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(req)
        .await
        .expect("Failed to send request");

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");

    (status, body_bytes.to_vec())
}

/// Case payload with every required field set.
pub fn case_body(case_number: &str) -> Value {
    serde_json::json!({
        "case_name": "Theft Investigation",
        "case_number": case_number,
        "team": "Unit A",
        "case_type": "Theft",
        "case_start_date": "2024-01-10",
    })
}

/// Create a case via the API and return its ID.
pub async fn create_test_case(app: &Router, case_number: &str) -> String {
    let (status, resp) = post_json(app, "/cases/", &case_body(case_number).to_string()).await;
    assert_eq!(status, StatusCode::CREATED, "Failed to create test case: {resp}");
    resp["id"].as_str().unwrap().to_string()
}

/// Item payload with every required field set.
pub fn item_body(case_id: &str, evidence_number: &str, serial_number: &str) -> Value {
    serde_json::json!({
        "type": "Laptop",
        "evidence_number": evidence_number,
        "serial_number": serial_number,
        "storage_location": "Inbeslag",
        "acquisition_method": "GrayKey",
        "case": case_id,
    })
}

/// Create an item via the API and return the response body.
pub async fn create_test_item(
    app: &Router,
    case_id: &str,
    evidence_number: &str,
    serial_number: &str,
) -> Value {
    let body = item_body(case_id, evidence_number, serial_number);
    let (status, resp) = post_json(app, "/items/", &body.to_string()).await;
    assert_eq!(status, StatusCode::CREATED, "Failed to create test item: {resp}");
    resp
}

/// Location on disk of a picture served under `/media/`.
pub fn picture_path(url: &str) -> PathBuf {
    media_root().join(url.trim_start_matches("/media/"))
}

/// A tiny valid PNG.
pub const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];
