use axum::http::StatusCode;

use crate::common::{case_body, create_test_case, get, post_json, test_app};

#[tokio::test]
async fn routes_answer_without_trailing_slash() {
    let (app, _pool, _guard) = test_app().await;

    let (status, resp) = post_json(&app, "/cases", &case_body("C-1100").to_string()).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = resp["id"].as_str().unwrap();

    let (status, _) = get(&app, &format!("/cases/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get(&app, "/items").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn api_prefix_serves_same_resources() {
    let (app, _pool, _guard) = test_app().await;
    let id = create_test_case(&app, "C-1101").await;

    let (status, resp) = get(&app, &format!("/api/cases/{id}/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["case_number"], "C-1101");

    let (status, resp) = get(&app, "/api/items/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp, serde_json::json!([]));
}

#[tokio::test]
async fn health_reports_database_and_storage() {
    let (app, _pool, _guard) = test_app().await;

    let (status, resp) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["status"], "ok");
    assert_eq!(resp["db"], "connected");
    assert_eq!(resp["storage"], "local");
}

#[tokio::test]
async fn unknown_route_404() {
    let (app, _pool, _guard) = test_app().await;

    let (status, _) = get(&app, "/evidence/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unsupported_method_405() {
    let (app, _pool, _guard) = test_app().await;

    let req = axum::http::Request::builder()
        .method("PATCH")
        .uri("/cases/")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, _) = crate::common::send(&app, req).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
