use axum::http::StatusCode;
use pretty_assertions::assert_eq;

use crate::common::{case_body, create_test_case, create_test_item, get, put_json, test_app};

#[tokio::test]
async fn update_case_replaces_fields() {
    let (app, _pool, _guard) = test_app().await;
    let id = create_test_case(&app, "C-400").await;

    let mut body = case_body("C-400-B");
    body["case_status"] = "Closed".into();
    body["team"] = "Unit B".into();

    let (status, resp) = put_json(&app, &format!("/cases/{id}/"), &body.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["id"], id.as_str());
    assert_eq!(resp["case_number"], "C-400-B");
    assert_eq!(resp["case_status"], "Closed");
    assert_eq!(resp["team"], "Unit B");
}

#[tokio::test]
async fn update_case_keeps_evidence() {
    let (app, _pool, _guard) = test_app().await;
    let id = create_test_case(&app, "C-401").await;
    create_test_item(&app, &id, "E-401", "SN-401").await;

    let (status, resp) = put_json(&app, &format!("/cases/{id}/"), &case_body("C-401").to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["evidence"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn update_case_omitted_status_resets_to_open() {
    let (app, _pool, _guard) = test_app().await;
    let id = create_test_case(&app, "C-402").await;

    let mut body = case_body("C-402");
    body["case_status"] = "Archived".into();
    put_json(&app, &format!("/cases/{id}/"), &body.to_string()).await;

    let (status, resp) = put_json(&app, &format!("/cases/{id}/"), &case_body("C-402").to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["case_status"], "Open");
}

#[tokio::test]
async fn update_case_invalid_leaves_row_unchanged() {
    let (app, _pool, _guard) = test_app().await;
    let id = create_test_case(&app, "C-403").await;
    let (_, before) = get(&app, &format!("/cases/{id}/")).await;

    let mut body = case_body("C-403");
    body["case_status"] = "Unknown".into();
    body["case_name"] = "Renamed".into();

    let (status, resp) = put_json(&app, &format!("/cases/{id}/"), &body.to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(resp["field_errors"]["case_status"].is_string());

    let (_, after) = get(&app, &format!("/cases/{id}/")).await;
    assert_eq!(before, after);
}

#[tokio::test]
async fn update_case_duplicate_number_400() {
    let (app, _pool, _guard) = test_app().await;
    create_test_case(&app, "C-404").await;
    let id = create_test_case(&app, "C-405").await;

    let (status, resp) = put_json(&app, &format!("/cases/{id}/"), &case_body("C-404").to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        resp["field_errors"]["case_number"],
        "case with this case number already exists."
    );
}

#[tokio::test]
async fn update_case_not_found_before_validation() {
    let (app, _pool, _guard) = test_app().await;

    let missing = uuid::Uuid::new_v4();
    let (status, _) = put_json(&app, &format!("/cases/{missing}/"), "{}").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
