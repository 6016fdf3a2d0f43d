use axum::http::StatusCode;
use serde_json::Value;

use crate::common::{
    create_test_case, get, item_body, media_root, picture_path, put_json, send_multipart,
    test_app, FilePart, PNG_BYTES,
};

fn form_fields(case_id: &str, evidence_number: &str, serial_number: &str) -> Vec<(String, String)> {
    vec![
        ("type".into(), "Smartphone".into()),
        ("evidence_number".into(), evidence_number.into()),
        ("serial_number".into(), serial_number.into()),
        ("storage_location".into(), "Digi".into()),
        ("acquisition_method".into(), "Cellebrite".into()),
        ("case".into(), case_id.into()),
    ]
}

fn borrowed(fields: &[(String, String)]) -> Vec<(&str, &str)> {
    fields.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
}

fn png(file_name: &str) -> FilePart<'_> {
    FilePart {
        name: "picture",
        file_name,
        content_type: "image/png",
        bytes: PNG_BYTES,
    }
}

fn stored_pictures() -> usize {
    std::fs::read_dir(media_root().join("evidence_pictures"))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

async fn create_with_picture(app: &axum::Router, case_id: &str, n: &str) -> Value {
    let fields = form_fields(case_id, &format!("E-{n}"), &format!("SN-{n}"));
    let (status, resp) =
        send_multipart(app, "POST", "/items/", &borrowed(&fields), &[png("phone.png")]).await;
    assert_eq!(status, StatusCode::CREATED, "{resp}");
    resp
}

#[tokio::test]
async fn multipart_create_stores_picture() {
    let (app, _pool, _guard) = test_app().await;
    let case_id = create_test_case(&app, "C-1000").await;

    let resp = create_with_picture(&app, &case_id, "1000").await;
    assert_eq!(resp["type"], "Smartphone");
    let url = resp["picture"].as_str().unwrap();
    assert!(url.starts_with("/media/evidence_pictures/"), "{url}");
    assert!(url.ends_with(".png"), "{url}");
    assert_eq!(std::fs::read(picture_path(url)).unwrap(), PNG_BYTES);
}

#[tokio::test]
async fn multipart_create_without_picture() {
    let (app, _pool, _guard) = test_app().await;
    let case_id = create_test_case(&app, "C-1001").await;

    let fields = form_fields(&case_id, "E-1001", "SN-1001");
    let (status, resp) = send_multipart(&app, "POST", "/items/", &borrowed(&fields), &[]).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(resp["picture"], Value::Null);
}

#[tokio::test]
async fn multipart_empty_file_input_is_no_picture() {
    let (app, _pool, _guard) = test_app().await;
    let case_id = create_test_case(&app, "C-1002").await;

    let fields = form_fields(&case_id, "E-1002", "SN-1002");
    let empty = FilePart {
        name: "picture",
        file_name: "",
        content_type: "application/octet-stream",
        bytes: b"",
    };
    let (status, resp) = send_multipart(&app, "POST", "/items/", &borrowed(&fields), &[empty]).await;
    assert_eq!(status, StatusCode::CREATED, "{resp}");
    assert_eq!(resp["picture"], Value::Null);
}

#[tokio::test]
async fn non_image_upload_rejected() {
    let (app, _pool, _guard) = test_app().await;
    let case_id = create_test_case(&app, "C-1003").await;

    let fields = form_fields(&case_id, "E-1003", "SN-1003");
    let notes = FilePart {
        name: "picture",
        file_name: "notes.txt",
        content_type: "text/plain",
        bytes: b"chain of custody notes",
    };
    let (status, resp) = send_multipart(&app, "POST", "/items/", &borrowed(&fields), &[notes]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        resp["field_errors"]["picture"],
        "Upload a valid image. Accepted types are JPEG, PNG, GIF and WebP."
    );
    assert_eq!(stored_pictures(), 0);
}

#[tokio::test]
async fn octet_stream_picture_rejected() {
    let (app, _pool, _guard) = test_app().await;
    let case_id = create_test_case(&app, "C-1020").await;

    let fields = form_fields(&case_id, "E-1020", "SN-1020");
    let undeclared = FilePart {
        name: "picture",
        file_name: "phone.jpg",
        content_type: "application/octet-stream",
        bytes: PNG_BYTES,
    };
    let (status, resp) =
        send_multipart(&app, "POST", "/items/", &borrowed(&fields), &[undeclared]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        resp["field_errors"]["picture"],
        "Upload a valid image. Accepted types are JPEG, PNG, GIF and WebP."
    );
    assert_eq!(stored_pictures(), 0);
}

#[tokio::test]
async fn repeated_text_part_takes_last_value() {
    let (app, _pool, _guard) = test_app().await;
    let case_id = create_test_case(&app, "C-1021").await;

    let mut fields = form_fields(&case_id, "E-1021", "SN-1021");
    fields.push(("brand".into(), "Nokia".into()));
    fields.push(("brand".into(), "Samsung".into()));
    let (status, resp) = send_multipart(&app, "POST", "/items/", &borrowed(&fields), &[]).await;
    assert_eq!(status, StatusCode::CREATED, "{resp}");
    assert_eq!(resp["brand"], "Samsung");
}

#[tokio::test]
async fn text_picture_value_rejected() {
    let (app, _pool, _guard) = test_app().await;
    let case_id = create_test_case(&app, "C-1004").await;

    let mut fields = form_fields(&case_id, "E-1004", "SN-1004");
    fields.push(("picture".into(), "phone.png".into()));
    let (status, resp) = send_multipart(&app, "POST", "/items/", &borrowed(&fields), &[]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(resp["field_errors"]["picture"]
        .as_str()
        .unwrap()
        .contains("not a file"));
}

#[tokio::test]
async fn invalid_fields_store_no_picture() {
    let (app, _pool, _guard) = test_app().await;
    let case_id = create_test_case(&app, "C-1005").await;

    let mut fields = form_fields(&case_id, "E-1005", "SN-1005");
    fields[0].1 = "Typewriter".into();
    let (status, resp) =
        send_multipart(&app, "POST", "/items/", &borrowed(&fields), &[png("phone.png")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(resp["field_errors"]["type"].is_string());
    assert_eq!(stored_pictures(), 0);
}

#[tokio::test]
async fn constraint_failure_discards_uploaded_picture() {
    let (app, _pool, _guard) = test_app().await;
    let case_id = create_test_case(&app, "C-1006").await;
    create_with_picture(&app, &case_id, "1006").await;
    assert_eq!(stored_pictures(), 1);

    let fields = form_fields(&case_id, "E-1006", "SN-1006-B");
    let (status, resp) =
        send_multipart(&app, "POST", "/items/", &borrowed(&fields), &[png("again.png")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(resp["field_errors"]["evidence_number"].is_string());
    assert_eq!(stored_pictures(), 1);
}

#[tokio::test]
async fn json_update_without_picture_keeps_it() {
    let (app, _pool, _guard) = test_app().await;
    let case_id = create_test_case(&app, "C-1007").await;
    let item = create_with_picture(&app, &case_id, "1007").await;
    let id = item["id"].as_str().unwrap();

    let (status, resp) = put_json(&app, &format!("/items/{id}/"), &item_body(&case_id, "E-1007", "SN-1007").to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["picture"], item["picture"]);
    assert!(picture_path(resp["picture"].as_str().unwrap()).exists());
}

#[tokio::test]
async fn json_null_picture_clears_it() {
    let (app, _pool, _guard) = test_app().await;
    let case_id = create_test_case(&app, "C-1008").await;
    let item = create_with_picture(&app, &case_id, "1008").await;
    let id = item["id"].as_str().unwrap();
    let old_path = picture_path(item["picture"].as_str().unwrap());

    let mut body = item_body(&case_id, "E-1008", "SN-1008");
    body["picture"] = Value::Null;
    let (status, resp) = put_json(&app, &format!("/items/{id}/"), &body.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["picture"], Value::Null);
    assert!(!old_path.exists());
}

#[tokio::test]
async fn multipart_update_replaces_picture() {
    let (app, _pool, _guard) = test_app().await;
    let case_id = create_test_case(&app, "C-1009").await;
    let item = create_with_picture(&app, &case_id, "1009").await;
    let id = item["id"].as_str().unwrap();
    let old_url = item["picture"].as_str().unwrap();

    let fields = form_fields(&case_id, "E-1009", "SN-1009");
    let (status, resp) = send_multipart(
        &app,
        "PUT",
        &format!("/items/{id}/"),
        &borrowed(&fields),
        &[png("replacement.png")],
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{resp}");
    let new_url = resp["picture"].as_str().unwrap();
    assert_ne!(new_url, old_url);
    assert!(picture_path(new_url).exists());
    assert!(!picture_path(old_url).exists());
    assert_eq!(stored_pictures(), 1);
}

#[tokio::test]
async fn failed_update_keeps_old_picture() {
    let (app, _pool, _guard) = test_app().await;
    let case_id = create_test_case(&app, "C-1010").await;
    let item = create_with_picture(&app, &case_id, "1010").await;
    let id = item["id"].as_str().unwrap();

    let mut fields = form_fields(&case_id, "E-1010", "SN-1010");
    fields[3].1 = "Basement".into();
    let (status, _) = send_multipart(
        &app,
        "PUT",
        &format!("/items/{id}/"),
        &borrowed(&fields),
        &[png("replacement.png")],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, after) = get(&app, &format!("/items/{id}/")).await;
    assert_eq!(after["picture"], item["picture"]);
    assert_eq!(stored_pictures(), 1);
}

#[tokio::test]
async fn deleting_item_removes_picture() {
    let (app, _pool, _guard) = test_app().await;
    let case_id = create_test_case(&app, "C-1011").await;
    let item = create_with_picture(&app, &case_id, "1011").await;
    let id = item["id"].as_str().unwrap();

    let (status, _) = crate::common::delete(&app, &format!("/items/{id}/")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(stored_pictures(), 0);
}

#[tokio::test]
async fn deleting_case_removes_item_pictures() {
    let (app, _pool, _guard) = test_app().await;
    let case_id = create_test_case(&app, "C-1012").await;
    create_with_picture(&app, &case_id, "1012").await;
    create_with_picture(&app, &case_id, "1013").await;
    assert_eq!(stored_pictures(), 2);

    let (status, _) = crate::common::delete(&app, &format!("/cases/{case_id}/")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(stored_pictures(), 0);
}

#[tokio::test]
async fn stored_picture_is_served() {
    let (app, _pool, _guard) = test_app().await;
    let case_id = create_test_case(&app, "C-1014").await;
    let item = create_with_picture(&app, &case_id, "1014").await;
    let url = item["picture"].as_str().unwrap();

    let req = axum::http::Request::builder()
        .uri(url)
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, bytes) = crate::common::send_raw(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, PNG_BYTES);
}
