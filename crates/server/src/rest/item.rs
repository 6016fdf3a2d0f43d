use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use shared_types::{AppError, Item, ItemRequest, ItemResponse};

use super::item_form::{ItemForm, PictureField};
use super::{parse_id, trimmed, with_conflicts};
use crate::error_convert::{missing_case, unique_field};
use crate::repo;
use crate::repo::item::{PictureChange, UniqueColumn, CASE_IS_FIXED};
use crate::storage::PictureStore;

fn item_response(pictures: &PictureStore, item: Item) -> ItemResponse {
    ItemResponse::new(item, |key| pictures.url(key))
}

/// Fields of `req` that clash with stored data. On update `current` is the
/// item being replaced: its own numbers do not count as taken, and its case
/// cannot change.
async fn item_conflicts(
    pool: &Pool<Postgres>,
    req: &ItemRequest,
    current: Option<&Item>,
) -> Result<Vec<(&'static str, String)>, AppError> {
    let mut conflicts = Vec::new();
    let exclude = current.map(|item| item.id);

    for column in UniqueColumn::ALL {
        let value = match column {
            UniqueColumn::EvidenceNumber => req.evidence_number.as_deref(),
            UniqueColumn::SerialNumber => req.serial_number.as_deref(),
        };
        let Some(value) = trimmed(value) else {
            continue;
        };
        if repo::item::value_taken(pool, column, value, exclude).await? {
            if let Some((field, message)) = unique_field(column.constraint()) {
                conflicts.push((field, message.to_string()));
            }
        }
    }

    let Some(raw) = trimmed(req.case.as_deref()) else {
        return Ok(conflicts);
    };
    let Ok(case_id) = Uuid::parse_str(raw) else {
        return Ok(conflicts);
    };
    match current {
        Some(item) if item.case_id != case_id => {
            conflicts.push(("case", CASE_IS_FIXED.to_string()));
        }
        Some(_) => {}
        None => {
            if !repo::case::exists(pool, case_id).await? {
                conflicts.push(("case", missing_case(raw)));
            }
        }
    }
    Ok(conflicts)
}

/// Store the uploaded picture, if the form carried one.
async fn store_upload(pictures: &PictureStore, picture: PictureField) -> Result<(Option<String>, bool), AppError> {
    match picture {
        PictureField::Replace(upload) => Ok((Some(pictures.save(upload).await?), false)),
        PictureField::Clear => Ok((None, true)),
        PictureField::Keep | PictureField::Invalid(_) => Ok((None, false)),
    }
}

/// Drop a picture that was stored for a write that did not go through.
async fn discard(pictures: &PictureStore, key: Option<&str>) {
    if let Some(key) = key {
        pictures.remove(key).await;
    }
}

/// GET /items/
#[utoipa::path(
    get,
    path = "/items/",
    responses(
        (status = 200, description = "All items, newest book date first", body = Vec<ItemResponse>)
    ),
    tag = "items"
)]
#[tracing::instrument(skip(pool, pictures))]
pub async fn list_items(
    State(pool): State<Pool<Postgres>>,
    State(pictures): State<PictureStore>,
) -> Result<Json<Vec<ItemResponse>>, AppError> {
    let items = repo::item::list(&pool).await?;
    Ok(Json(
        items
            .into_iter()
            .map(|item| item_response(&pictures, item))
            .collect(),
    ))
}

/// GET /items/{id}/
#[utoipa::path(
    get,
    path = "/items/{id}/",
    params(
        ("id" = String, Path, description = "Item UUID")
    ),
    responses(
        (status = 200, description = "Item found", body = ItemResponse),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "items"
)]
#[tracing::instrument(skip(pool, pictures))]
pub async fn get_item(
    State(pool): State<Pool<Postgres>>,
    State(pictures): State<PictureStore>,
    Path(id): Path<String>,
) -> Result<Json<ItemResponse>, AppError> {
    let uuid = parse_id(&id, "Item")?;

    let item = repo::item::find_by_id(&pool, uuid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Item {} not found", id)))?;

    Ok(Json(item_response(&pictures, item)))
}

/// POST /items/
///
/// Accepts multipart (with an optional `picture` file), urlencoded or JSON.
#[utoipa::path(
    post,
    path = "/items/",
    request_body(
        content = ItemRequest,
        content_type = "multipart/form-data",
        description = "Item fields plus an optional `picture` file. Urlencoded and JSON bodies are accepted too."
    ),
    responses(
        (status = 201, description = "Item created", body = ItemResponse),
        (status = 400, description = "Validation failed", body = AppError)
    ),
    tag = "items"
)]
#[tracing::instrument(skip(pool, pictures, form))]
pub async fn create_item(
    State(pool): State<Pool<Postgres>>,
    State(pictures): State<PictureStore>,
    form: ItemForm,
) -> Result<(StatusCode, Json<ItemResponse>), AppError> {
    let conflicts = item_conflicts(&pool, &form.request, None).await?;
    let (fields, picture) = with_conflicts(form.validate(&pictures), conflicts)?;
    let (key, _) = store_upload(&pictures, picture).await?;

    let item = match repo::item::create(&pool, &fields, key.as_deref()).await {
        Ok(item) => item,
        Err(e) => {
            discard(&pictures, key.as_deref()).await;
            return Err(e);
        }
    };
    tracing::info!(
        item_id = %item.id,
        case_id = %item.case_id,
        evidence_number = %item.evidence_number,
        "item created"
    );

    Ok((StatusCode::CREATED, Json(item_response(&pictures, item))))
}

/// PUT /items/{id}/
///
/// Replaces every field except the owning case, which must stay the same.
/// The picture is replaced when a file is sent, cleared by an empty
/// `picture` value and kept otherwise.
#[utoipa::path(
    put,
    path = "/items/{id}/",
    request_body(
        content = ItemRequest,
        content_type = "multipart/form-data",
        description = "Item fields plus an optional `picture` file. Urlencoded and JSON bodies are accepted too."
    ),
    params(
        ("id" = String, Path, description = "Item UUID")
    ),
    responses(
        (status = 200, description = "Item replaced", body = ItemResponse),
        (status = 400, description = "Validation failed", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "items"
)]
#[tracing::instrument(skip(pool, pictures, form))]
pub async fn update_item(
    State(pool): State<Pool<Postgres>>,
    State(pictures): State<PictureStore>,
    Path(id): Path<String>,
    form: ItemForm,
) -> Result<Json<ItemResponse>, AppError> {
    let uuid = parse_id(&id, "Item")?;
    let not_found = || AppError::not_found(format!("Item {} not found", id));

    let current = repo::item::find_by_id(&pool, uuid).await?.ok_or_else(not_found)?;
    let conflicts = item_conflicts(&pool, &form.request, Some(&current)).await?;
    let (fields, picture) = with_conflicts(form.validate(&pictures), conflicts)?;
    let (key, clear) = store_upload(&pictures, picture).await?;

    let change = match (key.as_deref(), clear) {
        (Some(key), _) => PictureChange::Set(key),
        (None, true) => PictureChange::Clear,
        (None, false) => PictureChange::Keep,
    };

    let (item, replaced) = match repo::item::update(&pool, uuid, &fields, change).await {
        Ok(Some(updated)) => updated,
        Ok(None) => {
            discard(&pictures, key.as_deref()).await;
            return Err(not_found());
        }
        Err(e) => {
            discard(&pictures, key.as_deref()).await;
            return Err(e);
        }
    };
    tracing::info!(item_id = %item.id, picture = ?item.picture, "item updated");

    discard(&pictures, replaced.as_deref()).await;

    Ok(Json(item_response(&pictures, item)))
}

/// DELETE /items/{id}/
#[utoipa::path(
    delete,
    path = "/items/{id}/",
    params(
        ("id" = String, Path, description = "Item UUID")
    ),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "items"
)]
#[tracing::instrument(skip(pool, pictures))]
pub async fn delete_item(
    State(pool): State<Pool<Postgres>>,
    State(pictures): State<PictureStore>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let uuid = parse_id(&id, "Item")?;

    let item = repo::item::delete(&pool, uuid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Item {} not found", id)))?;
    tracing::info!(item_id = %item.id, "item deleted");

    discard(&pictures, item.picture.as_deref()).await;

    Ok(StatusCode::NO_CONTENT)
}
