use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use shared_types::{AppError, Case, CaseFields, CaseRequest, CaseResponse, Item, ItemResponse};

use super::{parse_id, trimmed, with_conflicts, JsonBody};
use crate::error_convert::unique_field;
use crate::repo;
use crate::storage::PictureStore;

/// Attach each case's items, keeping the item order from the query.
fn with_evidence(cases: Vec<Case>, items: Vec<Item>, pictures: &PictureStore) -> Vec<CaseResponse> {
    let mut by_case: HashMap<Uuid, Vec<ItemResponse>> = HashMap::new();
    for item in items {
        let case_id = item.case_id;
        by_case
            .entry(case_id)
            .or_default()
            .push(ItemResponse::new(item, |key| pictures.url(key)));
    }
    cases
        .into_iter()
        .map(|case| {
            let evidence = by_case.remove(&case.id).unwrap_or_default();
            CaseResponse::new(case, evidence)
        })
        .collect()
}

/// Fields of `body` that clash with stored cases. `exclude` is the case
/// being replaced.
async fn case_conflicts(
    pool: &Pool<Postgres>,
    body: &CaseRequest,
    exclude: Option<Uuid>,
) -> Result<Vec<(&'static str, String)>, AppError> {
    let mut conflicts = Vec::new();
    if let Some(number) = trimmed(body.case_number.as_deref()) {
        if repo::case::number_taken(pool, number, exclude).await? {
            if let Some((field, message)) = unique_field("cases_case_number_key") {
                conflicts.push((field, message.to_string()));
            }
        }
    }
    Ok(conflicts)
}

async fn case_response(
    pool: &Pool<Postgres>,
    pictures: &PictureStore,
    case: Case,
) -> Result<CaseResponse, AppError> {
    let items = repo::item::list_by_cases(pool, &[case.id]).await?;
    let mut responses = with_evidence(vec![case], items, pictures);
    responses
        .pop()
        .ok_or_else(|| AppError::internal("case response missing"))
}

/// GET /cases/
#[utoipa::path(
    get,
    path = "/cases/",
    responses(
        (status = 200, description = "All cases, newest first, with their evidence", body = Vec<CaseResponse>)
    ),
    tag = "cases"
)]
#[tracing::instrument(skip(pool, pictures))]
pub async fn list_cases(
    State(pool): State<Pool<Postgres>>,
    State(pictures): State<PictureStore>,
) -> Result<Json<Vec<CaseResponse>>, AppError> {
    let cases = repo::case::list(&pool).await?;
    let ids: Vec<Uuid> = cases.iter().map(|c| c.id).collect();
    let items = repo::item::list_by_cases(&pool, &ids).await?;
    Ok(Json(with_evidence(cases, items, &pictures)))
}

/// GET /cases/{id}/
#[utoipa::path(
    get,
    path = "/cases/{id}/",
    params(
        ("id" = String, Path, description = "Case UUID")
    ),
    responses(
        (status = 200, description = "Case found", body = CaseResponse),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "cases"
)]
#[tracing::instrument(skip(pool, pictures))]
pub async fn get_case(
    State(pool): State<Pool<Postgres>>,
    State(pictures): State<PictureStore>,
    Path(id): Path<String>,
) -> Result<Json<CaseResponse>, AppError> {
    let uuid = parse_id(&id, "Case")?;

    let case = repo::case::find_by_id(&pool, uuid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Case {} not found", id)))?;

    Ok(Json(case_response(&pool, &pictures, case).await?))
}

/// POST /cases/
#[utoipa::path(
    post,
    path = "/cases/",
    request_body = CaseRequest,
    responses(
        (status = 201, description = "Case created", body = CaseResponse),
        (status = 400, description = "Validation failed", body = AppError)
    ),
    tag = "cases"
)]
#[tracing::instrument(skip(pool))]
pub async fn create_case(
    State(pool): State<Pool<Postgres>>,
    JsonBody(body): JsonBody<CaseRequest>,
) -> Result<(StatusCode, Json<CaseResponse>), AppError> {
    let conflicts = case_conflicts(&pool, &body, None).await?;
    let fields = with_conflicts(CaseFields::try_from(body), conflicts)?;
    let case = repo::case::create(&pool, &fields).await?;
    tracing::info!(case_id = %case.id, case_number = %case.case_number, "case created");
    Ok((StatusCode::CREATED, Json(CaseResponse::new(case, Vec::new()))))
}

/// PUT /cases/{id}/
#[utoipa::path(
    put,
    path = "/cases/{id}/",
    request_body = CaseRequest,
    params(
        ("id" = String, Path, description = "Case UUID")
    ),
    responses(
        (status = 200, description = "Case replaced", body = CaseResponse),
        (status = 400, description = "Validation failed", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "cases"
)]
#[tracing::instrument(skip(pool, pictures))]
pub async fn update_case(
    State(pool): State<Pool<Postgres>>,
    State(pictures): State<PictureStore>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<CaseRequest>,
) -> Result<Json<CaseResponse>, AppError> {
    let uuid = parse_id(&id, "Case")?;
    let not_found = || AppError::not_found(format!("Case {} not found", id));

    repo::case::find_by_id(&pool, uuid).await?.ok_or_else(not_found)?;
    let conflicts = case_conflicts(&pool, &body, Some(uuid)).await?;
    let fields = with_conflicts(CaseFields::try_from(body), conflicts)?;

    let case = repo::case::update(&pool, uuid, &fields)
        .await?
        .ok_or_else(not_found)?;
    tracing::info!(case_id = %case.id, "case updated");

    Ok(Json(case_response(&pool, &pictures, case).await?))
}

/// DELETE /cases/{id}/
#[utoipa::path(
    delete,
    path = "/cases/{id}/",
    params(
        ("id" = String, Path, description = "Case UUID")
    ),
    responses(
        (status = 204, description = "Case and its evidence deleted"),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "cases"
)]
#[tracing::instrument(skip(pool, pictures))]
pub async fn delete_case(
    State(pool): State<Pool<Postgres>>,
    State(pictures): State<PictureStore>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let uuid = parse_id(&id, "Case")?;

    let picture_keys = repo::case::delete(&pool, uuid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Case {} not found", id)))?;
    tracing::info!(case_id = %uuid, pictures = picture_keys.len(), "case deleted");

    for key in &picture_keys {
        pictures.remove(key).await;
    }

    Ok(StatusCode::NO_CONTENT)
}
