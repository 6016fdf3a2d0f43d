pub mod case;
pub mod item;
pub mod item_form;

use axum::{
    extract::{FromRequest, Request},
    routing::get,
    Json, Router,
};
use std::collections::HashMap;

use shared_types::{AppError, VALIDATION_FAILED};
use uuid::Uuid;

use crate::db::AppState;

/// JSON body extractor whose rejections use the `AppError` shape.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = axum::extract::rejection::JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::bad_request(rejection.body_text())),
        }
    }
}

/// Parse a path identifier. Anything that is not a UUID names no record.
pub(crate) fn parse_id(id: &str, entity: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|_| AppError::not_found(format!("{entity} {id} not found")))
}

/// Fold stored-data conflicts (duplicates, bad references) into the result
/// of parsing the request, so one response lists every field problem. A
/// field that already failed to parse keeps its parse message.
pub(crate) fn with_conflicts<T>(
    parsed: Result<T, AppError>,
    conflicts: Vec<(&'static str, String)>,
) -> Result<T, AppError> {
    if conflicts.is_empty() {
        return parsed;
    }
    let mut err = match parsed {
        Ok(_) => AppError::validation(VALIDATION_FAILED, HashMap::new()),
        Err(e) => e,
    };
    for (field, message) in conflicts {
        err = err.with_field_error(field, message);
    }
    Err(err)
}

/// Trimmed, non-blank text of an optional request field.
pub(crate) fn trimmed(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// The `cases` and `items` resources. Every route answers with and
/// without a trailing slash.
pub fn resource_router() -> Router<AppState> {
    let cases = get(case::list_cases).post(case::create_case);
    let case = get(case::get_case).put(case::update_case).delete(case::delete_case);
    let items = get(item::list_items).post(item::create_item);
    let item = get(item::get_item).put(item::update_item).delete(item::delete_item);

    Router::new()
        .route("/cases", cases.clone())
        .route("/cases/", cases)
        .route("/cases/{id}", case.clone())
        .route("/cases/{id}/", case)
        .route("/items", items.clone())
        .route("/items/", items)
        .route("/items/{id}", item.clone())
        .route("/items/{id}/", item)
}
