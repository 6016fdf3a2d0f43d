use shared_types::{AppError, Case, CaseFields};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

const CASE_COLUMNS: &str = "id, case_name, case_number, team, case_type, case_status, \
     case_description, case_start_date, created_at";

/// All cases, newest first.
pub async fn list(pool: &Pool<Postgres>) -> Result<Vec<Case>, AppError> {
    sqlx::query_as::<_, Case>(&format!(
        "SELECT {CASE_COLUMNS} FROM cases ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Find a case by ID.
pub async fn find_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<Case>, AppError> {
    sqlx::query_as::<_, Case>(&format!("SELECT {CASE_COLUMNS} FROM cases WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Whether a case with this id exists.
pub async fn exists(pool: &Pool<Postgres>, id: Uuid) -> Result<bool, AppError> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM cases WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Whether another case already uses `case_number`. `exclude` skips the
/// case being replaced.
pub async fn number_taken(
    pool: &Pool<Postgres>,
    case_number: &str,
    exclude: Option<Uuid>,
) -> Result<bool, AppError> {
    sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM cases WHERE case_number = $1 AND ($2::uuid IS NULL OR id <> $2))",
    )
    .bind(case_number)
    .bind(exclude)
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Insert a new case.
pub async fn create(pool: &Pool<Postgres>, fields: &CaseFields) -> Result<Case, AppError> {
    sqlx::query_as::<_, Case>(&format!(
        r#"
        INSERT INTO cases
            (case_name, case_number, team, case_type, case_status,
             case_description, case_start_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {CASE_COLUMNS}
        "#
    ))
    .bind(&fields.case_name)
    .bind(&fields.case_number)
    .bind(&fields.team)
    .bind(&fields.case_type)
    .bind(fields.case_status.as_str())
    .bind(fields.case_description.as_deref())
    .bind(fields.case_start_date)
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Replace every writable column of a case. Returns `None` if it does not exist.
pub async fn update(
    pool: &Pool<Postgres>,
    id: Uuid,
    fields: &CaseFields,
) -> Result<Option<Case>, AppError> {
    sqlx::query_as::<_, Case>(&format!(
        r#"
        UPDATE cases SET
            case_name = $2,
            case_number = $3,
            team = $4,
            case_type = $5,
            case_status = $6,
            case_description = $7,
            case_start_date = $8
        WHERE id = $1
        RETURNING {CASE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&fields.case_name)
    .bind(&fields.case_number)
    .bind(&fields.team)
    .bind(&fields.case_type)
    .bind(fields.case_status.as_str())
    .bind(fields.case_description.as_deref())
    .bind(fields.case_start_date)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Delete a case together with its items in one transaction.
///
/// Returns the picture keys of the removed items so the caller can drop the
/// blobs once the rows are gone, or `None` if the case does not exist.
pub async fn delete(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<Vec<String>>, AppError> {
    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;

    let locked: Option<Uuid> = sqlx::query_scalar("SELECT id FROM cases WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;
    if locked.is_none() {
        return Ok(None);
    }

    let pictures: Vec<Option<String>> =
        sqlx::query_scalar("DELETE FROM items WHERE case_id = $1 RETURNING picture")
            .bind(id)
            .fetch_all(&mut *tx)
            .await
            .map_err(SqlxErrorExt::into_app_error)?;

    sqlx::query("DELETE FROM cases WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;

    Ok(Some(pictures.into_iter().flatten().collect()))
}
