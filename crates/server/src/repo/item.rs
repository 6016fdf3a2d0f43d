use chrono::Utc;
use shared_types::{AppError, Item, ItemFields};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

const ITEM_COLUMNS: &str = "id, item_type, evidence_number, brand, model, serial_number, imei, \
     owner, book_date, storage_location, acquisition_method, acquisition_date, description, \
     status, picture, case_id";

/// Items share one fixed order everywhere: newest `book_date` first,
/// undated items ahead of dated ones.
const ITEM_ORDER: &str = "ORDER BY book_date DESC, evidence_number";

/// Reported on `case` when an update names a different case.
pub const CASE_IS_FIXED: &str = "An item cannot be moved to another case.";

/// Item columns with a unique constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueColumn {
    EvidenceNumber,
    SerialNumber,
}

impl UniqueColumn {
    pub const ALL: [UniqueColumn; 2] = [UniqueColumn::EvidenceNumber, UniqueColumn::SerialNumber];

    fn column(self) -> &'static str {
        match self {
            UniqueColumn::EvidenceNumber => "evidence_number",
            UniqueColumn::SerialNumber => "serial_number",
        }
    }

    /// Name of the backing constraint in the schema.
    pub fn constraint(self) -> &'static str {
        match self {
            UniqueColumn::EvidenceNumber => "items_evidence_number_key",
            UniqueColumn::SerialNumber => "items_serial_number_key",
        }
    }
}

/// What an update does to the stored picture key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictureChange<'a> {
    Keep,
    Clear,
    Set(&'a str),
}

/// All items.
pub async fn list(pool: &Pool<Postgres>) -> Result<Vec<Item>, AppError> {
    sqlx::query_as::<_, Item>(&format!("SELECT {ITEM_COLUMNS} FROM items {ITEM_ORDER}"))
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Items belonging to any of the given cases.
pub async fn list_by_cases(pool: &Pool<Postgres>, case_ids: &[Uuid]) -> Result<Vec<Item>, AppError> {
    if case_ids.is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_as::<_, Item>(&format!(
        "SELECT {ITEM_COLUMNS} FROM items WHERE case_id = ANY($1) {ITEM_ORDER}"
    ))
    .bind(case_ids)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Find an item by ID.
pub async fn find_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<Item>, AppError> {
    sqlx::query_as::<_, Item>(&format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Whether another item already holds `value` in `column`. `exclude` skips
/// the item being replaced.
pub async fn value_taken(
    pool: &Pool<Postgres>,
    column: UniqueColumn,
    value: &str,
    exclude: Option<Uuid>,
) -> Result<bool, AppError> {
    sqlx::query_scalar(&format!(
        "SELECT EXISTS (SELECT 1 FROM items WHERE {} = $1 AND ($2::uuid IS NULL OR id <> $2))",
        column.column()
    ))
    .bind(value)
    .bind(exclude)
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Insert a new item. A missing `acquisition_date` is recorded as today (UTC).
pub async fn create(
    pool: &Pool<Postgres>,
    fields: &ItemFields,
    picture: Option<&str>,
) -> Result<Item, AppError> {
    let acquisition_date = fields
        .acquisition_date
        .unwrap_or_else(|| Utc::now().date_naive());

    sqlx::query_as::<_, Item>(&format!(
        r#"
        INSERT INTO items
            (item_type, evidence_number, brand, model, serial_number, imei, owner,
             book_date, storage_location, acquisition_method, acquisition_date,
             description, status, picture, case_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        RETURNING {ITEM_COLUMNS}
        "#
    ))
    .bind(fields.item_type.as_str())
    .bind(&fields.evidence_number)
    .bind(fields.brand.as_deref())
    .bind(fields.model.as_deref())
    .bind(&fields.serial_number)
    .bind(fields.imei.as_deref())
    .bind(fields.owner.as_deref())
    .bind(fields.book_date)
    .bind(fields.storage_location.as_str())
    .bind(fields.acquisition_method.as_str())
    .bind(acquisition_date)
    .bind(fields.description.as_deref())
    .bind(fields.status.as_str())
    .bind(picture)
    .bind(fields.case_id)
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Replace every writable column of an item.
///
/// The owning case is fixed: `fields.case_id` must name the case the item
/// already belongs to. Returns the updated row and the picture key it no
/// longer references, or `None` if the item does not exist.
pub async fn update(
    pool: &Pool<Postgres>,
    id: Uuid,
    fields: &ItemFields,
    picture: PictureChange<'_>,
) -> Result<Option<(Item, Option<String>)>, AppError> {
    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;

    let locked: Option<(Option<String>, Uuid)> =
        sqlx::query_as("SELECT picture, case_id FROM items WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(SqlxErrorExt::into_app_error)?;
    let Some((current, case_id)) = locked else {
        return Ok(None);
    };
    if case_id != fields.case_id {
        return Err(AppError::field("case", CASE_IS_FIXED));
    }

    let (picture, replaced) = match picture {
        PictureChange::Keep => (current, None),
        PictureChange::Clear => (None, current),
        PictureChange::Set(key) => (Some(key.to_string()), current),
    };

    let item = sqlx::query_as::<_, Item>(&format!(
        r#"
        UPDATE items SET
            item_type = $2,
            evidence_number = $3,
            brand = $4,
            model = $5,
            serial_number = $6,
            imei = $7,
            owner = $8,
            book_date = $9,
            storage_location = $10,
            acquisition_method = $11,
            acquisition_date = $12,
            description = $13,
            status = $14,
            picture = $15
        WHERE id = $1
        RETURNING {ITEM_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(fields.item_type.as_str())
    .bind(&fields.evidence_number)
    .bind(fields.brand.as_deref())
    .bind(fields.model.as_deref())
    .bind(&fields.serial_number)
    .bind(fields.imei.as_deref())
    .bind(fields.owner.as_deref())
    .bind(fields.book_date)
    .bind(fields.storage_location.as_str())
    .bind(fields.acquisition_method.as_str())
    .bind(fields.acquisition_date)
    .bind(fields.description.as_deref())
    .bind(fields.status.as_str())
    .bind(picture.as_deref())
    .fetch_one(&mut *tx)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;

    Ok(Some((item, replaced)))
}

/// Delete an item, returning the removed row.
pub async fn delete(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<Item>, AppError> {
    sqlx::query_as::<_, Item>(&format!(
        "DELETE FROM items WHERE id = $1 RETURNING {ITEM_COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}
