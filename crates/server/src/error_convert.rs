use std::collections::HashMap;

use shared_types::AppError;
use sqlx::postgres::PgDatabaseError;

/// Field and message reported for a violated unique constraint.
pub(crate) fn unique_field(constraint: &str) -> Option<(&'static str, &'static str)> {
    match constraint {
        "cases_case_number_key" => Some(("case_number", "case with this case number already exists.")),
        "items_evidence_number_key" => {
            Some(("evidence_number", "items with this evidence number already exists."))
        }
        "items_serial_number_key" => {
            Some(("serial_number", "items with this serial number already exists."))
        }
        _ => None,
    }
}

/// Message for an item referencing a case that does not exist.
pub(crate) fn missing_case(value: &str) -> String {
    format!("Invalid pk \"{value}\" - object does not exist.")
}

/// Request field guarded by a `<table>_<column>_check` constraint.
fn check_field(constraint: &str) -> Option<&str> {
    let column = constraint
        .strip_prefix("cases_")
        .or_else(|| constraint.strip_prefix("items_"))?
        .strip_suffix("_check")?;
    Some(if column == "item_type" { "type" } else { column })
}

/// Pull the offending value out of a Postgres detail line such as
/// `Key (case_id)=(…) is not present in table "cases".`
fn key_value(detail: &str) -> Option<&str> {
    let start = detail.find(")=(")? + 3;
    let len = detail[start..].find(')')?;
    Some(&detail[start..start + len])
}

/// Convert a sqlx::Error into an AppError.
///
/// Constraint violations become per-field validation errors so that a
/// duplicate or dangling reference reads the same as any other bad field.
pub fn sqlx_to_app_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::RowNotFound => AppError::not_found("Resource not found"),
        sqlx::Error::Database(db_err) => {
            let constraint = db_err.constraint().unwrap_or_default();
            match db_err.code().as_deref() {
                Some("23505") => match unique_field(constraint) {
                    Some((field, message)) => AppError::field(field, message),
                    None => AppError::validation("A record with this value already exists", HashMap::new()),
                },
                Some("23503") if constraint == "items_case_id_fkey" => {
                    let value = db_err
                        .try_downcast_ref::<PgDatabaseError>()
                        .and_then(|pg| pg.detail())
                        .and_then(key_value)
                        .unwrap_or_default();
                    AppError::field("case", missing_case(value))
                }
                Some("23514") => match check_field(constraint) {
                    Some(field) => AppError::field(field, "Value is not a valid choice."),
                    None => AppError::validation(db_err.message(), HashMap::new()),
                },
                Some("22001") => AppError::validation(db_err.message(), HashMap::new()),
                _ => {
                    tracing::error!(error = %err, "database error");
                    AppError::database(err.to_string())
                }
            }
        }
        _ => {
            tracing::error!(error = %err, "database error");
            AppError::database(err.to_string())
        }
    }
}

/// Extension trait providing `.into_app_error()` on sqlx::Error.
pub trait SqlxErrorExt {
    fn into_app_error(self) -> AppError;
}

impl SqlxErrorExt for sqlx::Error {
    fn into_app_error(self) -> AppError {
        sqlx_to_app_error(self)
    }
}
