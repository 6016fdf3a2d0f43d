//! Field-level checks shared by the Case and Item request types.
//!
//! `validator` handles presence and length; the checks that need to parse
//! a value (choice labels, dates, identifiers) run afterwards through
//! [`FieldErrors`], so a single response reports every bad field.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::choice::InvalidChoice;
use crate::error::{AppError, VALIDATION_FAILED};

pub const REQUIRED: &str = "This field is required.";
pub const MAX_16: &str = "Ensure this field has no more than 16 characters.";
pub const MAX_20: &str = "Ensure this field has no more than 20 characters.";
pub const MAX_50: &str = "Ensure this field has no more than 50 characters.";
pub const MAX_100: &str = "Ensure this field has no more than 100 characters.";
pub const INVALID_DATE: &str = "Date has wrong format. Use YYYY-MM-DD.";
pub const INVALID_UUID: &str = "Must be a valid UUID.";

/// Trim surrounding whitespace; empty input counts as absent.
pub fn normalize(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Accumulates one message per field.
#[derive(Debug, Default)]
pub struct FieldErrors(HashMap<String, String>);

impl FieldErrors {
    /// Seed the collector with the outcome of a `validator` run.
    pub fn from_validation(result: Result<(), validator::ValidationErrors>) -> Self {
        match result {
            Ok(()) => Self::default(),
            Err(errors) => Self(AppError::from(errors).field_errors),
        }
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Parse a choice label. Absent values yield `None` without an error.
    pub fn choice<T>(&mut self, field: &str, value: Option<&str>) -> Option<T>
    where
        T: FromStr<Err = InvalidChoice>,
    {
        match value?.parse::<T>() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                self.add(field, e.to_string());
                None
            }
        }
    }

    /// Parse an ISO `YYYY-MM-DD` date. Absent values yield `None`.
    pub fn date(&mut self, field: &str, value: Option<&str>) -> Option<NaiveDate> {
        match NaiveDate::parse_from_str(value?, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                self.add(field, INVALID_DATE);
                None
            }
        }
    }

    /// Parse a UUID reference. Absent values yield `None`.
    pub fn uuid(&mut self, field: &str, value: Option<&str>) -> Option<Uuid> {
        match Uuid::parse_str(value?) {
            Ok(id) => Some(id),
            Err(_) => {
                self.add(field, INVALID_UUID);
                None
            }
        }
    }

    /// Fetch a value that must be present once validation has passed.
    pub fn required<T>(field: &str, value: Option<T>) -> Result<T, AppError> {
        value.ok_or_else(|| AppError::field(field, REQUIRED))
    }

    pub fn into_result(self) -> Result<(), AppError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(VALIDATION_FAILED, self.0))
        }
    }
}
