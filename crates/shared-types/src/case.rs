use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "validation")]
use validator::Validate;

use crate::choice::choice_enum;
use crate::item::ItemResponse;
#[cfg(feature = "validation")]
use crate::validation::{normalize, FieldErrors};

choice_enum! {
    /// Lifecycle label of an investigation.
    #[derive(Default)]
    pub enum CaseStatus {
        #[default]
        Open => "Open",
        Closed => "Closed",
        Pending => "Pending",
        InProgress => "In Progress",
        Resolved => "Resolved",
        Archived => "Archived",
        OnHold => "On Hold",
        Cancelled => "Cancelled",
    }
}

// ── DB row struct ───────────────────────────────────────────────────

/// An investigation record. Owns zero or more evidence items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct Case {
    pub id: Uuid,
    pub case_name: String,
    pub case_number: String,
    pub team: String,
    pub case_type: String,
    /// CaseStatus label.
    pub case_status: String,
    pub case_description: Option<String>,
    pub case_start_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

// ── API response ────────────────────────────────────────────────────

/// API response shape for a case, with its evidence embedded read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CaseResponse {
    pub id: String,
    pub evidence: Vec<ItemResponse>,
    pub case_name: String,
    pub case_number: String,
    pub team: String,
    pub case_type: String,
    pub case_status: String,
    pub case_description: Option<String>,
    pub case_start_date: String,
    pub created_at: String,
}

impl CaseResponse {
    pub fn new(case: Case, evidence: Vec<ItemResponse>) -> Self {
        Self {
            id: case.id.to_string(),
            evidence,
            case_name: case.case_name,
            case_number: case.case_number,
            team: case.team,
            case_type: case.case_type,
            case_status: case.case_status,
            case_description: case.case_description,
            case_start_date: case.case_start_date.to_string(),
            created_at: case.created_at.to_rfc3339(),
        }
    }
}

// ── Request types ───────────────────────────────────────────────────

/// Full field set for creating or replacing a case.
///
/// Every field arrives as optional text so that missing, blank, malformed
/// and out-of-set values all surface as per-field errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct CaseRequest {
    #[cfg_attr(
        feature = "validation",
        validate(required(message = "This field is required."), length(max = 50, message = "Ensure this field has no more than 50 characters."))
    )]
    pub case_name: Option<String>,
    #[cfg_attr(
        feature = "validation",
        validate(required(message = "This field is required."), length(max = 50, message = "Ensure this field has no more than 50 characters."))
    )]
    pub case_number: Option<String>,
    #[cfg_attr(
        feature = "validation",
        validate(required(message = "This field is required."), length(max = 50, message = "Ensure this field has no more than 50 characters."))
    )]
    pub team: Option<String>,
    #[cfg_attr(
        feature = "validation",
        validate(required(message = "This field is required."), length(max = 50, message = "Ensure this field has no more than 50 characters."))
    )]
    pub case_type: Option<String>,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<CaseStatus>))]
    pub case_status: Option<String>,
    #[serde(default)]
    pub case_description: Option<String>,
    /// ISO date, `YYYY-MM-DD`.
    #[cfg_attr(
        feature = "validation",
        validate(required(message = "This field is required."))
    )]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = Date))]
    pub case_start_date: Option<String>,
}

#[cfg(feature = "validation")]
impl CaseRequest {
    fn normalized(self) -> Self {
        Self {
            case_name: normalize(self.case_name),
            case_number: normalize(self.case_number),
            team: normalize(self.team),
            case_type: normalize(self.case_type),
            case_status: normalize(self.case_status),
            case_description: normalize(self.case_description),
            case_start_date: normalize(self.case_start_date),
        }
    }
}

/// A case field set that passed validation, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseFields {
    pub case_name: String,
    pub case_number: String,
    pub team: String,
    pub case_type: String,
    pub case_status: CaseStatus,
    pub case_description: Option<String>,
    pub case_start_date: NaiveDate,
}

#[cfg(feature = "validation")]
impl TryFrom<CaseRequest> for CaseFields {
    type Error = crate::AppError;

    fn try_from(req: CaseRequest) -> Result<Self, Self::Error> {
        let req = req.normalized();
        let mut errors = FieldErrors::from_validation(req.validate());

        let case_status = errors.choice::<CaseStatus>("case_status", req.case_status.as_deref());
        let case_start_date = errors.date("case_start_date", req.case_start_date.as_deref());
        errors.into_result()?;

        Ok(Self {
            case_name: FieldErrors::required("case_name", req.case_name)?,
            case_number: FieldErrors::required("case_number", req.case_number)?,
            team: FieldErrors::required("team", req.team)?,
            case_type: FieldErrors::required("case_type", req.case_type)?,
            case_status: case_status.unwrap_or_default(),
            case_description: req.case_description,
            case_start_date: FieldErrors::required("case_start_date", case_start_date)?,
        })
    }
}
