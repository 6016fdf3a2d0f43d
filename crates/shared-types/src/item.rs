use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "validation")]
use validator::Validate;

use crate::choice::choice_enum;
#[cfg(feature = "validation")]
use crate::validation::{normalize, FieldErrors, REQUIRED};

choice_enum! {
    /// Category of a seized device or source.
    pub enum EvidenceType {
        Laptop => "Laptop",
        Smartphone => "Smartphone",
        Tablet => "Tablet",
        UsbDrive => "USB Drive",
        ExternalHdd => "External HDD",
        ExternalSsd => "External SSD",
        DigitalCamera => "Digital Camera",
        Smartwatch => "Smartwatch",
        Router => "Router",
        Server => "Server",
        NetworkDevice => "Network Device",
        IotDevice => "IoT Device",
        CloudStorage => "Cloud Storage",
        Drone => "Drone",
        WearableDevice => "Wearable Device",
        BackupDevice => "Backup Device",
        SmartHomeDevice => "Smart Home Device",
        SmartTv => "Smart TV",
        GameConsole => "Game Console",
        Other => "Other",
    }
}

choice_enum! {
    /// Handling status of an evidence item. The set is closed and carries no
    /// transition rules.
    #[derive(Default)]
    pub enum ItemStatus {
        InStorage => "In Storage",
        UnderAnalysis => "Under Analysis",
        Analyzed => "Analyzed",
        Returned => "Returned",
        Destroyed => "Destroyed",
        Lost => "Lost",
        Stolen => "Stolen",
        Other => "Other",
        #[default]
        Pending => "Pending",
        Archived => "Archived",
        InTransit => "In Transit",
        AwaitingApproval => "Awaiting Approval",
        PendingDisposal => "Pending Disposal",
        PendingReturn => "Pending Return",
        PendingAnalysis => "Pending Analysis",
        PendingReview => "Pending Review",
        PendingCollection => "Pending Collection",
        PendingTransfer => "Pending Transfer",
        PendingDestruction => "Pending Destruction",
        PendingInvestigation => "Pending Investigation",
        PendingConfirmation => "Pending Confirmation",
        PendingDocumentation => "Pending Documentation",
        PendingVerification => "Pending Verification",
        PendingAssessment => "Pending Assessment",
        PendingApproval => "Pending Approval",
        PendingClosure => "Pending Closure",
        PendingRelease => "Pending Release",
        PendingFollowUp => "Pending Follow-up",
        PendingCoordination => "Pending Coordination",
        PendingCommunication => "Pending Communication",
        PendingReviewAndAnalysis => "Pending Review and Analysis",
    }
}

choice_enum! {
    /// Where the physical item is kept.
    pub enum StorageLocation {
        Inbeslag => "Inbeslag",
        Digi => "Digi",
        Rst => "Rst",
        SeeJournal => "See journal",
        Other => "other",
    }
}

choice_enum! {
    /// Tool used to extract the device.
    pub enum AcquisitionMethod {
        GrayKey => "GrayKey",
        Cellebrite => "Cellebrite",
        Other => "Other",
    }
}

// ── DB row struct ───────────────────────────────────────────────────

/// A forensic evidence record. Belongs to exactly one case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct Item {
    pub id: Uuid,
    /// EvidenceType label.
    pub item_type: String,
    pub evidence_number: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: String,
    pub imei: Option<String>,
    pub owner: Option<String>,
    pub book_date: Option<NaiveDate>,
    /// StorageLocation label.
    pub storage_location: String,
    /// AcquisitionMethod label.
    pub acquisition_method: String,
    pub acquisition_date: Option<NaiveDate>,
    pub description: Option<String>,
    /// ItemStatus label.
    pub status: String,
    /// Blob-store key of the uploaded picture.
    pub picture: Option<String>,
    pub case_id: Uuid,
}

// ── API response ────────────────────────────────────────────────────

/// API response shape for an item. The owning case is referenced by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ItemResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub evidence_number: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: String,
    pub imei: Option<String>,
    pub owner: Option<String>,
    pub book_date: Option<String>,
    pub storage_location: String,
    pub acquisition_method: String,
    pub acquisition_date: Option<String>,
    pub description: Option<String>,
    pub status: String,
    /// Public URL of the picture, if one was uploaded.
    pub picture: Option<String>,
    pub case: String,
}

impl ItemResponse {
    /// Build the response, rendering the picture key with `picture_url`.
    pub fn new(item: Item, picture_url: impl Fn(&str) -> String) -> Self {
        Self {
            id: item.id.to_string(),
            item_type: item.item_type,
            evidence_number: item.evidence_number,
            brand: item.brand,
            model: item.model,
            serial_number: item.serial_number,
            imei: item.imei,
            owner: item.owner,
            book_date: item.book_date.map(|d| d.to_string()),
            storage_location: item.storage_location,
            acquisition_method: item.acquisition_method,
            acquisition_date: item.acquisition_date.map(|d| d.to_string()),
            description: item.description,
            status: item.status,
            picture: item.picture.as_deref().map(picture_url),
            case: item.case_id.to_string(),
        }
    }
}

// ── Request types ───────────────────────────────────────────────────

/// Full field set for creating or replacing an item.
///
/// Arrives as JSON or as the text parts of a multipart/urlencoded form;
/// the picture blob travels separately.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct ItemRequest {
    /// Presence is checked under the wire name `type`.
    #[serde(rename = "type")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<EvidenceType>))]
    pub item_type: Option<String>,
    #[cfg_attr(
        feature = "validation",
        validate(required(message = "This field is required."), length(max = 20, message = "Ensure this field has no more than 20 characters."))
    )]
    pub evidence_number: Option<String>,
    #[cfg_attr(
        feature = "validation",
        validate(length(max = 100, message = "Ensure this field has no more than 100 characters."))
    )]
    pub brand: Option<String>,
    #[cfg_attr(
        feature = "validation",
        validate(length(max = 100, message = "Ensure this field has no more than 100 characters."))
    )]
    pub model: Option<String>,
    #[cfg_attr(
        feature = "validation",
        validate(required(message = "This field is required."), length(max = 100, message = "Ensure this field has no more than 100 characters."))
    )]
    pub serial_number: Option<String>,
    #[cfg_attr(
        feature = "validation",
        validate(length(max = 16, message = "Ensure this field has no more than 16 characters."))
    )]
    pub imei: Option<String>,
    #[cfg_attr(
        feature = "validation",
        validate(length(max = 100, message = "Ensure this field has no more than 100 characters."))
    )]
    pub owner: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = Date))]
    pub book_date: Option<String>,
    #[cfg_attr(
        feature = "validation",
        validate(required(message = "This field is required."))
    )]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<StorageLocation>))]
    pub storage_location: Option<String>,
    #[cfg_attr(
        feature = "validation",
        validate(required(message = "This field is required."))
    )]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<AcquisitionMethod>))]
    pub acquisition_method: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = Date))]
    pub acquisition_date: Option<String>,
    pub description: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<ItemStatus>))]
    pub status: Option<String>,
    /// Id of the owning case.
    #[cfg_attr(
        feature = "validation",
        validate(required(message = "This field is required."))
    )]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = Uuid))]
    pub case: Option<String>,
}

#[cfg(feature = "validation")]
impl ItemRequest {
    fn normalized(self) -> Self {
        Self {
            item_type: normalize(self.item_type),
            evidence_number: normalize(self.evidence_number),
            brand: normalize(self.brand),
            model: normalize(self.model),
            serial_number: normalize(self.serial_number),
            imei: normalize(self.imei),
            owner: normalize(self.owner),
            book_date: normalize(self.book_date),
            storage_location: normalize(self.storage_location),
            acquisition_method: normalize(self.acquisition_method),
            acquisition_date: normalize(self.acquisition_date),
            description: normalize(self.description),
            status: normalize(self.status),
            case: normalize(self.case),
        }
    }
}

/// An item field set that passed validation, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFields {
    pub item_type: EvidenceType,
    pub evidence_number: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: String,
    pub imei: Option<String>,
    pub owner: Option<String>,
    pub book_date: Option<NaiveDate>,
    pub storage_location: StorageLocation,
    pub acquisition_method: AcquisitionMethod,
    /// `None` on create means "today".
    pub acquisition_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub status: ItemStatus,
    pub case_id: Uuid,
}

#[cfg(feature = "validation")]
impl TryFrom<ItemRequest> for ItemFields {
    type Error = crate::AppError;

    fn try_from(req: ItemRequest) -> Result<Self, Self::Error> {
        let req = req.normalized();
        let mut errors = FieldErrors::from_validation(req.validate());

        let item_type = errors.choice::<EvidenceType>("type", req.item_type.as_deref());
        let storage_location =
            errors.choice::<StorageLocation>("storage_location", req.storage_location.as_deref());
        let acquisition_method =
            errors.choice::<AcquisitionMethod>("acquisition_method", req.acquisition_method.as_deref());
        let status = errors.choice::<ItemStatus>("status", req.status.as_deref());
        let book_date = errors.date("book_date", req.book_date.as_deref());
        let acquisition_date = errors.date("acquisition_date", req.acquisition_date.as_deref());
        let case_id = errors.uuid("case", req.case.as_deref());
        if req.item_type.is_none() && !errors.has("type") {
            errors.add("type", REQUIRED);
        }
        errors.into_result()?;

        Ok(Self {
            item_type: FieldErrors::required("type", item_type)?,
            evidence_number: FieldErrors::required("evidence_number", req.evidence_number)?,
            brand: req.brand,
            model: req.model,
            serial_number: FieldErrors::required("serial_number", req.serial_number)?,
            imei: req.imei,
            owner: req.owner,
            book_date,
            storage_location: FieldErrors::required("storage_location", storage_location)?,
            acquisition_method: FieldErrors::required("acquisition_method", acquisition_method)?,
            acquisition_date,
            description: req.description,
            status: status.unwrap_or_default(),
            case_id: FieldErrors::required("case", case_id)?,
        })
    }
}
