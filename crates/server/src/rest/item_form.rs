//! Request body for item create and update.
//!
//! Items arrive as `multipart/form-data` (text parts plus an optional
//! `picture` file), as a urlencoded form, or as JSON. All three land in the
//! same [`ItemForm`].

use std::collections::HashMap;

use axum::{
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use shared_types::{AppError, ItemFields, ItemRequest};

use crate::storage::{PictureStore, PictureUpload, PICTURE_NOT_A_FILE};

/// What the request asks to do with the item's picture.
pub enum PictureField {
    /// No picture sent: leave the stored one alone.
    Keep,
    /// Explicitly emptied.
    Clear,
    Replace(PictureUpload),
    /// Something other than a file was sent.
    Invalid(&'static str),
}

impl std::fmt::Debug for PictureField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PictureField::Keep => f.write_str("Keep"),
            PictureField::Clear => f.write_str("Clear"),
            PictureField::Replace(upload) => f
                .debug_struct("Replace")
                .field("file_name", &upload.file_name)
                .field("content_type", &upload.content_type)
                .field("len", &upload.bytes.len())
                .finish(),
            PictureField::Invalid(msg) => f.debug_tuple("Invalid").field(msg).finish(),
        }
    }
}

impl PictureField {
    /// Interpret a non-file value: blank clears, anything else is not a file.
    fn from_text(value: Option<&str>) -> Self {
        match value {
            None => PictureField::Keep,
            Some(v) if v.trim().is_empty() => PictureField::Clear,
            Some(_) => PictureField::Invalid(PICTURE_NOT_A_FILE),
        }
    }

    fn from_json(value: Option<Value>) -> Self {
        match value {
            None => PictureField::Keep,
            Some(Value::Null) => PictureField::Clear,
            Some(Value::String(s)) => Self::from_text(Some(s.as_str())),
            Some(_) => PictureField::Invalid(PICTURE_NOT_A_FILE),
        }
    }
}

#[derive(Debug)]
pub struct ItemForm {
    pub request: ItemRequest,
    pub picture: PictureField,
}

impl ItemForm {
    /// Validate the text fields and the picture together so one response
    /// carries every field error.
    pub fn validate(self, pictures: &PictureStore) -> Result<(ItemFields, PictureField), AppError> {
        let picture_error = match &self.picture {
            PictureField::Invalid(msg) => Some(msg.to_string()),
            PictureField::Replace(upload) => pictures.check(upload).err(),
            PictureField::Keep | PictureField::Clear => None,
        };
        match (ItemFields::try_from(self.request), picture_error) {
            (Ok(fields), None) => Ok((fields, self.picture)),
            (Ok(_), Some(msg)) => Err(AppError::field("picture", msg)),
            (Err(e), Some(msg)) => Err(e.with_field_error("picture", msg)),
            (Err(e), None) => Err(e),
        }
    }
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
struct JsonPayload {
    #[serde(flatten)]
    item: ItemRequest,
    #[serde(default, deserialize_with = "present")]
    picture: Option<Value>,
}

#[derive(Deserialize)]
struct FormPayload {
    #[serde(flatten)]
    item: ItemRequest,
    #[serde(default)]
    picture: Option<String>,
}

fn request_from_parts(mut parts: HashMap<String, String>) -> ItemRequest {
    let mut take = |name: &str| parts.remove(name);
    ItemRequest {
        item_type: take("type"),
        evidence_number: take("evidence_number"),
        brand: take("brand"),
        model: take("model"),
        serial_number: take("serial_number"),
        imei: take("imei"),
        owner: take("owner"),
        book_date: take("book_date"),
        storage_location: take("storage_location"),
        acquisition_method: take("acquisition_method"),
        acquisition_date: take("acquisition_date"),
        description: take("description"),
        status: take("status"),
        case: take("case"),
    }
}

async fn from_multipart(mut multipart: Multipart) -> Result<ItemForm, AppError> {
    let bad_request = |e: axum::extract::multipart::MultipartError| AppError::bad_request(e.body_text());

    let mut parts = HashMap::new();
    let mut picture = PictureField::Keep;

    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "picture" {
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await.map_err(bad_request)?;
            picture = match file_name {
                // A file input left empty is sent as a nameless, empty file part.
                Some(ref f) if f.is_empty() && bytes.is_empty() => PictureField::Keep,
                Some(_) => PictureField::Replace(PictureUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                }),
                None => PictureField::from_text(Some(String::from_utf8_lossy(&bytes).as_ref())),
            };
        } else {
            // Repeated parts: the last one wins.
            let value = field.text().await.map_err(bad_request)?;
            parts.insert(name, value);
        }
    }

    Ok(ItemForm {
        request: request_from_parts(parts),
        picture,
    })
}

impl<S> FromRequest<S> for ItemForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::bad_request(e.body_text()))?;
            from_multipart(multipart).await
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(payload) = Form::<FormPayload>::from_request(req, state)
                .await
                .map_err(|e| AppError::bad_request(e.body_text()))?;
            Ok(ItemForm {
                request: payload.item,
                picture: PictureField::from_text(payload.picture.as_deref()),
            })
        } else {
            let Json(payload) = Json::<JsonPayload>::from_request(req, state)
                .await
                .map_err(|e| AppError::bad_request(e.body_text()))?;
            Ok(ItemForm {
                request: payload.item,
                picture: PictureField::from_json(payload.picture),
            })
        }
    }
}
