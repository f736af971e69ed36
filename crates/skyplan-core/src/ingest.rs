//! Mission record construction and patch semantics.
//!
//! Creation requires a geometry source; updates are independent per-field
//! overwrites. Both funnel geometry through the format parsers in
//! [`crate::formats`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Result, SkyplanError};
use crate::formats;
use crate::models::{Mission, MissionSource};

/// Name given to missions created without one.
pub const UNTITLED_MISSION: &str = "Untitled mission";

/// An uploaded plan file, bytes plus the filename that routes it.
#[derive(Debug, Clone)]
pub struct PlanUpload {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Fields accepted when creating a mission.
#[derive(Debug, Default)]
pub struct MissionInput {
    pub name: Option<String>,
    pub notes: Option<String>,
    pub capture_date: Option<String>,
    /// Inline geometry payload, as submitted.
    pub geometry: Option<Value>,
    pub upload: Option<PlanUpload>,
}

/// Fields accepted when patching a mission. Absent fields leave the stored
/// value untouched.
#[derive(Debug, Default)]
pub struct MissionPatch {
    pub name: Option<String>,
    pub notes: Option<String>,
    /// Present-but-empty clears the stored date.
    pub capture_date: Option<String>,
    /// A blank string means "no change"; anything else replaces the stored
    /// geometry.
    pub geometry: Option<Value>,
    pub upload: Option<PlanUpload>,
}

/// Build a new mission record from a create request.
///
/// An inline payload is normalized first so its validation errors surface
/// even when a file is also present; the uploaded file then takes
/// precedence. A request carrying neither fails with
/// [`SkyplanError::MissingGeometry`].
pub fn build_mission(input: MissionInput) -> Result<Mission> {
    let mut source = MissionSource::Manual;
    let mut file_name = None;

    let mut geometry = match input.geometry.as_ref().filter(|p| !is_absent_payload(p)) {
        Some(payload) => Some(formats::geojson::normalize_payload(payload)?),
        None => None,
    };

    if let Some(upload) = &input.upload {
        geometry = Some(formats::normalize_upload(&upload.file_name, &upload.data)?);
        source = MissionSource::Upload;
        file_name = Some(upload.file_name.clone());
    }

    let geometry = geometry.ok_or(SkyplanError::MissingGeometry)?;

    let capture_date = match input.capture_date.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(parse_capture_date(raw)?),
        None => None,
    };

    let now = Utc::now();
    Ok(Mission {
        id: Uuid::new_v4(),
        name: normalize_name(input.name, None),
        notes: input.notes.unwrap_or_default(),
        capture_date,
        geometry,
        source,
        file_name,
        created_at: now,
        updated_at: now,
    })
}

/// Apply a patch to an existing mission, returning the updated record.
///
/// `id` and `created_at` never change; `updated_at` refreshes no matter
/// which fields the patch carries. An uploaded file wins over an inline
/// payload when both are present.
pub fn apply_update(existing: &Mission, patch: MissionPatch) -> Result<Mission> {
    let mut updated = existing.clone();

    if let Some(name) = patch.name {
        updated.name = normalize_name(Some(name), Some(&existing.name));
    }

    if let Some(notes) = patch.notes {
        updated.notes = notes;
    }

    if let Some(raw) = patch.capture_date {
        updated.capture_date = if raw.is_empty() {
            None
        } else {
            Some(parse_capture_date(&raw)?)
        };
    }

    if let Some(upload) = &patch.upload {
        updated.geometry = formats::normalize_upload(&upload.file_name, &upload.data)?;
        updated.source = MissionSource::Upload;
        updated.file_name = Some(upload.file_name.clone());
    } else if let Some(payload) = &patch.geometry {
        if !is_blank_text(payload) {
            updated.geometry = formats::geojson::normalize_payload(payload)?;
            updated.source = MissionSource::Manual;
        }
    }

    updated.updated_at = Utc::now();
    Ok(updated)
}

/// Parse a capture date, accepting either `YYYY-MM-DD` or a full ISO-8601
/// timestamp. Timestamps are truncated to their date.
pub fn parse_capture_date(value: &str) -> Result<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(datetime) = value.parse::<NaiveDateTime>() {
        return Ok(datetime.date());
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Ok(datetime.date_naive());
    }
    Err(SkyplanError::InvalidDate)
}

fn normalize_name(requested: Option<String>, stored: Option<&str>) -> String {
    requested.filter(|name| !name.is_empty()).unwrap_or_else(|| {
        stored
            .filter(|name| !name.is_empty())
            .unwrap_or(UNTITLED_MISSION)
            .to_string()
    })
}

/// Payloads the create path treats as "not supplied": null, blank strings
/// and empty containers.
fn is_absent_payload(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(members) => members.is_empty(),
        _ => false,
    }
}

/// The patch path only treats blank strings as "no change"; empty containers
/// go through normalization and fail there.
fn is_blank_text(payload: &Value) -> bool {
    matches!(payload, Value::String(text) if text.trim().is_empty())
}
