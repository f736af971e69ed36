use serde::Deserialize;
use serde_json::Value;

use skyplan_core::ingest::{MissionInput, MissionPatch, PlanUpload};

/// Fields shared by mission create and patch requests.
///
/// `captureDate` is accepted as a fallback alias for `capture_date`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MissionRequest {
    pub name: Option<String>,
    pub notes: Option<String>,
    pub capture_date: Option<String>,
    #[serde(rename = "captureDate")]
    pub capture_date_alias: Option<String>,
    /// Inline geometry: a GeoJSON value or a JSON-encoded string.
    pub geometry: Option<Value>,
}

impl MissionRequest {
    fn capture_date(&self) -> Option<String> {
        self.capture_date
            .clone()
            .or_else(|| self.capture_date_alias.clone())
    }

    pub fn into_input(self, upload: Option<PlanUpload>) -> MissionInput {
        let capture_date = self.capture_date();
        MissionInput {
            name: self.name,
            notes: self.notes,
            capture_date,
            geometry: self.geometry,
            upload,
        }
    }

    pub fn into_patch(self, upload: Option<PlanUpload>) -> MissionPatch {
        let capture_date = self.capture_date();
        MissionPatch {
            name: self.name,
            notes: self.notes,
            capture_date,
            geometry: self.geometry,
            upload,
        }
    }
}
