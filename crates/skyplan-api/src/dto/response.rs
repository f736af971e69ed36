use serde::Serialize;

use skyplan_core::models::Mission;

/// A project's mission collection
#[derive(Debug, Serialize)]
pub struct MissionListResponse {
    pub project: String,
    pub missions: Vec<Mission>,
}

/// A single mission record
#[derive(Debug, Serialize)]
pub struct MissionResponse {
    pub mission: Mission,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok",
            service: "skyplan-api",
        }
    }
}
