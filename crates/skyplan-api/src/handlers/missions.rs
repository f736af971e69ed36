use std::sync::Arc;

use axum::extract::multipart::Field;
use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::{header, StatusCode};
use axum::Json;
use serde_json::Value;

use skyplan_core::ingest::PlanUpload;

use crate::dto::{MissionListResponse, MissionRequest, MissionResponse};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn list_missions(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
) -> Result<Json<MissionListResponse>, ApiError> {
    let missions = state.missions.list(&project_id).await?;
    Ok(Json(MissionListResponse {
        project: project_id,
        missions,
    }))
}

pub async fn create_mission(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
    request: Request,
) -> Result<(StatusCode, Json<MissionResponse>), ApiError> {
    let (form, upload) = extract_mission_request(request).await?;

    tracing::info!(
        project_id = %project_id,
        has_upload = upload.is_some(),
        "Creating mission"
    );

    let mission = state
        .missions
        .create(&project_id, form.into_input(upload))
        .await?;
    Ok((StatusCode::CREATED, Json(MissionResponse { mission })))
}

pub async fn get_mission(
    State(state): State<Arc<AppState>>,
    Path((project_id, mission_id)): Path<(String, String)>,
) -> Result<Json<MissionResponse>, ApiError> {
    let mission = state.missions.get(&project_id, &mission_id).await?;
    Ok(Json(MissionResponse { mission }))
}

pub async fn update_mission(
    State(state): State<Arc<AppState>>,
    Path((project_id, mission_id)): Path<(String, String)>,
    request: Request,
) -> Result<Json<MissionResponse>, ApiError> {
    let (form, upload) = extract_mission_request(request).await?;

    let mission = state
        .missions
        .update(&project_id, &mission_id, form.into_patch(upload))
        .await?;
    Ok(Json(MissionResponse { mission }))
}

pub async fn delete_mission(
    State(state): State<Arc<AppState>>,
    Path((project_id, mission_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.missions.delete(&project_id, &mission_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Mission payloads arrive either as JSON bodies or as multipart forms
/// carrying an optional plan file.
async fn extract_mission_request(
    request: Request,
) -> Result<(MissionRequest, Option<PlanUpload>), ApiError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &()).await.map_err(|e| {
            ApiError::bad_request("Failed to parse multipart form").with_details(e.to_string())
        })?;
        read_mission_form(multipart).await
    } else {
        let Json(form) = Json::<MissionRequest>::from_request(request, &())
            .await
            .map_err(|e| {
                ApiError::bad_request("Failed to parse request body").with_details(e.to_string())
            })?;
        Ok((form, None))
    }
}

async fn read_mission_form(
    mut multipart: Multipart,
) -> Result<(MissionRequest, Option<PlanUpload>), ApiError> {
    let mut form = MissionRequest::default();
    let mut plan_file = None;
    let mut fallback_file = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::bad_request("Failed to parse multipart form").with_details(e.to_string())
    })? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "name" => form.name = Some(read_text(field).await?),
            "notes" => form.notes = Some(read_text(field).await?),
            "capture_date" => form.capture_date = Some(read_text(field).await?),
            "captureDate" => form.capture_date_alias = Some(read_text(field).await?),
            "geometry" => form.geometry = Some(Value::String(read_text(field).await?)),
            // `plan_file` wins over `file` when both parts are present
            "plan_file" | "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let data = field.bytes().await.map_err(|e| {
                    ApiError::bad_request("Failed to read uploaded file")
                        .with_details(e.to_string())
                })?;
                let upload = PlanUpload {
                    file_name,
                    data: data.to_vec(),
                };
                if name == "plan_file" {
                    plan_file = Some(upload);
                } else {
                    fallback_file = Some(upload);
                }
            }
            _ => {}
        }
    }

    Ok((form, plan_file.or(fallback_file)))
}

async fn read_text(field: Field<'_>) -> Result<String, ApiError> {
    field.text().await.map_err(|e| {
        ApiError::bad_request("Failed to read form field").with_details(e.to_string())
    })
}
