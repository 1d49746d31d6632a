use axum::{
    extract::{Json as ExtractJson, Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::credentials::UserCredentials;
use crate::models::request::{
    CatalogResponse, ScrapeRequest, ScrapeResponse, TaskStatusResponse,
};
use crate::models::schedule::FilterSelection;
use crate::services::catalog::{
    self, valid_times, validate_selection, CapacityBand, VALID_BUILDINGS, VALID_EQUIPMENT,
    VALID_FACILITY_TYPES, VALID_FLOORS,
};
use crate::services::jobs::{Dispatcher, JobStatus, ScrapeJob};
use crate::services::scraper::ScrapePolicy;
use crate::services::store::CredentialStore;

// AppState struct containing shared resources
pub struct AppState {
    /// Absent when no browser backend is configured; scrape requests then
    /// get a 503 instead of a doomed job.
    pub dispatcher: Option<Arc<Dispatcher>>,
    pub credential_store: Arc<dyn CredentialStore>,
    pub api_key: Option<String>,
    pub email_domain: String,
    pub strict_filter_labels: bool,
}

fn check_api_key(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
    let Some(expected) = &state.api_key else {
        return Ok(());
    };
    let provided = headers.get("x-api-key").and_then(|value| value.to_str().ok());
    if provided == Some(expected.as_str()) {
        Ok(())
    } else {
        warn!("Rejected scrape request with missing or wrong API key");
        Err((StatusCode::UNAUTHORIZED, "invalid API key".to_string()))
    }
}

// Scrape trigger endpoint: validates, enqueues a background job and returns
// the handle to poll
pub async fn trigger_scrape(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ExtractJson(request): ExtractJson<ScrapeRequest>,
) -> Result<Json<ScrapeResponse>, (StatusCode, String)> {
    check_api_key(&state, &headers)?;

    let credentials = UserCredentials::new(&request.email, &request.password);
    if !credentials.is_valid_format(&state.email_domain) {
        return Err((
            StatusCode::BAD_REQUEST,
            format!(
                "invalid credentials: email must contain {} and the password must be at least 8 characters",
                state.email_domain
            ),
        ));
    }

    let Some(dispatcher) = &state.dispatcher else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "scraping backend is not configured".to_string(),
        ));
    };

    let date = match &request.date {
        Some(raw) => catalog::parse_date(raw).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?,
        None => Utc::now().date_naive(),
    };

    let selection = FilterSelection {
        buildings: request.buildings,
        floors: request.floors,
        facility_types: request.facility_types,
        equipment: request.equipment,
        date,
        start_time: request.start_time,
        duration_hours: request.duration_hours,
        capacity: request.capacity,
    };
    validate_selection(&selection).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let task_id = dispatcher.dispatch(ScrapeJob {
        selection,
        credentials,
        policy: ScrapePolicy {
            strict_filter_labels: state.strict_filter_labels,
        },
    });
    info!("Accepted scrape request as task {}", task_id);

    Ok(Json(ScrapeResponse {
        task_id: task_id.to_string(),
        status_url: format!("/tasks/{}", task_id),
    }))
}

// Task status polling endpoint
pub async fn get_task_status(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskStatusResponse>, (StatusCode, String)> {
    let id = Uuid::parse_str(&task_id)
        .map_err(|_| (StatusCode::NOT_FOUND, format!("unknown task: {}", task_id)))?;

    let job = state
        .dispatcher
        .as_ref()
        .and_then(|dispatcher| dispatcher.status(&id))
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("unknown task: {}", task_id)))?;

    Ok(Json(TaskStatusResponse {
        task_id,
        status: job.status.as_str().to_string(),
        ready: job.status.is_terminal(),
        successful: job.status == JobStatus::Success,
        result: job.result,
        error: job.error,
    }))
}

// Catalog endpoint: the valid filter values for building pickers
pub async fn get_catalog() -> Json<CatalogResponse> {
    Json(CatalogResponse {
        buildings: VALID_BUILDINGS.iter().map(|s| s.to_string()).collect(),
        floors: VALID_FLOORS.iter().map(|s| s.to_string()).collect(),
        facility_types: VALID_FACILITY_TYPES.iter().map(|s| s.to_string()).collect(),
        equipment: VALID_EQUIPMENT.iter().map(|s| s.to_string()).collect(),
        times: valid_times(),
        capacity_bands: CapacityBand::all().iter().map(|s| s.to_string()).collect(),
    })
}
