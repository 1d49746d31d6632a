use serde::{Deserialize, Serialize};

use crate::models::schedule::ScrapeResult;

// Window defaults applied when the caller only supplies filters.
pub fn default_start_time() -> String {
    "00:00".to_string()
}

pub fn default_duration_hours() -> f64 {
    2.0
}

pub fn default_capacity() -> u32 {
    5
}

/// Body of `POST /scrape`.
///
/// Deliberately has no `Serialize` impl: the password must never travel back
/// out through this type.
#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    #[serde(default)]
    pub buildings: Vec<String>,
    #[serde(default)]
    pub floors: Vec<String>,
    #[serde(default)]
    pub facility_types: Vec<String>,
    #[serde(default)]
    pub equipment: Vec<String>,
    pub email: String,
    pub password: String,
    /// Target date; defaults to today when absent.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default = "default_start_time")]
    pub start_time: String,
    #[serde(default = "default_duration_hours")]
    pub duration_hours: f64,
    #[serde(default = "default_capacity")]
    pub capacity: u32,
}

/// Response of `POST /scrape`: the job handle plus where to poll it.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScrapeResponse {
    pub task_id: String,
    pub status_url: String,
}

/// Response of `GET /tasks/{task_id}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskStatusResponse {
    pub task_id: String,
    pub status: String,
    pub ready: bool,
    pub successful: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ScrapeResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response of `GET /catalog`: the valid filter values, for rendering
/// pickers.
#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub buildings: Vec<String>,
    pub floors: Vec<String>,
    pub facility_types: Vec<String>,
    pub equipment: Vec<String>,
    pub times: Vec<String>,
    pub capacity_bands: Vec<String>,
}

/// Response of `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
