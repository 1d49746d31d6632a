use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One interval on the portal's 30-minute grid, e.g. 09:00-09:30.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotInterval {
    pub start: String,
    pub end: String,
}

impl SlotInterval {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Parse the portal's "HH:MM-HH:MM" range label.
    pub fn parse(raw: &str) -> Option<Self> {
        let (start, end) = raw.trim().split_once('-')?;
        if start.is_empty() || end.is_empty() {
            return None;
        }
        Some(Self::new(start.trim(), end.trim()))
    }
}

impl fmt::Display for SlotInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Availability state of one slot, using the portal's own wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotStatus {
    #[serde(rename = "Available for booking")]
    Available,
    #[serde(rename = "Booked")]
    Booked,
    #[serde(rename = "Not available")]
    NotAvailable,
}

/// One 30-minute slot within a room's day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub interval: SlotInterval,
    pub available: bool,
    pub status: SlotStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<BTreeMap<String, String>>,
}

impl TimeSlot {
    /// Synthetic placeholder inserted by gap-filling for intervals the
    /// portal did not render.
    pub fn open(interval: SlotInterval) -> Self {
        Self {
            interval,
            available: true,
            status: SlotStatus::Available,
            details: None,
        }
    }
}

/// A room paired with its ordered slot sequence.
///
/// Schedules are carried as an ordered list of these pairs rather than a
/// room-keyed map so the room order read off the portal survives JSON
/// round-trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSchedule {
    pub room: String,
    pub slots: Vec<TimeSlot>,
}

/// Filters and window for one scrape request, validated against the catalog
/// before any network activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub buildings: Vec<String>,
    pub floors: Vec<String>,
    pub facility_types: Vec<String>,
    pub equipment: Vec<String>,
    pub date: NaiveDate,
    pub start_time: String,
    pub duration_hours: f64,
    pub capacity: u32,
}

/// Fully resolved configuration snapshot recorded with each result: the
/// portal-format date, the snapped end time and the mapped capacity band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeConfig {
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub duration_hours: f64,
    pub buildings: Vec<String>,
    pub floors: Vec<String>,
    pub facility_types: Vec<String>,
    pub equipment: Vec<String>,
    pub capacity_band: String,
}

/// Outcome of one scrape job. Created once per invocation and immutable
/// afterwards; stored as the job's terminal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub config: ScrapeConfig,
    pub schedules: Vec<RoomSchedule>,
    pub captured_at: DateTime<Utc>,
    #[serde(default)]
    pub errors: Vec<String>,
}
