use thiserror::Error;

/// Failure taxonomy for the scrape pipeline.
///
/// Every variant renders to a plain message suitable for the chat and HTTP
/// surfaces. Nothing below this type escapes the job boundary: the dispatcher
/// converts any `ScrapeError` into a structured error state before a caller
/// can observe it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScrapeError {
    /// Landing page never finished loading within the retry budget.
    #[error("page load failed after {attempts} attempts")]
    Navigation { attempts: u32 },

    /// Post-login marker never appeared. Reported separately from a plain
    /// timeout so callers can prompt for credential re-entry instead of
    /// retrying blindly.
    #[error("login failed - check credentials")]
    Authentication,

    /// The scheduling frame is missing, which means the portal's page
    /// structure changed underneath us.
    #[error("booking interface frame not found - portal layout may have changed")]
    Layout,

    /// The date picker never reached the target date within the step bound.
    #[error("date navigation failed: could not reach {target}")]
    DateNavigation { target: String },

    /// The results grid never appeared: zero rooms match the filters.
    #[error("no rooms found with current filters")]
    NoResults,

    /// Detected event groups do not line up with the room-name column.
    #[error("room/event alignment mismatch: {rooms} rooms but {groups} event groups")]
    ParseAlignment { rooms: usize, groups: usize },

    /// Bad date/time/credential/catalog input, caught before any network
    /// activity.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Unclassified automation backend fault.
    #[error("portal backend error: {0}")]
    Portal(String),
}
