use chrono::Utc;
use tracing::{info, warn};

use crate::driver::{FilterCategory, PortalError, PortalSession};
use crate::error::ScrapeError;
use crate::models::credentials::UserCredentials;
use crate::models::schedule::{FilterSelection, ScrapeConfig, ScrapeResult};
use crate::services::availability::build_schedules;
use crate::services::catalog::{
    self, format_portal_date, snap_end_time, validate_selection, CapacityBand,
};

/// Page-load retry budget for the landing page.
pub const PAGE_LOAD_ATTEMPTS: u32 = 3;

/// Upper bound on single-day steps of the date picker. The picker offers no
/// reliable direct-input path, so the driver walks it one day at a time.
pub const DATE_ADVANCE_LIMIT: u32 = 30;

/// Tunable behavior of one scrape run.
#[derive(Debug, Clone, Default)]
pub struct ScrapePolicy {
    /// When set, a requested filter value with no clickable label on the
    /// portal fails the job instead of being skipped with a warning.
    pub strict_filter_labels: bool,
}

fn portal_fault(error: PortalError) -> ScrapeError {
    ScrapeError::Portal(error.to_string())
}

/// Drive one portal session through a full availability search.
///
/// Validates the selection up front, then walks the portal: landing page
/// (with bounded retries), login, scheduling frame, date navigation, time
/// window, multi-select filters, capacity, search, and finally the raw grid
/// read that feeds the availability parser. Every failure maps onto the
/// `ScrapeError` taxonomy; the session itself is owned and released by the
/// caller.
pub async fn run_scrape(
    session: &mut dyn PortalSession,
    selection: &FilterSelection,
    credentials: &UserCredentials,
    policy: &ScrapePolicy,
) -> Result<ScrapeResult, ScrapeError> {
    validate_selection(selection)?;

    let date_formatted = format_portal_date(selection.date);
    let end_time = snap_end_time(&selection.start_time, selection.duration_hours)?;
    let band = CapacityBand::from_capacity(selection.capacity);

    info!(
        "Scraping configuration: date={} window={}-{} ({}h) capacity={} buildings=[{}] floors=[{}] facility_types=[{}] equipment=[{}]",
        date_formatted,
        selection.start_time,
        end_time,
        selection.duration_hours,
        band.as_str(),
        selection.buildings.join(", "),
        selection.floors.join(", "),
        selection.facility_types.join(", "),
        selection.equipment.join(", "),
    );

    // Landing page, with a fixed reload-and-retry budget for timeouts.
    let mut attempt = 0;
    loop {
        attempt += 1;
        info!("Loading portal landing page (attempt {}/{})", attempt, PAGE_LOAD_ATTEMPTS);
        match session.load_landing_page().await {
            Ok(()) => break,
            Err(PortalError::Timeout(_)) if attempt < PAGE_LOAD_ATTEMPTS => continue,
            Err(PortalError::Timeout(_)) => {
                return Err(ScrapeError::Navigation {
                    attempts: PAGE_LOAD_ATTEMPTS,
                })
            }
            Err(e) => return Err(portal_fault(e)),
        }
    }

    // Login. A timeout on the post-login marker is a credential problem,
    // not a flaky page.
    match session
        .submit_credentials(&credentials.email, &credentials.password)
        .await
    {
        Ok(()) => {}
        Err(PortalError::Timeout(_)) => return Err(ScrapeError::Authentication),
        Err(e) => return Err(portal_fault(e)),
    }

    session
        .enter_booking_frame()
        .await
        .map_err(|_| ScrapeError::Layout)?;

    // Step the date picker until it shows the target date.
    let mut reached = false;
    for _ in 0..DATE_ADVANCE_LIMIT {
        let shown = session.current_date_value().await.map_err(portal_fault)?;
        if shown == date_formatted {
            reached = true;
            break;
        }
        match session.advance_date().await {
            Ok(()) => {}
            Err(PortalError::Timeout(_)) => {
                return Err(ScrapeError::DateNavigation {
                    target: date_formatted,
                })
            }
            Err(e) => return Err(portal_fault(e)),
        }
    }
    if !reached {
        return Err(ScrapeError::DateNavigation {
            target: date_formatted,
        });
    }

    session
        .set_time_window(&selection.start_time, &end_time)
        .await
        .map_err(portal_fault)?;

    // Apply each non-empty multi-select filter.
    let mut warnings = Vec::new();
    let filters: [(FilterCategory, &Vec<String>); 4] = [
        (FilterCategory::Building, &selection.buildings),
        (FilterCategory::Floor, &selection.floors),
        (FilterCategory::FacilityType, &selection.facility_types),
        (FilterCategory::Equipment, &selection.equipment),
    ];
    for (category, values) in filters {
        if values.is_empty() {
            continue;
        }
        let skipped = session
            .select_multi(category, values)
            .await
            .map_err(portal_fault)?;
        if !skipped.is_empty() {
            if policy.strict_filter_labels {
                return Err(ScrapeError::InvalidConfiguration(format!(
                    "{} labels not present on the portal: {}",
                    category.as_str(),
                    skipped.join(", ")
                )));
            }
            warn!(
                "Skipped {} {} labels with no clickable match: {}",
                skipped.len(),
                category.as_str(),
                skipped.join(", ")
            );
            warnings.push(format!(
                "{} labels not found and skipped: {}",
                category.as_str(),
                skipped.join(", ")
            ));
        }
    }

    session
        .set_capacity(band.as_str())
        .await
        .map_err(portal_fault)?;

    if !session.submit_search().await.map_err(portal_fault)? {
        return Err(ScrapeError::NoResults);
    }

    let grid = session.read_results_grid().await.map_err(portal_fault)?;

    // The name column interleaves building header rows with room rows; only
    // the rooms take part in the event alignment.
    let room_names: Vec<String> = grid
        .room_names
        .iter()
        .filter(|name| !catalog::is_building(name.as_str()))
        .cloned()
        .collect();
    if room_names.is_empty() {
        return Err(ScrapeError::NoResults);
    }

    let schedules = build_schedules(&room_names, &grid.events)?;
    info!("Scrape complete: {} rooms", schedules.len());

    Ok(ScrapeResult {
        config: ScrapeConfig {
            date: date_formatted,
            start_time: selection.start_time.clone(),
            end_time,
            duration_hours: selection.duration_hours,
            buildings: selection.buildings.clone(),
            floors: selection.floors.clone(),
            facility_types: selection.facility_types.clone(),
            equipment: selection.equipment.clone(),
            capacity_band: band.as_str().to_string(),
        },
        schedules,
        captured_at: Utc::now(),
        errors: warnings,
    })
}
