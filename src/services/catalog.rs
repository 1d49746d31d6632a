use chrono::NaiveDate;

use crate::error::ScrapeError;
use crate::models::schedule::FilterSelection;

// Static catalogs of the portal's selectable filter values.

pub const VALID_BUILDINGS: [&str; 12] = [
    "Administration Building",
    "Campus Open Spaces - Events/Activities",
    "Concourse - Room/Lab",
    "Lee Kong Chian School of Business",
    "Li Ka Shing Library",
    "Prinsep Street Residences",
    "School of Accountancy",
    "School of Computing & Information Systems 1",
    "School of Economics/School of Computing & Information Systems 2",
    "School of Social Sciences/College of Integrative Studies",
    "SMU Connexion",
    "Yong Pung How School of Law/Kwa Geok Choo Law Library",
];

pub const VALID_FLOORS: [&str; 16] = [
    "Basement 0",
    "Basement 2",
    "Level 1",
    "Level 2",
    "Level 3",
    "Level 4",
    "Level 5",
    "Level 6",
    "Level 7",
    "Level 8",
    "Level 9",
    "Level 10",
    "Level 11",
    "Level 12",
    "Level 13",
    "Level 14",
];

pub const VALID_FACILITY_TYPES: [&str; 13] = [
    "Chatterbox",
    "Classroom",
    "Group Study Room",
    "Hostel Facilities",
    "Meeting Pod",
    "MPH / Sports Hall",
    "Phone Booth",
    "Project Room",
    "Project Room (Level 5)",
    "Seminar Room",
    "SMUC Facilities",
    "Student Activities Area",
    "Study Booth",
];

pub const VALID_EQUIPMENT: [&str; 18] = [
    "Classroom PC",
    "Classroom Prompter",
    "Clip-on Mic",
    "Doc Camera",
    "DVD Player",
    "Gooseneck Mic",
    "Handheld Mic",
    "Hybrid (USB connection)",
    "In-room VC System",
    "Projector",
    "Rostrum Mic",
    "Teams Room",
    "Teams Room NEAT Board",
    "TV Panel",
    "USB Connection VC room",
    "Video Recording",
    "Wired Mic",
    "Wireless Projection",
];

/// Every selectable time on the portal's 30-minute grid, in selector order
/// (00:00, 00:30, ..., 23:30).
pub fn valid_times() -> Vec<String> {
    let mut times = Vec::with_capacity(48);
    for hour in 0..24 {
        for minute in [0, 30] {
            times.push(format!("{:02}:{:02}", hour, minute));
        }
    }
    times
}

/// One of the portal's seven discrete capacity categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityBand {
    LessThan5,
    From6To10,
    From11To15,
    From16To20,
    From21To50,
    From51To100,
    MoreThan100,
}

impl CapacityBand {
    /// Map a raw headcount onto its band. Total over all non-negative
    /// integers; the breakpoints mirror the portal's selector exactly
    /// (note 5 falls in the 6-10 band, as the portal has it).
    pub fn from_capacity(raw: u32) -> Self {
        match raw {
            0..=4 => CapacityBand::LessThan5,
            5..=10 => CapacityBand::From6To10,
            11..=15 => CapacityBand::From11To15,
            16..=20 => CapacityBand::From16To20,
            21..=50 => CapacityBand::From21To50,
            51..=100 => CapacityBand::From51To100,
            _ => CapacityBand::MoreThan100,
        }
    }

    /// The selector value the portal expects.
    pub fn as_str(&self) -> &'static str {
        match self {
            CapacityBand::LessThan5 => "LessThan5Pax",
            CapacityBand::From6To10 => "From6To10Pax",
            CapacityBand::From11To15 => "From11To15Pax",
            CapacityBand::From16To20 => "From16To20Pax",
            CapacityBand::From21To50 => "From21To50Pax",
            CapacityBand::From51To100 => "From51To100Pax",
            CapacityBand::MoreThan100 => "MoreThan100Pax",
        }
    }

    pub fn all() -> Vec<&'static str> {
        [
            CapacityBand::LessThan5,
            CapacityBand::From6To10,
            CapacityBand::From11To15,
            CapacityBand::From16To20,
            CapacityBand::From21To50,
            CapacityBand::From51To100,
            CapacityBand::MoreThan100,
        ]
        .iter()
        .map(CapacityBand::as_str)
        .collect()
    }
}

pub fn is_building(name: &str) -> bool {
    VALID_BUILDINGS.contains(&name)
}

fn minutes_of_day(time: &str) -> Option<i64> {
    let (hour, minute) = time.split_once(':')?;
    let hour: i64 = hour.parse().ok()?;
    let minute: i64 = minute.parse().ok()?;
    if !(0..24).contains(&hour) || !(0..60).contains(&minute) {
        return None;
    }
    Some(hour * 60 + minute)
}

/// Snap the raw end of the requested window onto the portal's fixed
/// 30-minute grid.
///
/// Raw end minutes = start + duration, deliberately left unwrapped: the
/// closest-candidate scan compares against the raw value, so a window
/// running past midnight snaps to the end of the grid rather than wrapping
/// to the morning. Ties keep the earlier candidate (stable minimum over the
/// grid in selector order).
pub fn snap_end_time(start_time: &str, duration_hours: f64) -> Result<String, ScrapeError> {
    let start = minutes_of_day(start_time).ok_or_else(|| {
        ScrapeError::InvalidConfiguration(format!("invalid start time: {}", start_time))
    })?;
    if !duration_hours.is_finite() || duration_hours <= 0.0 {
        return Err(ScrapeError::InvalidConfiguration(format!(
            "invalid duration: {} hours",
            duration_hours
        )));
    }

    let raw_end = start + (duration_hours * 60.0).round() as i64;
    valid_times()
        .into_iter()
        .min_by_key(|candidate| {
            (minutes_of_day(candidate).unwrap_or(i64::MAX) - raw_end).abs()
        })
        .ok_or_else(|| ScrapeError::InvalidConfiguration("empty time grid".to_string()))
}

/// Render a date the way the portal's date picker displays it (DD-MMM-YYYY).
pub fn format_portal_date(date: NaiveDate) -> String {
    date.format("%d-%b-%Y").to_string()
}

/// Parse a caller-supplied date string in any of the accepted shapes.
pub fn parse_date(raw: &str) -> Result<NaiveDate, ScrapeError> {
    const FORMATS: [&str; 4] = ["%Y-%m-%d", "%d-%b-%Y", "%d %B %Y", "%d %b %Y"];
    FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw.trim(), format).ok())
        .ok_or_else(|| ScrapeError::InvalidConfiguration(format!("invalid date format: {}", raw)))
}

fn check_values(category: &str, values: &[String], catalog: &[&str]) -> Result<(), ScrapeError> {
    for value in values {
        if !catalog.contains(&value.as_str()) {
            return Err(ScrapeError::InvalidConfiguration(format!(
                "unknown {} value: {}",
                category, value
            )));
        }
    }
    Ok(())
}

/// Check every chosen filter value against its catalog and the window
/// fields against the time grid. Runs before any network activity.
pub fn validate_selection(selection: &FilterSelection) -> Result<(), ScrapeError> {
    check_values("building", &selection.buildings, &VALID_BUILDINGS)?;
    check_values("floor", &selection.floors, &VALID_FLOORS)?;
    check_values(
        "facility type",
        &selection.facility_types,
        &VALID_FACILITY_TYPES,
    )?;
    check_values("equipment", &selection.equipment, &VALID_EQUIPMENT)?;

    if !valid_times().contains(&selection.start_time) {
        return Err(ScrapeError::InvalidConfiguration(format!(
            "start time not on the 30-minute grid: {}",
            selection.start_time
        )));
    }
    if !selection.duration_hours.is_finite() || selection.duration_hours <= 0.0 {
        return Err(ScrapeError::InvalidConfiguration(format!(
            "invalid duration: {} hours",
            selection.duration_hours
        )));
    }
    Ok(())
}
