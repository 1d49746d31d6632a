use tracing::{debug, warn};

use crate::error::ScrapeError;
use crate::models::schedule::{RoomSchedule, SlotInterval, SlotStatus, TimeSlot};

const BOOKING_PREFIX: &str = "Booking Time:";
const UNAVAILABLE_MARKER: &str = "(not available)";

/// Partition the flat event stream into per-room groups.
///
/// The portal renders each room's events in sequence and always ends a
/// room's day with a "(not available)" boundary event, so that marker closes
/// the current group. Any trailing events with no closing boundary are
/// dropped with a warning; they belong to a room whose stream was cut off.
pub fn split_events_by_room(events: &[String]) -> Vec<Vec<String>> {
    let mut groups = Vec::new();
    let mut current = Vec::new();

    for event in events {
        current.push(event.clone());
        if event.contains(UNAVAILABLE_MARKER) {
            groups.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        warn!(
            "Dropping {} trailing events with no terminal boundary",
            current.len()
        );
    }
    groups
}

/// Parse one raw event string into a slot, or None for an unrecognised
/// shape (the caller logs and drops those).
pub fn parse_event(raw: &str) -> Option<TimeSlot> {
    if raw.starts_with(BOOKING_PREFIX) {
        // Multi-line block of "Key: Value" pairs; the Booking Time line
        // doubles as the slot's interval.
        let mut details = std::collections::BTreeMap::new();
        let mut interval = None;
        for line in raw.lines() {
            if let Some((key, value)) = line.split_once(": ") {
                details.insert(key.trim().to_string(), value.trim().to_string());
            }
            if let Some(range) = line.strip_prefix(BOOKING_PREFIX) {
                interval = SlotInterval::parse(range);
            }
        }
        Some(TimeSlot {
            interval: interval?,
            available: false,
            status: SlotStatus::Booked,
            details: Some(details),
        })
    } else if raw.ends_with(UNAVAILABLE_MARKER) {
        // "(HH:MM-HH:MM) (not available)"
        let range = raw.split(") (").next()?.trim_start_matches('(');
        Some(TimeSlot {
            interval: SlotInterval::parse(range)?,
            available: false,
            status: SlotStatus::NotAvailable,
            details: None,
        })
    } else {
        None
    }
}

/// Fill in the intervals the portal did not render.
///
/// The portal only draws booked/unavailable events, never free ones. The
/// expected timeline is rebuilt from the distinct interval boundaries in
/// first-appearance order; walking the parsed slots against it, a synthetic
/// "Available for booking" slot is inserted before any slot that does not
/// match the next expected interval. Postcondition: the returned schedule is
/// contiguous (each slot ends where the next begins).
pub fn fill_missing_slots(slots: Vec<TimeSlot>) -> Vec<TimeSlot> {
    let mut boundaries: Vec<String> = Vec::new();
    for slot in &slots {
        for time in [&slot.interval.start, &slot.interval.end] {
            if !boundaries.contains(time) {
                boundaries.push(time.clone());
            }
        }
    }

    let expected: Vec<SlotInterval> = boundaries
        .windows(2)
        .map(|pair| SlotInterval::new(pair[0].clone(), pair[1].clone()))
        .collect();

    let mut expected_iter = expected.into_iter();
    let mut filled = Vec::with_capacity(slots.len());
    for slot in slots {
        match expected_iter.next() {
            Some(interval) if interval == slot.interval => filled.push(slot),
            Some(interval) => {
                filled.push(TimeSlot::open(interval));
                filled.push(slot);
            }
            None => filled.push(slot),
        }
    }
    filled
}

/// Reconstruct one schedule per room from the raw grid payload.
///
/// Group i corresponds to room i in the portal's rendering order; that
/// positional alignment is the portal's implicit contract, so any count
/// mismatch is a data-integrity failure, never a silent truncation.
pub fn build_schedules(
    room_names: &[String],
    events: &[String],
) -> Result<Vec<RoomSchedule>, ScrapeError> {
    let groups = split_events_by_room(events);
    if groups.len() != room_names.len() {
        return Err(ScrapeError::ParseAlignment {
            rooms: room_names.len(),
            groups: groups.len(),
        });
    }

    let mut schedules = Vec::with_capacity(room_names.len());
    for (room, group) in room_names.iter().zip(groups) {
        let mut slots = Vec::new();
        for raw in &group {
            match parse_event(raw) {
                Some(slot) => slots.push(slot),
                None => warn!("Unrecognised timeslot format: {}", raw),
            }
        }
        debug!("Parsed {} slots for room {}", slots.len(), room);
        schedules.push(RoomSchedule {
            room: room.clone(),
            slots: fill_missing_slots(slots),
        });
    }
    Ok(schedules)
}
