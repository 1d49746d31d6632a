#[cfg(test)]
mod schedule_tests {
    use chrono::Utc;
    use std::collections::BTreeMap;

    use crate::models::schedule::{
        RoomSchedule, ScrapeConfig, ScrapeResult, SlotInterval, SlotStatus, TimeSlot,
    };

    #[test]
    fn test_interval_parsing() {
        assert_eq!(
            SlotInterval::parse("09:00-09:30").unwrap(),
            SlotInterval::new("09:00", "09:30")
        );
        assert_eq!(
            SlotInterval::parse(" 09:00 - 09:30 ").unwrap(),
            SlotInterval::new("09:00", "09:30")
        );
        assert!(SlotInterval::parse("09:00").is_none());
        assert!(SlotInterval::parse("-09:30").is_none());
        assert_eq!(SlotInterval::new("09:00", "09:30").to_string(), "09:00-09:30");
    }

    #[test]
    fn test_status_uses_portal_wording() {
        assert_eq!(
            serde_json::to_string(&SlotStatus::Available).unwrap(),
            r#""Available for booking""#
        );
        assert_eq!(
            serde_json::to_string(&SlotStatus::Booked).unwrap(),
            r#""Booked""#
        );
        assert_eq!(
            serde_json::to_string(&SlotStatus::NotAvailable).unwrap(),
            r#""Not available""#
        );
    }

    #[test]
    fn test_open_slot_is_available() {
        let slot = TimeSlot::open(SlotInterval::new("09:00", "09:30"));
        assert!(slot.available);
        assert_eq!(slot.status, SlotStatus::Available);
        assert!(slot.details.is_none());
    }

    #[test]
    fn test_slot_serialization_omits_empty_details() {
        let slot = TimeSlot::open(SlotInterval::new("09:00", "09:30"));
        let rendered = serde_json::to_string(&slot).unwrap();
        assert!(!rendered.contains("details"));

        let mut details = BTreeMap::new();
        details.insert("Booked by".to_string(), "ADMIN".to_string());
        let booked = TimeSlot {
            interval: SlotInterval::new("09:00", "09:30"),
            available: false,
            status: SlotStatus::Booked,
            details: Some(details),
        };
        let rendered = serde_json::to_string(&booked).unwrap();
        assert!(rendered.contains("Booked by"));
    }

    #[test]
    fn test_result_round_trip_preserves_room_and_slot_order() {
        let result = ScrapeResult {
            config: ScrapeConfig {
                date: "01-Apr-2025".to_string(),
                start_time: "08:00".to_string(),
                end_time: "10:00".to_string(),
                duration_hours: 2.0,
                buildings: vec!["Li Ka Shing Library".to_string()],
                floors: vec!["Level 2".to_string()],
                facility_types: Vec::new(),
                equipment: Vec::new(),
                capacity_band: "From6To10Pax".to_string(),
            },
            schedules: vec![
                RoomSchedule {
                    room: "Study Room 2-3".to_string(),
                    slots: vec![
                        TimeSlot::open(SlotInterval::new("08:00", "08:30")),
                        TimeSlot {
                            interval: SlotInterval::new("08:30", "09:00"),
                            available: false,
                            status: SlotStatus::Booked,
                            details: None,
                        },
                    ],
                },
                RoomSchedule {
                    room: "Study Room 2-1".to_string(),
                    slots: vec![TimeSlot::open(SlotInterval::new("08:00", "08:30"))],
                },
            ],
            captured_at: Utc::now(),
            errors: vec!["floor labels not found and skipped: Level 14".to_string()],
        };

        let rendered = serde_json::to_string(&result).unwrap();
        let parsed: ScrapeResult = serde_json::from_str(&rendered).unwrap();

        assert_eq!(parsed, result);
        // Rooms come back in portal rendering order, not sorted
        assert_eq!(parsed.schedules[0].room, "Study Room 2-3");
        assert_eq!(parsed.schedules[1].room, "Study Room 2-1");
        assert_eq!(
            parsed.schedules[0].slots[0].interval,
            SlotInterval::new("08:00", "08:30")
        );
    }
}
