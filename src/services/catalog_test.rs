#[cfg(test)]
mod catalog_tests {
    use chrono::NaiveDate;

    use crate::error::ScrapeError;
    use crate::models::schedule::FilterSelection;
    use crate::services::catalog::{
        format_portal_date, is_building, parse_date, snap_end_time, valid_times,
        validate_selection, CapacityBand, VALID_BUILDINGS,
    };

    fn selection() -> FilterSelection {
        FilterSelection {
            buildings: vec!["Li Ka Shing Library".to_string()],
            floors: vec!["Level 2".to_string()],
            facility_types: vec!["Group Study Room".to_string()],
            equipment: vec!["Projector".to_string()],
            date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            start_time: "09:00".to_string(),
            duration_hours: 2.0,
            capacity: 5,
        }
    }

    #[test]
    fn test_time_grid_shape() {
        let times = valid_times();
        assert_eq!(times.len(), 48);
        assert_eq!(times.first().unwrap(), "00:00");
        assert_eq!(times[1], "00:30");
        assert_eq!(times.last().unwrap(), "23:30");
    }

    #[test]
    fn test_capacity_band_boundaries() {
        assert_eq!(CapacityBand::from_capacity(0).as_str(), "LessThan5Pax");
        assert_eq!(CapacityBand::from_capacity(4).as_str(), "LessThan5Pax");
        // 5 falls into the 6-10 band, matching the portal's own selector
        assert_eq!(CapacityBand::from_capacity(5).as_str(), "From6To10Pax");
        assert_eq!(CapacityBand::from_capacity(10).as_str(), "From6To10Pax");
        assert_eq!(CapacityBand::from_capacity(11).as_str(), "From11To15Pax");
        assert_eq!(CapacityBand::from_capacity(15).as_str(), "From11To15Pax");
        assert_eq!(CapacityBand::from_capacity(16).as_str(), "From16To20Pax");
        assert_eq!(CapacityBand::from_capacity(20).as_str(), "From16To20Pax");
        assert_eq!(CapacityBand::from_capacity(21).as_str(), "From21To50Pax");
        assert_eq!(CapacityBand::from_capacity(50).as_str(), "From21To50Pax");
        assert_eq!(CapacityBand::from_capacity(51).as_str(), "From51To100Pax");
        assert_eq!(CapacityBand::from_capacity(100).as_str(), "From51To100Pax");
        assert_eq!(CapacityBand::from_capacity(101).as_str(), "MoreThan100Pax");
        assert_eq!(CapacityBand::all().len(), 7);
    }

    #[test]
    fn test_snap_end_time_exact_grid_hit() {
        assert_eq!(snap_end_time("10:00", 3.0).unwrap(), "13:00");
        assert_eq!(snap_end_time("14:00", 2.5).unwrap(), "16:30");
        assert_eq!(snap_end_time("09:00", 0.5).unwrap(), "09:30");
    }

    #[test]
    fn test_snap_end_time_off_grid_rounds_to_nearest() {
        // 10:00 + 40min = 10:40, nearest grid value is 10:30
        assert_eq!(snap_end_time("10:00", 40.0 / 60.0).unwrap(), "10:30");
        // 10:00 + 50min = 10:50, nearest grid value is 11:00
        assert_eq!(snap_end_time("10:00", 50.0 / 60.0).unwrap(), "11:00");
    }

    #[test]
    fn test_snap_end_time_tie_keeps_earlier_candidate() {
        // 10:00 + 15min = 10:15, equidistant between 10:00 and 10:30
        assert_eq!(snap_end_time("10:00", 0.25).unwrap(), "10:00");
    }

    #[test]
    fn test_snap_end_time_past_midnight_clamps_to_grid_end() {
        // 23:00 + 2h runs past midnight and must not wrap to the morning
        assert_eq!(snap_end_time("23:00", 2.0).unwrap(), "23:30");
    }

    #[test]
    fn test_snap_end_time_rejects_bad_input() {
        assert!(matches!(
            snap_end_time("25:00", 1.0),
            Err(ScrapeError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            snap_end_time("10:00", 0.0),
            Err(ScrapeError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            snap_end_time("10:00", f64::NAN),
            Err(ScrapeError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_portal_date_round_trip() {
        let date = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let formatted = format_portal_date(date);
        assert_eq!(formatted, "01-Apr-2025");
        assert_eq!(parse_date(&formatted).unwrap(), date);
    }

    #[test]
    fn test_parse_date_accepted_shapes() {
        let expected = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        assert_eq!(parse_date("2025-04-01").unwrap(), expected);
        assert_eq!(parse_date("01-Apr-2025").unwrap(), expected);
        assert_eq!(parse_date("1 April 2025").unwrap(), expected);
        assert_eq!(parse_date(" 1 Apr 2025 ").unwrap(), expected);
        assert!(parse_date("April Fools").is_err());
    }

    #[test]
    fn test_is_building_matches_catalog() {
        for name in VALID_BUILDINGS {
            assert!(is_building(name));
        }
        assert!(!is_building("Study Room 2-1"));
    }

    #[test]
    fn test_validate_selection_accepts_known_values() {
        assert!(validate_selection(&selection()).is_ok());
    }

    #[test]
    fn test_validate_selection_rejects_unknown_values() {
        let mut bad_building = selection();
        bad_building.buildings.push("Hogwarts".to_string());
        assert!(matches!(
            validate_selection(&bad_building),
            Err(ScrapeError::InvalidConfiguration(_))
        ));

        let mut bad_floor = selection();
        bad_floor.floors = vec!["Level 99".to_string()];
        assert!(validate_selection(&bad_floor).is_err());

        let mut bad_time = selection();
        bad_time.start_time = "09:15".to_string();
        assert!(validate_selection(&bad_time).is_err());

        let mut bad_duration = selection();
        bad_duration.duration_hours = -1.0;
        assert!(validate_selection(&bad_duration).is_err());
    }
}
