#[cfg(test)]
mod scraper_tests {
    use chrono::NaiveDate;

    use crate::driver::{MockPortalSession, PortalError, RawGrid};
    use crate::driver_mock::{ScriptedFactory, ScriptedFault};
    use crate::error::ScrapeError;
    use crate::models::credentials::UserCredentials;
    use crate::models::schedule::FilterSelection;
    use crate::services::scraper::{run_scrape, ScrapePolicy, PAGE_LOAD_ATTEMPTS};

    fn selection() -> FilterSelection {
        FilterSelection {
            buildings: vec!["Li Ka Shing Library".to_string()],
            floors: vec!["Level 2".to_string()],
            facility_types: Vec::new(),
            equipment: Vec::new(),
            date: NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
            start_time: "08:00".to_string(),
            duration_hours: 1.0,
            capacity: 5,
        }
    }

    fn credentials() -> UserCredentials {
        UserCredentials::new("student@smu.edu.sg", "hunter2hunter2")
    }

    fn results_grid() -> RawGrid {
        RawGrid {
            // The name column interleaves a building header with the rooms
            room_names: vec![
                "Li Ka Shing Library".to_string(),
                "Study Room 2-1".to_string(),
                "Study Room 2-2".to_string(),
            ],
            events: vec![
                "Booking Time: 09:00-10:00\nFacility: Study Room 2-1".to_string(),
                "(22:00-23:00) (not available)".to_string(),
                "(22:30-23:00) (not available)".to_string(),
            ],
        }
    }

    async fn create_session(factory: &ScriptedFactory) -> Box<dyn crate::driver::PortalSession> {
        use crate::driver::SessionFactory;
        factory.create().await.unwrap()
    }

    async fn run(
        factory: &ScriptedFactory,
        policy: ScrapePolicy,
    ) -> Result<crate::models::schedule::ScrapeResult, ScrapeError> {
        let mut session = create_session(factory).await;
        run_scrape(session.as_mut(), &selection(), &credentials(), &policy).await
    }

    #[tokio::test]
    async fn test_happy_path_walks_date_forward_and_builds_schedules() {
        let mut factory = ScriptedFactory::with_grid("02-Apr-2025", results_grid());
        factory.date_values = vec!["01-Apr-2025".to_string(), "02-Apr-2025".to_string()];

        let result = run(&factory, ScrapePolicy::default()).await.unwrap();

        assert_eq!(result.config.date, "02-Apr-2025");
        assert_eq!(result.config.start_time, "08:00");
        assert_eq!(result.config.end_time, "09:00");
        assert_eq!(result.config.capacity_band, "From6To10Pax");
        assert!(result.errors.is_empty());

        // The building header row is filtered out of the schedules
        assert_eq!(result.schedules.len(), 2);
        assert_eq!(result.schedules[0].room, "Study Room 2-1");
        assert_eq!(result.schedules[1].room, "Study Room 2-2");

        let calls = factory.calls();
        assert_eq!(calls.iter().filter(|c| *c == "advance_date").count(), 1);
        assert!(calls.contains(&"set_time_window:08:00-09:00".to_string()));
        assert!(calls.contains(&"set_capacity:From6To10Pax".to_string()));
        assert!(calls.contains(&"submit_credentials:student@smu.edu.sg".to_string()));
    }

    #[tokio::test]
    async fn test_landing_timeout_exhausts_retries() {
        let factory = ScriptedFactory::with_fault("02-Apr-2025", ScriptedFault::LandingTimeout);

        let err = run(&factory, ScrapePolicy::default()).await.unwrap_err();
        assert_eq!(
            err,
            ScrapeError::Navigation {
                attempts: PAGE_LOAD_ATTEMPTS
            }
        );

        let calls = factory.calls();
        assert_eq!(
            calls.iter().filter(|c| *c == "load_landing_page").count(),
            PAGE_LOAD_ATTEMPTS as usize
        );
    }

    #[tokio::test]
    async fn test_landing_retry_succeeds_within_budget() {
        let mut session = MockPortalSession::new();
        let mut attempts = 0;
        session
            .expect_load_landing_page()
            .times(3)
            .returning(move || {
                attempts += 1;
                if attempts < 3 {
                    Err(PortalError::Timeout("login form".to_string()))
                } else {
                    Ok(())
                }
            });
        session
            .expect_submit_credentials()
            .returning(|_, _| Ok(()));
        session.expect_enter_booking_frame().returning(|| Ok(()));
        session
            .expect_current_date_value()
            .returning(|| Ok("02-Apr-2025".to_string()));
        session.expect_set_time_window().returning(|_, _| Ok(()));
        session
            .expect_select_multi()
            .returning(|_, _| Ok(Vec::new()));
        session.expect_set_capacity().returning(|_| Ok(()));
        session.expect_submit_search().returning(|| Ok(true));
        session
            .expect_read_results_grid()
            .returning(|| Ok(results_grid()));

        let result = run_scrape(
            &mut session,
            &selection(),
            &credentials(),
            &ScrapePolicy::default(),
        )
        .await
        .unwrap();
        assert_eq!(result.schedules.len(), 2);
    }

    #[tokio::test]
    async fn test_login_timeout_is_an_authentication_failure() {
        let factory = ScriptedFactory::with_fault("02-Apr-2025", ScriptedFault::LoginTimeout);
        let err = run(&factory, ScrapePolicy::default()).await.unwrap_err();
        assert_eq!(err, ScrapeError::Authentication);
    }

    #[tokio::test]
    async fn test_missing_frame_is_a_layout_failure() {
        let factory = ScriptedFactory::with_fault("02-Apr-2025", ScriptedFault::MissingFrame);
        let err = run(&factory, ScrapePolicy::default()).await.unwrap_err();
        assert_eq!(err, ScrapeError::Layout);
    }

    #[tokio::test]
    async fn test_unreachable_date_fails_after_bounded_stepping() {
        // The picker never reaches the target date; the cursor clamps on the
        // last scripted value so every step is a no-op.
        let factory = ScriptedFactory::with_grid("01-Apr-2025", results_grid());

        let err = run(&factory, ScrapePolicy::default()).await.unwrap_err();
        assert_eq!(
            err,
            ScrapeError::DateNavigation {
                target: "02-Apr-2025".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_missing_results_grid_means_no_rooms() {
        let factory =
            ScriptedFactory::with_fault("02-Apr-2025", ScriptedFault::ResultsNeverAppear);
        let err = run(&factory, ScrapePolicy::default()).await.unwrap_err();
        assert_eq!(err, ScrapeError::NoResults);
    }

    #[tokio::test]
    async fn test_empty_room_list_means_no_rooms() {
        // Only a building header comes back: no actual rooms
        let grid = RawGrid {
            room_names: vec!["Li Ka Shing Library".to_string()],
            events: Vec::new(),
        };
        let factory = ScriptedFactory::with_grid("02-Apr-2025", grid);
        let err = run(&factory, ScrapePolicy::default()).await.unwrap_err();
        assert_eq!(err, ScrapeError::NoResults);
    }

    #[tokio::test]
    async fn test_soft_label_policy_records_warning_and_continues() {
        let mut factory = ScriptedFactory::with_grid("02-Apr-2025", results_grid());
        factory.missing_labels = vec!["Level 2".to_string()];

        let result = run(&factory, ScrapePolicy::default()).await.unwrap();
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("Level 2"));
        assert_eq!(result.schedules.len(), 2);
    }

    #[tokio::test]
    async fn test_strict_label_policy_fails_the_run() {
        let mut factory = ScriptedFactory::with_grid("02-Apr-2025", results_grid());
        factory.missing_labels = vec!["Level 2".to_string()];

        let err = run(
            &factory,
            ScrapePolicy {
                strict_filter_labels: true,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidConfiguration(_)));
    }

    #[tokio::test]
    async fn test_invalid_selection_fails_before_any_portal_call() {
        let factory = ScriptedFactory::with_grid("02-Apr-2025", results_grid());
        let mut bad = selection();
        bad.buildings = vec!["Hogwarts".to_string()];

        let mut session = create_session(&factory).await;
        let err = run_scrape(
            session.as_mut(),
            &bad,
            &credentials(),
            &ScrapePolicy::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidConfiguration(_)));
        assert!(factory.calls().is_empty());
    }
}
