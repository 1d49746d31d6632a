//! Scripted portal session for tests.
//!
//! Stands in for a live WebDriver-backed portal: canned date values, a canned
//! results grid, and injectable faults at each pipeline stage. Tests share
//! the call log and closed flag through `Arc`s handed out by the factory.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::driver::{FilterCategory, PortalError, PortalSession, RawGrid, SessionFactory};

/// Where (if anywhere) the scripted session should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptedFault {
    #[default]
    None,
    /// Landing page load times out on every attempt.
    LandingTimeout,
    /// Post-login marker never appears.
    LoginTimeout,
    /// Scheduling frame is missing from the page.
    MissingFrame,
    /// Search submits fine but the results grid never renders.
    ResultsNeverAppear,
}

pub struct ScriptedSession {
    fault: ScriptedFault,
    /// Values returned by successive `current_date_value` calls; the cursor
    /// advances on `advance_date` and clamps at the last entry.
    date_values: Vec<String>,
    date_cursor: usize,
    grid: RawGrid,
    /// Labels reported back as unmatched by `select_multi`.
    missing_labels: Vec<String>,
    log: Arc<Mutex<Vec<String>>>,
    closed: Arc<Mutex<bool>>,
}

impl ScriptedSession {
    fn record(&self, entry: impl Into<String>) {
        self.log.lock().unwrap().push(entry.into());
    }
}

#[async_trait]
impl PortalSession for ScriptedSession {
    async fn load_landing_page(&mut self) -> Result<(), PortalError> {
        self.record("load_landing_page");
        if self.fault == ScriptedFault::LandingTimeout {
            return Err(PortalError::Timeout("login form".to_string()));
        }
        Ok(())
    }

    async fn submit_credentials(
        &mut self,
        email: &str,
        _password: &str,
    ) -> Result<(), PortalError> {
        self.record(format!("submit_credentials:{}", email));
        if self.fault == ScriptedFault::LoginTimeout {
            return Err(PortalError::Timeout("post-login dashboard".to_string()));
        }
        Ok(())
    }

    async fn enter_booking_frame(&mut self) -> Result<(), PortalError> {
        self.record("enter_booking_frame");
        if self.fault == ScriptedFault::MissingFrame {
            return Err(PortalError::Backend("booking frame not present".to_string()));
        }
        Ok(())
    }

    async fn current_date_value(&mut self) -> Result<String, PortalError> {
        let index = self.date_cursor.min(self.date_values.len().saturating_sub(1));
        self.date_values
            .get(index)
            .cloned()
            .ok_or_else(|| PortalError::Backend("no scripted date value".to_string()))
    }

    async fn advance_date(&mut self) -> Result<(), PortalError> {
        self.record("advance_date");
        self.date_cursor += 1;
        Ok(())
    }

    async fn set_time_window(&mut self, start: &str, end: &str) -> Result<(), PortalError> {
        self.record(format!("set_time_window:{}-{}", start, end));
        Ok(())
    }

    async fn select_multi(
        &mut self,
        category: FilterCategory,
        values: &[String],
    ) -> Result<Vec<String>, PortalError> {
        self.record(format!("select_multi:{}:{}", category.as_str(), values.join(",")));
        Ok(values
            .iter()
            .filter(|value| self.missing_labels.contains(value))
            .cloned()
            .collect())
    }

    async fn set_capacity(&mut self, band: &str) -> Result<(), PortalError> {
        self.record(format!("set_capacity:{}", band));
        Ok(())
    }

    async fn submit_search(&mut self) -> Result<bool, PortalError> {
        self.record("submit_search");
        Ok(self.fault != ScriptedFault::ResultsNeverAppear)
    }

    async fn read_results_grid(&mut self) -> Result<RawGrid, PortalError> {
        self.record("read_results_grid");
        Ok(self.grid.clone())
    }

    async fn close(&mut self) {
        self.record("close");
        *self.closed.lock().unwrap() = true;
    }
}

/// Factory producing scripted sessions from a fixed template. The log and
/// closed flag are shared across every session it creates so tests can
/// observe the job's behavior from outside.
pub struct ScriptedFactory {
    pub fault: ScriptedFault,
    pub date_values: Vec<String>,
    pub grid: RawGrid,
    pub missing_labels: Vec<String>,
    /// When set, session creation itself fails.
    pub fail_create: bool,
    pub log: Arc<Mutex<Vec<String>>>,
    pub closed: Arc<Mutex<bool>>,
}

impl ScriptedFactory {
    /// Happy-path factory: the picker already shows `date` and the grid
    /// comes back as given.
    pub fn with_grid(date: &str, grid: RawGrid) -> Self {
        Self {
            fault: ScriptedFault::None,
            date_values: vec![date.to_string()],
            grid,
            missing_labels: Vec::new(),
            fail_create: false,
            log: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_fault(date: &str, fault: ScriptedFault) -> Self {
        let mut factory = Self::with_grid(date, RawGrid::default());
        factory.fault = fault;
        factory
    }

    pub fn was_closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionFactory for ScriptedFactory {
    async fn create(&self) -> Result<Box<dyn PortalSession>, PortalError> {
        if self.fail_create {
            return Err(PortalError::Backend("webdriver unreachable".to_string()));
        }
        Ok(Box::new(ScriptedSession {
            fault: self.fault,
            date_values: self.date_values.clone(),
            date_cursor: 0,
            grid: self.grid.clone(),
            missing_labels: self.missing_labels.clone(),
            log: Arc::clone(&self.log),
            closed: Arc::clone(&self.closed),
        }))
    }
}
