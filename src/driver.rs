use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

// Portal selectors. These encode the portal's page structure; if the portal
// changes, this is the list to revisit.
const EMAIL_INPUT: &str = "input[type='email']";
const PASSWORD_INPUT: &str = "input[type='password']";
const SUBMIT_BUTTON: &str = "span#submitButton";
const LOGIN_MARKER: &str = ".dashboard";
const BOOKING_FRAME: &str = "frame[name='frameContent'], iframe[name='frameContent']";
const DATE_FIELD: &str = "input#DateBookingFrom_c1_textDate";
const DATE_NEXT_BUTTON: &str = "a#BtnDpcNext.btn";
const TIME_FROM_SELECT: &str = "select#TimeFrom_c1_ctl04";
const TIME_TO_SELECT: &str = "select#TimeTo_c1_ctl04";
const CAPACITY_SELECT: &str = "select#DropCapacity_c1";
const SEARCH_BUTTON: &str = "a#CheckAvailability";
const RESULTS_TABLE: &str = "table#GridResults_gv";
const ROOM_HEADER_CELLS: &str = "div.scheduler_bluewhite_rowheader_inner";
const EVENT_CELLS: &str = "div.scheduler_bluewhite_event.scheduler_bluewhite_event_line0";

const LOGIN_FORM_WAIT: Duration = Duration::from_secs(15);
const LOGIN_MARKER_WAIT: Duration = Duration::from_secs(30);
const RESULTS_WAIT: Duration = Duration::from_secs(30);
const DATE_CHANGE_WAIT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(250);

// W3C WebDriver element identifier key, with the legacy JSON wire fallback.
const W3C_ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
const LEGACY_ELEMENT_KEY: &str = "ELEMENT";

/// Errors surfaced by a portal automation backend.
///
/// `Timeout` stays distinct from `Backend` so each pipeline step can apply
/// its own classification: a landing-page timeout is retryable, a post-login
/// timeout means bad credentials, a results timeout means zero rooms.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("timed out waiting for {0}")]
    Timeout(String),
    #[error("{0}")]
    Backend(String),
}

/// One of the portal's four multi-select filter controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterCategory {
    Building,
    Floor,
    FacilityType,
    Equipment,
}

impl FilterCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterCategory::Building => "building",
            FilterCategory::Floor => "floor",
            FilterCategory::FacilityType => "facility type",
            FilterCategory::Equipment => "equipment",
        }
    }

    fn control_selector(&self) -> &'static str {
        match self {
            FilterCategory::Building => "#DropMultiBuildingList_c1_textItem",
            FilterCategory::Floor => "#DropMultiFloorList_c1_textItem",
            FilterCategory::FacilityType => "#DropMultiFacilityTypeList_c1_textItem",
            FilterCategory::Equipment => "#DropMultiEquipmentList_c1_textItem",
        }
    }
}

/// Raw payload read off the results page, in portal rendering order.
///
/// `room_names` is the results grid's name column (may still contain
/// building header rows); `events` is the per-cell title attribute of the
/// event layer. Order matters on both sides: it is the only association the
/// portal gives us between rooms and their events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGrid {
    pub room_names: Vec<String>,
    pub events: Vec<String>,
}

/// Typed adapter over the automation backend, exposing only the operations
/// the session driver needs. Swappable and unit-testable via a scripted
/// fake; the production implementation is [`PortalClient`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PortalSession: Send {
    /// Navigate to the portal landing page and wait for the login form.
    async fn load_landing_page(&mut self) -> Result<(), PortalError>;

    /// Fill and submit the login form, then wait for the post-login marker.
    /// A `Timeout` here means the credentials were rejected.
    async fn submit_credentials(&mut self, email: &str, password: &str)
        -> Result<(), PortalError>;

    /// Switch into the interactive scheduling frame.
    async fn enter_booking_frame(&mut self) -> Result<(), PortalError>;

    /// Currently displayed date-picker value, in the portal's DD-MMM-YYYY
    /// display form.
    async fn current_date_value(&mut self) -> Result<String, PortalError>;

    /// Step the date picker forward by one day.
    async fn advance_date(&mut self) -> Result<(), PortalError>;

    /// Set the start/end time selectors.
    async fn set_time_window(&mut self, start: &str, end: &str) -> Result<(), PortalError>;

    /// Open one multi-select control, click each requested label, close the
    /// control again. Returns the labels that had no clickable match.
    async fn select_multi(
        &mut self,
        category: FilterCategory,
        values: &[String],
    ) -> Result<Vec<String>, PortalError>;

    /// Set the capacity selector to the given band value.
    async fn set_capacity(&mut self, band: &str) -> Result<(), PortalError>;

    /// Submit the search. Returns false when the results grid never
    /// appears, i.e. zero rooms match.
    async fn submit_search(&mut self) -> Result<bool, PortalError>;

    /// Read the room-name column and event layer off the results page.
    async fn read_results_grid(&mut self) -> Result<RawGrid, PortalError>;

    /// Release the underlying browser session. Must be safe to call on any
    /// exit path; failures are logged, never propagated.
    async fn close(&mut self);
}

/// Creates one fresh portal session per job.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn create(&self) -> Result<Box<dyn PortalSession>, PortalError>;
}

/// Production portal session speaking the W3C WebDriver wire protocol over
/// HTTP against a remote driver (chromedriver or equivalent).
pub struct PortalClient {
    http: Client,
    webdriver_url: String,
    portal_url: String,
    session_id: String,
}

impl PortalClient {
    /// Open a headless browser session against the given WebDriver endpoint.
    pub async fn connect(webdriver_url: &str, portal_url: &str) -> Result<Self, PortalError> {
        let http = Client::new();
        let body = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": {
                        "args": [
                            "--headless",
                            "--no-sandbox",
                            "--disable-gpu",
                            "--disable-dev-shm-usage"
                        ]
                    }
                }
            }
        });

        info!("Opening browser session at {}", webdriver_url);
        let res = http
            .post(format!("{}/session", webdriver_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| PortalError::Backend(format!("webdriver unreachable: {}", e)))?;
        let value: Value = res
            .json()
            .await
            .map_err(|e| PortalError::Backend(format!("bad webdriver response: {}", e)))?;

        let session_id = value["value"]["sessionId"]
            .as_str()
            .ok_or_else(|| {
                PortalError::Backend(format!("webdriver refused session: {}", value["value"]))
            })?
            .to_string();
        debug!("Browser session established: {}", session_id);

        Ok(Self {
            http,
            webdriver_url: webdriver_url.trim_end_matches('/').to_string(),
            portal_url: portal_url.to_string(),
            session_id,
        })
    }

    /// Issue one WebDriver command against the current session and unwrap
    /// the `value` envelope.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, PortalError> {
        let url = format!(
            "{}/session/{}{}",
            self.webdriver_url, self.session_id, path
        );
        let mut request = self.http.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(&body);
        } else if method == Method::POST {
            // WebDriver requires a JSON body on every POST
            request = request.json(&json!({}));
        }

        let res = request
            .send()
            .await
            .map_err(|e| PortalError::Backend(e.to_string()))?;
        let status = res.status();
        let value: Value = res
            .json()
            .await
            .map_err(|e| PortalError::Backend(e.to_string()))?;

        if !status.is_success() {
            let message = value["value"]["message"]
                .as_str()
                .unwrap_or("webdriver command failed")
                .to_string();
            return Err(PortalError::Backend(message));
        }
        Ok(value["value"].clone())
    }

    fn extract_element_id(value: &Value) -> Option<String> {
        value
            .get(W3C_ELEMENT_KEY)
            .or_else(|| value.get(LEGACY_ELEMENT_KEY))
            .and_then(Value::as_str)
            .map(String::from)
    }

    /// Find the first element matching a locator, or None. Absence is a
    /// normal outcome here, not a backend fault.
    async fn find_element(&self, using: &str, locator: &str) -> Result<Option<String>, PortalError> {
        let value = self
            .execute(
                Method::POST,
                "/elements",
                Some(json!({ "using": using, "value": locator })),
            )
            .await?;
        Ok(value
            .as_array()
            .and_then(|elements| elements.first())
            .and_then(Self::extract_element_id))
    }

    async fn find_elements(&self, selector: &str) -> Result<Vec<String>, PortalError> {
        let value = self
            .execute(
                Method::POST,
                "/elements",
                Some(json!({ "using": "css selector", "value": selector })),
            )
            .await?;
        Ok(value
            .as_array()
            .map(|elements| {
                elements
                    .iter()
                    .filter_map(Self::extract_element_id)
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Find an element that must be present for the flow to continue.
    async fn require_element(&self, selector: &str) -> Result<String, PortalError> {
        self.find_element("css selector", selector)
            .await?
            .ok_or_else(|| PortalError::Backend(format!("element not found: {}", selector)))
    }

    /// Poll for an element until it appears or the deadline passes.
    async fn wait_for(
        &self,
        selector: &str,
        timeout: Duration,
        what: &str,
    ) -> Result<String, PortalError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(id) = self.find_element("css selector", selector).await? {
                return Ok(id);
            }
            if Instant::now() >= deadline {
                return Err(PortalError::Timeout(what.to_string()));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn click(&self, element_id: &str) -> Result<(), PortalError> {
        self.execute(Method::POST, &format!("/element/{}/click", element_id), None)
            .await?;
        Ok(())
    }

    async fn send_keys(&self, element_id: &str, text: &str) -> Result<(), PortalError> {
        self.execute(
            Method::POST,
            &format!("/element/{}/value", element_id),
            Some(json!({ "text": text })),
        )
        .await?;
        Ok(())
    }

    async fn element_text(&self, element_id: &str) -> Result<String, PortalError> {
        let value = self
            .execute(Method::GET, &format!("/element/{}/text", element_id), None)
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn element_attribute(
        &self,
        element_id: &str,
        name: &str,
    ) -> Result<Option<String>, PortalError> {
        let value = self
            .execute(
                Method::GET,
                &format!("/element/{}/attribute/{}", element_id, name),
                None,
            )
            .await?;
        Ok(value.as_str().map(String::from))
    }

    async fn element_property(&self, element_id: &str, name: &str) -> Result<String, PortalError> {
        let value = self
            .execute(
                Method::GET,
                &format!("/element/{}/property/{}", element_id, name),
                None,
            )
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    /// Pick an option from a native select control by its value attribute.
    async fn select_option(&self, select_selector: &str, value: &str) -> Result<(), PortalError> {
        let option = self
            .require_element(&format!("{} option[value='{}']", select_selector, value))
            .await?;
        self.click(&option).await
    }

    /// Find a clickable item by its exact visible label.
    async fn find_by_label(&self, label: &str) -> Result<Option<String>, PortalError> {
        let xpath = format!("//*[normalize-space(text())='{}']", label);
        self.find_element("xpath", &xpath).await
    }
}

#[async_trait]
impl PortalSession for PortalClient {
    async fn load_landing_page(&mut self) -> Result<(), PortalError> {
        debug!("Navigating to {}", self.portal_url);
        self.execute(
            Method::POST,
            "/url",
            Some(json!({ "url": self.portal_url })),
        )
        .await?;
        self.wait_for(EMAIL_INPUT, LOGIN_FORM_WAIT, "login form")
            .await?;
        Ok(())
    }

    async fn submit_credentials(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<(), PortalError> {
        let email_field = self.require_element(EMAIL_INPUT).await?;
        self.send_keys(&email_field, email).await?;
        let password_field = self.require_element(PASSWORD_INPUT).await?;
        self.send_keys(&password_field, password).await?;
        let submit = self.require_element(SUBMIT_BUTTON).await?;
        self.click(&submit).await?;

        self.wait_for(LOGIN_MARKER, LOGIN_MARKER_WAIT, "post-login dashboard")
            .await?;
        Ok(())
    }

    async fn enter_booking_frame(&mut self) -> Result<(), PortalError> {
        let frame = self
            .find_element("css selector", BOOKING_FRAME)
            .await?
            .ok_or_else(|| PortalError::Backend("booking frame not present".to_string()))?;
        self.execute(
            Method::POST,
            "/frame",
            Some(json!({ "id": { W3C_ELEMENT_KEY: frame } })),
        )
        .await?;
        Ok(())
    }

    async fn current_date_value(&mut self) -> Result<String, PortalError> {
        let field = self.require_element(DATE_FIELD).await?;
        self.element_property(&field, "value").await
    }

    async fn advance_date(&mut self) -> Result<(), PortalError> {
        let before = self.current_date_value().await?;
        let next = self.require_element(DATE_NEXT_BUTTON).await?;
        self.click(&next).await?;

        // The picker updates asynchronously; wait for the value to move.
        let deadline = Instant::now() + DATE_CHANGE_WAIT;
        loop {
            if self.current_date_value().await? != before {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(PortalError::Timeout("date picker update".to_string()));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn set_time_window(&mut self, start: &str, end: &str) -> Result<(), PortalError> {
        self.select_option(TIME_FROM_SELECT, start).await?;
        self.select_option(TIME_TO_SELECT, end).await
    }

    async fn select_multi(
        &mut self,
        category: FilterCategory,
        values: &[String],
    ) -> Result<Vec<String>, PortalError> {
        if values.is_empty() {
            return Ok(Vec::new());
        }

        let control = self.require_element(category.control_selector()).await?;
        self.click(&control).await?;

        let mut skipped = Vec::new();
        for value in values {
            match self.find_by_label(value).await? {
                Some(item) => self.click(&item).await?,
                None => {
                    warn!("No clickable {} label for '{}'", category.as_str(), value);
                    skipped.push(value.clone());
                }
            }
        }

        // Close the control again so it does not cover the next one.
        self.click(&control).await?;
        Ok(skipped)
    }

    async fn set_capacity(&mut self, band: &str) -> Result<(), PortalError> {
        self.select_option(CAPACITY_SELECT, band).await
    }

    async fn submit_search(&mut self) -> Result<bool, PortalError> {
        let search = self.require_element(SEARCH_BUTTON).await?;
        self.click(&search).await?;

        match self.wait_for(RESULTS_TABLE, RESULTS_WAIT, "results grid").await {
            Ok(_) => Ok(true),
            Err(PortalError::Timeout(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn read_results_grid(&mut self) -> Result<RawGrid, PortalError> {
        let mut room_names = Vec::new();
        for cell in self.find_elements(ROOM_HEADER_CELLS).await? {
            room_names.push(self.element_text(&cell).await?);
        }

        let mut events = Vec::new();
        for cell in self.find_elements(EVENT_CELLS).await? {
            if let Some(title) = self.element_attribute(&cell, "title").await? {
                events.push(title);
            }
        }

        debug!(
            "Read {} room header cells and {} event cells",
            room_names.len(),
            events.len()
        );
        Ok(RawGrid { room_names, events })
    }

    async fn close(&mut self) {
        if let Err(e) = self.execute(Method::DELETE, "", None).await {
            warn!("Failed to close browser session: {}", e);
        } else {
            debug!("Browser session {} closed", self.session_id);
        }
    }
}

/// Factory that opens one fresh [`PortalClient`] per job.
pub struct PortalClientFactory {
    webdriver_url: String,
    portal_url: String,
}

impl PortalClientFactory {
    pub fn new(webdriver_url: &str, portal_url: &str) -> Self {
        Self {
            webdriver_url: webdriver_url.to_string(),
            portal_url: portal_url.to_string(),
        }
    }
}

#[async_trait]
impl SessionFactory for PortalClientFactory {
    async fn create(&self) -> Result<Box<dyn PortalSession>, PortalError> {
        let client = PortalClient::connect(&self.webdriver_url, &self.portal_url).await?;
        Ok(Box::new(client))
    }
}
