//! Facility Booking System Availability Service
//!
//! This library drives a university facility-booking portal through a
//! WebDriver-backed browser session, scrapes the availability calendar for a
//! chosen date, window and set of filters, and reconstructs per-room
//! schedules with the portal's unrendered free slots filled back in. A small
//! web service fronts the scraper with an asynchronous task API, and a
//! transport-agnostic chat adapter offers the same flow conversationally.
//!
//! # Modules
//!
//! - `driver`: WebDriver wire client and the portal session abstraction
//! - `services::scraper`: the page-by-page scrape orchestration
//! - `services::availability`: calendar grid parsing and gap filling
//! - `services::jobs`: background job dispatch and polling
//! - `services::store`: credential persistence
//! - `handlers` / `routes`: the HTTP surface

pub mod driver;
pub mod driver_mock;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;


// Re-export the main types for ease of use
pub use driver::{PortalClient, PortalClientFactory, PortalSession, SessionFactory};
pub use error::ScrapeError;
pub use handlers::api::AppState;
pub use routes::create_router;
