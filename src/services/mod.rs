pub mod availability;
pub mod catalog;
pub mod chat;
pub mod jobs;
pub mod scraper;
pub mod store;

#[cfg(test)]
mod catalog_test;
#[cfg(test)]
mod scraper_test;
#[cfg(test)]
mod store_test;
