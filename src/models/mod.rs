pub mod credentials;
pub mod request;
pub mod schedule;

#[cfg(test)]
mod schedule_test;
