pub mod api;
pub mod test;
