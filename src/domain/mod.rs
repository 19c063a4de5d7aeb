pub mod filter;
pub mod models;
pub mod record_date;
