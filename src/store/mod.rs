pub mod daily_store;
pub mod error;
pub mod raw_store;
