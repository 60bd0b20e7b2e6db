pub mod records;
pub mod store;
