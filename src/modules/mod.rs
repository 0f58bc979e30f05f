//! Feature modules driven from the app
//!
//! - export: CSV export of the tracked table

pub mod export;
