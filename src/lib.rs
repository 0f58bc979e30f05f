//! Terminal tracker for Ethereum address balances and transaction counts

pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod infrastructure;
pub mod modules;
pub mod store;
pub mod ui;
