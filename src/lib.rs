pub mod config;
pub mod db;
pub mod doctor;
pub mod environment;
pub mod errors;
pub mod form;
pub mod log;
pub mod normalization;
pub mod routes;
pub mod store;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const REVISION: Option<&str> = option_env!("REGISTRY_REVISION");

pub const BUILD_TIMESTAMP: Option<&str> = option_env!("BUILD_TIMESTAMP");
