//! # CMS Migrate
//!
//! One-shot migration of a WordPress site into the CMS schema.
//!
//! ## Modules
//!
//! - [`config`]: Environment configuration and dependency wiring
//! - [`errors`]: Error types for the binary

pub mod config;
pub mod errors;

pub use config::{AppConfig, Dependencies};
pub use errors::{ConfigError, MigrateError};
