//! # CMS Migrate Shared
//! This crate defines the data structures shared across the migration workspace.
//! It includes the legacy WordPress row types read from the source schema and the
//! strongly-typed records written to the CMS schema.
pub mod types;
