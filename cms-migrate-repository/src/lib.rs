//! # CMS Migrate Repository
//! This crate provides the data access layer of the migration. It defines the
//! read-only `LegacySource` over a WordPress MySQL schema and the idempotent
//! `TargetStore` over the CMS PostgreSQL schema, together with their concrete
//! implementations and in-memory mocks for tests.
pub mod errors;
pub mod interfaces;
pub mod mock;
pub mod mysql;
pub mod postgres;

pub use errors::{LegacySourceError, TargetStoreError};
pub use interfaces::{LegacySource, TargetStore};
pub use mock::{MockLegacySource, MockTargetStore};
pub use mysql::MySqlLegacySource;
pub use postgres::PostgresTargetStore;
