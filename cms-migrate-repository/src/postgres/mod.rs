//! PostgreSQL implementation of the target store.
mod tables;
mod target_store;

pub use tables::{CLEAR_ORDER, ContentTables};
pub use target_store::PostgresTargetStore;
