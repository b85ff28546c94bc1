//! Error types for the migration repository.
//! Consolidates and re-exports the errors of the legacy source and the target store.
mod legacy;
mod target;

pub use legacy::LegacySourceError;
pub use target::TargetStoreError;
