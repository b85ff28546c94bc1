//! This module defines and re-exports the interfaces of the migration repository.
mod legacy;
mod target;

pub use legacy::LegacySource;
pub use target::TargetStore;
