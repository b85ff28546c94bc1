//! MySQL implementation of the legacy source.
mod legacy_reader;

pub use legacy_reader::MySqlLegacySource;
