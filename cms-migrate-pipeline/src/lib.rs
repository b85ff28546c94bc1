//! # CMS Migrate Pipeline
//! This crate contains the migration engine: the content sanitizer, the identity
//! resolver, one migrator per entity family, the media pipeline and the
//! orchestrator that runs them in dependency order.
pub mod config;
pub mod dates;
pub mod errors;
pub mod hierarchy;
pub mod media;
pub mod meta;
pub mod migrators;
pub mod orchestrator;
pub mod php_serialized;
pub mod resolver;
pub mod sanitizer;
pub mod summary;

pub use config::{MediaConfig, NamedSize, OutputFormat, PipelineConfig, RoleMapping};
pub use errors::{MediaError, MigrationError, OrchestratorError};
pub use orchestrator::{Orchestrator, RunReport};
pub use resolver::{EntityFamily, IdentityResolver};
pub use sanitizer::Sanitizer;
pub use summary::{Phase, PhaseSummary};
