mod media;
mod migration;
mod orchestrator;

pub use media::MediaError;
pub use migration::MigrationError;
pub use orchestrator::OrchestratorError;
