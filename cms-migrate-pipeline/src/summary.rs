//! Per-phase accounting.
use std::fmt;

use cms_migrate_shared::types::Upserted;

/// The phases of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Users,
    Taxonomy,
    Content,
    Media,
    Comments,
    TermRelationships,
    Menus,
    Settings,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Users => "users",
            Phase::Taxonomy => "taxonomy",
            Phase::Content => "content",
            Phase::Media => "media",
            Phase::Comments => "comments",
            Phase::TermRelationships => "term_relationships",
            Phase::Menus => "menus",
            Phase::Settings => "settings",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts of what a phase did to the target.
///
/// `skipped` covers rows deliberately not migrated (filtered statuses,
/// unresolvable relations); `failed` covers rows whose write or conversion
/// raised an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseSummary {
    pub phase: Phase,
    pub created: u64,
    pub updated: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl PhaseSummary {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            created: 0,
            updated: 0,
            skipped: 0,
            failed: 0,
        }
    }

    pub fn record(&mut self, upserted: Upserted) {
        if upserted.created {
            self.created += 1;
        } else {
            self.updated += 1;
        }
    }

    pub fn created(&mut self) {
        self.created += 1;
    }

    pub fn skip(&mut self) {
        self.skipped += 1;
    }

    pub fn fail(&mut self) {
        self.failed += 1;
    }

    pub fn total(&self) -> u64 {
        self.created + self.updated + self.skipped + self.failed
    }
}

impl fmt::Display for PhaseSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} created, {} updated, {} skipped, {} failed",
            self.phase, self.created, self.updated, self.skipped, self.failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_splits_created_and_updated() {
        let mut summary = PhaseSummary::new(Phase::Users);
        summary.record(Upserted::created(1));
        summary.record(Upserted::updated(1));
        summary.skip();
        summary.fail();

        assert_eq!(summary.created, 1);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.total(), 4);
        assert_eq!(
            summary.to_string(),
            "users: 1 created, 1 updated, 1 skipped, 1 failed"
        );
    }
}
