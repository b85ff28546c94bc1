//! Cycle guard for self-referential parent links.
use std::collections::HashMap;

use cms_migrate_shared::types::TargetId;

/// Parent links accepted so far for one hierarchy.
///
/// Links are added one at a time; a link that points a node at itself or at
/// one of its own descendants is refused, so the accepted set is always a
/// forest.
#[derive(Debug, Default)]
pub struct ParentLinks {
    parents: HashMap<TargetId, TargetId>,
}

impl ParentLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts `child → parent` unless it would close a cycle.
    ///
    /// # Returns
    ///
    /// `true` when the link was accepted.
    pub fn link(&mut self, child: TargetId, parent: TargetId) -> bool {
        if self.is_ancestor_or_self(child, parent) {
            return false;
        }
        self.parents.insert(child, parent);
        true
    }

    fn is_ancestor_or_self(&self, candidate: TargetId, mut node: TargetId) -> bool {
        // Walk is bounded by the number of accepted links.
        for _ in 0..=self.parents.len() {
            if node == candidate {
                return true;
            }
            match self.parents.get(&node) {
                Some(parent) => node = *parent,
                None => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_link_is_refused() {
        let mut links = ParentLinks::new();
        assert!(!links.link(1, 1));
    }

    #[test]
    fn test_cycle_is_refused() {
        let mut links = ParentLinks::new();
        assert!(links.link(2, 1));
        assert!(links.link(3, 2));
        assert!(!links.link(1, 3));
        assert!(links.link(4, 1));
    }
}
