//! Inheritable folder access attributes and nearest-ancestor resolution.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Value reserved in the years/semesters sets as the "match any legal value"
/// wildcard. When both sets hold *only* this value the folder is hidden from
/// everyone instead.
pub const WILDCARD: u8 = 0;

/// The inheritable access attributes of a folder.
///
/// An empty set means "not declared here" during inheritance resolution and
/// "deny everyone" once resolution is final (fail-closed). `BTreeSet` keeps
/// serialization and iteration deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessMetadata {
    #[serde(default)]
    pub departments: BTreeSet<String>,
    /// Academic years, legal range 1..=4 plus the `0` sentinel.
    #[serde(default)]
    pub years: BTreeSet<u8>,
    /// Semesters, legal range 1..=8 plus the `0` sentinel.
    #[serde(default)]
    pub semesters: BTreeSet<u8>,
    /// Free-form descriptive tags; not consulted by the access decision.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Fine-grained gating tags matched against a principal's tags.
    #[serde(default)]
    pub access_tags: BTreeSet<String>,
}

impl AccessMetadata {
    /// True if no attribute field is declared.
    pub fn is_empty(&self) -> bool {
        self.departments.is_empty()
            && self.years.is_empty()
            && self.semesters.is_empty()
            && self.tags.is_empty()
            && self.access_tags.is_empty()
    }
}

/// Resolve a node's effective attributes from its own declarations and its
/// parent's already-resolved attributes.
///
/// Per field: a non-empty own value wins verbatim, otherwise the parent's
/// resolved value is inherited. The root's "parent" is
/// `AccessMetadata::default()`. This runs once, at sync time, against the
/// freshly fetched candidate tree, so a reparented node inherits from its new
/// parent rather than the stale persisted chain.
pub fn resolve_metadata(own: &AccessMetadata, parent: &AccessMetadata) -> AccessMetadata {
    fn pick<T: Clone + Ord>(own: &BTreeSet<T>, parent: &BTreeSet<T>) -> BTreeSet<T> {
        if own.is_empty() {
            parent.clone()
        } else {
            own.clone()
        }
    }

    AccessMetadata {
        departments: pick(&own.departments, &parent.departments),
        years: pick(&own.years, &parent.years),
        semesters: pick(&own.semesters, &parent.semesters),
        tags: pick(&own.tags, &parent.tags),
        access_tags: pick(&own.access_tags, &parent.access_tags),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(departments: &[&str], years: &[u8], semesters: &[u8]) -> AccessMetadata {
        AccessMetadata {
            departments: departments.iter().map(|d| d.to_string()).collect(),
            years: years.iter().copied().collect(),
            semesters: semesters.iter().copied().collect(),
            ..Default::default()
        }
    }

    #[test]
    fn own_values_win_over_parent() {
        let parent = meta(&["CSE"], &[1], &[1, 2]);
        let own = meta(&["ECE"], &[], &[]);
        let resolved = resolve_metadata(&own, &parent);
        assert_eq!(resolved.departments, meta(&["ECE"], &[], &[]).departments);
        assert_eq!(resolved.years, parent.years);
        assert_eq!(resolved.semesters, parent.semesters);
    }

    #[test]
    fn root_inherits_nothing() {
        let own = meta(&["CSE"], &[], &[]);
        let resolved = resolve_metadata(&own, &AccessMetadata::default());
        assert!(!resolved.departments.is_empty());
        assert!(resolved.years.is_empty());
        assert!(resolved.semesters.is_empty());
    }

    #[test]
    fn resolved_field_nonempty_iff_declared_somewhere_in_chain() {
        // Three-level chain: only the grandparent declares departments.
        let grandparent = resolve_metadata(&meta(&["CSE"], &[], &[]), &AccessMetadata::default());
        let parent = resolve_metadata(&AccessMetadata::default(), &grandparent);
        let leaf = resolve_metadata(&AccessMetadata::default(), &parent);
        assert_eq!(leaf.departments, grandparent.departments);
        assert!(leaf.years.is_empty());
    }

    #[test]
    fn access_tags_inherit_like_other_fields() {
        let mut parent = AccessMetadata::default();
        parent.access_tags.insert("placement-cell".to_string());
        let resolved = resolve_metadata(&AccessMetadata::default(), &parent);
        assert!(resolved.access_tags.contains("placement-cell"));
    }
}
