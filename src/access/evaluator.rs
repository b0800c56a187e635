//! The per-principal access decision.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::metadata::{AccessMetadata, WILDCARD};

pub const MIN_YEAR: u8 = 1;
pub const MAX_YEAR: u8 = 4;
pub const MIN_SEMESTER: u8 = 1;
pub const MAX_SEMESTER: u8 = 8;

/// A requesting user's attributes, supplied per request and never persisted
/// by this subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub department: String,
    pub year: u8,
    pub semester: u8,
    #[serde(default)]
    pub access_tags: BTreeSet<String>,
}

/// Pure decision function mapping (resolved metadata, principal) to
/// allow/deny.
#[derive(Debug, Default, Clone, Copy)]
pub struct AccessEvaluator;

impl AccessEvaluator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Decide whether `principal` may see a folder carrying `metadata`.
    ///
    /// Checks run in order and short-circuit, fail-closed:
    /// 1. the principal's year and semester must be in legal range;
    /// 2. undeclared departments/years/semesters deny (never "allow all");
    /// 3. `years == {0}` together with `semesters == {0}` is the explicit
    ///    hidden-from-everyone sentinel;
    /// 4. department membership, case-insensitive;
    /// 5. `0` in a larger years set is a wildcard over 1..=4;
    /// 6. same for semesters over 1..=8;
    /// 7. when both the folder and the principal declare access tags, the
    ///    intersection must be non-empty. A tagged folder does not block a
    ///    principal holding no tags at all.
    ///
    /// Deterministic for identical inputs; never fails for malformed
    /// metadata.
    #[must_use]
    pub fn allow(&self, metadata: &AccessMetadata, principal: &Principal) -> bool {
        if !(MIN_YEAR..=MAX_YEAR).contains(&principal.year)
            || !(MIN_SEMESTER..=MAX_SEMESTER).contains(&principal.semester)
        {
            return false;
        }

        if metadata.departments.is_empty()
            || metadata.years.is_empty()
            || metadata.semesters.is_empty()
        {
            return false;
        }

        if is_sentinel_only(&metadata.years) && is_sentinel_only(&metadata.semesters) {
            return false;
        }

        let department_matches = metadata
            .departments
            .iter()
            .any(|d| d.eq_ignore_ascii_case(&principal.department));
        if !department_matches {
            return false;
        }

        if !metadata.years.contains(&WILDCARD) && !metadata.years.contains(&principal.year) {
            return false;
        }

        if !metadata.semesters.contains(&WILDCARD)
            && !metadata.semesters.contains(&principal.semester)
        {
            return false;
        }

        if !metadata.access_tags.is_empty() && !principal.access_tags.is_empty() {
            let intersects = metadata
                .access_tags
                .iter()
                .any(|tag| principal.access_tags.contains(tag));
            if !intersects {
                return false;
            }
        }

        true
    }
}

fn is_sentinel_only(set: &BTreeSet<u8>) -> bool {
    set.len() == 1 && set.contains(&WILDCARD)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(department: &str, year: u8, semester: u8) -> Principal {
        Principal {
            id: "u-1".to_string(),
            department: department.to_string(),
            year,
            semester,
            access_tags: BTreeSet::new(),
        }
    }

    fn meta(departments: &[&str], years: &[u8], semesters: &[u8]) -> AccessMetadata {
        AccessMetadata {
            departments: departments.iter().map(|d| d.to_string()).collect(),
            years: years.iter().copied().collect(),
            semesters: semesters.iter().copied().collect(),
            ..Default::default()
        }
    }

    #[test]
    fn year_wildcard_passes_any_legal_year() {
        // Scenario A
        let evaluator = AccessEvaluator::new();
        let metadata = meta(&["CSE"], &[0], &[3, 4]);
        assert!(evaluator.allow(&metadata, &principal("CSE", 2, 3)));
    }

    #[test]
    fn department_mismatch_denies() {
        // Scenario B
        let evaluator = AccessEvaluator::new();
        let metadata = meta(&["ECE"], &[2], &[3]);
        assert!(!evaluator.allow(&metadata, &principal("CSE", 2, 3)));
    }

    #[test]
    fn sole_sentinel_hides_from_everyone() {
        // Scenario C
        let evaluator = AccessEvaluator::new();
        let metadata = meta(&["CSE"], &[0], &[0]);
        for year in 1..=4 {
            for semester in 1..=8 {
                assert!(!evaluator.allow(&metadata, &principal("CSE", year, semester)));
            }
        }
    }

    #[test]
    fn undeclared_years_deny_despite_department_match() {
        // Scenario E
        let evaluator = AccessEvaluator::new();
        let metadata = meta(&["CSE"], &[], &[1]);
        assert!(!evaluator.allow(&metadata, &principal("CSE", 1, 1)));
    }

    #[test]
    fn empty_metadata_denies() {
        let evaluator = AccessEvaluator::new();
        assert!(!evaluator.allow(&AccessMetadata::default(), &principal("CSE", 1, 1)));
    }

    #[test]
    fn department_match_is_case_insensitive() {
        let evaluator = AccessEvaluator::new();
        let metadata = meta(&["cse"], &[1], &[1]);
        assert!(evaluator.allow(&metadata, &principal("CSE", 1, 1)));
    }

    #[test]
    fn out_of_range_principal_is_rejected() {
        let evaluator = AccessEvaluator::new();
        let metadata = meta(&["CSE"], &[0], &[0, 1]);
        assert!(!evaluator.allow(&metadata, &principal("CSE", 5, 1)));
        assert!(!evaluator.allow(&metadata, &principal("CSE", 1, 9)));
        assert!(!evaluator.allow(&metadata, &principal("CSE", 0, 1)));
    }

    #[test]
    fn semester_wildcard_in_larger_set_passes() {
        let evaluator = AccessEvaluator::new();
        let metadata = meta(&["CSE"], &[1], &[0, 5]);
        assert!(evaluator.allow(&metadata, &principal("CSE", 1, 2)));
    }

    #[test]
    fn tag_intersection_required_when_both_sides_tagged() {
        let evaluator = AccessEvaluator::new();
        let mut metadata = meta(&["CSE"], &[1], &[1]);
        metadata.access_tags.insert("placement-cell".to_string());

        let mut tagged = principal("CSE", 1, 1);
        tagged.access_tags.insert("sports".to_string());
        assert!(!evaluator.allow(&metadata, &tagged));

        tagged.access_tags.insert("placement-cell".to_string());
        assert!(evaluator.allow(&metadata, &tagged));
    }

    #[test]
    fn tagged_folder_does_not_block_untagged_principal() {
        let evaluator = AccessEvaluator::new();
        let mut metadata = meta(&["CSE"], &[1], &[1]);
        metadata.access_tags.insert("placement-cell".to_string());
        assert!(evaluator.allow(&metadata, &principal("CSE", 1, 1)));
    }

    #[test]
    fn decision_is_deterministic() {
        let evaluator = AccessEvaluator::new();
        let metadata = meta(&["CSE"], &[0], &[3, 4]);
        let p = principal("CSE", 2, 3);
        let first = evaluator.allow(&metadata, &p);
        for _ in 0..100 {
            assert_eq!(evaluator.allow(&metadata, &p), first);
        }
    }
}
