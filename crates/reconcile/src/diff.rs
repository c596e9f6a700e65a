//! Diff computation between artifact snapshots

use catalog::ArtifactSet;
use serde::Serialize;

/// Computes which artifacts an update must associate.
///
/// Updates only ever grow the association: when the current set is not
/// strictly larger than the previous one nothing is added, even if
/// individual members changed. Removed members stay associated until the
/// resource is deleted.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffEngine;

impl DiffEngine {
    /// Artifacts to associate when moving from `previous` to `current`
    pub fn additions(previous: &ArtifactSet, current: &ArtifactSet) -> ArtifactSet {
        Self::compare(previous, current).additions
    }

    /// Full comparison, including what the growth gate leaves behind
    pub fn compare(previous: &ArtifactSet, current: &ArtifactSet) -> ArtifactDiff {
        let new_members = current.difference(previous);
        let dangling = previous.difference(current);

        if current.len() > previous.len() {
            ArtifactDiff {
                additions: new_members,
                ignored_additions: ArtifactSet::new(),
                dangling,
            }
        } else {
            ArtifactDiff {
                additions: ArtifactSet::new(),
                ignored_additions: new_members,
                dangling,
            }
        }
    }
}

/// Result of [`DiffEngine::compare`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArtifactDiff {
    /// Artifacts to associate
    pub additions: ArtifactSet,
    /// New members dropped because the set did not grow
    pub ignored_additions: ArtifactSet,
    /// Members no longer declared that remain associated
    pub dangling: ArtifactSet,
}

impl ArtifactDiff {
    /// Whether the update leaves the catalog out of step with the declaration
    pub fn has_gap(&self) -> bool {
        !self.ignored_additions.is_empty() || !self.dangling.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(raw: &str) -> ArtifactSet {
        ArtifactSet::from_delimited(raw, '|')
    }

    #[test]
    fn test_growth_adds_new_members() {
        let additions = DiffEngine::additions(&set("v1"), &set("v1|v2"));
        assert_eq!(additions, set("v2"));
    }

    #[test]
    fn test_shrink_adds_nothing() {
        let diff = DiffEngine::compare(&set("v1|v2"), &set("v1"));
        assert!(diff.additions.is_empty());
        assert_eq!(diff.dangling, set("v2"));
        assert!(diff.has_gap());
    }

    #[test]
    fn test_same_size_swap_adds_nothing() {
        let diff = DiffEngine::compare(&set("v1|v2"), &set("v1|v3"));
        assert!(diff.additions.is_empty());
        assert_eq!(diff.ignored_additions, set("v3"));
        assert_eq!(diff.dangling, set("v2"));
    }

    #[test]
    fn test_identical_sets() {
        let diff = DiffEngine::compare(&set("v1|v2"), &set("v2|v1"));
        assert_eq!(diff, ArtifactDiff::default());
        assert!(!diff.has_gap());
    }

    #[test]
    fn test_growth_with_replacement() {
        let diff = DiffEngine::compare(&set("v1|v2"), &set("v1|v3|v4"));
        assert_eq!(diff.additions, set("v3|v4"));
        assert_eq!(diff.dangling, set("v2"));
    }

    #[test]
    fn test_from_empty() {
        assert_eq!(DiffEngine::additions(&set(""), &set("v1|v2")), set("v1|v2"));
        assert!(DiffEngine::additions(&set(""), &set("")).is_empty());
    }

    #[test]
    fn test_additions_never_in_previous() {
        let cases = [
            ("v1", "v1|v2|v3"),
            ("v1|v2", "v3|v4|v5"),
            ("a|b|c", "c|d|e|f"),
        ];
        for (prev, cur) in cases {
            let previous = set(prev);
            let current = set(cur);
            let additions = DiffEngine::additions(&previous, &current);
            assert!(additions.iter().all(|a| current.contains(a)));
            assert!(additions.iter().all(|a| !previous.contains(a)));
        }
    }
}
