//! Rename tracking and ambiguous-rename detection.
//!
//! Built once from a frozen list of [`FileDiff`]s. If two distinct new
//! paths share the same old path, both new paths and the old path are
//! marked ambiguous; no heuristic ever picks a winner between them.

use std::collections::{HashMap, HashSet};

use crate::diff::canonical::{canonicalize, CanonicalPath};
use crate::models::FileDiff;

/// Old→new path mapping for renames in a single diff, with ambiguous
/// old-paths tracked separately so callers never silently remap through
/// one.
#[derive(Debug, Clone, Default)]
pub struct RenameMap {
    /// old path -> new path, present only for unambiguous renames.
    unambiguous: HashMap<CanonicalPath, CanonicalPath>,
    /// old and new paths that participate in an ambiguous rename.
    ambiguous: HashSet<CanonicalPath>,
}

impl RenameMap {
    /// Build a `RenameMap` from a diff's files, detecting ambiguous
    /// renames (same old path producing more than one distinct new path).
    pub fn build(diffs: &[FileDiff]) -> Self {
        let mut by_old: HashMap<CanonicalPath, HashSet<CanonicalPath>> = HashMap::new();

        for d in diffs {
            if !d.is_rename {
                continue;
            }
            let old = canonicalize(&d.old_path);
            let new = canonicalize(&d.new_path);
            by_old.entry(old).or_default().insert(new);
        }

        let mut unambiguous = HashMap::new();
        let mut ambiguous = HashSet::new();

        for (old, news) in by_old {
            if news.len() > 1 {
                ambiguous.insert(old.clone());
                for new in news {
                    ambiguous.insert(new);
                }
            } else if let Some(new) = news.into_iter().next() {
                unambiguous.insert(old, new);
            }
        }

        Self {
            unambiguous,
            ambiguous,
        }
    }

    /// Whether `path` (old or new side) participates in an ambiguous
    /// rename in this diff.
    pub fn is_ambiguous(&self, path: &CanonicalPath) -> bool {
        self.ambiguous.contains(path)
    }

    /// Remap an old path to its new path. Identity unless `path` is an
    /// unambiguous old-path; never remaps an ambiguous path.
    pub fn remap<'a>(&'a self, path: &'a CanonicalPath) -> &'a CanonicalPath {
        if self.ambiguous.contains(path) {
            return path;
        }
        self.unambiguous.get(path).unwrap_or(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::diff::FileDiff as _FileDiff;

    fn rename_diff(old: &str, new: &str) -> FileDiff {
        _FileDiff {
            old_path: old.to_string(),
            new_path: new.to_string(),
            is_new: false,
            is_deleted: false,
            is_rename: true,
            is_binary: false,
            hunks: vec![],
        }
    }

    #[test]
    fn unambiguous_rename_remaps() {
        let diffs = vec![rename_diff("old.rs", "new.rs")];
        let map = RenameMap::build(&diffs);
        let old = canonicalize("old.rs");
        assert!(!map.is_ambiguous(&old));
        assert_eq!(map.remap(&old).as_str(), "new.rs");
    }

    #[test]
    fn ambiguous_rename_marks_both_new_paths_and_old_path() {
        let diffs = vec![
            rename_diff("shared.ts", "a.ts"),
            rename_diff("shared.ts", "b.ts"),
        ];
        let map = RenameMap::build(&diffs);
        let old = canonicalize("shared.ts");
        let a = canonicalize("a.ts");
        let b = canonicalize("b.ts");
        assert!(map.is_ambiguous(&old));
        assert!(map.is_ambiguous(&a));
        assert!(map.is_ambiguous(&b));
        // Never picks a winner.
        assert_eq!(map.remap(&old), &old);
    }

    #[test]
    fn non_rename_diffs_are_ignored() {
        let diffs = vec![_FileDiff {
            old_path: "x.rs".into(),
            new_path: "x.rs".into(),
            is_new: false,
            is_deleted: false,
            is_rename: false,
            is_binary: false,
            hunks: vec![],
        }];
        let map = RenameMap::build(&diffs);
        assert!(map.unambiguous.is_empty());
        assert!(map.ambiguous.is_empty());
    }

    #[test]
    fn identical_rename_to_same_new_path_twice_stays_unambiguous() {
        // Two hunks of the same logical rename (shouldn't normally happen,
        // but the set-based construction must not treat it as ambiguous).
        let diffs = vec![
            rename_diff("old.rs", "new.rs"),
            rename_diff("old.rs", "new.rs"),
        ];
        let map = RenameMap::build(&diffs);
        let old = canonicalize("old.rs");
        assert!(!map.is_ambiguous(&old));
        assert_eq!(map.remap(&old).as_str(), "new.rs");
    }
}
