//! Path include/exclude filtering applied to the diff before review.
//!
//! Patterns are gitignore-style, matched with the same engine the
//! repository-aware tools already use for traversal. `exclude` always
//! drops a match; `include`, when non-empty, keeps only matches — so a
//! path must survive both to stay in scope.

use ignore::gitignore::GitignoreBuilder;

use crate::config::PathFiltersConfig;
use crate::models::FileDiff;

/// Filter diffs by the configured include/exclude path patterns.
///
/// An empty `include` list keeps everything not excluded. A path that
/// doesn't match any pattern in a non-empty `include` list is dropped.
pub fn filter_diffs(diffs: Vec<FileDiff>, filters: &PathFiltersConfig) -> Vec<FileDiff> {
    if filters.include.is_empty() && filters.exclude.is_empty() {
        return diffs;
    }

    let exclude = build_matcher(&filters.exclude);
    let include = build_matcher(&filters.include);

    diffs
        .into_iter()
        .filter(|diff| {
            let path = diff.path();
            if let Some(ref m) = exclude {
                if m.matched(path, false).is_ignore() {
                    return false;
                }
            }
            if let Some(ref m) = include {
                return m.matched(path, false).is_ignore();
            }
            true
        })
        .collect()
}

fn build_matcher(patterns: &[String]) -> Option<ignore::gitignore::Gitignore> {
    if patterns.is_empty() {
        return None;
    }
    let mut builder = GitignoreBuilder::new(".");
    for pattern in patterns {
        // A build error here means a malformed pattern; skip it rather
        // than failing the whole review over one bad glob.
        let _ = builder.add_line(None, pattern);
    }
    builder.build().ok()
}
