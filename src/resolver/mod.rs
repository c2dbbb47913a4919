//! Line resolver: validates and normalizes agent-reported `(file, line)`
//! locations against the frozen diff they were reported against.
//!
//! Built once per run from the canonicalized `FileDiff` list (see
//! `diff::canonical`, `diff::rename`) and treated as read-only afterward,
//! matching the teacher's "build once, pass by reference" style used for
//! `ReviewContext`.
//!
//! A [`Finding`]'s `line` field has no sentinel-free "undefined" state
//! (it is `u32`, not `Option<u32>`) to avoid reshaping the ~30 existing
//! `Finding { .. }` literals across the tree; `line == 0` is used as the
//! file-level/undefined marker, matching the wire encoding the spec
//! already assigns to `DedupeKey` (`line = 0` denotes file-level).

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::diff::canonical::{canonicalize, CanonicalPath};
use crate::diff::rename::RenameMap;
use crate::models::diff::DiffLineType;
use crate::models::finding::Finding;
use crate::models::FileDiff;

/// Maximum rename-chain hops followed before giving up (defends against
/// pathological or malformed diffs; real diffs never chain renames).
const MAX_REMAP_HOPS: u8 = 8;

/// The set of addressable lines for a single file in the new revision.
#[derive(Debug, Clone, Default)]
pub struct FileLineMap {
    pub all_lines: BTreeSet<u32>,
    pub added_lines: BTreeSet<u32>,
    pub context_lines: BTreeSet<u32>,
}

impl FileLineMap {
    fn from_diff(diff: &FileDiff) -> Self {
        let mut all_lines = BTreeSet::new();
        let mut added_lines = BTreeSet::new();
        let mut context_lines = BTreeSet::new();

        for hunk in &diff.hunks {
            for line in &hunk.lines {
                match line.line_type {
                    DiffLineType::Added => {
                        if let Some(n) = line.new_line_no {
                            added_lines.insert(n);
                            all_lines.insert(n);
                        }
                    }
                    DiffLineType::Context => {
                        if let Some(n) = line.new_line_no {
                            context_lines.insert(n);
                            all_lines.insert(n);
                        }
                    }
                    DiffLineType::Removed => {}
                }
            }
        }

        Self {
            all_lines,
            added_lines,
            context_lines,
        }
    }
}

/// Options controlling a single [`LineResolver::validate_line`] call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateOptions {
    /// Reject context lines; only added lines are considered valid.
    pub additions_only: bool,
    /// On an out-of-context line, compute the nearest valid line.
    pub suggest_nearest: bool,
}

/// The outcome of validating a single `(path, line)` pair.
#[derive(Debug, Clone)]
pub struct ValidateOutcome {
    pub valid: bool,
    pub line: Option<u32>,
    pub is_addition: Option<bool>,
    pub reason: Option<&'static str>,
    pub nearest_valid_line: Option<u32>,
    /// The path the outcome is addressed against — equal to the input
    /// path unless an unambiguous rename remap succeeded.
    pub file: CanonicalPath,
}

impl ValidateOutcome {
    fn file_level(file: CanonicalPath) -> Self {
        Self {
            valid: true,
            line: None,
            is_addition: None,
            reason: None,
            nearest_valid_line: None,
            file,
        }
    }

    fn invalid(file: CanonicalPath, reason: &'static str) -> Self {
        Self {
            valid: false,
            line: None,
            is_addition: None,
            reason: Some(reason),
            nearest_valid_line: None,
            file,
        }
    }
}

/// Validates and remaps findings against a single frozen diff.
pub struct LineResolver {
    files: HashMap<CanonicalPath, FileLineMap>,
    deleted: HashSet<CanonicalPath>,
    renames: RenameMap,
}

impl LineResolver {
    /// Build a resolver from the diff files of a single review run.
    pub fn build(diffs: &[FileDiff]) -> Self {
        let mut files = HashMap::new();
        let mut deleted = HashSet::new();

        for diff in diffs {
            if diff.is_binary {
                continue;
            }
            if diff.is_deleted {
                deleted.insert(canonicalize(&diff.old_path));
                continue;
            }
            let path = canonicalize(&diff.new_path);
            files.insert(path, FileLineMap::from_diff(diff));
        }

        Self {
            files,
            deleted,
            renames: RenameMap::build(diffs),
        }
    }

    /// Whether the resolver's diff contains this (already-canonical) path.
    pub fn has_file(&self, path: &CanonicalPath) -> bool {
        self.files.contains_key(path)
    }

    /// Whether `path` participates in an ambiguous rename in this diff.
    pub fn is_ambiguous_rename(&self, path: &CanonicalPath) -> bool {
        self.renames.is_ambiguous(path)
    }

    /// Identity unless `path` is an unambiguous rename's old path.
    pub fn remap_path<'a>(&'a self, path: &'a CanonicalPath) -> &'a CanonicalPath {
        self.renames.remap(path)
    }

    /// Human-readable summary of a file's addressable lines, for error
    /// messages and drift reports.
    pub fn get_file_summary(&self, path: &CanonicalPath) -> String {
        match self.files.get(path) {
            Some(map) => format!(
                "{} ({} addressable line{}, {} added)",
                path,
                map.all_lines.len(),
                if map.all_lines.len() == 1 { "" } else { "s" },
                map.added_lines.len(),
            ),
            None if self.deleted.contains(path) => format!("{path} (deleted)"),
            None => format!("{path} (not in diff)"),
        }
    }

    /// Validate a single `(path, line)` pair per the 8-step precedence.
    pub fn validate_line(
        &self,
        path: &CanonicalPath,
        line: Option<u32>,
        opts: ValidateOptions,
    ) -> ValidateOutcome {
        // Step 1: undefined line is always a valid file-level finding.
        let Some(l) = line else {
            return ValidateOutcome::file_level(path.clone());
        };
        // Step 2: non-positive line numbers are always invalid.
        if l == 0 {
            return ValidateOutcome::invalid(path.clone(), "must be positive");
        }
        self.validate_at(path, l, opts, 0)
    }

    fn validate_at(
        &self,
        path: &CanonicalPath,
        line: u32,
        opts: ValidateOptions,
        hops: u8,
    ) -> ValidateOutcome {
        if let Some(map) = self.files.get(path) {
            // Step 6
            if !map.all_lines.contains(&line) {
                let nearest = if opts.suggest_nearest {
                    nearest_line(&map.all_lines, line)
                } else {
                    None
                };
                return ValidateOutcome {
                    valid: false,
                    line: None,
                    is_addition: None,
                    reason: Some("not in the diff context"),
                    nearest_valid_line: nearest,
                    file: path.clone(),
                };
            }
            // Step 7
            if opts.additions_only && map.context_lines.contains(&line) {
                return ValidateOutcome::invalid(path.clone(), "not an added line");
            }
            // Step 8
            return ValidateOutcome {
                valid: true,
                line: Some(line),
                is_addition: Some(map.added_lines.contains(&line)),
                reason: None,
                nearest_valid_line: None,
                file: path.clone(),
            };
        }

        // Step 3: not in resolver — deleted file downgrade.
        if self.deleted.contains(path) {
            return ValidateOutcome::invalid(path.clone(), "deleted-file");
        }
        // Step 4: ambiguous rename — never pick a winner.
        if self.renames.is_ambiguous(path) {
            return ValidateOutcome::invalid(path.clone(), "ambiguous-rename");
        }
        // Step 5: unambiguous rename — remap and re-validate.
        let remapped = self.renames.remap(path);
        if remapped != path && hops < MAX_REMAP_HOPS {
            return self.validate_at(remapped, line, opts, hops + 1);
        }

        ValidateOutcome::invalid(path.clone(), "not found in diff")
    }

    /// Normalize a batch of findings against this diff, producing the
    /// retained findings, aggregate stats, and a bounded sample of
    /// invalid details.
    pub fn normalize_findings_for_diff(
        &self,
        findings: Vec<Finding>,
        opts: NormalizeOptions,
    ) -> (Vec<Finding>, NormalizeStats, Vec<InvalidDetail>) {
        let mut stats = NormalizeStats::default();
        let mut kept = Vec::with_capacity(findings.len());
        let mut invalid_details = Vec::new();

        for mut finding in findings {
            stats.total += 1;
            let original = canonicalize(&finding.file);
            let line = if finding.line == 0 {
                None
            } else {
                Some(finding.line)
            };
            let outcome = self.validate_line(
                &original,
                line,
                ValidateOptions {
                    additions_only: false,
                    suggest_nearest: opts.auto_fix,
                },
            );

            match outcome.reason {
                None => {
                    stats.valid += 1;
                    if outcome.file != original {
                        stats.remapped_paths += 1;
                    }
                    finding.file = outcome.file.into_string();
                    finding.line = outcome.line.unwrap_or(0);
                    kept.push(finding);
                }
                Some("deleted-file") => {
                    stats.downgraded += 1;
                    stats.deleted_files += 1;
                    record_invalid(&mut invalid_details, &finding, "deleted-file");
                    finding.line = 0;
                    kept.push(finding);
                }
                Some("ambiguous-rename") => {
                    stats.downgraded += 1;
                    stats.ambiguous_renames += 1;
                    record_invalid(&mut invalid_details, &finding, "ambiguous-rename");
                    finding.line = 0;
                    kept.push(finding);
                }
                Some("not in the diff context") => {
                    if opts.auto_fix {
                        if let Some(nearest) = outcome.nearest_valid_line {
                            stats.normalized += 1;
                            finding.line = nearest;
                            kept.push(finding);
                            continue;
                        }
                    }
                    stats.dropped += 1;
                    record_invalid(&mut invalid_details, &finding, "not in the diff context");
                }
                Some(reason) => {
                    stats.dropped += 1;
                    record_invalid(&mut invalid_details, &finding, reason);
                }
            }
        }

        (kept, stats, invalid_details)
    }
}

/// Up to how many invalid-finding samples [`DriftSignal::compute`] (and
/// `normalize_findings_for_diff`'s caller) should keep for diagnostics.
const INVALID_DETAIL_SAMPLE: usize = 5;

fn record_invalid(details: &mut Vec<InvalidDetail>, finding: &Finding, reason: &'static str) {
    if details.len() < INVALID_DETAIL_SAMPLE {
        details.push(InvalidDetail {
            file: finding.file.clone(),
            line: if finding.line == 0 {
                None
            } else {
                Some(finding.line)
            },
            reason: reason.to_string(),
        });
    }
}

/// Find the numerically closest line in `lines` to `target`, ties
/// breaking to the smaller line number.
fn nearest_line(lines: &BTreeSet<u32>, target: u32) -> Option<u32> {
    let above = lines.range(target..).next().copied();
    let below = lines.range(..target).next_back().copied();

    match (above, below) {
        (Some(a), Some(b)) => {
            let da = a.abs_diff(target);
            let db = b.abs_diff(target);
            if db <= da { Some(b) } else { Some(a) }
        }
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

/// Options for [`LineResolver::normalize_findings_for_diff`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeOptions {
    /// Snap out-of-context lines to the nearest valid line instead of
    /// dropping the finding.
    pub auto_fix: bool,
}

/// Aggregate outcome counts from a single normalization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub total: usize,
    pub valid: usize,
    pub normalized: usize,
    pub downgraded: usize,
    pub dropped: usize,
    pub deleted_files: usize,
    pub ambiguous_renames: usize,
    pub remapped_paths: usize,
}

/// A single invalid-finding sample kept for diagnostics.
#[derive(Debug, Clone)]
pub struct InvalidDetail {
    pub file: String,
    pub line: Option<u32>,
    pub reason: String,
}

/// Overall health level of a normalization pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftLevel {
    Ok,
    Warn,
    Fail,
}

/// Derived drift metrics summarizing how much of a pass's findings were
/// downgraded, dropped, or auto-fixed.
#[derive(Debug, Clone)]
pub struct DriftSignal {
    pub degradation_percent: f64,
    pub auto_fix_percent: f64,
    pub level: DriftLevel,
    pub sample: Vec<InvalidDetail>,
}

impl DriftSignal {
    /// Compute drift metrics from normalization stats, with configurable
    /// warn/fail thresholds (spec defaults: warn=20, fail=50).
    pub fn compute(
        stats: &NormalizeStats,
        sample: Vec<InvalidDetail>,
        warn_threshold: f64,
        fail_threshold: f64,
    ) -> Self {
        if stats.total == 0 {
            return Self {
                degradation_percent: 0.0,
                auto_fix_percent: 0.0,
                level: DriftLevel::Ok,
                sample,
            };
        }

        let total = stats.total as f64;
        let degradation_percent = (stats.downgraded + stats.dropped) as f64 / total * 100.0;
        let auto_fix_percent = stats.normalized as f64 / total * 100.0;

        let level = if degradation_percent >= fail_threshold {
            DriftLevel::Fail
        } else if degradation_percent >= warn_threshold {
            DriftLevel::Warn
        } else {
            DriftLevel::Ok
        };

        let bounded_sample = sample.into_iter().take(INVALID_DETAIL_SAMPLE).collect();

        Self {
            degradation_percent,
            auto_fix_percent,
            level,
            sample: bounded_sample,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::diff::{DiffLine, Hunk};
    use crate::models::finding::Severity;

    fn added_line(new_no: u32) -> DiffLine {
        DiffLine {
            line_type: DiffLineType::Added,
            content: String::new(),
            old_line_no: None,
            new_line_no: Some(new_no),
        }
    }

    fn context_line(old_no: u32, new_no: u32) -> DiffLine {
        DiffLine {
            line_type: DiffLineType::Context,
            content: String::new(),
            old_line_no: Some(old_no),
            new_line_no: Some(new_no),
        }
    }

    fn modified_diff(path: &str, lines: Vec<DiffLine>, new_start: u32) -> FileDiff {
        FileDiff {
            old_path: path.to_string(),
            new_path: path.to_string(),
            is_new: false,
            is_deleted: false,
            is_rename: false,
            is_binary: false,
            hunks: vec![Hunk {
                old_start: new_start,
                old_count: lines.len() as u32,
                new_start,
                new_count: lines.len() as u32,
                header: None,
                lines,
            }],
        }
    }

    fn finding(file: &str, line: u32) -> Finding {
        Finding {
            file: file.to_string(),
            line,
            end_line: None,
            severity: Severity::Warning,
            title: "t".into(),
            message: "m".into(),
            suggestion: None,
            agent: "a".into(),
            rule_id: None,
            fingerprint: None,
            provenance: crate::models::finding::Provenance::Complete,
        }
    }

    #[test]
    fn file_level_finding_is_always_valid() {
        let resolver = LineResolver::build(&[]);
        let outcome = resolver.validate_line(&canonicalize("x.rs"), None, ValidateOptions::default());
        assert!(outcome.valid);
        assert_eq!(outcome.line, None);
    }

    #[test]
    fn non_positive_line_is_invalid() {
        let resolver = LineResolver::build(&[]);
        let outcome = resolver.validate_line(&canonicalize("x.rs"), Some(0), ValidateOptions::default());
        assert!(!outcome.valid);
        assert_eq!(outcome.reason, Some("must be positive"));
    }

    #[test]
    fn unknown_file_drops_with_not_found() {
        let resolver = LineResolver::build(&[]);
        let outcome = resolver.validate_line(&canonicalize("x.rs"), Some(5), ValidateOptions::default());
        assert!(!outcome.valid);
        assert_eq!(outcome.reason, Some("not found in diff"));
    }

    #[test]
    fn deleted_file_downgrades() {
        let diffs = vec![FileDiff {
            old_path: "gone.rs".into(),
            new_path: "/dev/null".into(),
            is_new: false,
            is_deleted: true,
            is_rename: false,
            is_binary: false,
            hunks: vec![],
        }];
        let resolver = LineResolver::build(&diffs);
        let outcome = resolver.validate_line(&canonicalize("gone.rs"), Some(3), ValidateOptions::default());
        assert!(!outcome.valid);
        assert_eq!(outcome.reason, Some("deleted-file"));
    }

    #[test]
    fn ambiguous_rename_clears_line_and_keeps_old_path() {
        let diffs = vec![
            FileDiff {
                old_path: "shared.ts".into(),
                new_path: "a.ts".into(),
                is_new: false,
                is_deleted: false,
                is_rename: true,
                is_binary: false,
                hunks: vec![],
            },
            FileDiff {
                old_path: "shared.ts".into(),
                new_path: "b.ts".into(),
                is_new: false,
                is_deleted: false,
                is_rename: true,
                is_binary: false,
                hunks: vec![],
            },
        ];
        let resolver = LineResolver::build(&diffs);
        let outcome = resolver.validate_line(&canonicalize("shared.ts"), Some(5), ValidateOptions::default());
        assert!(!outcome.valid);
        assert_eq!(outcome.reason, Some("ambiguous-rename"));
        assert_eq!(outcome.file.as_str(), "shared.ts");
    }

    #[test]
    fn unambiguous_rename_remaps_and_revalidates() {
        let mut rename = FileDiff {
            old_path: "old.rs".into(),
            new_path: "new.rs".into(),
            is_new: false,
            is_deleted: false,
            is_rename: true,
            is_binary: false,
            hunks: vec![],
        };
        rename.hunks.push(Hunk {
            old_start: 1,
            old_count: 1,
            new_start: 1,
            new_count: 1,
            header: None,
            lines: vec![added_line(1)],
        });
        let resolver = LineResolver::build(&[rename]);
        let outcome = resolver.validate_line(&canonicalize("old.rs"), Some(1), ValidateOptions::default());
        assert!(outcome.valid);
        assert_eq!(outcome.file.as_str(), "new.rs");
    }

    #[test]
    fn out_of_context_line_without_suggestion() {
        let diff = modified_diff("x.rs", vec![context_line(1, 1), added_line(2)], 1);
        let resolver = LineResolver::build(&[diff]);
        let outcome = resolver.validate_line(&canonicalize("x.rs"), Some(99), ValidateOptions::default());
        assert!(!outcome.valid);
        assert_eq!(outcome.reason, Some("not in the diff context"));
        assert_eq!(outcome.nearest_valid_line, None);
    }

    #[test]
    fn out_of_context_line_suggests_nearest_with_tie_break_low() {
        let diff = modified_diff("x.rs", vec![added_line(10), added_line(20)], 10);
        let resolver = LineResolver::build(&[diff]);
        let opts = ValidateOptions {
            additions_only: false,
            suggest_nearest: true,
        };
        // 15 is equidistant from 10 and 20 -> ties break to the smaller line.
        let outcome = resolver.validate_line(&canonicalize("x.rs"), Some(15), opts);
        assert_eq!(outcome.nearest_valid_line, Some(10));
    }

    #[test]
    fn additions_only_rejects_context_line() {
        let diff = modified_diff("x.rs", vec![context_line(1, 1)], 1);
        let resolver = LineResolver::build(&[diff]);
        let opts = ValidateOptions {
            additions_only: true,
            suggest_nearest: false,
        };
        let outcome = resolver.validate_line(&canonicalize("x.rs"), Some(1), opts);
        assert!(!outcome.valid);
        assert_eq!(outcome.reason, Some("not an added line"));
    }

    #[test]
    fn valid_added_line_reports_is_addition() {
        let diff = modified_diff("x.rs", vec![added_line(3)], 3);
        let resolver = LineResolver::build(&[diff]);
        let outcome = resolver.validate_line(&canonicalize("x.rs"), Some(3), ValidateOptions::default());
        assert!(outcome.valid);
        assert_eq!(outcome.is_addition, Some(true));
    }

    #[test]
    fn normalize_drops_findings_not_in_diff() {
        let diff = modified_diff("x.rs", vec![added_line(3)], 3);
        let resolver = LineResolver::build(&[diff]);
        let (kept, stats, details) = resolver.normalize_findings_for_diff(
            vec![finding("x.rs", 3), finding("x.rs", 99)],
            NormalizeOptions::default(),
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.valid, 1);
        assert_eq!(stats.dropped, 1);
        assert_eq!(details.len(), 1);
    }

    #[test]
    fn normalize_auto_fix_snaps_to_nearest() {
        let diff = modified_diff("x.rs", vec![added_line(10)], 10);
        let resolver = LineResolver::build(&[diff]);
        let (kept, stats, _) = resolver.normalize_findings_for_diff(
            vec![finding("x.rs", 11)],
            NormalizeOptions { auto_fix: true },
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].line, 10);
        assert_eq!(stats.normalized, 1);
    }

    #[test]
    fn normalize_keeps_file_level_findings() {
        let diff = modified_diff("x.rs", vec![added_line(1)], 1);
        let resolver = LineResolver::build(&[diff]);
        let (kept, stats, _) = resolver.normalize_findings_for_diff(
            vec![finding("x.rs", 0)],
            NormalizeOptions::default(),
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].line, 0);
        assert_eq!(stats.valid, 1);
    }

    #[test]
    fn normalize_ambiguous_rename_keeps_original_path_clears_line() {
        let diffs = vec![
            FileDiff {
                old_path: "shared.ts".into(),
                new_path: "a.ts".into(),
                is_new: false,
                is_deleted: false,
                is_rename: true,
                is_binary: false,
                hunks: vec![],
            },
            FileDiff {
                old_path: "shared.ts".into(),
                new_path: "b.ts".into(),
                is_new: false,
                is_deleted: false,
                is_rename: true,
                is_binary: false,
                hunks: vec![],
            },
        ];
        let resolver = LineResolver::build(&diffs);
        let (kept, stats, details) = resolver.normalize_findings_for_diff(
            vec![finding("shared.ts", 5)],
            NormalizeOptions::default(),
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].file, "shared.ts");
        assert_eq!(kept[0].line, 0);
        assert_eq!(stats.ambiguous_renames, 1);
        assert_eq!(stats.remapped_paths, 0);
        assert_eq!(details[0].reason, "ambiguous-rename");
    }

    #[test]
    fn drift_signal_levels() {
        let mut stats = NormalizeStats {
            total: 100,
            dropped: 10,
            ..Default::default()
        };
        let ok = DriftSignal::compute(&stats, vec![], 20.0, 50.0);
        assert_eq!(ok.level, DriftLevel::Ok);

        stats.dropped = 25;
        let warn = DriftSignal::compute(&stats, vec![], 20.0, 50.0);
        assert_eq!(warn.level, DriftLevel::Warn);

        stats.dropped = 60;
        let fail = DriftSignal::compute(&stats, vec![], 20.0, 50.0);
        assert_eq!(fail.level, DriftLevel::Fail);
    }

    #[test]
    fn drift_signal_empty_is_ok() {
        let stats = NormalizeStats::default();
        let signal = DriftSignal::compute(&stats, vec![], 20.0, 50.0);
        assert_eq!(signal.level, DriftLevel::Ok);
        assert_eq!(signal.degradation_percent, 0.0);
    }
}
