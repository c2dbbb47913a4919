//! Deterministic ordering, intra-run dedup, and cross-run proximity
//! dedup/staleness for findings.

use std::collections::{HashMap, HashSet};

use crate::constants::LINE_PROXIMITY_THRESHOLD;
use crate::finding::fingerprint::{dedupe_key, DedupeKey};
use crate::models::finding::{Finding, Severity};

fn severity_rank(severity: Severity) -> u8 {
    match severity {
        Severity::Error => 0,
        Severity::Warning => 1,
        Severity::Info => 2,
    }
}

/// Line 0 (file-level) sorts after every defined line.
fn line_sort_key(line: u32) -> u32 {
    if line == 0 { u32::MAX } else { line }
}

/// Sort findings by severity (error, warning, info), then file
/// lexicographically, then line ascending (undefined last). Stable, so
/// equal keys keep their original relative order.
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        severity_rank(a.severity)
            .cmp(&severity_rank(b.severity))
            .then_with(|| a.file.cmp(&b.file))
            .then_with(|| line_sort_key(a.line).cmp(&line_sort_key(b.line)))
    });
}

/// Keep at most one finding per unique [`DedupeKey`], retaining the
/// first occurrence in input order. Callers sort first if they want a
/// specific tie-break; this function is stable either way.
pub fn dedup_intra_run(findings: Vec<Finding>) -> Vec<Finding> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(findings.len());
    for finding in findings {
        if seen.insert(dedupe_key(&finding)) {
            out.push(finding);
        }
    }
    out
}

/// Index of `(fingerprint, file) -> lines`, used both for proximity
/// dedup against prior open comments and for stale detection against
/// current findings.
#[derive(Debug, Clone, Default)]
pub struct ProximityMap {
    by_fp_file: HashMap<(String, String), Vec<u32>>,
}

impl ProximityMap {
    pub fn from_keys<'a>(keys: impl IntoIterator<Item = &'a DedupeKey>) -> Self {
        let mut by_fp_file: HashMap<(String, String), Vec<u32>> = HashMap::new();
        for key in keys {
            by_fp_file
                .entry((key.fingerprint.clone(), key.file.clone()))
                .or_default()
                .push(key.line);
        }
        Self { by_fp_file }
    }

    pub fn from_findings(findings: &[Finding]) -> Self {
        Self::from_keys(findings.iter().map(dedupe_key).collect::<Vec<_>>().iter())
    }

    fn has_nearby(&self, fingerprint: &str, file: &str, line: u32, threshold: u32) -> bool {
        self.by_fp_file
            .get(&(fingerprint.to_string(), file.to_string()))
            .is_some_and(|lines| lines.iter().any(|&l| l.abs_diff(line) <= threshold))
    }

    fn record(&mut self, key: &DedupeKey) {
        self.by_fp_file
            .entry((key.fingerprint.clone(), key.file.clone()))
            .or_default()
            .push(key.line);
    }
}

/// Filter `findings` down to the ones that are genuinely new against a
/// prior run's open comment keys, using exact-key match first and then
/// same-fingerprint/same-file proximity within `threshold` lines
/// (inclusive). Accepted findings are recorded into both `existing_keys`
/// and `proximity` so later findings in the same batch also dedupe
/// against them, matching the deterministic sort order callers should
/// apply beforehand.
pub fn proximity_dedup(
    findings: Vec<Finding>,
    existing_keys: &mut HashSet<DedupeKey>,
    proximity: &mut ProximityMap,
    threshold: u32,
) -> Vec<Finding> {
    let mut new_findings = Vec::new();
    for finding in findings {
        let key = dedupe_key(&finding);
        if existing_keys.contains(&key) {
            continue;
        }
        if proximity.has_nearby(&key.fingerprint, &key.file, key.line, threshold) {
            continue;
        }
        existing_keys.insert(key.clone());
        proximity.record(&key);
        new_findings.push(finding);
    }
    new_findings
}

/// Same as [`proximity_dedup`] with the spec's default threshold of 20.
pub fn proximity_dedup_default(
    findings: Vec<Finding>,
    existing_keys: &mut HashSet<DedupeKey>,
    proximity: &mut ProximityMap,
) -> Vec<Finding> {
    proximity_dedup(findings, existing_keys, proximity, LINE_PROXIMITY_THRESHOLD)
}

/// A prior-run key is stale iff no current finding shares its
/// fingerprint+file within `threshold` lines. Same-file
/// different-fingerprint and different-file same-fingerprint never
/// count as a match.
pub fn stale_keys(
    prior_keys: &[DedupeKey],
    current_findings: &[Finding],
    threshold: u32,
) -> Vec<DedupeKey> {
    let current_index = ProximityMap::from_findings(current_findings);
    prior_keys
        .iter()
        .filter(|key| !current_index.has_nearby(&key.fingerprint, &key.file, key.line, threshold))
        .cloned()
        .collect()
}
