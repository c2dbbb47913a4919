//! Stable finding identity: fingerprints, dedupe keys, and the
//! fingerprint-marker wire format embedded in comment bodies.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::constants::FINGERPRINT_MARKER_PREFIX;
use crate::models::finding::{Finding, Severity};

/// `fingerprint:file:line` identity string for a finding instance.
/// `line == 0` denotes a file-level finding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DedupeKey {
    pub fingerprint: String,
    pub file: String,
    pub line: u32,
}

impl fmt::Display for DedupeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.fingerprint, self.file, self.line)
    }
}

/// Collapse whitespace runs to a single space and trim the ends. Does
/// NOT HTML-escape — the fingerprint is computed on raw text so it stays
/// stable whether or not sanitization ever runs.
fn normalize_message(message: &str) -> String {
    message.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Compute the first 128 bits of SHA-256 over
/// `(ruleId_or_empty, file, normalized_message, severity)`, lowercase hex.
pub fn compute_fingerprint(rule_id: Option<&str>, file: &str, message: &str, severity: Severity) -> String {
    let mut hasher = Sha256::new();
    hasher.update(rule_id.unwrap_or("").as_bytes());
    hasher.update([0u8]);
    hasher.update(file.as_bytes());
    hasher.update([0u8]);
    hasher.update(normalize_message(message).as_bytes());
    hasher.update([0u8]);
    hasher.update(severity.to_string().as_bytes());

    let digest = hasher.finalize();
    hex::encode(&digest[..16])
}

/// Attach a fingerprint to a finding, computed from its current fields.
/// Idempotent: calling this twice on an unmodified finding yields the
/// same fingerprint.
pub fn fingerprint_finding(finding: &mut Finding) {
    finding.fingerprint = Some(compute_fingerprint(
        finding.rule_id.as_deref(),
        &finding.file,
        &finding.message,
        finding.severity,
    ));
}

/// Build the `DedupeKey` for a finding. Panics if the finding has not
/// yet been fingerprinted (a contract violation — fingerprinting always
/// runs before dedup in the pipeline).
pub fn dedupe_key(finding: &Finding) -> DedupeKey {
    DedupeKey {
        fingerprint: finding
            .fingerprint
            .clone()
            .expect("dedupe_key called before fingerprint_finding"),
        file: finding.file.clone(),
        line: finding.line,
    }
}

/// Build the single-line HTML comment marker embedded in a reported
/// comment body for one finding.
pub fn build_marker(key: &DedupeKey) -> String {
    format!(
        "<!-- {FINGERPRINT_MARKER_PREFIX}:fingerprint:v1:{}:{}:{} -->",
        key.fingerprint, key.file, key.line
    )
}

fn marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"<!--\s*{FINGERPRINT_MARKER_PREFIX}:fingerprint:v1:([a-f0-9]{{32}}):([^:]+):(\d+)\s*-->"
        ))
        .expect("marker regex is a fixed valid pattern")
    })
}

/// Extract every well-formed `DedupeKey` marker from a comment body.
/// Any match with an empty capture group is discarded rather than
/// producing a malformed key.
pub fn extract_markers(body: &str) -> Vec<DedupeKey> {
    marker_regex()
        .captures_iter(body)
        .filter_map(|caps| {
            let fp = caps.get(1)?.as_str();
            let file = caps.get(2)?.as_str();
            let line = caps.get(3)?.as_str();
            if fp.is_empty() || file.is_empty() || line.is_empty() {
                return None;
            }
            let line: u32 = line.parse().ok()?;
            Some(DedupeKey {
                fingerprint: fp.to_string(),
                file: file.to_string(),
                line,
            })
        })
        .collect()
}
