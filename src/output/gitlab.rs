//! GitLab Code Quality report renderer.
//!
//! Outputs a JSON array conforming to the [CodeClimate spec](https://docs.gitlab.com/ee/ci/testing/code_quality.html)
//! that GitLab ingests via `artifacts:reports:codequality`.
//!
//! Users pipe the output to a file and declare it as a CI artifact:
//! ```yaml
//! artifacts:
//!   reports:
//!     codequality: gl-code-quality-report.json
//! ```

use crate::models::finding::{Finding, Severity};
use crate::output::OutputRenderer;

/// GitLab Code Quality renderer.
///
/// Emits a JSON array of CodeClimate-format objects suitable for use
/// as a `codequality` artifact in GitLab CI. Each finding is mapped to
/// a CodeClimate issue with a stable fingerprint derived from the
/// file path, line number, title, and message.
pub struct GitlabRenderer;

impl OutputRenderer for GitlabRenderer {
    fn render(&self, findings: &[Finding]) -> String {
        let entries: Vec<serde_json::Value> = findings
            .iter()
            .map(|f| {
                let severity = match f.severity {
                    Severity::Error => "critical",
                    Severity::Warning => "major",
                    Severity::Info => "minor",
                };

                let mut description = f.message.clone();
                if let Some(ref suggestion) = f.suggestion {
                    description.push_str(&format!("\n\nSuggestion: {suggestion}"));
                }

                let fingerprint = compute_fingerprint(f);

                let mut lines = serde_json::json!({ "begin": f.line });
                if let Some(end) = f.end_line {
                    lines["end"] = serde_json::json!(end);
                }

                serde_json::json!({
                    "description": description,
                    "check_name": f.title,
                    "fingerprint": fingerprint,
                    "severity": severity,
                    "location": {
                        "path": f.file,
                        "lines": lines,
                    },
                })
            })
            .collect();

        serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string())
    }
}

/// Compute a stable fingerprint for a finding.
///
/// Uses MD5 to produce a 32-char hex digest, matching the
/// [CodeClimate fingerprint convention](https://github.com/codeclimate/platform/blob/master/spec/analyzers/SPEC.md#fingerprints).
fn compute_fingerprint(f: &Finding) -> String {
    let input = format!("{}:{}:{}:{}", f.file, f.line, f.title, f.message);
    let digest = md5::compute(input.as_bytes());
    format!("{:x}", digest)
}
