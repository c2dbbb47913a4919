//! JSON output renderer.
//!
//! Outputs `{"findings": [...], "summary": {...}}` format.

use crate::models::finding::{Finding, Summary};
use crate::output::OutputRenderer;

/// JSON output renderer.
pub struct JsonRenderer;

impl OutputRenderer for JsonRenderer {
    fn render(&self, findings: &[Finding]) -> String {
        let summary = Summary::from_findings(findings);

        let output = serde_json::json!({
            "findings": findings,
            "summary": summary,
        });

        serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
    }
}
