//! Forgejo/Gitea Pull Request Review API renderer.
//!
//! Posts findings as inline review comments on a pull request via the
//! Forgejo (or Gitea) API. The stdout output is a JSON payload matching
//! the `CreatePullReviewOptions` schema for debugging/piping.
//!
//! When running inside Woodpecker CI the required environment variables
//! (`CI_FORGE_URL`, `CI_REPO_OWNER`, `CI_REPO_NAME`,
//! `CI_COMMIT_PULL_REQUEST`, `CI_COMMIT_SHA`) are provided automatically.
//! The user only needs to supply `FORGEJO_TOKEN`.

use crate::models::finding::{Finding, Severity};
use crate::output::OutputRenderer;
use thiserror::Error;

/// Errors from Forgejo API calls.
#[derive(Error, Debug)]
pub enum ForgejoError {
    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid pull request index: {0}")]
    InvalidPrIndex(String),

    #[error("API request failed: {0}")]
    ApiError(String),
}

/// Forgejo / Gitea pull request review renderer.
///
/// The synchronous `render()` method outputs a JSON object matching the
/// Forgejo `CreatePullReviewOptions` schema so the payload can be
/// inspected or piped. For actually posting to the API, use
/// [`post_to_forgejo`].
pub struct ForgejoRenderer;

impl OutputRenderer for ForgejoRenderer {
    fn render(&self, findings: &[Finding]) -> String {
        let comments: Vec<serde_json::Value> = findings
            .iter()
            .map(|f| {
                let body = format_comment_body(f);
                serde_json::json!({
                    "path": f.file,
                    "body": body,
                    "new_position": f.line,
                    "old_position": 0,
                })
            })
            .collect();

        let summary = crate::models::finding::Summary::from_findings(findings);
        let body = format!(
            "**{}** found {} {} ({} error{}, {} warning{}, {} info)\n\n_{}_",
            crate::constants::APP_NAME,
            summary.total,
            if summary.total == 1 { "finding" } else { "findings" },
            summary.errors,
            if summary.errors == 1 { "" } else { "s" },
            summary.warnings,
            if summary.warnings == 1 { "" } else { "s" },
            summary.info,
            crate::constants::AI_DISCLOSURE,
        );

        let review = serde_json::json!({
            "event": "COMMENT",
            "body": body,
            "comments": comments,
        });

        serde_json::to_string_pretty(&review).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Format a single finding as a Markdown comment body.
fn format_comment_body(f: &Finding) -> String {
    let severity_emoji = match f.severity {
        Severity::Error => "🔴",
        Severity::Warning => "🟡",
        Severity::Info => "🔵",
    };

    let mut body = format!(
        "{} **{}** ({})\n\n{}",
        severity_emoji, f.title, f.severity, f.message
    );
    if let Some(ref suggestion) = f.suggestion {
        body.push_str(&format!("\n\n**Suggestion:** {suggestion}"));
    }
    body.push_str(&format!("\n\n_— agent: {}_", f.agent));
    body
}

/// Read a required environment variable or return a [`ForgejoError`].
fn require_env(name: &str) -> Result<String, ForgejoError> {
    std::env::var(name).map_err(|_| ForgejoError::MissingEnvVar(name.into()))
}

/// Post findings to the Forgejo/Gitea Pull Request Review API.
///
/// Creates a single review with `event: COMMENT` containing inline
/// comments for every finding.
///
/// # Required environment variables
///
/// | Variable | Source |
/// |---|---|
/// | `CI_FORGE_URL` | Woodpecker built-in (or set manually) |
/// | `CI_REPO_OWNER` | Woodpecker built-in |
/// | `CI_REPO_NAME` | Woodpecker built-in |
/// | `CI_COMMIT_PULL_REQUEST` | Woodpecker built-in |
/// | `CI_COMMIT_SHA` | Woodpecker built-in |
/// | `FORGEJO_TOKEN` | User-provided API token |
pub async fn post_to_forgejo(findings: &[Finding]) -> Result<(), ForgejoError> {
    let forge_url = require_env("CI_FORGE_URL")?;
    let owner = require_env("CI_REPO_OWNER")?;
    let repo = require_env("CI_REPO_NAME")?;
    let pr_index_str = require_env("CI_COMMIT_PULL_REQUEST")?;
    let commit_sha = require_env("CI_COMMIT_SHA")?;
    let token = require_env("FORGEJO_TOKEN")?;

    let pr_index: u64 = pr_index_str
        .parse()
        .map_err(|_| ForgejoError::InvalidPrIndex(pr_index_str.clone()))?;

    // Build the review payload
    let comments: Vec<serde_json::Value> = findings
        .iter()
        .map(|f| {
            let body = format_comment_body(f);
            serde_json::json!({
                "path": f.file,
                "body": body,
                "new_position": f.line,
                "old_position": 0,
            })
        })
        .collect();

    let summary = crate::models::finding::Summary::from_findings(findings);
    let review_body = format!(
        "**{}** found {} {} ({} error{}, {} warning{}, {} info)\n\n_{}_",
        crate::constants::APP_NAME,
        summary.total,
        if summary.total == 1 { "finding" } else { "findings" },
        summary.errors,
        if summary.errors == 1 { "" } else { "s" },
        summary.warnings,
        if summary.warnings == 1 { "" } else { "s" },
        summary.info,
        crate::constants::AI_DISCLOSURE,
    );

    let review_payload = serde_json::json!({
        "event": "COMMENT",
        "body": review_body,
        "commit_id": commit_sha,
        "comments": comments,
    });

    let url = format!(
        "{}/api/v1/repos/{}/{}/pulls/{}/reviews",
        forge_url.trim_end_matches('/'),
        owner,
        repo,
        pr_index,
    );

    let client = reqwest::Client::new();
    let response = client
        .post(&url)
        .header("Authorization", format!("token {token}"))
        .header("Content-Type", "application/json")
        .json(&review_payload)
        .send()
        .await
        .map_err(|e| ForgejoError::ApiError(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        return Err(ForgejoError::ApiError(format!(
            "review creation failed with HTTP {status}: {body}"
        )));
    }

    Ok(())
}
