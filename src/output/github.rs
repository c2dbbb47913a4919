//! GitHub Actions annotation renderer and Pull Request review-comment
//! poster/reconciler.
//!
//! The synchronous `render()` method emits [workflow command](https://docs.github.com/en/actions/using-workflows/workflow-commands-for-github-actions#setting-an-error-message)
//! annotations (`::error`/`::warning`/`::notice`) for use in a plain Actions
//! log. [`post_to_github`] instead posts right-side-only inline review
//! comments via the Pull Requests API and reconciles them against prior
//! runs using the fingerprint-marker protocol.

use thiserror::Error;

use crate::finding::fingerprint::{dedupe_key, extract_markers, DedupeKey};
use crate::models::finding::{Finding, Severity, Summary};
use crate::output::OutputRenderer;
use crate::reconcile::{
    build_comment_body, build_inline_payload, decide_resolution, log_resolution, next_state,
    rewrite_partial_resolution, scan_markers, CommentState, PriorComment,
};

/// Errors from GitHub API calls.
#[derive(Error, Debug)]
pub enum GithubError {
    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid repository slug: {0}")]
    InvalidRepository(String),

    #[error("invalid pull request number: {0}")]
    InvalidPrNumber(String),

    #[error("API request failed: {0}")]
    ApiError(String),
}

/// GitHub Actions workflow-command renderer.
///
/// For posting real PR review comments, use [`post_to_github`].
pub struct GithubRenderer;

impl OutputRenderer for GithubRenderer {
    fn render(&self, findings: &[Finding]) -> String {
        findings
            .iter()
            .map(render_annotation)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn render_annotation(f: &Finding) -> String {
    let command = match f.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "notice",
    };
    let mut props = format!("file={}", escape_property(&f.file));
    if f.line > 0 {
        props.push_str(&format!(",line={}", f.line));
        if let Some(end) = f.end_line {
            props.push_str(&format!(",endLine={end}"));
        }
    }
    props.push_str(&format!(",title={}", escape_property(&f.title)));

    let mut message = f.message.clone();
    if let Some(ref suggestion) = f.suggestion {
        message.push_str(&format!(" Suggestion: {suggestion}"));
    }

    format!("::{command} {props}::{}", escape_data(&message))
}

/// Escape a workflow-command property value per GitHub's escaping rules.
fn escape_property(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
        .replace(':', "%3A")
        .replace(',', "%2C")
}

/// Escape workflow-command message data.
fn escape_data(s: &str) -> String {
    s.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A")
}

fn require_env(name: &str) -> Result<String, GithubError> {
    std::env::var(name).map_err(|_| GithubError::MissingEnvVar(name.into()))
}

/// Post findings as right-side-only inline review comments on a GitHub
/// pull request, reconciling against any prior run's fingerprint-marker
/// comments.
///
/// # Required environment variables
///
/// | Variable | Source |
/// |---|---|
/// | `GITHUB_REPOSITORY` | Actions built-in, `owner/repo` |
/// | `GITHUB_PR_NUMBER` | User-provided (e.g. from the event payload) |
/// | `GITHUB_SHA` | Actions built-in |
/// | `GITHUB_TOKEN` | User-provided API token |
///
/// `GITHUB_API_URL` defaults to `https://api.github.com` when unset (GitHub
/// Enterprise Server deployments set it to their own host).
pub async fn post_to_github(
    findings: &[Finding],
    prior_comments: &[PriorComment],
) -> Result<(), GithubError> {
    post_to_github_with_summary(findings, prior_comments, false).await
}

/// Like [`post_to_github`], but also sets the review's top-level `body` to
/// an aggregate summary when `post_summary` is true.
pub async fn post_to_github_with_summary(
    findings: &[Finding],
    prior_comments: &[PriorComment],
    post_summary: bool,
) -> Result<(), GithubError> {
    let repository = require_env("GITHUB_REPOSITORY")?;
    let (owner, repo) = repository
        .split_once('/')
        .ok_or_else(|| GithubError::InvalidRepository(repository.clone()))?;
    let pr_number_str = require_env("GITHUB_PR_NUMBER")?;
    let pr_number: u64 = pr_number_str
        .parse()
        .map_err(|_| GithubError::InvalidPrNumber(pr_number_str.clone()))?;
    let commit_sha = require_env("GITHUB_SHA")?;
    let token = require_env("GITHUB_TOKEN")?;
    let api_url = std::env::var("GITHUB_API_URL").unwrap_or_else(|_| "https://api.github.com".into());

    let current_keys: Vec<DedupeKey> = findings.iter().map(dedupe_key).collect();

    for prior in prior_comments {
        let scan = scan_markers(&prior.body);
        let stale: std::collections::HashSet<DedupeKey> = scan
            .valid
            .iter()
            .filter(|k| !current_keys.contains(k))
            .cloned()
            .collect();
        let outcome = decide_resolution(&scan.valid, scan.malformed_count, &stale);
        log_resolution("github", &prior.comment_id, scan.valid.len(), stale.len(), &outcome);
        let state = next_state(CommentState::OpenActive, &outcome);
        if matches!(state, CommentState::OpenPartial) {
            let new_body = rewrite_partial_resolution(&prior.body, &scan.valid, &stale);
            patch_comment(&api_url, owner, repo, &token, &prior.comment_id, &new_body).await?;
        }
    }

    if findings.is_empty() {
        return Ok(());
    }

    let comments: Vec<serde_json::Value> = findings
        .iter()
        .map(|f| {
            let key = dedupe_key(f);
            let payload = build_inline_payload(&f.file, f.line, f.end_line, &commit_sha);
            let body = build_comment_body(&[(f.clone(), key)]);
            let mut comment = serde_json::json!({
                "path": payload.path,
                "line": payload.line,
                "side": "RIGHT",
                "body": body,
            });
            if let Some(start_line) = payload.start_line {
                comment["start_line"] = serde_json::json!(start_line);
                comment["start_side"] = serde_json::json!("RIGHT");
            }
            comment
        })
        .collect();

    let mut review_payload = serde_json::json!({
        "commit_id": commit_sha,
        "event": "COMMENT",
        "comments": comments,
    });
    if post_summary {
        review_payload["body"] = serde_json::json!(summary_body(findings));
    }

    let url = format!("{}/repos/{owner}/{repo}/pulls/{pr_number}/reviews", api_url.trim_end_matches('/'));
    let client = reqwest::Client::new();
    let response = client
        .post(&url)
        .bearer_auth(&token)
        .header("Accept", "application/vnd.github+json")
        .header("User-Agent", crate::constants::APP_NAME)
        .json(&review_payload)
        .send()
        .await
        .map_err(|e| GithubError::ApiError(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_else(|_| "<no body>".to_string());
        return Err(GithubError::ApiError(format!("review creation failed with HTTP {status}: {body}")));
    }

    Ok(())
}

async fn patch_comment(
    api_url: &str,
    owner: &str,
    repo: &str,
    token: &str,
    comment_id: &str,
    body: &str,
) -> Result<(), GithubError> {
    let url = format!(
        "{}/repos/{owner}/{repo}/pulls/comments/{comment_id}",
        api_url.trim_end_matches('/')
    );
    let client = reqwest::Client::new();
    let response = client
        .patch(&url)
        .bearer_auth(token)
        .header("Accept", "application/vnd.github+json")
        .header("User-Agent", crate::constants::APP_NAME)
        .json(&serde_json::json!({ "body": body }))
        .send()
        .await
        .map_err(|e| GithubError::ApiError(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let resp_body = response.text().await.unwrap_or_else(|_| "<no body>".to_string());
        return Err(GithubError::ApiError(format!("comment update failed with HTTP {status}: {resp_body}")));
    }
    Ok(())
}

/// Build the aggregate summary used as a review's top-level `body`.
fn summary_body(findings: &[Finding]) -> String {
    let summary = Summary::from_findings(findings);
    format!(
        "**Review summary:** {} finding(s) — {} error(s), {} warning(s), {} info",
        summary.total, summary.errors, summary.warnings, summary.info,
    )
}

/// Extract fingerprint markers from an existing comment body, for callers
/// building [`PriorComment`] values from a fetched comment list.
pub fn markers_in(body: &str) -> Vec<DedupeKey> {
    extract_markers(body)
}

/// Fetch this PR's existing review comments, for reconciliation against
/// the current run's fingerprint markers.
///
/// Only review comments carrying a well-formed marker are relevant to
/// reconciliation, but all comments are returned as [`PriorComment`]s —
/// [`scan_markers`] filters out the rest when a caller processes them.
pub async fn fetch_prior_comments() -> Result<Vec<PriorComment>, GithubError> {
    let repository = require_env("GITHUB_REPOSITORY")?;
    let (owner, repo) = repository
        .split_once('/')
        .ok_or_else(|| GithubError::InvalidRepository(repository.clone()))?;
    let pr_number_str = require_env("GITHUB_PR_NUMBER")?;
    let pr_number: u64 = pr_number_str
        .parse()
        .map_err(|_| GithubError::InvalidPrNumber(pr_number_str.clone()))?;
    let token = require_env("GITHUB_TOKEN")?;
    let api_url = std::env::var("GITHUB_API_URL").unwrap_or_else(|_| "https://api.github.com".into());

    let mut comments = Vec::new();
    let mut page = 1u32;
    let client = reqwest::Client::new();

    loop {
        let url = format!(
            "{}/repos/{owner}/{repo}/pulls/{pr_number}/comments?per_page=100&page={page}",
            api_url.trim_end_matches('/'),
        );
        let response = client
            .get(&url)
            .bearer_auth(&token)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", crate::constants::APP_NAME)
            .send()
            .await
            .map_err(|e| GithubError::ApiError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "<no body>".to_string());
            return Err(GithubError::ApiError(format!("list comments failed with HTTP {status}: {body}")));
        }

        let page_items: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| GithubError::ApiError(e.to_string()))?;
        if page_items.is_empty() {
            break;
        }

        let count = page_items.len();
        for item in page_items {
            let (Some(id), Some(body)) = (item["id"].as_u64(), item["body"].as_str()) else {
                continue;
            };
            comments.push(PriorComment {
                comment_id: id.to_string(),
                body: body.to_string(),
            });
        }

        if count < 100 {
            break;
        }
        page += 1;
    }

    Ok(comments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn sample_findings() -> Vec<Finding> {
        vec![
            Finding {
                file: "src/main.rs".to_string(),
                line: 10,
                end_line: None,
                severity: Severity::Error,
                title: "Bug".to_string(),
                message: "A bug was found".to_string(),
                suggestion: Some("Fix the bug".to_string()),
                agent: "backend".to_string(),
                rule_id: None,
                fingerprint: None,
                provenance: crate::models::finding::Provenance::Complete,
            },
            Finding {
                file: "src/lib.rs".to_string(),
                line: 20,
                end_line: None,
                severity: Severity::Warning,
                title: "Style".to_string(),
                message: "Style issue".to_string(),
                suggestion: None,
                agent: "backend".to_string(),
                rule_id: None,
                fingerprint: None,
                provenance: crate::models::finding::Provenance::Complete,
            },
        ]
    }

    #[test]
    fn render_emits_workflow_commands() {
        let output = GithubRenderer.render(&sample_findings());
        assert!(output.contains("::error"));
        assert!(output.contains("::warning"));
        assert!(output.contains("file=src/main.rs"));
        assert!(output.contains("line=10"));
    }

    #[test]
    fn render_info_uses_notice() {
        let findings = vec![Finding {
            file: "f.rs".into(),
            line: 1,
            end_line: None,
            severity: Severity::Info,
            title: "T".into(),
            message: "M".into(),
            suggestion: None,
            agent: "a".into(),
            rule_id: None,
            fingerprint: None,
            provenance: crate::models::finding::Provenance::Complete,
        }];
        let output = GithubRenderer.render(&findings);
        assert!(output.contains("::notice"));
    }

    #[test]
    fn render_file_level_finding_omits_line() {
        let findings = vec![Finding {
            file: "f.rs".into(),
            line: 0,
            end_line: None,
            severity: Severity::Warning,
            title: "T".into(),
            message: "M".into(),
            suggestion: None,
            agent: "a".into(),
            rule_id: None,
            fingerprint: None,
            provenance: crate::models::finding::Provenance::Complete,
        }];
        let output = GithubRenderer.render(&findings);
        assert!(!output.contains("line="));
    }

    #[test]
    fn render_empty_findings() {
        assert_eq!(GithubRenderer.render(&[]), "");
    }

    #[test]
    fn escape_property_handles_reserved_chars() {
        assert_eq!(escape_property("a:b,c\n"), "a%3Ab%2Cc%0A");
    }

    #[test]
    fn summary_body_reports_counts() {
        let body = summary_body(&sample_findings());
        assert!(body.contains("2 finding(s)"));
        assert!(body.contains("1 error(s)"));
        assert!(body.contains("1 warning(s)"));
    }

    #[tokio::test]
    #[serial]
    async fn fetch_prior_comments_missing_env_errors() {
        struct EnvGuard;
        impl Drop for EnvGuard {
            fn drop(&mut self) {
                unsafe { std::env::remove_var("GITHUB_REPOSITORY"); }
            }
        }
        let _guard = EnvGuard;
        unsafe { std::env::remove_var("GITHUB_REPOSITORY"); }
        let result = fetch_prior_comments().await;
        assert!(result.unwrap_err().to_string().contains("GITHUB_REPOSITORY"));
    }

    #[tokio::test]
    #[serial]
    async fn post_missing_env_vars_cascade() {
        struct EnvGuard;
        impl Drop for EnvGuard {
            fn drop(&mut self) {
                unsafe {
                    std::env::remove_var("GITHUB_REPOSITORY");
                    std::env::remove_var("GITHUB_PR_NUMBER");
                    std::env::remove_var("GITHUB_SHA");
                    std::env::remove_var("GITHUB_TOKEN");
                    std::env::remove_var("GITHUB_API_URL");
                }
            }
        }
        let _guard = EnvGuard;
        unsafe {
            std::env::remove_var("GITHUB_REPOSITORY");
            std::env::remove_var("GITHUB_PR_NUMBER");
            std::env::remove_var("GITHUB_SHA");
            std::env::remove_var("GITHUB_TOKEN");
        }

        let result = post_to_github(&sample_findings(), &[]).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("GITHUB_REPOSITORY"));

        unsafe { std::env::set_var("GITHUB_REPOSITORY", "owner/repo"); }
        let result = post_to_github(&sample_findings(), &[]).await;
        assert!(result.unwrap_err().to_string().contains("GITHUB_PR_NUMBER"));
    }

    #[tokio::test]
    #[serial]
    async fn post_invalid_repository_slug() {
        struct EnvGuard;
        impl Drop for EnvGuard {
            fn drop(&mut self) {
                unsafe { std::env::remove_var("GITHUB_REPOSITORY"); }
            }
        }
        let _guard = EnvGuard;
        unsafe { std::env::set_var("GITHUB_REPOSITORY", "not-a-slug"); }
        let result = post_to_github(&sample_findings(), &[]).await;
        assert!(result.unwrap_err().to_string().contains("invalid repository slug"));
    }
}
