//! Azure DevOps Pull Request thread renderer and poster/reconciler.
//!
//! Mirrors `output::github`'s structure but against the Azure DevOps
//! Pull Request Threads API: comments are grouped into threads anchored
//! by `threadContext.rightFileStart/rightFileEnd` (never `leftFile*`),
//! and thread status transitions through `active`/`fixed`/`closed`/
//! `wontFix`/`byDesign`/`pending` instead of GitHub's flat comment body
//! rewrite.

use thiserror::Error;

use crate::finding::fingerprint::{dedupe_key, extract_markers, DedupeKey};
use crate::models::finding::{Finding, Severity, Summary};
use crate::output::OutputRenderer;
use crate::reconcile::{
    build_ado_thread_context, build_comment_body, decide_resolution, log_resolution, next_state,
    rewrite_partial_resolution, scan_markers, AdoThreadStatus, CommentState, PriorComment,
};

/// Errors from the Azure DevOps API.
#[derive(Error, Debug)]
pub enum AdoError {
    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("API request failed: {0}")]
    ApiError(String),
}

/// Azure DevOps thread renderer.
///
/// The synchronous `render()` method outputs the JSON array of thread
/// payloads the engine would create, for inspection or piping. For
/// actually posting to the API, use [`post_to_ado`].
pub struct AdoRenderer;

impl OutputRenderer for AdoRenderer {
    fn render(&self, findings: &[Finding]) -> String {
        let threads: Vec<serde_json::Value> = findings
            .iter()
            .map(|f| {
                let key = dedupe_key(f);
                let ctx = build_ado_thread_context(f.line, f.end_line);
                let body = build_comment_body(&[(f.clone(), key)]);
                thread_payload(f, &ctx, &body, AdoThreadStatus::Active)
            })
            .collect();

        serde_json::to_string_pretty(&threads).unwrap_or_else(|_| "[]".to_string())
    }
}

fn status_label(status: AdoThreadStatus) -> &'static str {
    match status {
        AdoThreadStatus::Active => "active",
        AdoThreadStatus::Fixed => "fixed",
        AdoThreadStatus::Closed => "closed",
        AdoThreadStatus::WontFix => "wontFix",
        AdoThreadStatus::ByDesign => "byDesign",
        AdoThreadStatus::Pending => "pending",
    }
}

fn thread_payload(
    f: &Finding,
    ctx: &crate::reconcile::AdoThreadContext,
    body: &str,
    status: AdoThreadStatus,
) -> serde_json::Value {
    let mut thread_context = serde_json::json!({ "rightFileStart": { "line": ctx.right_file_start, "offset": 1 } });
    if let Some(end) = ctx.right_file_end {
        thread_context["rightFileEnd"] = serde_json::json!({ "line": end, "offset": 1 });
    }
    serde_json::json!({
        "comments": [{ "content": body, "commentType": 1 }],
        "status": status_label(status),
        "threadContext": thread_context,
        "pullRequestThreadContext": { "filePath": f.file },
    })
}

fn require_env(name: &str) -> Result<String, AdoError> {
    std::env::var(name).map_err(|_| AdoError::MissingEnvVar(name.into()))
}

/// Post findings as Azure DevOps pull request threads, reconciling prior
/// threads' status against this run's fingerprint markers.
///
/// # Required environment variables
///
/// | Variable | Source |
/// |---|---|
/// | `SYSTEM_COLLECTIONURI` | Pipeline built-in |
/// | `SYSTEM_TEAMPROJECT` | Pipeline built-in |
/// | `BUILD_REPOSITORY_NAME` | Pipeline built-in |
/// | `SYSTEM_PULLREQUEST_PULLREQUESTID` | Pipeline built-in |
/// | `SYSTEM_ACCESSTOKEN` | Pipeline OAuth token (enable in pipeline settings) |
pub async fn post_to_ado(
    findings: &[Finding],
    prior_comments: &[PriorComment],
) -> Result<(), AdoError> {
    post_to_ado_with_summary(findings, prior_comments, false).await
}

/// Like [`post_to_ado`], but also creates a general (no `threadContext`)
/// thread carrying an aggregate summary when `post_summary` is true.
pub async fn post_to_ado_with_summary(
    findings: &[Finding],
    prior_comments: &[PriorComment],
    post_summary: bool,
) -> Result<(), AdoError> {
    let collection_uri = require_env("SYSTEM_COLLECTIONURI")?;
    let project = require_env("SYSTEM_TEAMPROJECT")?;
    let repo = require_env("BUILD_REPOSITORY_NAME")?;
    let pr_id = require_env("SYSTEM_PULLREQUEST_PULLREQUESTID")?;
    let token = require_env("SYSTEM_ACCESSTOKEN")?;

    let base = format!(
        "{}{}/_apis/git/repositories/{}/pullRequests/{}/threads",
        collection_uri.trim_end_matches('/'),
        project,
        repo,
        pr_id,
    );

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
        log_resolution("ado", &prior.comment_id, scan.valid.len(), stale.len(), &outcome);
        let state = next_state(CommentState::OpenActive, &outcome);
        let new_status = match state {
            CommentState::Resolved => Some(AdoThreadStatus::Fixed),
            CommentState::OpenPartial => {
                let new_body = rewrite_partial_resolution(&prior.body, &scan.valid, &stale);
                patch_thread_comment(&base, &token, &prior.comment_id, &new_body).await?;
                None
            }
            CommentState::OpenActive => None,
        };
        if let Some(status) = new_status {
            patch_thread_status(&base, &token, &prior.comment_id, status).await?;
        }
    }

    for f in findings {
        let key = dedupe_key(f);
        let ctx = build_ado_thread_context(f.line, f.end_line);
        let body = build_comment_body(&[(f.clone(), key)]);
        let payload = thread_payload(f, &ctx, &body, AdoThreadStatus::Active);
        create_thread(&base, &token, &payload).await?;
    }

    if post_summary {
        let payload = serde_json::json!({
            "comments": [{ "content": summary_body(findings), "commentType": 1 }],
            "status": status_label(AdoThreadStatus::Active),
        });
        create_thread(&base, &token, &payload).await?;
    }

    Ok(())
}

/// Build the aggregate summary used for the general (no `threadContext`)
/// summary thread.
fn summary_body(findings: &[Finding]) -> String {
    let summary = Summary::from_findings(findings);
    format!(
        "**Review summary:** {} finding(s) — {} error(s), {} warning(s), {} info",
        summary.total, summary.errors, summary.warnings, summary.info,
    )
}

/// `SYSTEM_ACCESSTOKEN` is the pipeline's scoped OAuth token; Azure DevOps
/// accepts it as a bearer token directly, no basic-auth encoding needed.
fn auth_header(token: &str) -> String {
    format!("Bearer {token}")
}

async fn create_thread(base_url: &str, token: &str, payload: &serde_json::Value) -> Result<(), AdoError> {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{base_url}?api-version=7.1"))
        .header("Authorization", auth_header(token))
        .header("Content-Type", "application/json")
        .json(payload)
        .send()
        .await
        .map_err(|e| AdoError::ApiError(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_else(|_| "<no body>".to_string());
        return Err(AdoError::ApiError(format!("thread creation failed with HTTP {status}: {body}")));
    }
    Ok(())
}

async fn patch_thread_status(
    base_url: &str,
    token: &str,
    thread_id: &str,
    status: AdoThreadStatus,
) -> Result<(), AdoError> {
    let client = reqwest::Client::new();
    let response = client
        .patch(format!("{base_url}/{thread_id}?api-version=7.1"))
        .header("Authorization", auth_header(token))
        .header("Content-Type", "application/json")
        .json(&serde_json::json!({ "status": status_label(status) }))
        .send()
        .await
        .map_err(|e| AdoError::ApiError(e.to_string()))?;

    if !response.status().is_success() {
        let status_code = response.status();
        let body = response.text().await.unwrap_or_else(|_| "<no body>".to_string());
        return Err(AdoError::ApiError(format!("thread status update failed with HTTP {status_code}: {body}")));
    }
    Ok(())
}

async fn patch_thread_comment(
    base_url: &str,
    token: &str,
    thread_id: &str,
    body: &str,
) -> Result<(), AdoError> {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{base_url}/{thread_id}/comments?api-version=7.1"))
        .header("Authorization", auth_header(token))
        .header("Content-Type", "application/json")
        .json(&serde_json::json!({ "content": body, "commentType": 1 }))
        .send()
        .await
        .map_err(|e| AdoError::ApiError(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let resp_body = response.text().await.unwrap_or_else(|_| "<no body>".to_string());
        return Err(AdoError::ApiError(format!("comment update failed with HTTP {status}: {resp_body}")));
    }
    Ok(())
}

/// Extract fingerprint markers from an existing thread comment, for
/// callers building [`PriorComment`] values from fetched threads.
pub fn markers_in(body: &str) -> Vec<DedupeKey> {
    extract_markers(body)
}

/// Fetch this PR's existing threads, one [`PriorComment`] per thread using
/// its first comment — mirroring how [`post_to_ado`] addresses threads by
/// the id of the comment created alongside them.
pub async fn fetch_prior_comments() -> Result<Vec<PriorComment>, AdoError> {
    let collection_uri = require_env("SYSTEM_COLLECTIONURI")?;
    let project = require_env("SYSTEM_TEAMPROJECT")?;
    let repo = require_env("BUILD_REPOSITORY_NAME")?;
    let pr_id = require_env("SYSTEM_PULLREQUEST_PULLREQUESTID")?;
    let token = require_env("SYSTEM_ACCESSTOKEN")?;

    let base = format!(
        "{}{}/_apis/git/repositories/{}/pullRequests/{}/threads",
        collection_uri.trim_end_matches('/'),
        project,
        repo,
        pr_id,
    );

    let client = reqwest::Client::new();
    let response = client
        .get(format!("{base}?api-version=7.1"))
        .header("Authorization", auth_header(&token))
        .send()
        .await
        .map_err(|e| AdoError::ApiError(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_else(|_| "<no body>".to_string());
        return Err(AdoError::ApiError(format!("list threads failed with HTTP {status}: {body}")));
    }

    let payload: serde_json::Value = response
        .json()
        .await
        .map_err(|e| AdoError::ApiError(e.to_string()))?;

    let mut comments = Vec::new();
    for thread in payload["value"].as_array().into_iter().flatten() {
        // Only threads anchored to a file (rightFileStart set) carry our
        // fingerprint markers — general/system threads have no context.
        if thread["threadContext"].is_null() {
            continue;
        }
        let Some(thread_id) = thread["id"].as_u64() else {
            continue;
        };
        let Some(first_comment) = thread["comments"].as_array().and_then(|c| c.first()) else {
            continue;
        };
        let Some(content) = first_comment["content"].as_str() else {
            continue;
        };
        comments.push(PriorComment {
            comment_id: thread_id.to_string(),
            body: content.to_string(),
        });
    }

    Ok(comments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn sample_findings() -> Vec<Finding> {
        vec![Finding {
            file: "src/main.rs".to_string(),
            line: 10,
            end_line: Some(12),
            severity: Severity::Error,
            title: "Bug".to_string(),
            message: "A bug was found".to_string(),
            suggestion: None,
            agent: "backend".to_string(),
            rule_id: None,
            fingerprint: None,
            provenance: crate::models::finding::Provenance::Complete,
        }]
    }

    #[test]
    fn render_produces_thread_with_right_file_range() {
        let output = AdoRenderer.render(&sample_findings());
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0]["status"], "active");
        assert_eq!(parsed[0]["threadContext"]["rightFileStart"]["line"], 10);
        assert_eq!(parsed[0]["threadContext"]["rightFileEnd"]["line"], 12);
        assert!(parsed[0]["threadContext"].get("leftFileStart").is_none());
        assert!(parsed[0]["threadContext"].get("leftFileEnd").is_none());
    }

    #[test]
    fn render_single_line_omits_right_file_end() {
        let findings = vec![Finding {
            file: "f.rs".into(),
            line: 5,
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
        let output = AdoRenderer.render(&findings);
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&output).unwrap();
        assert!(parsed[0]["threadContext"].get("rightFileEnd").is_none());
    }

    #[test]
    fn render_empty_findings() {
        let output = AdoRenderer.render(&[]);
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&output).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn summary_body_reports_counts() {
        let body = summary_body(&sample_findings());
        assert!(body.contains("1 finding(s)"));
        assert!(body.contains("1 error(s)"));
    }

    #[tokio::test]
    #[serial]
    async fn fetch_prior_comments_missing_env_errors() {
        struct EnvGuard;
        impl Drop for EnvGuard {
            fn drop(&mut self) {
                unsafe { std::env::remove_var("SYSTEM_COLLECTIONURI"); }
            }
        }
        let _guard = EnvGuard;
        unsafe { std::env::remove_var("SYSTEM_COLLECTIONURI"); }
        let result = fetch_prior_comments().await;
        assert!(result.unwrap_err().to_string().contains("SYSTEM_COLLECTIONURI"));
    }

    #[tokio::test]
    #[serial]
    async fn post_missing_env_vars_cascade() {
        struct EnvGuard;
        impl Drop for EnvGuard {
            fn drop(&mut self) {
                unsafe {
                    std::env::remove_var("SYSTEM_COLLECTIONURI");
                    std::env::remove_var("SYSTEM_TEAMPROJECT");
                    std::env::remove_var("BUILD_REPOSITORY_NAME");
                    std::env::remove_var("SYSTEM_PULLREQUEST_PULLREQUESTID");
                    std::env::remove_var("SYSTEM_ACCESSTOKEN");
                }
            }
        }
        let _guard = EnvGuard;
        unsafe {
            std::env::remove_var("SYSTEM_COLLECTIONURI");
        }
        let result = post_to_ado(&sample_findings(), &[]).await;
        assert!(result.unwrap_err().to_string().contains("SYSTEM_COLLECTIONURI"));
    }
}
