//! Git CLI wrapper for producing diffs.
//!
//! Shells out to `git` via `tokio::process::Command`.

use std::path::Path;

use super::DiffError;
use crate::env::Env;

/// Run `git diff <base_ref>` and return the unified diff output.
pub async fn git_diff(repo_root: &Path, base_ref: &str) -> Result<String, DiffError> {
    let output = tokio::process::Command::new("git")
        .args(["diff", "--src-prefix=a/", "--dst-prefix=b/", base_ref])
        .current_dir(repo_root)
        .output()
        .await
        .map_err(|e| DiffError::GitError(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DiffError::GitError(format!(
            "git diff failed (exit {}): {stderr}",
            output.status
        )));
    }

    String::from_utf8(output.stdout)
        .map_err(|e| DiffError::GitError(format!("git output is not valid UTF-8: {e}")))
}

/// Detect the current branch or review scope.
///
/// Tries, in order:
/// 1. `git rev-parse --abbrev-ref HEAD` (returns branch name, or `HEAD` when detached)
/// 2. CI-specific environment variables (`GITHUB_HEAD_REF`, `CI_COMMIT_BRANCH`,
///    `BITBUCKET_BRANCH`, `CI_BRANCH`)
/// 3. Returns an empty string when nothing is available.
///
/// The result is used to scope sidecar `.meta` files so that parallel
/// PRs/branches reviewing the same file don't cross-contaminate prior findings.
pub async fn detect_branch(repo_root: &Path, env: &Env) -> String {
    // Try git first
    if let Ok(output) = tokio::process::Command::new("git")
        .args(["rev-parse", "--abbrev-ref", "HEAD"])
        .current_dir(repo_root)
        .output()
        .await
    {
        if output.status.success() {
            let branch = String::from_utf8_lossy(&output.stdout).trim().to_string();
            // "HEAD" means detached — fall through to CI env vars
            if !branch.is_empty() && branch != "HEAD" {
                return branch;
            }
        }
    }

    // CI env var fallback (detached HEAD is common in CI)
    for var in &[
        "GITHUB_HEAD_REF",
        "CI_COMMIT_BRANCH",
        "CI_MERGE_REQUEST_SOURCE_BRANCH_NAME",
        "BITBUCKET_BRANCH",
        "CI_BRANCH",
    ] {
        if let Ok(val) = env.var(var) {
            let val = val.trim().to_string();
            if !val.is_empty() {
                return val;
            }
        }
    }

    String::new()
}

/// Find the root of the git repository containing `start_dir`.
pub async fn find_repo_root(start_dir: &Path) -> Result<String, DiffError> {
    let output = tokio::process::Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .current_dir(start_dir)
        .output()
        .await
        .map_err(|e| DiffError::GitError(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DiffError::GitError(format!(
            "not a git repository: {stderr}"
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
