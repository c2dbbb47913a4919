//! Diff engine: git CLI wrapper, unified diff parsing, file scanning, and chunk splitting.

pub mod canonical;
pub mod chunker;
pub mod file;
pub mod git;
pub mod parser;
pub mod path_filter;
pub mod rename;
pub mod scanner;

use std::path::Path;
use thiserror::Error;

use crate::models::InputMode;
use crate::models::FileDiff;

/// Errors from the diff engine.
#[derive(Error, Debug)]
#[allow(dead_code)]
pub enum DiffError {
    #[error("git command failed: {0}")]
    GitError(String),

    #[error("failed to read diff file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("diff parse error: {0}")]
    ParseError(String),

    #[error("path not found: {0}")]
    PathNotFound(String),
}

/// Read a unified diff from stdin.
pub async fn read_diff_stdin() -> Result<String, DiffError> {
    use tokio::io::AsyncReadExt;
    let mut buf = String::new();
    tokio::io::stdin()
        .read_to_string(&mut buf)
        .await
        .map_err(DiffError::FileReadError)?;
    Ok(buf)
}

/// Produce a list of file diffs from the given input mode.
pub async fn get_diffs(input: &InputMode, repo_root: &Path) -> Result<Vec<FileDiff>, DiffError> {
    match input {
        InputMode::DiffFile(path) => {
            let content = file::read_diff_file(path).await?;
            Ok(parser::parse_unified_diff(&content))
        }
        InputMode::Stdin => {
            let content = read_diff_stdin().await?;
            Ok(parser::parse_unified_diff(&content))
        }
        InputMode::GitBase(base_ref) => {
            let diff_output = git::git_diff(repo_root, base_ref).await?;
            Ok(parser::parse_unified_diff(&diff_output))
        }
        InputMode::DirectPath(path) => scanner::scan_path(path).await,
    }
}
