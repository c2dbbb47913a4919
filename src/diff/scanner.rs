//! File and directory scanner for direct review mode.
//!
//! When `--path` is used, we scan files and create synthetic diffs
//! treating all content as "added" for review purposes.

use std::path::Path;

use ignore::WalkBuilder;

use crate::models::diff::{DiffLine, DiffLineType, FileDiff, Hunk};

use super::DiffError;

/// Scan a file or directory and produce synthetic file diffs for review.
pub async fn scan_path(path: &Path) -> Result<Vec<FileDiff>, DiffError> {
    if !path.exists() {
        return Err(DiffError::PathNotFound(path.display().to_string()));
    }

    let mut diffs = Vec::new();

    if path.is_file() {
        if let Some(diff) = scan_single_file(path).await? {
            diffs.push(diff);
        }
    } else if path.is_dir() {
        let walker = WalkBuilder::new(path).hidden(true).git_ignore(true).build();

        for entry in walker.flatten() {
            if entry.file_type().map_or(true, |ft| !ft.is_file()) {
                continue;
            }
            if let Some(diff) = scan_single_file(entry.path()).await? {
                diffs.push(diff);
            }
        }
    }

    Ok(diffs)
}

/// Create a synthetic diff for a single file (all lines as "added").
async fn scan_single_file(path: &Path) -> Result<Option<FileDiff>, DiffError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(c) => c,
        Err(_) => return Ok(None), // Skip binary or unreadable files
    };

    if content.is_empty() {
        return Ok(None);
    }

    let lines: Vec<DiffLine> = content
        .lines()
        .enumerate()
        .map(|(i, line)| DiffLine {
            line_type: DiffLineType::Added,
            content: line.to_string(),
            old_line_no: None,
            new_line_no: Some(i as u32 + 1),
        })
        .collect();

    let line_count = lines.len() as u32;
    let path_str = path.display().to_string();

    Ok(Some(FileDiff {
        old_path: "/dev/null".to_string(),
        new_path: path_str,
        is_new: true,
        is_deleted: false,
        is_rename: false,
        is_binary: false,
        hunks: vec![Hunk {
            old_start: 0,
            old_count: 0,
            new_start: 1,
            new_count: line_count,
            header: None,
            lines,
        }],
    }))
}
