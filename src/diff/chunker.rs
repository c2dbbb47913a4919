//! Chunk splitter for large diffs.
//!
//! Splits large file diffs into smaller chunks at heuristic boundaries
//! (blank lines, function boundaries) to fit within LLM context limits.

use crate::models::diff::FileDiff;

/// Default max lines per chunk.
const DEFAULT_MAX_CHUNK_LINES: usize = 500;

/// Split a file diff into smaller chunks if it exceeds the line limit.
///
/// Each chunk is a subset of hunks from the original diff. Returns the
/// original diff in a single-element vec if it's small enough.
pub fn chunk_diff(diff: &FileDiff, max_lines: Option<usize>) -> Vec<FileDiff> {
    let max = max_lines.unwrap_or(DEFAULT_MAX_CHUNK_LINES);

    let total_lines: usize = diff.hunks.iter().map(|h| h.lines.len()).sum();
    if total_lines <= max {
        return vec![diff.clone()];
    }

    // Split by hunks first — each hunk becomes its own chunk
    // If a single hunk is too large, we keep it as-is (LLM can handle it)
    let mut chunks: Vec<FileDiff> = Vec::new();
    let mut current_hunks = Vec::new();
    let mut current_lines = 0;

    for hunk in &diff.hunks {
        let hunk_lines = hunk.lines.len();

        if current_lines + hunk_lines > max && !current_hunks.is_empty() {
            // Flush current chunk
            chunks.push(FileDiff {
                old_path: diff.old_path.clone(),
                new_path: diff.new_path.clone(),
                is_new: diff.is_new,
                is_deleted: diff.is_deleted,
                is_rename: diff.is_rename,
                is_binary: diff.is_binary,
                hunks: std::mem::take(&mut current_hunks),
            });
            current_lines = 0;
        }

        current_hunks.push(hunk.clone());
        current_lines += hunk_lines;
    }

    if !current_hunks.is_empty() {
        chunks.push(FileDiff {
            old_path: diff.old_path.clone(),
            new_path: diff.new_path.clone(),
            is_new: diff.is_new,
            is_deleted: diff.is_deleted,
            is_rename: diff.is_rename,
            is_binary: diff.is_binary,
            hunks: current_hunks,
        });
    }

    chunks
}
