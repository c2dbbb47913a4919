//! Unified diff format parser.
//!
//! Parses the output of `git diff` (unified format) into `Vec<FileDiff>`.

use crate::models::diff::{DiffLine, DiffLineType, FileDiff, Hunk};

/// Parse a unified diff string into a list of file diffs.
pub fn parse_unified_diff(input: &str) -> Vec<FileDiff> {
    let mut files: Vec<FileDiff> = Vec::new();
    let mut lines = input.lines().peekable();

    while let Some(line) = lines.next() {
        // Look for "diff --git a/... b/..."
        if !line.starts_with("diff --git ") {
            continue;
        }

        let (old_path, new_path) = parse_diff_header(line);
        let mut is_new = false;
        let mut is_deleted = false;
        let mut is_rename = false;
        let mut is_binary = false;
        let mut hunks: Vec<Hunk> = Vec::new();

        // Parse extended headers until we hit a hunk or another diff
        while let Some(&next) = lines.peek() {
            if next.starts_with("diff --git ") {
                break;
            }
            if next.starts_with("new file mode") {
                is_new = true;
                lines.next();
            } else if next.starts_with("deleted file mode") {
                is_deleted = true;
                lines.next();
            } else if next.starts_with("rename from") || next.starts_with("rename to") {
                is_rename = true;
                lines.next();
            } else if next.starts_with("similarity index") || next.starts_with("dissimilarity index") {
                lines.next();
            } else if next.starts_with("index ") {
                lines.next();
            } else if next.contains("Binary files") {
                is_binary = true;
                lines.next();
            } else if next.starts_with("---") || next.starts_with("+++") {
                // File path lines before hunks
                lines.next();
            } else if next.starts_with("@@") {
                // Parse hunk
                if let Some(hunk) = parse_hunk(&mut lines) {
                    hunks.push(hunk);
                }
            } else {
                lines.next();
            }
        }

        files.push(FileDiff {
            old_path,
            new_path,
            is_new,
            is_deleted,
            is_rename,
            is_binary,
            hunks,
        });
    }

    files
}

/// Parse the "diff --git a/path b/path" header line.
fn parse_diff_header(line: &str) -> (String, String) {
    let rest = line.strip_prefix("diff --git ").unwrap_or(line);

    // Handle paths with spaces by finding the second prefix separator
    // Paths are prefixed with a/ and b/ (default), or c/w/i/o/ when
    // git's diff.mnemonicPrefix is enabled.
    if let Some(b_idx) = find_second_prefix(rest) {
        let a_part = &rest[..b_idx];
        let b_part = &rest[b_idx + 1..]; // skip the space

        let old_path = strip_diff_prefix(a_part).to_string();
        let new_path = strip_diff_prefix(b_part).to_string();
        (old_path, new_path)
    } else {
        // Fallback: split on space
        let parts: Vec<&str> = rest.splitn(2, ' ').collect();
        let old_path = strip_diff_prefix(parts.first().unwrap_or(&"")).to_string();
        let new_path = strip_diff_prefix(parts.get(1).unwrap_or(&"")).to_string();
        (old_path, new_path)
    }
}

/// Strip a single-character git diff prefix (`a/`, `b/`, `c/`, `w/`, `i/`, `o/`).
///
/// These prefixes appear in `diff --git` headers:
/// - `a/` and `b/` are the defaults.
/// - `c/` (commit), `w/` (working tree), `i/` (index), `o/` (object)
///   are used when `diff.mnemonicPrefix` is enabled.
fn strip_diff_prefix(path: &str) -> &str {
    if path.len() >= 2 {
        let bytes = path.as_bytes();
        if bytes[1] == b'/' && matches!(bytes[0], b'a' | b'b' | b'c' | b'w' | b'i' | b'o') {
            return &path[2..];
        }
    }
    path
}

/// Find the position of the second path prefix separator in a diff header.
///
/// Looks for ` X/` where X is any known single-letter prefix (`a`..`o`).
fn find_second_prefix(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    for i in 1..bytes.len().saturating_sub(1) {
        if bytes[i] == b' '
            && bytes.get(i + 2) == Some(&b'/')
            && matches!(bytes.get(i + 1), Some(b'a' | b'b' | b'c' | b'w' | b'i' | b'o'))
        {
            return Some(i);
        }
    }
    None
}

/// Parse a single hunk starting with @@ line.
fn parse_hunk(lines: &mut std::iter::Peekable<std::str::Lines<'_>>) -> Option<Hunk> {
    let header_line = lines.next()?;
    let (old_start, old_count, new_start, new_count, header) = parse_hunk_header(header_line)?;

    let mut hunk_lines: Vec<DiffLine> = Vec::new();
    let mut old_line = old_start;
    let mut new_line = new_start;

    while let Some(&next) = lines.peek() {
        if next.starts_with("diff --git ") || next.starts_with("@@") {
            break;
        }

        let line = lines.next().unwrap();

        if let Some(content) = line.strip_prefix('+') {
            hunk_lines.push(DiffLine {
                line_type: DiffLineType::Added,
                content: content.to_string(),
                old_line_no: None,
                new_line_no: Some(new_line),
            });
            new_line += 1;
        } else if let Some(content) = line.strip_prefix('-') {
            hunk_lines.push(DiffLine {
                line_type: DiffLineType::Removed,
                content: content.to_string(),
                old_line_no: Some(old_line),
                new_line_no: None,
            });
            old_line += 1;
        } else if line.starts_with(' ') || line.is_empty() {
            let content = if line.is_empty() {
                String::new()
            } else {
                line[1..].to_string()
            };
            hunk_lines.push(DiffLine {
                line_type: DiffLineType::Context,
                content,
                old_line_no: Some(old_line),
                new_line_no: Some(new_line),
            });
            old_line += 1;
            new_line += 1;
        } else if line.starts_with('\\') {
            // "\ No newline at end of file" â€” skip
            continue;
        } else {
            // Unknown line format, stop parsing this hunk
            break;
        }
    }

    Some(Hunk {
        old_start,
        old_count,
        new_start,
        new_count,
        header,
        lines: hunk_lines,
    })
}

/// Parse a `@@ -old_start,old_count +new_start,new_count @@ header` line.
fn parse_hunk_header(line: &str) -> Option<(u32, u32, u32, u32, Option<String>)> {
    let line = line.strip_prefix("@@ ")?;
    let end = line.find(" @@")?;
    let range_part = &line[..end];
    let header = {
        let rest = &line[end + 3..];
        if rest.is_empty() {
            None
        } else {
            Some(rest.trim().to_string())
        }
    };

    let parts: Vec<&str> = range_part.split(' ').collect();
    if parts.len() != 2 {
        return None;
    }

    let (old_start, old_count) = parse_range(parts[0].strip_prefix('-')?)?;
    let (new_start, new_count) = parse_range(parts[1].strip_prefix('+')?)?;

    Some((old_start, old_count, new_start, new_count, header))
}

/// Parse "start,count" or "start" (count defaults to 1).
fn parse_range(s: &str) -> Option<(u32, u32)> {
    if let Some((start, count)) = s.split_once(',') {
        Some((start.parse().ok()?, count.parse().ok()?))
    } else {
        Some((s.parse().ok()?, 1))
    }
}
