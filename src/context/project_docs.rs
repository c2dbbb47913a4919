//! Auto-detect project documentation files.
//!
//! Looks for well-known documentation files in the repo root
//! that provide context for code reviews.

use std::path::Path;

use indexmap::IndexMap;

/// Well-known project documentation filenames.
const PROJECT_DOC_FILES: &[&str] = &[
    "AGENTS.md",
    "ARCHITECTURE.md",
    "CONVENTIONS.md",
    "CONTRIBUTING.md",
    "CLAUDE.md",
    ".github/copilot-instructions.md",
    ".cursorrules",
    "CODING_GUIDELINES.md",
    "STYLE_GUIDE.md",
    "DEVELOPMENT.md",
];

/// Maximum size of a project doc to include (256KB).
const MAX_DOC_SIZE: u64 = 256 * 1024;

/// Detect and load project documentation files from the repo root.
///
/// Pass `exclude` to skip specific filenames (e.g. `["AGENTS.md"]`).
/// The names are matched exactly against the well-known filename list.
pub async fn detect_project_docs(
    repo_root: &Path,
    exclude: &[String],
) -> IndexMap<String, String> {
    let mut docs = IndexMap::new();

    for &filename in PROJECT_DOC_FILES {
        if exclude.iter().any(|e| e == filename) {
            continue;
        }

        let path = repo_root.join(filename);
        if !path.exists() {
            continue;
        }

        // Check file size before reading
        if let Ok(metadata) = tokio::fs::metadata(&path).await {
            if metadata.len() > MAX_DOC_SIZE {
                continue;
            }
        }

        if let Ok(content) = tokio::fs::read_to_string(&path).await {
            docs.insert(filename.to_string(), content);
        }
    }

    docs
}
