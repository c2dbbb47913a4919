//! Free-text sanitization applied to every finding before any reporter
//! sees it, and secret redaction for diff content handed to LLM agents.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::finding::Finding;

const MESSAGE_MAX: usize = 4000;
const SUGGESTION_MAX: usize = 2000;
const RULE_ID_MAX: usize = 200;

/// Sanitize a finding's free-text fields in place: HTML-escape
/// `message`/`suggestion`, strip NUL bytes everywhere, rewrite dangerous
/// URL prefixes, and truncate to the field-specific limit.
///
/// Idempotent: calling this twice on an already-sanitized finding is a
/// no-op (property 9).
pub fn sanitize_finding(finding: &mut Finding) {
    finding.message = sanitize_text(&finding.message, MESSAGE_MAX);
    finding.suggestion = finding
        .suggestion
        .as_deref()
        .map(|s| sanitize_text(s, SUGGESTION_MAX));
    finding.rule_id = finding
        .rule_id
        .as_deref()
        .map(|s| truncate_with_ellipsis(&strip_nul(s), RULE_ID_MAX));
}

/// NUL-strip, rewrite dangerous URL prefixes, HTML-escape, then
/// truncate. Each step is order-sensitive to keep the whole pipeline a
/// fixed point under repeated application.
fn sanitize_text(raw: &str, max_len: usize) -> String {
    let stripped = strip_nul(raw);
    let url_safe = rewrite_dangerous_urls(&stripped);
    let escaped = html_escape(&url_safe);
    truncate_with_ellipsis(&escaped, max_len)
}

fn strip_nul(s: &str) -> String {
    if s.contains('\0') {
        s.chars().filter(|&c| c != '\0').collect()
    } else {
        s.to_string()
    }
}

/// HTML-escape `<`, `>`, `&`, `"`, `'`. Recognizes the five entities it
/// produces and leaves them untouched, so re-escaping already-escaped
/// text is a no-op rather than double-encoding.
fn html_escape(s: &str) -> String {
    const ENTITIES: [&str; 5] = ["&lt;", "&gt;", "&amp;", "&quot;", "&#39;"];
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while !rest.is_empty() {
        if rest.starts_with('&') {
            if let Some(entity) = ENTITIES.iter().find(|e| rest.starts_with(**e)) {
                out.push_str(entity);
                rest = &rest[entity.len()..];
                continue;
            }
            out.push_str("&amp;");
            rest = &rest[1..];
            continue;
        }
        let ch = rest.chars().next().expect("rest is non-empty");
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
        rest = &rest[ch.len_utf8()..];
    }
    out
}

fn dangerous_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(javascript|data|vbscript):").expect("fixed pattern"))
}

/// Rewrite `javascript:`, `data:`, `vbscript:` (case-insensitive) to
/// their `-blocked:` variants, wherever they occur.
fn rewrite_dangerous_urls(s: &str) -> String {
    dangerous_url_regex()
        .replace_all(s, |caps: &regex::Captures| {
            format!("{}-blocked:", caps[1].to_lowercase())
        })
        .to_string()
}

/// Truncate to at most `max` chars total (including the `"..."` suffix
/// when cut), never leaving a dangling partial HTML entity at the
/// boundary.
fn truncate_with_ellipsis(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut truncated: String = s.chars().take(keep).collect();
    if let Some(amp_pos) = truncated.rfind('&') {
        if !truncated[amp_pos..].contains(';') {
            truncated.truncate(amp_pos);
        }
    }
    truncated.push_str("...");
    truncated
}

/// Bounded summary of what a diff-for-LLM cap trimmed.
#[derive(Debug, Clone, Default)]
pub struct DiffLimitInfo {
    pub files_included: usize,
    pub files_total: usize,
    pub lines_included: usize,
    pub lines_total: usize,
    pub limit_hit: Option<&'static str>,
}

const MAX_FILES: usize = 50;
const MAX_LINES: usize = 2000;

/// Redact secret-like patterns from diff content, sort files
/// alphabetically, and cap the result at 50 files / 2000 lines for
/// determinism and to bound what an LLM agent ever sees.
pub fn sanitize_diff_for_llm(mut files: Vec<(String, String)>) -> (Vec<(String, String)>, DiffLimitInfo) {
    files.sort_by(|a, b| a.0.cmp(&b.0));
    let files_total = files.len();
    let lines_total: usize = files.iter().map(|(_, c)| c.lines().count()).sum();

    let mut out = Vec::new();
    let mut lines_included = 0usize;
    let mut limit_hit = None;

    for (path, content) in files {
        if out.len() >= MAX_FILES {
            limit_hit = Some("files");
            break;
        }
        let redacted = redact_secrets(&content);
        let file_lines = redacted.lines().count();
        if lines_included + file_lines > MAX_LINES {
            let remaining = MAX_LINES.saturating_sub(lines_included);
            if remaining > 0 {
                let partial: String = redacted.lines().take(remaining).collect::<Vec<_>>().join("\n");
                lines_included += remaining;
                out.push((path, partial));
            }
            limit_hit = Some("lines");
            break;
        }
        lines_included += file_lines;
        out.push((path, redacted));
    }

    let files_included = out.len();
    (
        out,
        DiffLimitInfo {
            files_included,
            files_total,
            lines_included,
            lines_total,
            limit_hit,
        },
    )
}

fn secret_patterns() -> &'static Vec<Regex> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            Regex::new(r"(?i)authorization:\s*bearer\s+\S+").expect("fixed pattern"),
            Regex::new(r"\b[A-Z_][A-Z0-9_]*_(?:TOKEN|KEY|SECRET)\s*=\s*\S+").expect("fixed pattern"),
            Regex::new(r"\bsk-[A-Za-z0-9_\-]{10,}\b").expect("fixed pattern"),
            Regex::new(r"\bghp_[A-Za-z0-9]{20,}\b").expect("fixed pattern"),
            Regex::new(r"\bAKIA[0-9A-Z]{16}\b").expect("fixed pattern"),
        ]
    })
}

/// Redact secret-like prefix tokens, env-style assignments, and bearer
/// auth headers to `[REDACTED]`.
fn redact_secrets(text: &str) -> String {
    let mut out = text.to_string();
    for re in secret_patterns() {
        out = re.replace_all(&out, "[REDACTED]").to_string();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::finding::Severity;

    fn finding(message: &str, suggestion: Option<&str>, rule_id: Option<&str>) -> Finding {
        Finding {
            file: "a.rs".into(),
            line: 1,
            end_line: None,
            severity: Severity::Warning,
            title: "t".into(),
            message: message.to_string(),
            suggestion: suggestion.map(str::to_string),
            agent: "a".into(),
            rule_id: rule_id.map(str::to_string),
            fingerprint: None,
            provenance: crate::models::finding::Provenance::Complete,
        }
    }

    #[test]
    fn escapes_html_special_chars() {
        let out = sanitize_text("<script>\"it's\" & run</script>", MESSAGE_MAX);
        assert!(!out.contains('<'));
        assert!(!out.contains('>'));
        assert!(out.contains("&lt;script&gt;"));
        assert!(out.contains("&amp;"));
        assert!(out.contains("&quot;"));
        assert!(out.contains("&#39;"));
    }

    #[test]
    fn strips_nul_bytes() {
        let out = sanitize_text("hello\0world", MESSAGE_MAX);
        assert!(!out.contains('\0'));
    }

    #[test]
    fn truncates_with_ellipsis_at_exact_max_length() {
        let long = "x".repeat(MESSAGE_MAX + 100);
        let out = sanitize_text(&long, MESSAGE_MAX);
        assert_eq!(out.chars().count(), MESSAGE_MAX);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn short_text_untouched_by_truncation() {
        let short = "hello";
        let out = sanitize_text(short, MESSAGE_MAX);
        assert_eq!(out, "hello");
    }

    #[test]
    fn rewrites_dangerous_url_prefixes() {
        let out = sanitize_text("click javascript:alert(1) or DATA:text/html", MESSAGE_MAX);
        assert!(out.contains("javascript-blocked:"));
        assert!(out.contains("data-blocked:"));
        assert!(!out.to_lowercase().contains("javascript:alert"));
    }

    #[test]
    fn sanitize_is_idempotent() {
        let inputs = [
            "<script>alert(1)</script>",
            "plain text",
            &"y".repeat(5000),
            "javascript:void(0)",
            "tab\0separated\0nul",
            "already &amp; escaped &lt;tag&gt;",
        ];
        for input in inputs {
            let once = sanitize_text(input, MESSAGE_MAX);
            let twice = sanitize_text(&once, MESSAGE_MAX);
            assert_eq!(once, twice, "not idempotent for input: {input:?}");
            assert!(!twice.contains("<script"));
            assert!(!twice.to_lowercase().contains("javascript:"));
            assert!(!twice.contains('\0'));
        }
    }

    #[test]
    fn sanitize_finding_applies_per_field_limits() {
        let mut f = finding(
            &"m".repeat(5000),
            Some(&"s".repeat(3000)),
            Some(&"r".repeat(500)),
        );
        sanitize_finding(&mut f);
        assert_eq!(f.message.chars().count(), MESSAGE_MAX);
        assert_eq!(f.suggestion.unwrap().chars().count(), SUGGESTION_MAX);
        assert_eq!(f.rule_id.unwrap().chars().count(), RULE_ID_MAX);
    }

    #[test]
    fn sanitize_finding_leaves_none_suggestion_as_none() {
        let mut f = finding("msg", None, None);
        sanitize_finding(&mut f);
        assert!(f.suggestion.is_none());
    }

    #[test]
    fn redacts_bearer_tokens_and_env_assignments() {
        let text = "Authorization: Bearer abc123xyz\nGITHUB_TOKEN=ghp_abcdefghijklmnopqrstuvwxyz01";
        let out = redact_secrets(text);
        assert!(!out.contains("abc123xyz"));
        assert!(out.contains("[REDACTED]"));
    }

    #[test]
    fn diff_for_llm_sorts_and_caps_files() {
        let files: Vec<(String, String)> = (0..60)
            .map(|i| (format!("file{i:03}.rs"), "line1\n".to_string()))
            .collect();
        let (out, info) = sanitize_diff_for_llm(files);
        assert_eq!(out.len(), MAX_FILES);
        assert_eq!(info.limit_hit, Some("files"));
        assert_eq!(info.files_total, 60);
        // sorted alphabetically
        assert!(out.windows(2).all(|w| w[0].0 <= w[1].0));
    }

    #[test]
    fn diff_for_llm_caps_lines() {
        let files = vec![
            ("a.rs".to_string(), "x\n".repeat(1500)),
            ("b.rs".to_string(), "x\n".repeat(1500)),
        ];
        let (out, info) = sanitize_diff_for_llm(files);
        assert_eq!(info.limit_hit, Some("lines"));
        let total_lines: usize = out.iter().map(|(_, c)| c.lines().count()).sum();
        assert!(total_lines <= MAX_LINES);
    }

    #[test]
    fn diff_for_llm_under_limits_passes_through() {
        let files = vec![("a.rs".to_string(), "one\ntwo\n".to_string())];
        let (out, info) = sanitize_diff_for_llm(files);
        assert_eq!(out.len(), 1);
        assert_eq!(info.limit_hit, None);
        assert_eq!(info.files_included, 1);
    }
}
