//! Comment composition, inline payload shaping, and the per-comment
//! resolution state machine that closes out or strikes through prior
//! comments whose findings have disappeared.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::finding::fingerprint::{build_marker, extract_markers, DedupeKey};
use crate::models::finding::{Finding, Severity};

/// The only side the engine ever addresses a comment to. Modelled as a
/// single-variant enum rather than a bool or string so a `side: LEFT`
/// payload cannot be constructed at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffSide {
    Right,
}

impl std::fmt::Display for DiffSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RIGHT")
    }
}

/// GitHub review-comment payload. Has no `left_*` fields at all, so the
/// right-side invariant (spec property 6) holds structurally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineCommentPayload {
    pub path: String,
    pub line: u32,
    pub side: DiffSide,
    pub start_line: Option<u32>,
    pub start_side: Option<DiffSide>,
    pub commit_id: String,
}

/// Build the right-side inline payload for one finding. Single-line
/// findings omit `start_*`; multi-line findings (`end_line > line`) set
/// `start_line`/`start_side` and use `end_line` as `line`.
pub fn build_inline_payload(
    path: &str,
    line: u32,
    end_line: Option<u32>,
    commit_id: &str,
) -> InlineCommentPayload {
    match end_line {
        Some(end) if end > line => InlineCommentPayload {
            path: path.to_string(),
            line: end,
            side: DiffSide::Right,
            start_line: Some(line),
            start_side: Some(DiffSide::Right),
            commit_id: commit_id.to_string(),
        },
        _ => InlineCommentPayload {
            path: path.to_string(),
            line,
            side: DiffSide::Right,
            start_line: None,
            start_side: None,
            commit_id: commit_id.to_string(),
        },
    }
}

/// Azure DevOps thread `threadContext`. Only `right_file_*` fields
/// exist; there is no `left_file_start`/`left_file_end` to accidentally
/// populate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdoThreadContext {
    pub right_file_start: u32,
    pub right_file_end: Option<u32>,
}

pub fn build_ado_thread_context(line: u32, end_line: Option<u32>) -> AdoThreadContext {
    AdoThreadContext {
        right_file_start: line,
        right_file_end: end_line.filter(|&end| end > line),
    }
}

/// ADO thread status values the engine transitions between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdoThreadStatus {
    Active,
    Fixed,
    Closed,
    WontFix,
    ByDesign,
    Pending,
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "Error",
        Severity::Warning => "Warning",
        Severity::Info => "Info",
    }
}

/// Compose the body for one or more findings grouped onto a single
/// comment (proximity grouping happens upstream). A single item gets a
/// prose body; multiple items get a numbered list. Every item's
/// fingerprint marker is appended, in the same order as the items, one
/// per line.
pub fn build_comment_body(items: &[(Finding, DedupeKey)]) -> String {
    let mut body = String::new();
    if items.len() == 1 {
        let (finding, key) = &items[0];
        body.push_str(&format!("**{}**: {}\n\n{}\n", severity_label(finding.severity), finding.title, finding.message));
        if let Some(suggestion) = &finding.suggestion {
            body.push_str(&format!("\n> {suggestion}\n"));
        }
        if let Some(rule_id) = &finding.rule_id {
            body.push_str(&format!("\n_Rule: {rule_id}_\n"));
        }
        body.push('\n');
        body.push_str(&build_marker(key));
    } else {
        for (i, (finding, _)) in items.iter().enumerate() {
            body.push_str(&format!(
                "{}. **{}**: {} — {}\n",
                i + 1,
                severity_label(finding.severity),
                finding.title,
                finding.message
            ));
        }
        body.push('\n');
        for (_, key) in items {
            body.push_str(&build_marker(key));
            body.push('\n');
        }
    }
    body
}

/// A review comment authored by the bot in a prior run.
#[derive(Debug, Clone)]
pub struct PriorComment {
    pub comment_id: String,
    pub body: String,
}

/// The markers found in a comment body, split into well-formed keys and
/// a count of marker-shaped-but-malformed attempts.
#[derive(Debug, Clone, Default)]
pub struct MarkerScan {
    pub valid: Vec<DedupeKey>,
    pub malformed_count: usize,
}

fn loose_marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"<!--\s*{}:fingerprint:v1:[^>]*-->",
            regex::escape(crate::constants::FINGERPRINT_MARKER_PREFIX)
        ))
        .expect("fixed pattern")
    })
}

/// Scan a comment body for fingerprint markers: well-formed ones via the
/// strict regex (empty-capture guard applied), and a count of anything
/// that merely looks like a marker attempt but fails strict validation.
pub fn scan_markers(body: &str) -> MarkerScan {
    let valid = extract_markers(body);
    let attempts = loose_marker_regex().find_iter(body).count();
    MarkerScan {
        malformed_count: attempts.saturating_sub(valid.len()),
        valid,
    }
}

/// Per-run resolution decision for one prior comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionOutcome {
    pub resolved: bool,
    pub partially_resolved: Vec<DedupeKey>,
    pub has_malformed: bool,
}

/// Decide a prior comment's fate given its markers, how many
/// marker-shaped-but-malformed attempts were found, and the current
/// stale-key set.
pub fn decide_resolution(
    markers: &[DedupeKey],
    malformed_count: usize,
    stale: &HashSet<DedupeKey>,
) -> ResolutionOutcome {
    let has_malformed = malformed_count > 0;
    let resolved = !markers.is_empty() && !has_malformed && markers.iter().all(|m| stale.contains(m));
    let partially_resolved = if resolved {
        Vec::new()
    } else {
        markers.iter().filter(|m| stale.contains(*m)).cloned().collect()
    };
    ResolutionOutcome {
        resolved,
        partially_resolved,
        has_malformed,
    }
}

/// Per-comment lifecycle state. `Resolved` is terminal for a run; the
/// platform may reopen a thread on user action, which re-enters
/// `OpenActive` (modelled outside the engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentState {
    OpenActive,
    OpenPartial,
    Resolved,
}

/// Advance a comment's state given this run's resolution outcome.
pub fn next_state(current: CommentState, outcome: &ResolutionOutcome) -> CommentState {
    if outcome.resolved {
        CommentState::Resolved
    } else if !outcome.partially_resolved.is_empty() {
        CommentState::OpenPartial
    } else {
        current
    }
}

fn item_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)\.\s").expect("fixed pattern"))
}

/// Rewrite a grouped comment body for partial resolution: strike
/// through and mark resolved the numbered list lines whose marker (by
/// position, matching `markers`) is in `stale`. Every marker HTML
/// comment is left byte-for-byte untouched; only bot-authored list
/// lines are rewritten.
pub fn rewrite_partial_resolution(body: &str, markers: &[DedupeKey], stale: &HashSet<DedupeKey>) -> String {
    let item_re = item_line_regex();
    body.lines()
        .map(|line| {
            if let Some(caps) = item_re.captures(line) {
                if let Ok(idx) = caps[1].parse::<usize>() {
                    if idx >= 1 && idx <= markers.len() && stale.contains(&markers[idx - 1]) && !line.starts_with("~~")
                    {
                        return format!("~~{line}~~ ✅ resolved");
                    }
                }
            }
            line.to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Emit the structured `comment_resolution` event (and
/// `comment_resolution_warning` when malformed markers were seen).
/// Never logs raw fingerprints, file paths, or patterns.
pub fn log_resolution(platform: &str, comment_id: &str, total_markers: usize, stale_count: usize, outcome: &ResolutionOutcome) {
    tracing::info!(
        event = "comment_resolution",
        platform,
        comment_id,
        fingerprint_count = total_markers,
        stale_count,
        resolved = outcome.resolved,
    );
    if outcome.has_malformed {
        tracing::warn!(
            event = "comment_resolution_warning",
            reason = "malformed_marker",
            platform,
            comment_id,
        );
    }
}
