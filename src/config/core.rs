//! Ambient configuration sections: schema version, resource limits, model
//! defaults, output-target gating, review gating, and path filters.

use serde::{Deserialize, Serialize};

/// Current config schema version. Bumped when a breaking change is made to
/// the TOML shape; unset in user files, it defaults to the current version.
pub const SCHEMA_VERSION: u32 = 1;

/// Resource limits applied to agent execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Per-agent execution timeout, in seconds.
    pub agent_timeout_secs: u64,
    /// Maximum combined stdout+stderr captured from a subprocess tool call.
    pub max_buffer_bytes: usize,
    /// Maximum number of agents running concurrently.
    pub max_concurrent_agents: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            agent_timeout_secs: crate::constants::DEFAULT_AGENT_TIMEOUT_SECS,
            max_buffer_bytes: crate::constants::DEFAULT_MAX_BUFFER_BYTES,
            max_concurrent_agents: 5,
        }
    }
}

/// Model resolution defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ModelsConfig {
    /// Fallback model used when an agent profile doesn't override one,
    /// taking precedence over the provider's own default model.
    pub default: Option<String>,
}

/// Posting configuration for a single output target (GitHub or ADO).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReportingTarget {
    /// Whether posting to this target is permitted at all.
    pub enabled: bool,
    /// Whether to post a top-level summary comment in addition to inline ones.
    pub post_summary: bool,
}

impl Default for ReportingTarget {
    fn default() -> Self {
        Self {
            enabled: true,
            post_summary: true,
        }
    }
}

/// Reporting/posting configuration, one section per output target.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ReportingConfig {
    pub github: ReportingTarget,
    pub ado: ReportingTarget,
}

/// Gating behavior for pass/review failures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GatingConfig {
    /// When `true` (default), a required pass failing fails the whole
    /// review. When `false`, it's downgraded to a warning.
    pub fail_on_required_pass_failure: bool,
}

impl Default for GatingConfig {
    fn default() -> Self {
        Self {
            fail_on_required_pass_failure: true,
        }
    }
}

/// Path include/exclude filters applied to the diff before review.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct PathFiltersConfig {
    /// Gitignore-style patterns; if non-empty, only matching paths are kept.
    pub include: Vec<String>,
    /// Gitignore-style patterns; matching paths are always dropped.
    pub exclude: Vec<String>,
}
