//! App-wide constants.
//!
//! Centralises the tool name, config paths, environment variable names,
//! and wire-format constants so a rename only requires changing this file.

/// Display name of the tool (lowercase).
pub const APP_NAME: &str = "ai-reviewer";

/// Local config filename (e.g. `.ai-reviewer.toml` in repo root).
pub const CONFIG_FILENAME: &str = ".ai-reviewer.toml";

/// Directory name under `~/.config/` for global config and cache.
pub const CONFIG_DIR: &str = "ai-reviewer";

/// Telemetry heartbeat endpoint.
pub const TELEMETRY_URL: &str = "https://ai-reviewer.dev/v1/heartbeat";

/// Footer appended to every rendered review, disclosing automated authorship.
pub const AI_DISCLOSURE: &str =
    "This review was generated by an automated AI reviewer. Findings may be incomplete or incorrect.";

/// Crate version, baked in at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Short git commit hash the binary was built from (see `build.rs`).
pub const GIT_SHA: &str = env!("GIT_SHA");

/// UTC build date (see `build.rs`).
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Compilation target triple (see `build.rs`).
pub const TARGET: &str = env!("TARGET");

// ── Environment variable names (engine knobs) ───────────────────────

pub const ENV_PROVIDER: &str = "AI_REVIEWER_PROVIDER";
pub const ENV_MODEL: &str = "MODEL";
pub const ENV_API_KEY: &str = "AI_REVIEWER_API_KEY";
pub const ENV_BASE_URL: &str = "AI_REVIEWER_BASE_URL";
pub const ENV_TELEMETRY: &str = "AI_REVIEWER_TELEMETRY";

// ── Canonical provider secrets ──────────────────────────────────────

pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ENV_AZURE_OPENAI_API_KEY: &str = "AZURE_OPENAI_API_KEY";
pub const ENV_AZURE_OPENAI_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
pub const ENV_AZURE_OPENAI_DEPLOYMENT: &str = "AZURE_OPENAI_DEPLOYMENT";
pub const ENV_OLLAMA_BASE_URL: &str = "OLLAMA_BASE_URL";

/// Legacy env var aliases that must be rejected with a migration hint
/// rather than silently honored.
pub const LEGACY_ENV_ALIASES: &[&str] = &[
    "PR_AGENT_API_KEY",
    "AI_SEMANTIC_REVIEW_API_KEY",
    "OPENCODE_MODEL",
    "OPENAI_MODEL",
    "OPENCODE_API_KEY",
];

/// Environment variable names stripped from custom-command subprocesses by
/// default (see [`crate::tools::custom_command`]). Covers our own knobs plus
/// every provider's API key env var.
pub const SENSITIVE_ENV_VARS: &[&str] = &[
    ENV_PROVIDER,
    ENV_API_KEY,
    ENV_BASE_URL,
    ENV_AZURE_OPENAI_API_KEY,
    ENV_AZURE_OPENAI_ENDPOINT,
    "ANTHROPIC_API_KEY",
    "OPENAI_API_KEY",
    "COHERE_API_KEY",
    "GEMINI_API_KEY",
    "PERPLEXITY_API_KEY",
    "DEEPSEEK_API_KEY",
    "XAI_API_KEY",
    "GROQ_API_KEY",
];

// ── Hosting platform detection ───────────────────────────────────────

pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_GITHUB_ACTIONS: &str = "GITHUB_ACTIONS";
pub const ENV_TF_BUILD: &str = "TF_BUILD";

// ── Local-LLM engine knobs ───────────────────────────────────────────

pub const ENV_LOCAL_LLM_OPTIONAL: &str = "LOCAL_LLM_OPTIONAL";
pub const ENV_LOCAL_LLM_NUM_CTX: &str = "LOCAL_LLM_NUM_CTX";
pub const ENV_LOCAL_LLM_TIMEOUT: &str = "LOCAL_LLM_TIMEOUT";

// ── Reconciler wire format ───────────────────────────────────────────

/// Prefix used in every fingerprint marker HTML comment.
pub const FINGERPRINT_MARKER_PREFIX: &str = "odd-ai-reviewers";

/// Cross-run proximity dedup window, in lines, inclusive.
pub const LINE_PROXIMITY_THRESHOLD: u32 = 20;

/// Default per-agent subprocess/HTTP timeout, in seconds.
pub const DEFAULT_AGENT_TIMEOUT_SECS: u64 = 300;

/// Default per-subprocess output cap, in bytes (50 MiB).
pub const DEFAULT_MAX_BUFFER_BYTES: usize = 50 * 1024 * 1024;
