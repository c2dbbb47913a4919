//! Clap argument types, validation, and profile resolution.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::models::{Severity, DEFAULT_PROFILE};

/// AI-powered code review CLI.
#[derive(Parser, Debug)]
#[command(
    name = "ai-reviewer",
    version = crate::constants::VERSION,
    about = super::BANNER,
)]
pub struct Cli {
    /// Disable anonymous usage telemetry.
    #[arg(long, global = true, default_value_t = false)]
    pub no_telemetry: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Run a code review.
    Review(ReviewArgs),

    /// List available agent profiles.
    Profiles(ProfilesArgs),

    /// Validate a custom agent profile definition.
    Validate(ValidateArgs),

    /// Manage the result cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Print version and build information.
    Version,
}

/// Arguments for the `profiles` subcommand.
#[derive(Parser, Debug)]
pub struct ProfilesArgs {
    /// Directory to scan for additional custom profiles.
    #[arg(long)]
    pub profile_dir: Option<PathBuf>,
}

/// Arguments for the `validate` subcommand.
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the agent profile markdown file to validate.
    pub file: PathBuf,
}

/// Cache management subcommands.
#[derive(clap::Subcommand, Debug)]
pub enum CacheAction {
    /// Remove all cached review results.
    Clear,
    /// Show cache statistics (entry count and size).
    Stats,
    /// Print the cache directory path.
    Path,
}

/// Arguments for the `review` subcommand.
#[derive(Parser, Debug)]
pub struct ReviewArgs {
    // --- Repo location ---
    /// Path to the repository or working directory (default: current directory).
    #[arg(long, default_value = ".")]
    pub path: PathBuf,

    // --- Input (one required) ---
    /// Pre-computed unified diff file.
    #[arg(long)]
    pub diff_file: Option<PathBuf>,

    /// Read unified diff from stdin.
    #[arg(long, default_value_t = false)]
    pub diff_stdin: bool,

    /// Branch or commit to diff against (uses git diff).
    #[arg(long)]
    pub diff_base: Option<String>,

    /// File or directory to scan directly (review all contents, no git required).
    #[arg(long)]
    pub scan: Option<PathBuf>,

    // --- Profile ---
    /// Comma-separated profiles: built-in names, file paths, or "auto".
    /// Built-in: frontend, backend, architect, security
    #[arg(long, default_value = DEFAULT_PROFILE, value_delimiter = ',')]
    pub profile: Vec<String>,

    /// Directory to resolve bare profile names from.
    #[arg(long)]
    pub profile_dir: Option<PathBuf>,

    /// Only run agents tagged with one of these labels (repeatable).
    #[arg(long = "tag")]
    pub tag: Vec<String>,

    // --- Output ---
    /// Output format.
    #[arg(long, default_value = "terminal")]
    pub format: OutputFormat,

    /// Exit non-zero if findings meet this severity threshold.
    #[arg(long)]
    pub fail_on: Option<Severity>,

    // --- Agentic ---
    /// Enable agentic context gathering (tools for LLM).
    #[arg(long, default_value_t = false)]
    pub agent: bool,

    /// Max agentic loop turns per file×agent.
    #[arg(long, default_value_t = 10)]
    pub max_turns: usize,

    /// Max tool invocations per file×agent.
    #[arg(long, default_value_t = 10)]
    pub max_tool_calls: usize,

    // --- Security ---
    /// Enable secret detection and redaction before LLM calls.
    #[arg(long, default_value_t = false)]
    pub scan_secrets: bool,

    /// Additional gitleaks-format TOML rules file.
    #[arg(long)]
    pub secrets_rules: Option<PathBuf>,

    // --- Reconciliation ---
    /// Skip fetching prior review comments for dedup/reconciliation.
    #[arg(long, default_value_t = false)]
    pub no_prior_context: bool,

    /// Max prior findings to fetch for reconciliation.
    #[arg(long, default_value_t = 500)]
    pub max_prior_findings: usize,

    // --- Performance ---
    /// Max concurrent LLM calls.
    #[arg(long, default_value_t = 5)]
    pub max_concurrent: usize,

    /// Disable result caching.
    #[arg(long, default_value_t = false)]
    pub no_cache: bool,

    /// Disable live progress output (useful for CI or piped output).
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

/// Output format options.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Terminal,
    Json,
    Github,
    Gitlab,
    Bitbucket,
    Forgejo,
    Ado,
}

impl OutputFormat {
    /// Render findings using the renderer for this format.
    pub fn render(&self, findings: &[crate::models::finding::Finding]) -> String {
        use crate::output::OutputRenderer;
        match self {
            OutputFormat::Terminal => crate::output::terminal::TerminalRenderer.render(findings),
            OutputFormat::Json => crate::output::json::JsonRenderer.render(findings),
            OutputFormat::Github => crate::output::github::GithubRenderer.render(findings),
            OutputFormat::Gitlab => crate::output::gitlab::GitlabRenderer.render(findings),
            OutputFormat::Bitbucket => crate::output::bitbucket::BitbucketRenderer.render(findings),
            OutputFormat::Forgejo => crate::output::forgejo::ForgejoRenderer.render(findings),
            OutputFormat::Ado => crate::output::ado::AdoRenderer.render(findings),
        }
    }
}

impl ReviewArgs {
    /// Validate that exactly one input source is provided.
    pub fn validate_input(&self) -> Result<InputMode, String> {
        let sources = [
            self.diff_file.is_some(),
            self.diff_stdin,
            self.diff_base.is_some(),
            self.scan.is_some(),
        ];
        let count = sources.iter().filter(|&&x| x).count();

        if count == 0 {
            return Err(
                "one input source is required: --diff-file, --diff-stdin, --diff-base, or --scan".to_string(),
            );
        }
        if count > 1 {
            return Err(
                "only one input source allowed: --diff-file, --diff-stdin, --diff-base, or --scan".to_string(),
            );
        }

        if let Some(ref path) = self.diff_file {
            Ok(InputMode::DiffFile(path.clone()))
        } else if self.diff_stdin {
            Ok(InputMode::Stdin)
        } else if let Some(ref base) = self.diff_base {
            Ok(InputMode::GitBase(base.clone()))
        } else if let Some(ref path) = self.scan {
            Ok(InputMode::DirectPath(path.clone()))
        } else {
            unreachable!()
        }
    }
}

// InputMode is defined in models/ and re-exported here for convenience.
pub use crate::models::InputMode;
