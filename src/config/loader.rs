//! Config struct and loading logic.
//!
//! Priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables
//! 3. `.ai-reviewer.toml` in repo root
//! 4. `~/.config/ai-reviewer/config.toml` (global defaults)
//! 5. Built-in defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::core::{
    GatingConfig, LimitsConfig, ModelsConfig, PathFiltersConfig, ReportingConfig, SCHEMA_VERSION,
};
use crate::env::Env;
use crate::models::finding::Severity;
use crate::models::{ProviderName, DEFAULT_PROFILE};

/// Errors during config loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: u32,
    pub review: ReviewConfig,
    pub provider: ProviderConfig,
    pub secrets: SecretsConfig,
    pub telemetry: TelemetryConfig,
    pub limits: LimitsConfig,
    pub models: ModelsConfig,
    pub reporting: ReportingConfig,
    pub gating: GatingConfig,
    pub path_filters: PathFiltersConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            review: ReviewConfig::default(),
            provider: ProviderConfig::default(),
            secrets: SecretsConfig::default(),
            telemetry: TelemetryConfig::default(),
            limits: LimitsConfig::default(),
            models: ModelsConfig::default(),
            reporting: ReportingConfig::default(),
            gating: GatingConfig::default(),
            path_filters: PathFiltersConfig::default(),
        }
    }
}

/// Review-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    pub default_profiles: Vec<String>,
    pub fail_on: Option<Severity>,
    pub agentic: AgenticConfig,
    pub context: ContextConfig,
    /// Ordered review passes. Empty means a single implicit pass covering
    /// every resolved agent.
    pub passes: Vec<PassConfig>,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            default_profiles: vec![DEFAULT_PROFILE.to_string()],
            fail_on: None,
            agentic: AgenticConfig::default(),
            context: ContextConfig::default(),
            passes: Vec::new(),
        }
    }
}

/// A single named stage of the review pipeline.
///
/// Passes run in declaration order; agents within a pass run concurrently.
/// A `required` pass that fails its preflight checks or whose agents all
/// fail aborts the review; an optional pass's failure is logged and the
/// remaining passes still run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PassConfig {
    pub name: String,
    pub agents: Vec<String>,
    pub enabled: bool,
    pub required: bool,
}

impl Default for PassConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            agents: Vec::new(),
            enabled: true,
            required: true,
        }
    }
}

/// Agentic mode configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgenticConfig {
    pub enabled: bool,
    pub max_turns: usize,
    pub max_tool_calls: usize,
}

impl Default for AgenticConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_turns: 10,
            max_tool_calls: 10,
        }
    }
}

/// Context assembly configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    pub max_file_lines: usize,
    pub surrounding_lines: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_file_lines: 1000,
            surrounding_lines: 100,
        }
    }
}

/// LLM provider configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub name: ProviderName,
    pub model: String,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: ProviderName::Anthropic,
            model: "claude-sonnet-4-20250514".to_string(),
            base_url: None,
            api_key: None,
        }
    }
}

/// Secret scanning configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
    pub enabled: bool,
    pub additional_rules: Option<String>,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            additional_rules: None,
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Whether anonymous usage telemetry is enabled.
    pub enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Load configuration with proper layering.
    ///
    /// Reads from global config, repo-local config, then applies
    /// environment variable overrides.
    pub fn load(repo_root: Option<&Path>, env: &Env) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        // Layer 4: global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                config.merge(global);
            }
        }

        // Layer 3: repo-local config
        if let Some(root) = repo_root {
            let local_path = root.join(crate::constants::CONFIG_FILENAME);
            if local_path.exists() {
                let local = Self::load_file(&local_path)?;
                config.merge(local);
            }
        }

        // Layer 2: environment variables
        config.apply_env_vars(env);

        Ok(config)
    }

    /// Load a config from a specific file.
    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the global config file path.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(crate::constants::CONFIG_DIR).join("config.toml"))
    }

    /// Merge another config into this one (other takes precedence for non-default values).
    ///
    /// Uses a partial-config pattern: we serialize `other` to TOML value,
    /// then only override fields that were explicitly set (non-default).
    fn merge(&mut self, other: Config) {
        // Review settings
        let default_review = ReviewConfig::default();
        if other.review.default_profiles != default_review.default_profiles {
            self.review.default_profiles = other.review.default_profiles;
        }
        if other.review.fail_on.is_some() {
            self.review.fail_on = other.review.fail_on;
        }
        if other.review.agentic.enabled {
            self.review.agentic.enabled = true;
        }
        if other.review.agentic.max_turns != AgenticConfig::default().max_turns {
            self.review.agentic.max_turns = other.review.agentic.max_turns;
        }
        if other.review.agentic.max_tool_calls != AgenticConfig::default().max_tool_calls {
            self.review.agentic.max_tool_calls = other.review.agentic.max_tool_calls;
        }
        if other.review.context.max_file_lines != ContextConfig::default().max_file_lines {
            self.review.context.max_file_lines = other.review.context.max_file_lines;
        }
        if other.review.context.surrounding_lines != ContextConfig::default().surrounding_lines {
            self.review.context.surrounding_lines = other.review.context.surrounding_lines;
        }
        if !other.review.passes.is_empty() {
            self.review.passes = other.review.passes;
        }

        // Provider settings
        let default_provider = ProviderConfig::default();
        if other.provider.name != default_provider.name {
            self.provider.name = other.provider.name;
        }
        if other.provider.model != default_provider.model {
            self.provider.model = other.provider.model;
        }
        if other.provider.base_url.is_some() {
            self.provider.base_url = other.provider.base_url;
        }
        if other.provider.api_key.is_some() {
            self.provider.api_key = other.provider.api_key;
        }

        // Secret settings
        if other.secrets.enabled {
            self.secrets.enabled = true;
        }
        if other.secrets.additional_rules.is_some() {
            self.secrets.additional_rules = other.secrets.additional_rules;
        }

        // Telemetry settings (disabled overrides enabled)
        if !other.telemetry.enabled {
            self.telemetry.enabled = false;
        }

        // Schema version always tracks whatever was most recently loaded.
        self.version = other.version;

        // Limits
        let default_limits = LimitsConfig::default();
        if other.limits.agent_timeout_secs != default_limits.agent_timeout_secs {
            self.limits.agent_timeout_secs = other.limits.agent_timeout_secs;
        }
        if other.limits.max_buffer_bytes != default_limits.max_buffer_bytes {
            self.limits.max_buffer_bytes = other.limits.max_buffer_bytes;
        }
        if other.limits.max_concurrent_agents != default_limits.max_concurrent_agents {
            self.limits.max_concurrent_agents = other.limits.max_concurrent_agents;
        }

        // Models
        if other.models.default.is_some() {
            self.models.default = other.models.default;
        }

        // Reporting (disabling a target overrides enabling it)
        if !other.reporting.github.enabled {
            self.reporting.github.enabled = false;
        }
        if !other.reporting.github.post_summary {
            self.reporting.github.post_summary = false;
        }
        if !other.reporting.ado.enabled {
            self.reporting.ado.enabled = false;
        }
        if !other.reporting.ado.post_summary {
            self.reporting.ado.post_summary = false;
        }

        // Gating (disabling the default-true flag overrides)
        if !other.gating.fail_on_required_pass_failure {
            self.gating.fail_on_required_pass_failure = false;
        }

        // Path filters
        if !other.path_filters.include.is_empty() {
            self.path_filters.include = other.path_filters.include;
        }
        if !other.path_filters.exclude.is_empty() {
            self.path_filters.exclude = other.path_filters.exclude;
        }
    }

    /// Apply environment variable overrides.
    fn apply_env_vars(&mut self, env: &Env) {
        if let Ok(val) = env.var(crate::constants::ENV_PROVIDER) {
            if let Ok(name) = val.parse::<ProviderName>() {
                self.provider.name = name;
            } else {
                eprintln!("Warning: ignoring invalid {} value: {val}", crate::constants::ENV_PROVIDER);
            }
        }
        if let Ok(val) = env.var(crate::constants::ENV_MODEL) {
            self.provider.model = val;
        }
        if let Ok(val) = env.var(crate::constants::ENV_BASE_URL) {
            self.provider.base_url = Some(val);
        }

        // Provider-specific API key resolution
        let api_key = env.var(crate::constants::ENV_API_KEY)
            .or_else(|_| env.var(self.provider.name.api_key_env_var()))
            .ok();
        if api_key.is_some() {
            self.provider.api_key = api_key;
        }

        // Telemetry
        if let Ok(val) = env.var(crate::constants::ENV_TELEMETRY) {
            match val.to_lowercase().as_str() {
                "false" | "0" | "no" | "off" => self.telemetry.enabled = false,
                "true" | "1" | "yes" | "on" => self.telemetry.enabled = true,
                _ => eprintln!("Warning: ignoring invalid {} value: {val}", crate::constants::ENV_TELEMETRY),
            }
        }
    }
}
