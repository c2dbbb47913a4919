//! Secret scanning rule loader.
//!
//! Loads rules from embedded defaults and optional user-provided TOML files.
//! Rule format is compatible with gitleaks TOML format.
//!
//! **Performance:** A few bundled patterns contain large bounded
//! repetitions (e.g. `[\w-]{50,1000}`) that produce sizable internal DFA
//! states, hence the elevated size limit below. This cost is paid once
//! per process and only when secret scanning is enabled — the rules are
//! never loaded on the normal review path.

use regex::Regex;
use serde::Deserialize;
use std::path::Path;

/// Maximum compiled regex size (50 MB). Some gitleaks patterns with
/// large bounded repetitions (e.g. `[\w-]{50,1000}`) produce DFA states
/// that exceed the default 10 MB limit.
const REGEX_SIZE_LIMIT: usize = 50 * 1024 * 1024;

/// A single secret scanning rule with a pre-compiled regex.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct SecretRule {
    /// Unique identifier for the rule.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// Original regex pattern string (kept for diagnostics).
    pub regex: String,
    /// Pre-compiled regex, built with an elevated size limit.
    pub compiled_regex: Regex,
    /// Keywords for prefiltering (at least one must appear in the line).
    pub keywords: Vec<String>,
    /// Minimum Shannon entropy threshold (0.0 to disable).
    pub entropy_threshold: f64,
    /// Pre-compiled allowlist regexes for false positive suppression.
    pub allowlist_regexes: Vec<Regex>,
}

/// Compile a regex pattern with the project-wide elevated size limit.
fn compile_regex(pattern: &str) -> Result<Regex, regex::Error> {
    regex::RegexBuilder::new(pattern)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
}

/// Compile allowlist patterns into regexes, skipping invalid ones with a warning.
fn compile_allowlist(patterns: Vec<String>, rule_id: &str) -> Vec<Regex> {
    patterns
        .into_iter()
        .filter_map(|p| match compile_regex(&p) {
            Ok(re) => Some(re),
            Err(e) => {
                eprintln!(
                    "Warning: skipping allowlist pattern for rule '{}': {e}",
                    rule_id
                );
                None
            }
        })
        .collect()
}

/// Embedded default rules (vendored gitleaks-compatible TOML).
const EMBEDDED_RULES_TOML: &str = include_str!("gitleaks_rules.toml");

/// Gitleaks-compatible TOML rule format.
#[derive(Debug, Deserialize)]
struct GitleaksConfig {
    #[serde(default)]
    rules: Vec<GitleaksRule>,
    /// Ignored top-level fields (e.g. `title`).
    #[serde(flatten)]
    _extra: std::collections::HashMap<String, toml::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
struct GitleaksRule {
    id: String,
    #[serde(default)]
    description: String,
    /// Regex pattern — optional because some rules are path-only (e.g. pkcs12-file).
    #[serde(default)]
    regex: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    entropy: f64,
    #[serde(default)]
    allowlist: Option<GitleaksAllowlist>,
    /// Optional fields from gitleaks format we parse but don't use.
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    secret_group: Option<u32>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    /// Gitleaks v8 uses `[[rules.allowlists]]` (plural) in some configs.
    #[serde(default)]
    allowlists: Option<Vec<GitleaksAllowlist>>,
}

#[derive(Debug, Deserialize)]
struct GitleaksAllowlist {
    #[serde(default)]
    regexes: Vec<String>,
    /// Extra fields we ignore.
    #[serde(flatten)]
    _extra: std::collections::HashMap<String, toml::Value>,
}

/// Load the default built-in rules from embedded gitleaks-compatible TOML.
///
/// The rules are vendored from the gitleaks project and compiled into
/// the binary. Invalid regexes are skipped with a warning to stderr.
pub fn default_rules() -> Vec<SecretRule> {
    let config: GitleaksConfig = toml::from_str(EMBEDDED_RULES_TOML)
        .expect("embedded gitleaks_rules.toml should be valid TOML");

    config
        .rules
        .into_iter()
        .filter_map(|r| {
            // Skip path-only rules that have no regex pattern.
            let regex_str = r.regex?;

            // Pre-compile with elevated size limit for large patterns.
            let compiled_regex = match compile_regex(&regex_str) {
                Ok(re) => re,
                Err(e) => {
                    eprintln!(
                        "Warning: skipping secret rule '{}': invalid regex: {e}",
                        r.id
                    );
                    return None;
                }
            };

            // Merge allowlist from both singular and plural forms
            let mut allowlist_patterns = Vec::new();
            if let Some(al) = r.allowlist {
                allowlist_patterns.extend(al.regexes);
            }
            if let Some(als) = r.allowlists {
                for al in als {
                    allowlist_patterns.extend(al.regexes);
                }
            }

            Some(SecretRule {
                id: r.id.clone(),
                description: r.description,
                regex: regex_str,
                compiled_regex,
                keywords: r.keywords,
                entropy_threshold: r.entropy,
                allowlist_regexes: compile_allowlist(allowlist_patterns, &r.id),
            })
        })
        .collect()
}

/// Load additional rules from a TOML file (gitleaks format).
pub fn load_rules_from_file(path: &Path) -> Result<Vec<SecretRule>, String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("failed to read rules file: {e}"))?;

    let config: GitleaksConfig =
        toml::from_str(&content).map_err(|e| format!("failed to parse rules file: {e}"))?;

    Ok(config
        .rules
        .into_iter()
        .filter_map(|r| {
            let regex_str = r.regex?;

            let compiled_regex = match compile_regex(&regex_str) {
                Ok(re) => re,
                Err(e) => {
                    eprintln!(
                        "Warning: skipping secret rule '{}': invalid regex: {e}",
                        r.id
                    );
                    return None;
                }
            };

            let mut allowlist_patterns = Vec::new();
            if let Some(al) = r.allowlist {
                allowlist_patterns.extend(al.regexes);
            }
            if let Some(als) = r.allowlists {
                for al in als {
                    allowlist_patterns.extend(al.regexes);
                }
            }

            Some(SecretRule {
                id: r.id.clone(),
                description: r.description,
                regex: regex_str,
                compiled_regex,
                keywords: r.keywords,
                entropy_threshold: r.entropy,
                allowlist_regexes: compile_allowlist(allowlist_patterns, &r.id),
            })
        })
        .collect())
}
