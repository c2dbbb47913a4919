//! Agent loading, profile resolution, and markdown+YAML parsing.

pub mod auto;
pub mod builtin;
pub mod parser;

use std::path::Path;
use thiserror::Error;

use crate::models::AgentDefinition;

/// Errors from agent loading.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("agent profile not found: {0}")]
    NotFound(String),

    #[error("failed to read agent file {path}: {source}")]
    ReadError {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse agent definition: {0}")]
    ParseError(String),
}

/// Resolve a list of profile names/paths into agent definitions.
///
/// Resolution order for each value:
/// 1. If it matches a built-in name → use embedded profile
/// 2. If `agent_dir` is set and `{agent_dir}/{value}.md` exists → load it
/// 3. If it's a file path (contains `/` or `.md`) → load it directly
/// 4. Otherwise → error with suggestions
pub async fn resolve_profiles(
    profiles: &[String],
    agent_dir: Option<&Path>,
) -> Result<Vec<AgentDefinition>, AgentError> {
    let mut agents = Vec::new();

    for profile in profiles {
        let agent = resolve_single_profile(profile, agent_dir).await?;
        agents.push(agent);
    }

    Ok(agents)
}

/// List all available profiles: built-ins plus any custom ones from `agent_dir`.
pub async fn list_all_profiles(
    agent_dir: Option<&Path>,
) -> Result<Vec<AgentDefinition>, AgentError> {
    let mut agents: Vec<AgentDefinition> = Vec::new();

    // Built-in profiles
    for name in builtin::list_builtin_names() {
        if let Some(agent) = builtin::get_builtin(name) {
            agents.push(agent);
        }
    }

    // Custom profiles from agent_dir
    if let Some(dir) = agent_dir {
        if dir.is_dir() {
            let mut entries = tokio::fs::read_dir(dir)
                .await
                .map_err(|e| AgentError::ReadError {
                    path: dir.display().to_string(),
                    source: e,
                })?;

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| AgentError::ReadError {
                    path: dir.display().to_string(),
                    source: e,
                })?
            {
                let path = entry.path();
                if path.extension().is_some_and(|e| e == "md") {
                    let content = tokio::fs::read_to_string(&path)
                        .await
                        .map_err(|e| AgentError::ReadError {
                            path: path.display().to_string(),
                            source: e,
                        })?;
                    match parser::parse_agent_definition(&content) {
                        Ok(agent) => agents.push(agent),
                        Err(e) => {
                            eprintln!(
                                "Warning: skipping {}: {e}",
                                path.display()
                            );
                        }
                    }
                }
            }
        }
    }

    Ok(agents)
}

/// Resolve every profile (built-in or custom) carrying at least one of
/// `tags` in its own `tags` list.
pub async fn resolve_profiles_by_tags(
    tags: &[String],
    agent_dir: Option<&Path>,
) -> Result<Vec<AgentDefinition>, AgentError> {
    let all = list_all_profiles(agent_dir).await?;
    Ok(all
        .into_iter()
        .filter(|agent| agent.profile.tags.iter().any(|t| tags.contains(t)))
        .collect())
}

/// Resolve a single profile name or path.
async fn resolve_single_profile(
    profile: &str,
    agent_dir: Option<&Path>,
) -> Result<AgentDefinition, AgentError> {
    // 1. Check built-in profiles
    if let Some(agent) = builtin::get_builtin(profile) {
        return Ok(agent);
    }

    // 2. Check agent_dir
    if let Some(dir) = agent_dir {
        let path = dir.join(format!("{profile}.md"));
        if path.exists() {
            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| AgentError::ReadError {
                    path: path.display().to_string(),
                    source: e,
                })?;
            return parser::parse_agent_definition(&content)
                .map_err(|e| AgentError::ParseError(e.to_string()));
        }
    }

    // 3. Check if it's a direct file path
    if profile.contains('/') || profile.ends_with(".md") {
        let path = Path::new(profile);
        if path.exists() {
            let content = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| AgentError::ReadError {
                    path: profile.to_string(),
                    source: e,
                })?;
            return parser::parse_agent_definition(&content)
                .map_err(|e| AgentError::ParseError(e.to_string()));
        }
        return Err(AgentError::NotFound(format!(
            "file not found: {profile}"
        )));
    }

    // 4. Error with suggestions
    let builtins = builtin::list_builtin_names();
    Err(AgentError::NotFound(format!(
        "unknown profile '{profile}'. Available built-in profiles: {}",
        builtins.join(", ")
    )))
}
