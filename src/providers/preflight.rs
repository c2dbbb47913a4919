//! Preflight validation run once per pass, before any agent in that pass
//! is dispatched.
//!
//! A pass's preflight check is independent of any individual agent's
//! outcome: it validates that the *environment* the pass is about to run
//! in is sane (no legacy env aliases shadowing the canonical key, no
//! half-configured Azure bundle, model/provider compatible) so a
//! misconfiguration fails loudly up front instead of surfacing as N
//! confusing per-agent API errors.

use thiserror::Error;

use crate::config::ProviderConfig;
use crate::env::Env;

/// Errors surfaced by preflight validation.
#[derive(Error, Debug)]
pub enum PreflightError {
    #[error(
        "legacy environment variable '{0}' is set — migrate to the canonical provider key ({1}). \
         See docs for migration guidance."
    )]
    LegacyEnvAlias(String, &'static str),

    #[error("incomplete Azure OpenAI bundle: {0} is required alongside the other Azure settings")]
    IncompleteAzureBundle(&'static str),

    #[error("model '{0}' is not compatible with provider '{1}'")]
    ModelProviderMismatch(String, String),
}

/// The canonical key a legacy alias should be migrated to, by position in
/// [`crate::constants::LEGACY_ENV_ALIASES`].
fn canonical_key_for_alias(alias: &str) -> &'static str {
    match alias {
        "PR_AGENT_API_KEY" | "AI_SEMANTIC_REVIEW_API_KEY" | "OPENCODE_API_KEY" => {
            crate::constants::ENV_API_KEY
        }
        "OPENCODE_MODEL" | "OPENAI_MODEL" => crate::constants::ENV_MODEL,
        _ => crate::constants::ENV_API_KEY,
    }
}

/// Reject any legacy environment variable alias still present in the
/// environment, rather than silently honoring it alongside (or instead of)
/// the canonical key.
pub fn check_legacy_aliases(env: &Env) -> Result<(), PreflightError> {
    for &alias in crate::constants::LEGACY_ENV_ALIASES {
        if env.is_set(alias) {
            return Err(PreflightError::LegacyEnvAlias(
                alias.to_string(),
                canonical_key_for_alias(alias),
            ));
        }
    }
    Ok(())
}

/// Enforce all-or-nothing on the Azure OpenAI bundle: if any of the three
/// Azure env vars is set, all three must be.
pub fn check_azure_bundle(env: &Env) -> Result<(), PreflightError> {
    let key = env.is_set(crate::constants::ENV_AZURE_OPENAI_API_KEY);
    let endpoint = env.is_set(crate::constants::ENV_AZURE_OPENAI_ENDPOINT);
    let deployment = env.is_set(crate::constants::ENV_AZURE_OPENAI_DEPLOYMENT);

    if !key && !endpoint && !deployment {
        return Ok(());
    }
    if !key {
        return Err(PreflightError::IncompleteAzureBundle(
            crate::constants::ENV_AZURE_OPENAI_API_KEY,
        ));
    }
    if !endpoint {
        return Err(PreflightError::IncompleteAzureBundle(
            crate::constants::ENV_AZURE_OPENAI_ENDPOINT,
        ));
    }
    if !deployment {
        return Err(PreflightError::IncompleteAzureBundle(
            crate::constants::ENV_AZURE_OPENAI_DEPLOYMENT,
        ));
    }
    Ok(())
}

/// Returns `true` for an Ollama-shaped model string (`family:tag`, no `/`,
/// e.g. `llama3:8b`), which only makes sense against a local or explicitly
/// overridden endpoint.
fn looks_like_ollama_model(model: &str) -> bool {
    model.contains(':') && !model.contains('/')
}

/// Reject an Ollama-shaped model configured against a cloud provider with
/// no explicit `base_url` override — almost certainly a misconfiguration
/// rather than an intentional local-LLM setup.
pub fn check_model_provider_compatibility(provider: &ProviderConfig) -> Result<(), PreflightError> {
    if provider.base_url.is_some() {
        return Ok(());
    }
    if looks_like_ollama_model(&provider.model) {
        return Err(PreflightError::ModelProviderMismatch(
            provider.model.clone(),
            provider.name.to_string(),
        ));
    }
    Ok(())
}

/// Run every preflight check for a pass. Called once per pass, before any
/// agent in that pass is dispatched — a failure here fails the whole pass
/// without executing a single agent.
pub fn run(env: &Env, provider: &ProviderConfig) -> Result<(), PreflightError> {
    check_legacy_aliases(env)?;
    check_azure_bundle(env)?;
    check_model_provider_compatibility(provider)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProviderName;

    fn provider(model: &str, base_url: Option<&str>) -> ProviderConfig {
        ProviderConfig {
            name: ProviderName::Anthropic,
            model: model.to_string(),
            base_url: base_url.map(str::to_string),
            api_key: None,
        }
    }

    #[test]
    fn legacy_alias_rejected() {
        let env = Env::mock([("OPENCODE_API_KEY", "sk-old")]);
        let err = check_legacy_aliases(&env).unwrap_err();
        assert!(matches!(err, PreflightError::LegacyEnvAlias(_, _)));
    }

    #[test]
    fn no_legacy_alias_passes() {
        let env = Env::mock([("ANTHROPIC_API_KEY", "sk-new")]);
        assert!(check_legacy_aliases(&env).is_ok());
    }

    #[test]
    fn azure_bundle_complete_passes() {
        let env = Env::mock([
            ("AZURE_OPENAI_API_KEY", "key"),
            ("AZURE_OPENAI_ENDPOINT", "https://example.openai.azure.com"),
            ("AZURE_OPENAI_DEPLOYMENT", "gpt-4o"),
        ]);
        assert!(check_azure_bundle(&env).is_ok());
    }

    #[test]
    fn azure_bundle_absent_passes() {
        let env = Env::mock(Vec::<(&str, &str)>::new());
        assert!(check_azure_bundle(&env).is_ok());
    }

    #[test]
    fn azure_bundle_partial_fails() {
        let env = Env::mock([("AZURE_OPENAI_API_KEY", "key")]);
        let err = check_azure_bundle(&env).unwrap_err();
        assert!(matches!(err, PreflightError::IncompleteAzureBundle(_)));
    }

    #[test]
    fn ollama_model_without_base_url_rejected() {
        let p = provider("llama3:8b", None);
        let err = check_model_provider_compatibility(&p).unwrap_err();
        assert!(matches!(err, PreflightError::ModelProviderMismatch(_, _)));
    }

    #[test]
    fn ollama_model_with_base_url_allowed() {
        let p = provider("llama3:8b", Some("http://localhost:11434/v1"));
        assert!(check_model_provider_compatibility(&p).is_ok());
    }

    #[test]
    fn normal_model_passes() {
        let p = provider("claude-sonnet-4-20250514", None);
        assert!(check_model_provider_compatibility(&p).is_ok());
    }

    #[test]
    fn run_passes_with_clean_env() {
        let env = Env::mock([("ANTHROPIC_API_KEY", "sk-test")]);
        let provider = provider("claude-sonnet-4-20250514", None);
        assert!(run(&env, &provider).is_ok());
    }
}
