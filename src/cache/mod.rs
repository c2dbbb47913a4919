//! Content-hash based result cache.
//!
//! Caches review results to skip redundant LLM calls when the same
//! agent+model+file-set combination is reviewed again. The cache key
//! covers per-file change stats and a content fingerprint so a cache
//! entry invalidates the moment the diff actually changes, not just
//! when some unrelated summary field changes.

pub mod store;

use sha2::{Digest, Sha256};

use crate::models::finding::Finding;

/// Per-file metadata folded into the agent cache key.
#[derive(Debug, Clone)]
pub struct CacheFileMeta {
    /// The file's path (post-rename).
    pub path: String,
    /// Change kind: "added", "deleted", "renamed", or "modified".
    pub status: String,
    /// Number of added lines.
    pub additions: usize,
    /// Number of removed lines.
    pub deletions: usize,
}

/// Compute a cache key covering agent identity, resolved model, provider,
/// the set of files under review (sorted by path for determinism), and a
/// content fingerprint of the diff being reviewed.
pub fn agent_cache_key(
    agent_id: &str,
    effective_model: &str,
    provider: &str,
    files: &[CacheFileMeta],
    diff_fingerprint: &str,
) -> String {
    let mut sorted: Vec<&CacheFileMeta> = files.iter().collect();
    sorted.sort_by(|a, b| a.path.cmp(&b.path));

    let mut hasher = Sha256::new();
    hasher.update(agent_id.as_bytes());
    hasher.update(b"\0");
    hasher.update(effective_model.as_bytes());
    hasher.update(b"\0");
    hasher.update(provider.as_bytes());
    hasher.update(b"\0");
    for meta in sorted {
        hasher.update(meta.path.as_bytes());
        hasher.update(b"\0");
        hasher.update(meta.status.as_bytes());
        hasher.update(b"\0");
        hasher.update(meta.additions.to_le_bytes());
        hasher.update(meta.deletions.to_le_bytes());
    }
    hasher.update(b"\0");
    hasher.update(diff_fingerprint.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compute the stable identity a sidecar pointer is filed under. This is
/// independent of the cache key itself so it stays put across content
/// changes — it identifies *what* is being cached, not its current value.
fn sidecar_id(file_path: &str, agent_name: &str, model: &str, review_scope: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(file_path.as_bytes());
    hasher.update(b"\0");
    hasher.update(agent_name.as_bytes());
    hasher.update(b"\0");
    hasher.update(model.as_bytes());
    hasher.update(b"\0");
    hasher.update(review_scope.as_bytes());
    hex::encode(hasher.finalize())
}

/// The cache engine for review results.
pub struct CacheEngine {
    enabled: bool,
    store: store::FileStore,
}

impl CacheEngine {
    /// Create a new cache engine.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            store: store::FileStore::new(),
        }
    }

    /// Look up cached findings.
    pub fn get(&self, key: &str) -> Option<Vec<Finding>> {
        if !self.enabled {
            return None;
        }
        self.store.get(key)
    }

    /// Store findings in the cache.
    pub fn put(&self, key: &str, findings: &[Finding]) {
        if !self.enabled {
            return;
        }
        self.store.put(key, findings);
    }

    /// Record the current cache key for a `(file, agent, model, scope)`
    /// identity, so a future run whose content has changed can still find
    /// this run's findings via [`CacheEngine::get_previous`].
    pub fn put_sidecar(
        &self,
        file_path: &str,
        agent_name: &str,
        model: &str,
        cache_key: &str,
        review_scope: &str,
    ) {
        if !self.enabled {
            return;
        }
        let id = sidecar_id(file_path, agent_name, model, review_scope);
        self.store.put_sidecar_pointer(&id, cache_key);
    }

    /// Look up findings from the previous run's cache entry for this
    /// identity, if the content has since changed (i.e. the sidecar's
    /// recorded key differs from `cache_key`). Returns `None` when there's
    /// no sidecar yet, or when the sidecar key matches the current one
    /// (meaning nothing changed, so this was already a cache hit).
    pub fn get_previous(
        &self,
        file_path: &str,
        agent_name: &str,
        model: &str,
        cache_key: &str,
        review_scope: &str,
    ) -> Option<Vec<Finding>> {
        if !self.enabled {
            return None;
        }
        let id = sidecar_id(file_path, agent_name, model, review_scope);
        let prev_key = self.store.get_sidecar_pointer(&id)?;
        if prev_key == cache_key {
            return None;
        }
        self.store.get(&prev_key)
    }

    /// Remove all cached entries.
    pub fn clear(&self) -> Result<store::CacheStats, std::io::Error> {
        self.store.clear()
    }

    /// Compute statistics about the cache.
    pub fn stats(&self) -> Result<store::CacheStats, std::io::Error> {
        self.store.stats()
    }

    /// Return the cache directory path.
    pub fn path(&self) -> Option<&std::path::PathBuf> {
        self.store.path()
    }

    /// Remove cache and sidecar entries older than `max_age`, returning the
    /// number of files removed.
    pub fn cleanup_stale(&self, max_age: std::time::Duration) -> usize {
        self.store.cleanup_stale(max_age)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(path: &str, status: &str, additions: usize, deletions: usize) -> CacheFileMeta {
        CacheFileMeta {
            path: path.to_string(),
            status: status.to_string(),
            additions,
            deletions,
        }
    }

    #[test]
    fn agent_cache_key_deterministic() {
        let files = vec![meta("a.rs", "modified", 3, 1)];
        let k1 = agent_cache_key("backend", "claude-3", "anthropic", &files, "fp1");
        let k2 = agent_cache_key("backend", "claude-3", "anthropic", &files, "fp1");
        assert_eq!(k1, k2);
    }

    #[test]
    fn agent_cache_key_order_independent() {
        let files_a = vec![meta("a.rs", "modified", 1, 0), meta("b.rs", "added", 2, 0)];
        let files_b = vec![meta("b.rs", "added", 2, 0), meta("a.rs", "modified", 1, 0)];
        let k1 = agent_cache_key("backend", "claude-3", "anthropic", &files_a, "fp1");
        let k2 = agent_cache_key("backend", "claude-3", "anthropic", &files_b, "fp1");
        assert_eq!(k1, k2);
    }

    #[test]
    fn agent_cache_key_varies_with_fingerprint() {
        let files = vec![meta("a.rs", "modified", 3, 1)];
        let k1 = agent_cache_key("backend", "claude-3", "anthropic", &files, "fp1");
        let k2 = agent_cache_key("backend", "claude-3", "anthropic", &files, "fp2");
        assert_ne!(k1, k2);
    }

    #[test]
    fn agent_cache_key_varies_with_model() {
        let files = vec![meta("a.rs", "modified", 3, 1)];
        let k1 = agent_cache_key("backend", "claude-3", "anthropic", &files, "fp1");
        let k2 = agent_cache_key("backend", "claude-3-opus", "anthropic", &files, "fp1");
        assert_ne!(k1, k2);
    }

    #[test]
    fn agent_cache_key_varies_with_stats() {
        let files_a = vec![meta("a.rs", "modified", 3, 1)];
        let files_b = vec![meta("a.rs", "modified", 4, 1)];
        let k1 = agent_cache_key("backend", "claude-3", "anthropic", &files_a, "fp1");
        let k2 = agent_cache_key("backend", "claude-3", "anthropic", &files_b, "fp1");
        assert_ne!(k1, k2);
    }

    #[test]
    fn sidecar_and_previous_roundtrip() {
        use crate::models::finding::{Finding, Provenance, Severity};

        let dir = tempfile::tempdir().unwrap();
        let engine = CacheEngine {
            enabled: true,
            store: store::FileStore::new_with_dir(dir.path().to_path_buf()),
        };

        let findings = vec![Finding {
            file: "a.rs".into(),
            line: 1,
            end_line: None,
            severity: Severity::Warning,
            title: "Issue".into(),
            message: "Details".into(),
            suggestion: None,
            agent: "backend".into(),
            rule_id: None,
            fingerprint: None,
            provenance: Provenance::Complete,
        }];

        engine.put("key-v1", &findings);
        engine.put_sidecar("a.rs", "backend", "claude-3", "key-v1", "main");

        // Content hasn't changed: no "previous" entry distinct from current.
        assert!(
            engine
                .get_previous("a.rs", "backend", "claude-3", "key-v1", "main")
                .is_none()
        );

        // Content changed: new cache key, but the sidecar still points at
        // the old one, so the old findings surface as "previous".
        let prior = engine.get_previous("a.rs", "backend", "claude-3", "key-v2", "main");
        assert_eq!(prior.map(|f| f.len()), Some(1));
    }

    #[test]
    fn disabled_engine_skips_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let engine = CacheEngine {
            enabled: false,
            store: store::FileStore::new_with_dir(dir.path().to_path_buf()),
        };
        engine.put_sidecar("a.rs", "backend", "claude-3", "key", "main");
        assert!(
            engine
                .get_previous("a.rs", "backend", "claude-3", "key2", "main")
                .is_none()
        );
    }
}
