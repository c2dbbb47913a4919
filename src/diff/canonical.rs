//! Canonical path newtype.
//!
//! A [`CanonicalPath`] is a path string with a single fallible construction
//! path (`canonicalize`); every module that reads a path off a diff or a
//! finding funnels it through here exactly once. Downstream comparisons
//! (rename lookup, resolver lookup, fingerprinting) never re-canonicalize.

use std::fmt;

/// A platform-normalized path: no leading `/`, `a/`, `b/`, or `./`, UTF-8,
/// case-sensitive. Construct with [`canonicalize`]; there is no public
/// constructor that skips normalization.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalPath(String);

impl CanonicalPath {
    /// Borrow the normalized path string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume self, returning the owned normalized string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CanonicalPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalize a raw path string into a [`CanonicalPath`].
///
/// Strips one or more leading `a/`, `b/`, `./`, or `/` segments in any
/// combination (e.g. `./a/src/x.rs` → `src/x.rs`), then leaves the rest
/// untouched. Idempotent: `canonicalize(canonicalize(p).as_str()) ==
/// canonicalize(p)`.
pub fn canonicalize(raw: &str) -> CanonicalPath {
    let mut s = raw;
    loop {
        if let Some(rest) = s.strip_prefix("./") {
            s = rest;
        } else if let Some(rest) = s.strip_prefix('/') {
            s = rest;
        } else if s.len() >= 2 {
            let bytes = s.as_bytes();
            if bytes[1] == b'/' && matches!(bytes[0], b'a' | b'b') {
                s = &s[2..];
                continue;
            }
            break;
        } else {
            break;
        }
    }
    CanonicalPath(s.to_string())
}
