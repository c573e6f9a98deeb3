use std::fmt;

use ctx_types::ContextId;
use sha2::{Digest, Sha256};

/// Derives a [`ContextId`] from a context name.
///
/// Implementations must be pure functions of the name: two stores using the
/// same hasher over the same root resolve a name to the same directory.
pub trait NameHasher: Send + Sync + fmt::Debug {
    /// Short algorithm label, for diagnostics.
    fn algorithm(&self) -> &str;

    /// Digest of `name`.
    fn context_id(&self, name: &str) -> ContextId;
}

/// Plain SHA-256 of the UTF-8 name.
///
/// This is the layout other context-aware tools write, so a store using it
/// can share a directory with them.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha256NameHasher;

impl NameHasher for Sha256NameHasher {
    fn algorithm(&self) -> &str {
        "sha256"
    }

    fn context_id(&self, name: &str) -> ContextId {
        let digest = Sha256::digest(name.as_bytes());
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&digest);
        ContextId::from_hash(hash)
    }
}

/// Domain-separated BLAKE3 hasher.
///
/// The domain tag is prepended to every name, so stores using different tags
/// never share directories even when rooted at the same path.
#[derive(Clone, Copy, Debug)]
pub struct Blake3NameHasher {
    domain: &'static str,
}

impl Blake3NameHasher {
    /// Hasher for the default context namespace.
    pub const CONTEXT: Self = Self {
        domain: "ctxstore-context-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

impl Default for Blake3NameHasher {
    fn default() -> Self {
        Self::CONTEXT
    }
}

impl NameHasher for Blake3NameHasher {
    fn algorithm(&self) -> &str {
        "blake3"
    }

    fn context_id(&self, name: &str) -> ContextId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(name.as_bytes());
        ContextId::from_hash(*hasher.finalize().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_matches_known_vector() {
        // sha256("default")
        let id = Sha256NameHasher.context_id("default");
        assert_eq!(
            id.to_hex(),
            "37a8eec1ce19687d132fe29051dca629d164e2c4958ba141d5f4133a33f0688f"
        );
    }

    #[test]
    fn hash_is_deterministic() {
        let a = Sha256NameHasher.context_id("ctx-a");
        let b = Sha256NameHasher.context_id("ctx-a");
        assert_eq!(a, b);
        assert_eq!(
            Blake3NameHasher::CONTEXT.context_id("ctx-a"),
            Blake3NameHasher::CONTEXT.context_id("ctx-a")
        );
    }

    #[test]
    fn different_names_produce_different_ids() {
        let a = Sha256NameHasher.context_id("ctx-a");
        let b = Sha256NameHasher.context_id("ctx-b");
        assert_ne!(a, b);
    }

    #[test]
    fn different_domains_produce_different_ids() {
        let custom = Blake3NameHasher::new("my-tool-v1");
        assert_ne!(
            custom.context_id("prod"),
            Blake3NameHasher::CONTEXT.context_id("prod")
        );
        assert_eq!(custom.domain(), "my-tool-v1");
    }

    #[test]
    fn blake3_differs_from_undomained_hash() {
        let raw = *blake3::hash(b"prod").as_bytes();
        assert_ne!(Blake3NameHasher::CONTEXT.context_id("prod").as_bytes(), &raw);
    }

    #[test]
    fn hostile_names_hash_to_plain_hex() {
        let id = Sha256NameHasher.context_id("../../etc/passwd");
        let hex = id.to_hex();
        assert_eq!(hex.len(), 64);
        assert!(!hex.contains('/'));
        assert_eq!(hex::decode(&hex).unwrap().len(), 32);
    }

    #[test]
    fn algorithm_labels() {
        assert_eq!(Sha256NameHasher.algorithm(), "sha256");
        assert_eq!(Blake3NameHasher::default().algorithm(), "blake3");
    }
}
