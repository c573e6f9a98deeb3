use std::fmt;

/// On-disk identifier of a context.
///
/// A `ContextId` is a 32-byte one-way digest of the context name. The name
/// itself is unconstrained (it may contain `/`, `..` or reserved characters),
/// so the store never uses it as a path; the hex form of the digest is used
/// as the directory name for both metadata and TLS material.
///
/// Computing the digest is the job of a `NameHasher` (see `ctx-crypto`);
/// this type only carries the result.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId([u8; 32]);

impl ContextId {
    /// Create a `ContextId` from a pre-computed digest.
    pub const fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// The raw 32-byte digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation. This is the directory name.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters), for log lines.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextId({})", self.short_hex())
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_lowercase_and_64_chars() {
        let id = ContextId::from_hash([0xAB; 32]);
        let hex = id.to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn short_hex_is_8_chars() {
        let id = ContextId::from_hash([7; 32]);
        assert_eq!(id.short_hex().len(), 8);
        assert!(id.to_hex().starts_with(&id.short_hex()));
    }

    #[test]
    fn display_is_full_hex() {
        let id = ContextId::from_hash([1; 32]);
        assert_eq!(format!("{id}"), id.to_hex());
    }

    #[test]
    fn debug_shows_short_form() {
        let id = ContextId::from_hash([0xcd; 32]);
        assert_eq!(format!("{id:?}"), "ContextId(cdcdcdcd)");
    }
}
