//! Stage signatures
//!
//! A signature is a SHA256 digest over an ordered list of dependency
//! tokens. Every token is framed with its byte length before hashing so
//! that distinct token lists can never collide by concatenation
//! (`["ab", "c"]` and `["a", "bc"]` hash differently).

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Number of hex characters in the abbreviated form used for image tags
/// and log lines.
pub const SHORT_LEN: usize = 12;

/// Content-derived cache key for a stage.
///
/// Wraps the lowercase hex encoding of a SHA256 digest. Two stages with
/// the same signature are guaranteed to have identical build inputs, so
/// the signature doubles as the image tag suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(String);

impl Signature {
    /// Compute the signature of an ordered token list.
    ///
    /// Each token contributes its length (little-endian u64) followed by
    /// its bytes. Token order matters: reordering tokens produces a
    /// different signature.
    pub fn of_tokens<T: AsRef<str>>(tokens: &[T]) -> Self {
        let mut hasher = Sha256::new();
        for token in tokens {
            let bytes = token.as_ref().as_bytes();
            hasher.update((bytes.len() as u64).to_le_bytes());
            hasher.update(bytes);
        }
        Signature(hex::encode(hasher.finalize()))
    }

    /// Wrap an already-computed hex digest.
    ///
    /// Used when loading recorded signatures from the store; no
    /// validation is performed beyond what serde did.
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Signature(hex.into())
    }

    /// Full 64-character hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated digest for display and image tags.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(SHORT_LEN)]
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Signature {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
