//! Content hashing for round-trip validation
//!
//! Two texts are considered equal when their SHA-256 digests match.

use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{debug, instrument};

use crate::application::{ApplicationResult, IoResultExt};
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// Compute the lowercase hex SHA-256 digest of content.
///
/// # Returns
/// 64-character lowercase hex string
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Compare `text` with the file at `path_or_text`, or with `path_or_text`
/// itself when it does not name an existing file.
pub fn validate(text: &str, path_or_text: &str) -> ApplicationResult<bool> {
    validate_with(&RealFileSystem, text, path_or_text)
}

#[instrument(level = "debug", skip(fs, text, path_or_text))]
pub fn validate_with(fs: &dyn FileSystem, text: &str, path_or_text: &str) -> ApplicationResult<bool> {
    let path = Path::new(path_or_text);
    let other = if fs.is_file(path) {
        fs.read_to_string(path)
            .with_path_context("read file for validation", path)?
    } else {
        path_or_text.to_string()
    };

    let (left, right) = (content_hash(text.as_bytes()), content_hash(other.as_bytes()));
    debug!(%left, %right, "compared content hashes");
    Ok(left == right)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_deterministic() {
        let hash1 = content_hash(b"hello world");
        let hash2 = content_hash(b"hello world");
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_content_hash_different_content() {
        let hash1 = content_hash(b"hello");
        let hash2 = content_hash(b"world");
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_validate_texts() {
        assert!(validate("a: 1\n", "a: 1\n").unwrap());
        assert!(!validate("a: 1\n", "a: 2\n").unwrap());
    }
}
