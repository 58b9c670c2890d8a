//! Content hashing for run idempotency
//!
//! A run is identified by the SHA-256 digest of its trimmed SMILES string,
//! trimmed amino-acid sequence, and the model version, joined with `|`.
//! Changing the model version therefore invalidates every previously
//! computed hash.

use sha2::{Digest, Sha256};

/// Compute the idempotency hash for a (smiles, sequence, model version) triple.
///
/// Inputs are expected to already be trimmed by the caller.
pub fn input_hash(smiles: &str, sequence: &str, model_version: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(smiles.as_bytes());
    hasher.update(b"|");
    hasher.update(sequence.as_bytes());
    hasher.update(b"|");
    hasher.update(model_version.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        let a = input_hash("CCO", "MKTAYIAK", "affinity-v1");
        let b = input_hash("CCO", "MKTAYIAK", "affinity-v1");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_hash_changes_with_model_version() {
        let a = input_hash("CCO", "MKTAYIAK", "affinity-v1");
        let b = input_hash("CCO", "MKTAYIAK", "affinity-v2");
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_distinguishes_field_boundaries() {
        // "ab" / "c" must not collide with "a" / "bc"
        assert_ne!(input_hash("ab", "c", "v1"), input_hash("a", "bc", "v1"));
    }

    #[test]
    fn test_hash_is_lowercase_hex() {
        let hash = input_hash("CCO", "MKT", "v1");
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
