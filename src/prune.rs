//! Deterministic prune-label derivation
//!
//! Every manifest set that opts into pruning gets a label key that is unique
//! to its logical identifier and stable across redeployments. The downstream
//! executor matches objects purely on this key string, so derivation only has
//! to be deterministic and collision-resistant, not reversible.

use aws_lc_rs::digest::{digest, SHA256};

use crate::{PRUNE_LABEL_PREFIX, PRUNE_TOKEN_LEN};

/// Derive the prune label key for a manifest set identifier.
///
/// The identifier is expected to already be unique within the calling
/// application (e.g. a slash-joined path like `"MyStack/MyManifest"`); that
/// uniqueness is not validated here. The result is
/// `aws.cdk.eks/prune-<token>` where `<token>` is the SHA-256 digest of the
/// identifier rendered as lowercase hex and truncated to 42 characters.
///
/// This is a total function: any identifier, including the empty string,
/// produces a valid non-empty label key.
pub fn prune_label(identifier: &str) -> String {
    let hash = digest(&SHA256, identifier.as_bytes());
    let mut token = String::with_capacity(PRUNE_TOKEN_LEN);
    for byte in hash.as_ref() {
        if token.len() >= PRUNE_TOKEN_LEN {
            break;
        }
        token.push_str(&format!("{:02x}", byte));
    }
    token.truncate(PRUNE_TOKEN_LEN);
    format!("{}{}", PRUNE_LABEL_PREFIX, token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_label_has_fixed_length() {
        for id in ["MyStack/MyManifest", "a", "", "cluster/ns/very/deep/path"] {
            let label = prune_label(id);
            assert_eq!(label.len(), PRUNE_LABEL_PREFIX.len() + PRUNE_TOKEN_LEN);
            assert!(label.starts_with(PRUNE_LABEL_PREFIX));
        }
    }

    #[test]
    fn test_label_is_stable() {
        let first = prune_label("MyStack/MyManifest");
        for _ in 0..10 {
            assert_eq!(prune_label("MyStack/MyManifest"), first);
        }
    }

    #[test]
    fn test_token_is_lowercase_hex() {
        let label = prune_label("MyStack/MyManifest");
        let token = &label[PRUNE_LABEL_PREFIX.len()..];
        assert_eq!(token.len(), PRUNE_TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_distinct_identifiers_do_not_collide() {
        let mut seen = HashSet::new();
        for i in 0..10_000 {
            let label = prune_label(&format!("Stack{}/Manifest{}", i % 97, i));
            assert!(seen.insert(label), "collision at identifier {}", i);
        }
    }

    #[test]
    fn test_empty_identifier_still_valid() {
        let label = prune_label("");
        assert!(label.starts_with(PRUNE_LABEL_PREFIX));
        assert_eq!(label.len(), PRUNE_LABEL_PREFIX.len() + PRUNE_TOKEN_LEN);
    }

    #[test]
    fn test_similar_identifiers_diverge() {
        // One-character differences must still produce unrelated tokens.
        assert_ne!(prune_label("MyStack/MyManifest"), prune_label("MyStack/MyManifest2"));
        assert_ne!(prune_label("a/b"), prune_label("a/b/"));
        assert_ne!(prune_label("a/b"), prune_label("A/b"));
    }
}
