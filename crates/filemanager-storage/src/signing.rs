//! Signed temporary URLs.
//!
//! A signature is `base64url(SHA-256(key || ":" || path || ":" || expires))`.
//! The serving route recomputes it with [`UrlSigner::verify`].

use std::fmt;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha2::{Digest, Sha256};

const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode each segment of a disk path, keeping the separators.
pub fn encode_path(path: &str) -> String {
    path.trim_matches('/')
        .split('/')
        .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Signs and verifies expiring URLs.
#[derive(Clone)]
pub struct UrlSigner {
    key: String,
}

impl fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlSigner").field("key", &"****").finish()
    }
}

impl UrlSigner {
    /// Create a signer with a secret key.
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Signature for a path expiring at a unix timestamp.
    pub fn sign(&self, path: &str, expires_at: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.key.as_bytes());
        hasher.update(b":");
        hasher.update(path.trim_matches('/').as_bytes());
        hasher.update(b":");
        hasher.update(expires_at.to_string().as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }

    /// Check a signature and that it has not expired at `now`.
    pub fn verify(&self, path: &str, expires_at: i64, signature: &str, now: i64) -> bool {
        expires_at >= now && self.sign(path, expires_at) == signature
    }

    /// Build `{base}/{path}?expires=..&signature=..`.
    pub fn temporary_url(&self, base: &str, path: &str, ttl: Duration) -> String {
        let expires_at = chrono::Utc::now().timestamp() + ttl.as_secs() as i64;
        format!(
            "{}/{}?expires={}&signature={}",
            base.trim_end_matches('/'),
            encode_path(path),
            expires_at,
            self.sign(path, expires_at)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let signer = UrlSigner::new("secret");
        let sig = signer.sign("docs/a.pdf", 2_000);
        assert!(signer.verify("docs/a.pdf", 2_000, &sig, 1_000));
        assert!(signer.verify("/docs/a.pdf/", 2_000, &sig, 1_000));
        assert!(!signer.verify("docs/a.pdf", 2_000, &sig, 3_000));
        assert!(!signer.verify("docs/b.pdf", 2_000, &sig, 1_000));
        assert!(!UrlSigner::new("other").verify("docs/a.pdf", 2_000, &sig, 1_000));
    }

    #[test]
    fn test_encode_path() {
        assert_eq!(encode_path("a b/c&d.txt"), "a%20b/c%26d.txt");
        assert_eq!(encode_path("/x/y/"), "x/y");
    }

    #[test]
    fn test_debug_hides_key() {
        let signer = UrlSigner::new("topsecret");
        assert!(!format!("{signer:?}").contains("topsecret"));
    }
}
