//! Origin fingerprinting
//!
//! Binds a token to the remote address and user agent of the browser that
//! requested it. The digest is SHA-256, hex encoded, so every fingerprint is
//! exactly [`FINGERPRINT_WIDTH`] characters wide both when it is written into
//! a token and when it is sliced back out.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Width of an encoded fingerprint in characters
pub const FINGERPRINT_WIDTH: usize = 64;

/// Compute the fingerprint of a remote address / user agent pair.
pub fn compute(remote_address: &str, user_agent: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(remote_address.as_bytes());
    hasher.update(user_agent.as_bytes());
    hex::encode(hasher.finalize())
}

/// Network identity of the requesting browser
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOrigin {
    /// Remote address as reported by the HTTP layer
    pub remote_address: String,
    /// `User-Agent` header value
    pub user_agent: String,
}

impl RequestOrigin {
    pub fn new(remote_address: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            remote_address: remote_address.into(),
            user_agent: user_agent.into(),
        }
    }

    /// Fingerprint of this origin
    pub fn fingerprint(&self) -> String {
        compute(&self.remote_address, &self.user_agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_width() {
        assert_eq!(compute("", "").len(), FINGERPRINT_WIDTH);
        assert_eq!(
            compute("203.0.113.9", "Mozilla/5.0 (X11; Linux x86_64)").len(),
            FINGERPRINT_WIDTH
        );
    }

    #[test]
    fn test_known_digest() {
        // sha256("abc")
        assert_eq!(
            compute("a", "bc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_deterministic_and_input_sensitive() {
        let origin = RequestOrigin::new("127.0.0.1", "curl/8.0");
        assert_eq!(origin.fingerprint(), origin.fingerprint());
        assert_ne!(
            origin.fingerprint(),
            RequestOrigin::new("127.0.0.2", "curl/8.0").fingerprint()
        );
        assert_ne!(
            origin.fingerprint(),
            RequestOrigin::new("127.0.0.1", "curl/8.1").fingerprint()
        );
    }
}
