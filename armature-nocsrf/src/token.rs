use crate::error::{CsrfError, Result};
use crate::fingerprint::FINGERPRINT_WIDTH;
use base64::{Engine, engine::general_purpose::STANDARD};

/// Width of the issue-time prefix in decoded token bytes
pub const ISSUE_TIME_WIDTH: usize = 10;

const MAX_ISSUE_TIME: i64 = 9_999_999_999;

/// Fields recovered from a token.
///
/// Decoding is lenient: missing or garbled fields come back empty (or `None`
/// for the issue time) instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedToken {
    /// Unix timestamp the token was issued at
    pub issue_time: Option<i64>,

    /// Origin fingerprint slice (empty when origin checking is off)
    pub origin_fingerprint: String,

    /// Random nonce
    pub nonce: String,
}

/// Packs token fields into an opaque base64 string and back.
///
/// The decoded layout is `issue_time (10 digits) ++ fingerprint ++ nonce`.
/// Nothing in the token says whether a fingerprint is present, so the codec
/// must be built with the same `origin_check` setting on both sides.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenCodec {
    origin_check: bool,
}

impl TokenCodec {
    pub fn new(origin_check: bool) -> Self {
        Self { origin_check }
    }

    pub fn origin_check(&self) -> bool {
        self.origin_check
    }

    /// Encode token fields
    pub fn encode(&self, issue_time: i64, origin_fingerprint: &str, nonce: &str) -> Result<String> {
        let expected = if self.origin_check { FINGERPRINT_WIDTH } else { 0 };
        if origin_fingerprint.len() != expected {
            return Err(CsrfError::config(format!(
                "Origin fingerprint must be {} characters with origin_check={}, got {}",
                expected,
                self.origin_check,
                origin_fingerprint.len()
            )));
        }

        let issue_time = issue_time.clamp(0, MAX_ISSUE_TIME);
        let raw = format!(
            "{:0width$}{}{}",
            issue_time,
            origin_fingerprint,
            nonce,
            width = ISSUE_TIME_WIDTH
        );
        Ok(STANDARD.encode(raw))
    }

    /// Decode a token into its fields
    pub fn decode(&self, token: &str) -> DecodedToken {
        let bytes = STANDARD.decode(token).unwrap_or_default();

        let issue_time = bytes
            .get(..ISSUE_TIME_WIDTH)
            .filter(|digits| digits.iter().all(u8::is_ascii_digit))
            .and_then(|digits| std::str::from_utf8(digits).ok())
            .and_then(|digits| digits.parse().ok());

        let mut offset = ISSUE_TIME_WIDTH.min(bytes.len());
        let origin_fingerprint = if self.origin_check {
            let end = (offset + FINGERPRINT_WIDTH).min(bytes.len());
            let slice = String::from_utf8_lossy(&bytes[offset..end]).into_owned();
            offset = end;
            slice
        } else {
            String::new()
        };

        let nonce = String::from_utf8_lossy(&bytes[offset..]).into_owned();

        DecodedToken {
            issue_time,
            origin_fingerprint,
            nonce,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint;
    use crate::nonce::{NONCE_LENGTH, NonceGenerator};
    use proptest::prelude::*;

    #[test]
    fn test_encode_decode_without_origin() {
        let codec = TokenCodec::new(false);
        let nonce = NonceGenerator::new().next(NONCE_LENGTH);

        let token = codec.encode(1_700_000_000, "", &nonce).unwrap();
        let decoded = codec.decode(&token);

        assert_eq!(decoded.issue_time, Some(1_700_000_000));
        assert!(decoded.origin_fingerprint.is_empty());
        assert_eq!(decoded.nonce, nonce);
    }

    #[test]
    fn test_encode_decode_with_origin() {
        let codec = TokenCodec::new(true);
        let fp = fingerprint::compute("10.0.0.1", "Firefox");

        let token = codec.encode(42, &fp, "abc").unwrap();
        let decoded = codec.decode(&token);

        assert_eq!(decoded.issue_time, Some(42));
        assert_eq!(decoded.origin_fingerprint, fp);
        assert_eq!(decoded.nonce, "abc");
    }

    #[test]
    fn test_issue_time_is_zero_padded() {
        let token = TokenCodec::new(false).encode(7, "", "n").unwrap();
        let raw = STANDARD.decode(token).unwrap();
        assert_eq!(&raw[..ISSUE_TIME_WIDTH], b"0000000007");
    }

    #[test]
    fn test_rejects_wrong_fingerprint_width() {
        let codec = TokenCodec::new(true);
        assert!(codec.encode(1, "deadbeef", "nonce").is_err());
    }

    #[test]
    fn test_origin_codec_requires_fingerprint() {
        let codec = TokenCodec::new(true);
        let nonce = NonceGenerator::new().next(NONCE_LENGTH);

        assert!(matches!(
            codec.encode(1_700_000_000, "", &nonce),
            Err(CsrfError::Config(_))
        ));
    }

    #[test]
    fn test_plain_codec_rejects_fingerprint() {
        let codec = TokenCodec::new(false);
        let fp = fingerprint::compute("10.0.0.1", "Firefox");

        assert!(matches!(
            codec.encode(1_700_000_000, &fp, "abc"),
            Err(CsrfError::Config(_))
        ));
    }

    #[test]
    fn test_decode_garbage_does_not_panic() {
        let codec = TokenCodec::new(true);

        let decoded = codec.decode("whateverkey");
        assert_eq!(decoded.issue_time, None);

        let decoded = codec.decode("!!!not base64!!!");
        assert_eq!(decoded, DecodedToken::default());

        let decoded = codec.decode(&STANDARD.encode("12345"));
        assert_eq!(decoded.issue_time, None);
        assert!(decoded.origin_fingerprint.is_empty());
    }

    #[test]
    fn test_non_numeric_issue_time() {
        let token = STANDARD.encode("12345abcdeNONCE");
        let decoded = TokenCodec::new(false).decode(&token);
        assert_eq!(decoded.issue_time, None);
        assert_eq!(decoded.nonce, "NONCE");
    }

    proptest! {
        #[test]
        fn decode_never_panics(input in ".{0,200}", origin_check in any::<bool>()) {
            let _ = TokenCodec::new(origin_check).decode(&input);
        }
    }
}
