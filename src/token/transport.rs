//! Transport encoding for single-use action secrets.
//!
//! The raw secrets minted by the credential store are textual but may carry
//! characters that are reserved inside a URL query string. This codec wraps
//! them in base64url so they survive an email link round trip untouched.
//! It carries no business semantics: purpose and target user live with the
//! store, not here.

use base64ct::{Base64UrlUnpadded, Encoding};

use crate::error::AuthError;

/// Encode a raw secret for embedding in a link query parameter. Total for any
/// input string.
#[must_use]
pub fn encode_for_transport(raw_secret: &str) -> String {
    Base64UrlUnpadded::encode_string(raw_secret.as_bytes())
}

/// Inverse of [`encode_for_transport`].
///
/// Fails with `MalformedToken` when the input is not valid base64url or does
/// not decode to UTF-8 text.
pub fn decode_from_transport(value: &str) -> Result<String, AuthError> {
    let bytes =
        Base64UrlUnpadded::decode_vec(value.trim()).map_err(|_| AuthError::MalformedToken)?;
    String::from_utf8(bytes).map_err(|_| AuthError::MalformedToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_textual_secrets() {
        for secret in [
            "plain",
            "u0hF+Qy/3Zw==",
            "secret with spaces & reserved ?=#",
            "",
        ] {
            let encoded = encode_for_transport(secret);
            assert_eq!(decode_from_transport(&encoded).unwrap(), secret);
        }
    }

    #[test]
    fn encoded_form_is_url_safe() {
        let encoded = encode_for_transport("u0hF+Qy/3Zw==?&");
        assert!(encoded
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn rejects_invalid_base64url() {
        let err = decode_from_transport("not%valid!").unwrap_err();
        assert!(matches!(err, AuthError::MalformedToken));
    }

    #[test]
    fn rejects_non_utf8_payload() {
        let encoded = Base64UrlUnpadded::encode_string(&[0xff, 0xfe, 0xfd]);
        let err = decode_from_transport(&encoded).unwrap_err();
        assert!(matches!(err, AuthError::MalformedToken));
    }
}
