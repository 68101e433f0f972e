//! Signed session tokens carrying identity claims.
//!
//! Tokens are stateless HS512 JWTs: validity is purely a function of the
//! signing key, the embedded claims, and the clock at verification time.
//! There is no server-side revocation list; a token stays valid until its
//! natural expiry even if the password changes afterwards.

use anyhow::{Context, Result};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::AuthError;
use crate::store::UserCredential;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Closed claim set embedded in every session token.
///
/// The claim set is fixed and statically typed; there is no free-form
/// key/value payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub email: String,
    pub given_name: String,
    pub family_name: String,
    pub iss: String,
    pub iat: u64,
    pub exp: u64,
}

/// Builds and verifies signed session tokens.
///
/// Pure apart from the clock: no storage, no locking.
pub struct SessionTokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl_seconds: u64,
    validation: Validation,
}

impl SessionTokenIssuer {
    #[must_use]
    pub fn new(key: &SecretString, issuer: String, ttl_days: i64) -> Self {
        let secret = key.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS512);
        validation.set_issuer(&[issuer.as_str()]);
        // Single-client deployment: there is no audience to pin, so audience
        // validation stays off.
        validation.validate_aud = false;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer,
            ttl_seconds: u64::try_from(ttl_days).unwrap_or(7).saturating_mul(SECONDS_PER_DAY),
            validation,
        }
    }

    /// Mint a token for a fully populated credential record.
    pub fn issue(&self, user: &UserCredential) -> Result<String> {
        let now = unix_now()?;
        let claims = SessionClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            given_name: user.first_name.clone(),
            family_name: user.last_name.clone(),
            iss: self.issuer.clone(),
            iat: now,
            exp: now + self.ttl_seconds,
        };
        encode(&Header::new(Algorithm::HS512), &claims, &self.encoding)
            .context("failed to sign session token")
    }

    /// Verify signature, issuer, and expiry, returning the embedded claims.
    ///
    /// Expired, mis-signed, tampered, and malformed tokens are all rejected
    /// as the same `InvalidToken` kind so callers cannot probe the cause.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }
}

fn unix_now() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before the unix epoch")?
        .as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user() -> UserCredential {
        UserCredential {
            id: Uuid::new_v4(),
            login_name: "alice@example.com".to_string(),
            email: "alice@example.com".to_string(),
            first_name: "alice".to_string(),
            last_name: "liddell".to_string(),
            email_confirmed: true,
        }
    }

    fn issuer(key: &str) -> SessionTokenIssuer {
        SessionTokenIssuer::new(&SecretString::from(key.to_string()), "ingresso".to_string(), 7)
    }

    #[test]
    fn issue_then_verify_round_trips_claims() {
        let user = user();
        let issuer = issuer("test-signing-key");
        let token = issuer.issue(&user).unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.given_name, user.first_name);
        assert_eq!(claims.family_name, user.last_name);
        assert_eq!(claims.iss, "ingresso");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn rejects_token_signed_with_another_key() {
        let token = issuer("first-key").issue(&user()).unwrap();
        let err = issuer("second-key").verify(&token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[test]
    fn rejects_expired_token() {
        let issuer = issuer("test-signing-key");
        let now = unix_now().unwrap();
        let claims = SessionClaims {
            sub: "subject".to_string(),
            email: "alice@example.com".to_string(),
            given_name: "alice".to_string(),
            family_name: "liddell".to_string(),
            iss: "ingresso".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"test-signing-key"),
        )
        .unwrap();
        let err = issuer.verify(&token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[test]
    fn rejects_issuer_mismatch() {
        let issuer = issuer("test-signing-key");
        let now = unix_now().unwrap();
        let claims = SessionClaims {
            sub: "subject".to_string(),
            email: "alice@example.com".to_string(),
            given_name: "alice".to_string(),
            family_name: "liddell".to_string(),
            iss: "somebody-else".to_string(),
            iat: now,
            exp: now + 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"test-signing-key"),
        )
        .unwrap();
        let err = issuer.verify(&token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[test]
    fn rejects_tampered_claims() {
        let issuer = issuer("test-signing-key");
        let mut alice = user();
        let mut mallory = user();
        alice.email = "alice@example.com".to_string();
        mallory.email = "mallory@example.com".to_string();

        let alice_token = issuer.issue(&alice).unwrap();
        let mallory_token = issuer.issue(&mallory).unwrap();

        // Splice mallory's payload under alice's signature.
        let alice_parts: Vec<&str> = alice_token.split('.').collect();
        let mallory_parts: Vec<&str> = mallory_token.split('.').collect();
        let forged = format!(
            "{}.{}.{}",
            alice_parts[0], mallory_parts[1], alice_parts[2]
        );

        let err = issuer.verify(&forged).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[test]
    fn rejects_garbage() {
        let issuer = issuer("test-signing-key");
        assert!(matches!(
            issuer.verify("not.a.token").unwrap_err(),
            AuthError::InvalidToken
        ));
        assert!(matches!(
            issuer.verify("").unwrap_err(),
            AuthError::InvalidToken
        ));
    }
}
