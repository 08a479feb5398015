use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::Role;

/// Issuer stamped into, and required of, every session token
pub const TOKEN_ISSUER: &str = "storefront-api";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub iss: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    /// Unique token id
    pub jti: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token is signed with an unexpected algorithm")]
    UnexpectedAlgorithm,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token is not valid yet")]
    NotYetValid,
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Issues and verifies HMAC-signed session tokens. Holds no session state.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: chrono::Duration,
    validation: Validation,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        // Time window is checked by verify_at against an explicit clock
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "nbf", "iat", "sub", "iss"]);
        validation.set_issuer(&[TOKEN_ISSUER]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::hours(24)),
            validation,
        }
    }

    /// Token lifetime in whole seconds
    pub fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }

    pub fn issue(&self, subject_id: &str, email: &str, role: Role) -> Result<String, TokenError> {
        self.issue_at(subject_id, email, role, Utc::now())
    }

    pub fn issue_at(
        &self,
        subject_id: &str,
        email: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let issued_at = now.timestamp();
        let claims = Claims {
            sub: subject_id.to_string(),
            email: email.to_string(),
            role,
            iss: TOKEN_ISSUER.to_string(),
            iat: issued_at,
            nbf: issued_at,
            exp: issued_at + self.ttl.num_seconds(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                    TokenError::UnexpectedAlgorithm
                }
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed(e.to_string()),
            })?
            .claims;

        let now = now.timestamp();
        if now < claims.nbf {
            return Err(TokenError::NotYetValid);
        }
        if now > claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-signing-secret";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, Duration::from_secs(3600))
    }

    #[test]
    fn test_verify_returns_issued_identity() {
        let codec = codec();
        let token = codec.issue("user-123", "a@b.com", Role::User).unwrap();
        let claims = codec.verify(&token).unwrap();

        assert_eq!(claims.sub, "user-123");
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.iss, TOKEN_ISSUER);
        assert_eq!(claims.exp, claims.iat + 3600);
        assert_eq!(claims.nbf, claims.iat);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn test_each_token_gets_a_fresh_id() {
        let codec = codec();
        let now = Utc::now();
        let first = codec.verify(&codec.issue_at("u", "a@b.com", Role::Admin, now).unwrap()).unwrap();
        let second = codec.verify(&codec.issue_at("u", "a@b.com", Role::Admin, now).unwrap()).unwrap();
        assert_ne!(first.jti, second.jti);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let codec = codec();
        let issued = Utc::now() - chrono::Duration::hours(2);
        let token = codec.issue_at("user-123", "a@b.com", Role::User, issued).unwrap();

        assert_eq!(codec.verify(&token), Err(TokenError::Expired));
        let at_expiry = issued + chrono::Duration::seconds(3600);
        assert!(codec.verify_at(&token, at_expiry).is_ok());
        let after_expiry = at_expiry + chrono::Duration::seconds(1);
        assert_eq!(codec.verify_at(&token, after_expiry), Err(TokenError::Expired));
    }

    #[test]
    fn test_token_from_the_future_is_not_yet_valid() {
        let codec = codec();
        let issued = Utc::now() + chrono::Duration::minutes(10);
        let token = codec.issue_at("user-123", "a@b.com", Role::User, issued).unwrap();
        assert_eq!(codec.verify(&token), Err(TokenError::NotYetValid));
    }

    #[test]
    fn test_other_secret_fails_signature() {
        let token = TokenCodec::new("another-secret", Duration::from_secs(3600))
            .issue("user-123", "a@b.com", Role::User)
            .unwrap();
        assert_eq!(codec().verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_non_hmac_algorithm_is_rejected() {
        let token = codec().issue("user-123", "a@b.com", Role::User).unwrap();
        let mut parts = token.split('.');
        let _header = parts.next();
        let payload = parts.next().unwrap();
        // {"alg":"RS256","typ":"JWT"}
        let forged = format!("eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9.{}.c2lnbmF0dXJl", payload);

        assert_eq!(codec().verify(&forged), Err(TokenError::UnexpectedAlgorithm));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let codec = codec();
        assert!(matches!(codec.verify("not-a-token"), Err(TokenError::Malformed(_))));
        assert!(matches!(codec.verify("a.b.c"), Err(TokenError::Malformed(_))));
        assert!(matches!(codec.verify(""), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn test_foreign_issuer_is_malformed() {
        #[derive(Serialize)]
        struct Foreign<'a> {
            sub: &'a str,
            email: &'a str,
            role: &'a str,
            iss: &'a str,
            iat: i64,
            nbf: i64,
            exp: i64,
            jti: &'a str,
        }

        let now = Utc::now().timestamp();
        let token = encode(
            &Header::default(),
            &Foreign {
                sub: "user-123",
                email: "a@b.com",
                role: "user",
                iss: "someone-else",
                iat: now,
                nbf: now,
                exp: now + 60,
                jti: "x",
            },
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(codec().verify(&token), Err(TokenError::Malformed(_))));
    }
}
