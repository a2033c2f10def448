//! services/api/src/token.rs
//!
//! Issues and verifies the bearer tokens handed out at signup and login.
//!
//! Tokens are stateless HS256 JWTs carrying the user id (`sub`) and an absolute
//! expiry (`exp`). A token is accepted while its signature verifies against the
//! current secret and its expiry lies in the future. There is no revocation
//! list: a leaked token stays usable until it expires, and rotating the secret
//! invalidates every outstanding token at once.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Malformed token, bad signature, or a subject that is not a user id.
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    Expired,
    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// The claim set embedded in every token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Signs and checks bearer tokens with a single shared secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is compared in `verify_at` so the boundary follows the caller's clock.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, TokenError> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Returns the user id the token was issued for.
    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|_| TokenError::InvalidToken)?;

        if data.claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        Uuid::parse_str(&data.claims.sub).map_err(|_| TokenError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret", Duration::days(30))
    }

    #[test]
    fn issued_token_verifies_to_the_same_user() {
        let tokens = service();
        let user_id = Uuid::new_v4();

        let token = tokens.issue(user_id).unwrap();

        assert_eq!(tokens.verify(&token), Ok(user_id));
    }

    #[test]
    fn token_expires_after_thirty_days() {
        let tokens = service();
        let user_id = Uuid::new_v4();
        let issued = Utc::now();
        let token = tokens.issue_at(user_id, issued).unwrap();

        assert_eq!(tokens.verify_at(&token, issued + Duration::days(29)), Ok(user_id));
        assert_eq!(
            tokens.verify_at(&token, issued + Duration::days(31)),
            Err(TokenError::Expired)
        );
        assert_eq!(
            tokens.verify_at(&token, issued + Duration::days(30)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let other = TokenService::new("another-secret", Duration::days(30));
        let token = other.issue(Uuid::new_v4()).unwrap();

        assert_eq!(service().verify(&token), Err(TokenError::InvalidToken));
    }

    #[test]
    fn tampered_or_garbage_tokens_are_rejected() {
        let tokens = service();
        let token = tokens.issue(Uuid::new_v4()).unwrap();

        // Flip one character in the middle of the signature segment.
        let at = token.rfind('.').unwrap() + 5;
        let original = &token[at..at + 1];
        let replacement = if original == "A" { "B" } else { "A" };
        let tampered = format!("{}{}{}", &token[..at], replacement, &token[at + 1..]);

        assert_eq!(tokens.verify(&tampered), Err(TokenError::InvalidToken));
        assert_eq!(tokens.verify("not-a-token"), Err(TokenError::InvalidToken));
        assert_eq!(tokens.verify(""), Err(TokenError::InvalidToken));
    }

    #[test]
    fn subject_must_be_a_user_id() {
        let claims = Claims {
            sub: "admin".to_string(),
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + Duration::days(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert_eq!(service().verify(&token), Err(TokenError::InvalidToken));
    }
}
