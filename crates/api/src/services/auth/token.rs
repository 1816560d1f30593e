//! Signed session tokens.
//!
//! Tokens are HS256 JWTs carrying the user ID, email and role, valid for
//! seven days. The role in the token is informational only: extractors
//! reload the account on every request.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use loyalty_core::{UserId, UserRole};

use super::AuthError;
use crate::models::user::User;

/// Token lifetime, matching the cookie `Max-Age`.
pub const TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// JWT claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID as a decimal string.
    pub sub: String,
    pub email: String,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// The user this token was issued to.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MalformedSubject` if `sub` is not an integer.
    pub fn user_id(&self) -> Result<UserId, AuthError> {
        self.sub.parse().map_err(|_| AuthError::MalformedSubject)
    }
}

/// Signing and verification keys derived from the configured secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys").finish_non_exhaustive()
    }
}

impl JwtKeys {
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
        }
    }

    /// Sign a token for `user` issued at `now`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if signing fails.
    pub fn issue(&self, user: &User, now: DateTime<Utc>) -> Result<String, AuthError> {
        let iat = now.timestamp();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.as_str().to_owned(),
            role: user.role,
            iat,
            exp: iat + TOKEN_TTL_SECS,
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(token)
    }

    /// Verify a token's signature and expiry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if the token is malformed, forged or expired.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use loyalty_core::Email;

    use super::*;

    fn keys(secret: &str) -> JwtKeys {
        JwtKeys::new(&SecretString::from(secret.to_owned()))
    }

    fn user() -> User {
        User {
            id: UserId::new(42),
            email: Email::parse("member@example.com").unwrap(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone: None,
            role: UserRole::Customer,
            is_active: true,
            last_login: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_issue_then_verify() {
        let keys = keys("kQ9#vT2$wX7!mP4@zR8&nL3*bJ6^cH1%");
        let now = Utc::now();
        let token = keys.issue(&user(), now).unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), UserId::new(42));
        assert_eq!(claims.email, "member@example.com");
        assert_eq!(claims.role, UserRole::Customer);
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let keys = keys("kQ9#vT2$wX7!mP4@zR8&nL3*bJ6^cH1%");
        let token = keys.issue(&user(), Utc::now() - Duration::days(8)).unwrap();
        assert!(matches!(keys.verify(&token), Err(AuthError::Token(_))));
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let token = keys("another-secret-value-of-32-chars!!")
            .issue(&user(), Utc::now())
            .unwrap();
        let result = keys("kQ9#vT2$wX7!mP4@zR8&nL3*bJ6^cH1%").verify(&token);
        assert!(matches!(result, Err(AuthError::Token(_))));
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let keys = keys("kQ9#vT2$wX7!mP4@zR8&nL3*bJ6^cH1%");
        assert!(keys.verify("not.a.jwt").is_err());
        assert!(keys.verify("").is_err());
    }
}
