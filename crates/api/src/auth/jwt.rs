//! Session tokens.
//!
//! A token only names the user and when it was issued. Role and active flag
//! are looked up per request, and tokens issued before the last password
//! change are refused by the auth middleware using `iat`.

use chrono::{Duration, Utc};
use eventhub_core::types::DbId;
use jsonwebtoken::errors::Error as JwtError;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id.
    pub sub: DbId,
    /// Unix seconds.
    pub iat: i64,
    /// Unix seconds.
    pub exp: i64,
    pub jti: String,
}

/// Signing secret plus token and cookie lifetimes.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiry_days: i64,
    pub cookie_expiry_days: i64,
}

impl JwtConfig {
    /// Reads `JWT_SECRET` (required), `JWT_EXPIRY_DAYS` and
    /// `JWT_COOKIE_EXPIRY_DAYS` (both default to 90).
    ///
    /// # Panics
    ///
    /// On a missing or empty secret, or a non-numeric lifetime.
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_default();
        assert!(!secret.is_empty(), "JWT_SECRET must be set to a non-empty value");

        Self {
            secret,
            expiry_days: days_from_env("JWT_EXPIRY_DAYS"),
            cookie_expiry_days: days_from_env("JWT_COOKIE_EXPIRY_DAYS"),
        }
    }

    fn keys(&self) -> (EncodingKey, DecodingKey) {
        let raw = self.secret.as_bytes();
        (EncodingKey::from_secret(raw), DecodingKey::from_secret(raw))
    }
}

fn days_from_env(var: &str) -> i64 {
    match std::env::var(var) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{var} must be a whole number of days")),
        Err(_) => 90,
    }
}

/// Issue a fresh token for `user_id` valid for `expiry_days`.
pub fn generate_access_token(user_id: DbId, config: &JwtConfig) -> Result<String, JwtError> {
    let issued = Utc::now();
    let claims = Claims {
        sub: user_id,
        iat: issued.timestamp(),
        exp: (issued + Duration::days(config.expiry_days)).timestamp(),
        jti: Uuid::new_v4().to_string(),
    };
    encode_claims(&claims, config)
}

/// HS256-sign a claim set.
pub fn encode_claims(claims: &Claims, config: &JwtConfig) -> Result<String, JwtError> {
    let (signing, _) = config.keys();
    encode(&Header::default(), claims, &signing)
}

/// Check signature and expiry, returning the claims of a usable token.
pub fn validate_token(token: &str, config: &JwtConfig) -> Result<Claims, JwtError> {
    let (_, verifying) = config.keys();
    decode::<Claims>(token, &verifying, &Validation::default()).map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::errors::ErrorKind;

    use super::*;

    fn config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.to_string(),
            expiry_days: 90,
            cookie_expiry_days: 90,
        }
    }

    #[test]
    fn issued_token_names_the_user_for_ninety_days() {
        let cfg = config("eventhub-test-secret");
        let token = generate_access_token(7, &cfg).unwrap();

        let claims = validate_token(&token, &cfg).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.exp - claims.iat, 90 * 86_400);
    }

    #[test]
    fn each_login_gets_a_distinct_token_id() {
        let cfg = config("eventhub-test-secret");
        let a = validate_token(&generate_access_token(7, &cfg).unwrap(), &cfg).unwrap();
        let b = validate_token(&generate_access_token(7, &cfg).unwrap(), &cfg).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn lapsed_session_is_rejected() {
        let cfg = config("eventhub-test-secret");
        // Outside the default 60s leeway.
        let now = Utc::now().timestamp();
        let token = encode_claims(
            &Claims {
                sub: 7,
                iat: now - 7_200,
                exp: now - 3_600,
                jti: Uuid::new_v4().to_string(),
            },
            &cfg,
        )
        .unwrap();

        let err = validate_token(&token, &cfg).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ExpiredSignature));
    }

    #[test]
    fn token_from_another_deployment_is_rejected() {
        let token = generate_access_token(7, &config("staging-secret")).unwrap();
        let err = validate_token(&token, &config("production-secret")).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidSignature));
    }

    #[test]
    fn malformed_bearer_value_is_rejected() {
        assert!(validate_token("Bearer.abc", &config("eventhub-test-secret")).is_err());
    }
}
