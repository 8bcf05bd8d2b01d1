//! HS256 access token encoding and decoding.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use learnhub_core::config::auth::AuthConfig;
use learnhub_core::error::AppError;
use learnhub_entity::user::{User, UserRole};

/// Claims carried in an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject — the user ID.
    pub sub: Uuid,
    /// Username at issuance time.
    pub username: String,
    /// Role at issuance time.
    pub role: UserRole,
    /// Issued-at (unix seconds).
    pub iat: i64,
    /// Expiration (unix seconds).
    pub exp: i64,
}

/// Encodes access tokens.
#[derive(Clone)]
pub struct JwtEncoder {
    key: EncodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder").finish()
    }
}

impl JwtEncoder {
    /// Create a new encoder from configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl: Duration::minutes(config.token_ttl_minutes),
        }
    }

    /// Issue an access token for a user. Returns the token and its expiry.
    pub fn encode(&self, user: &User) -> Result<(String, DateTime<Utc>), AppError> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = AccessClaims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.key)
            .map_err(|e| AppError::internal(format!("Failed to sign token: {e}")))?;

        Ok((token, expires_at))
    }
}

/// Decodes and validates access tokens.
#[derive(Clone)]
pub struct JwtDecoder {
    key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder").finish()
    }
}

impl JwtDecoder {
    /// Create a new decoder from configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation: Validation::default(),
        }
    }

    /// Decode and validate an access token.
    pub fn decode(&self, token: &str) -> Result<AccessClaims, AppError> {
        jsonwebtoken::decode::<AccessClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::unauthorized(format!("Invalid access token: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret-not-for-production".to_string(),
            token_ttl_minutes: 60,
        }
    }

    fn test_user(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: None,
            password_hash: "x".to_string(),
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_round_trip() {
        let config = test_config();
        let encoder = JwtEncoder::new(&config);
        let decoder = JwtDecoder::new(&config);

        let user = test_user(UserRole::Student);
        let (token, expires_at) = encoder.encode(&user).unwrap();
        assert!(expires_at > Utc::now());

        let claims = decoder.decode(&token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, UserRole::Student);
    }

    #[test]
    fn test_rejects_wrong_secret() {
        let encoder = JwtEncoder::new(&test_config());
        let decoder = JwtDecoder::new(&AuthConfig {
            jwt_secret: "a-different-secret".to_string(),
            token_ttl_minutes: 60,
        });

        let (token, _) = encoder.encode(&test_user(UserRole::Admin)).unwrap();
        assert!(decoder.decode(&token).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        let decoder = JwtDecoder::new(&test_config());
        assert!(decoder.decode("not-a-token").is_err());
    }
}
