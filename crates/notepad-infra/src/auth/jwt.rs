//! JWT token service implementation.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use notepad_core::ports::{AuthError, TokenClaims, TokenService};

const DEFAULT_SECRET: &str = "change-me-in-production";
const DEFAULT_ISSUER: &str = "guitar-notepad";

/// JWT token service configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SECRET.to_string(),
            expiration_hours: 24,
            issuer: DEFAULT_ISSUER.to_string(),
        }
    }
}

impl JwtConfig {
    /// Load configuration from `JWT_SECRET`, `JWT_EXPIRATION_HOURS` and `JWT_ISSUER`.
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_SECRET.to_string());

        if secret == DEFAULT_SECRET {
            let is_production = std::env::var("RUST_ENV")
                .map(|v| v == "production" || v == "prod")
                .unwrap_or(false);

            if is_production {
                tracing::error!(
                    "SECURITY: Using default JWT secret in production! Set JWT_SECRET environment variable."
                );
            } else {
                tracing::warn!("Using default JWT secret. Set JWT_SECRET for production use.");
            }
        }

        Self {
            secret,
            expiration_hours: std::env::var("JWT_EXPIRATION_HOURS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(24),
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| DEFAULT_ISSUER.to_string()),
        }
    }
}

/// Wire format of the token payload.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // user_id
    username: String,
    roles: Vec<String>,
    exp: i64,
    iat: i64,
    iss: String,
}

/// HS256 JWT token service.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    config: JwtConfig,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            encoding_key,
            decoding_key,
            config,
        }
    }
}

impl TokenService for JwtTokenService {
    fn generate_token(
        &self,
        user_id: Uuid,
        username: &str,
        roles: Vec<String>,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + TimeDelta::hours(self.config.expiration_hours);

        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            roles,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        let user_id = Uuid::parse_str(&token_data.claims.sub)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(TokenClaims {
            user_id,
            username: token_data.claims.username,
            roles: token_data.claims.roles,
            exp: token_data.claims.exp,
        })
    }

    fn expiration_seconds(&self) -> i64 {
        self.config.expiration_hours * 3600
    }
}
