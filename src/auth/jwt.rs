use crate::auth::IdentityProvider;
use crate::core::errors::SmartSplitError;
use crate::core::models::user::Identity;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

const MAX_TOKEN_MINUTES: u64 = 60 * 24 * 365 * 10;

/// Bearer token payload. `sub` is the user id.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 tokens signed with one shared secret.
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl JwtService {
    pub fn new(secret: String, expire_minutes: u64) -> Self {
        // capped at ten years
        let minutes = expire_minutes.min(MAX_TOKEN_MINUTES) as i64;
        JwtService {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime: Duration::minutes(minutes),
        }
    }

    pub fn generate_token(&self, user_id: &str) -> Result<String, SmartSplitError> {
        let issued = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: issued.timestamp(),
            exp: (issued + self.lifetime).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| SmartSplitError::InternalServerError(format!("JWT encoding error: {}", e)))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, SmartSplitError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| SmartSplitError::Unauthorized(format!("Invalid token: {}", e)))
    }
}

impl IdentityProvider for JwtService {
    fn resolve(&self, token: &str) -> Result<Identity, SmartSplitError> {
        let claims = self.validate_token(token)?;
        if claims.sub.is_empty() {
            return Err(SmartSplitError::Unauthorized("Token has no subject".to_string()));
        }
        Ok(Identity { user_id: claims.sub })
    }
}
