//! JWT issuance/verification and the authenticated-caller extractor.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::backend::error::ApiError;
use crate::backend::AppState;
use crate::config::AppConfig;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub email: String,
    pub exp: usize,
}

pub fn issue_token(
    config: &AppConfig,
    user_id: i64,
    email: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let exp = (Utc::now() + Duration::hours(config.jwt_expire_hours)).timestamp() as usize;
    let claims = Claims {
        user_id,
        email: email.to_string(),
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
}

pub fn verify_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

/// The authenticated caller. Handlers take this as an argument; requests
/// without a valid Bearer token never reach them.
#[derive(Debug)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                ApiError::Unauthorized("Access denied. No token provided.".to_string())
            })?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError::Unauthorized("Access denied. No token provided.".to_string())
        })?;

        let claims = verify_token(&state.config.jwt_secret, token).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => {
                    ApiError::Unauthorized("Token expired. Please login again.".to_string())
                }
                _ => ApiError::Unauthorized("Invalid token.".to_string()),
            }
        })?;

        Ok(AuthUser {
            user_id: claims.user_id,
            email: claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".to_string(),
            port: 0,
            jwt_secret: "test_secret".to_string(),
            jwt_expire_hours: 1,
            cors_origin: "http://localhost:5173".to_string(),
        }
    }

    #[test]
    fn token_round_trip() {
        let config = test_config();
        let token = issue_token(&config, 42, "a@b.com").unwrap();
        let claims = verify_token(&config.jwt_secret, &token).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.email, "a@b.com");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let config = test_config();
        let token = issue_token(&config, 42, "a@b.com").unwrap();
        assert!(verify_token("other_secret", &token).is_err());
    }
}
