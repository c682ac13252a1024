use actix_web::{HttpMessage, HttpRequest, HttpResponse, dev::ServiceRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    env_config::JwtConfig,
    error::{AppError, Res},
    misc::Role,
};

/// Session token claims issued after a successful phone login or signup.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtClaims {
    pub user_id: Uuid,
    pub role: Role,
    pub exp: usize,
}

pub struct ClaimsSpec {
    pub user_id: Uuid,
    pub role: Role,
}

/// Generates JWT token based on user object and JWT configuration options
pub fn generate_jwt(spec: ClaimsSpec, config: &JwtConfig) -> Res<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(config.expiration_hours))
        .ok_or_else(|| AppError::Internal("Token expiration overflow".to_string()))?
        .timestamp();

    let claims = JwtClaims {
        user_id: spec.user_id,
        role: spec.role,
        exp: expiration as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(AppError::from)
}

/// Extracts claims object from JWT token.
/// Requires JWT secret.
pub fn validate_jwt(token: &str, secret: &str) -> Res<JwtClaims> {
    let token_data = jsonwebtoken::decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| AppError::Unauthorized(format!("Invalid session token: {}", e)))?;
    Ok(token_data.claims)
}

pub fn get_jwt_claims_or_error(req: &ServiceRequest) -> Result<JwtClaims, HttpResponse> {
    if let Some(jwt_claims_res) = req.extensions().get::<Res<JwtClaims>>() {
        match jwt_claims_res {
            Ok(claims) => Ok(claims.clone()),
            Err(app_error) => Err(app_error.to_http_response()),
        }
    } else {
        Err(
            AppError::Unauthorized("No authorization token provided".to_string())
                .to_http_response(),
        )
    }
}

/// Claims of an optional session.
///
/// No token yields `None`; a token that failed validation is an error, never anonymous access.
pub fn optional_claims(req: &HttpRequest) -> Res<Option<JwtClaims>> {
    match req.extensions().get::<Res<JwtClaims>>() {
        Some(Ok(claims)) => Ok(Some(claims.clone())),
        Some(Err(app_error)) => Err(AppError::Unauthorized(app_error.to_string())),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".to_string(),
            expiration_hours: 1,
        }
    }

    #[test]
    fn issued_token_validates_with_same_secret() {
        let user_id = Uuid::new_v4();
        let token = generate_jwt(
            ClaimsSpec {
                user_id,
                role: Role::Freelancer,
            },
            &config(),
        )
        .unwrap();

        let claims = validate_jwt(&token, "test-secret").unwrap();
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.role, Role::Freelancer);
    }

    #[test]
    fn token_signed_with_other_secret_is_unauthorized() {
        let token = generate_jwt(
            ClaimsSpec {
                user_id: Uuid::new_v4(),
                role: Role::Client,
            },
            &config(),
        )
        .unwrap();

        assert!(matches!(
            validate_jwt(&token, "other-secret"),
            Err(AppError::Unauthorized(_))
        ));
    }
}
