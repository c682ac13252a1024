use actix_web::{HttpMessage, HttpResponse, dev::ServiceRequest};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use base64::{Engine, engine::general_purpose};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Res};

const ADMIN_KEY_PREFIX: &str = "ak_";

/// Contents of an admin API key (`X-API-KEY` header).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AdminKeyClaims {
    pub admin_id: Uuid,
    pub secret: String,
}

impl AdminKeyClaims {
    pub fn to_key(&self) -> Res<String> {
        let json = serde_json::to_string(self)
            .map_err(|e| AppError::Internal(format!("Failed to encode admin key: {}", e)))?;
        let encoded = general_purpose::STANDARD.encode(json);
        Ok(format!("{}{}", ADMIN_KEY_PREFIX, encoded))
    }

    pub fn from_key(key: &str) -> Res<Self> {
        let encoded = key
            .strip_prefix(ADMIN_KEY_PREFIX)
            .ok_or_else(|| AppError::Unauthorized("Missing prefix 'ak_'".to_string()))?;

        let decoded_bytes = general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| AppError::Unauthorized(format!("Base64 decode error: {}", e)))?;

        let claims = serde_json::from_slice(&decoded_bytes)
            .map_err(|e| AppError::Unauthorized(format!("JSON parse error: {}", e)))?;

        Ok(claims)
    }
}

/// Argon2 hash of an admin secret, stored instead of the secret itself.
pub fn hash_secret(secret: &str) -> Res<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash secret: {}", e)))
}

pub fn verify_secret(secret: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed_hash) => Argon2::default()
            .verify_password(secret.as_bytes(), &parsed_hash)
            .is_ok(),
        Err(e) => {
            log::error!("Stored admin key hash is malformed: {}", e);
            false
        }
    }
}

pub fn get_admin_claims_or_error(req: &ServiceRequest) -> Result<AdminKeyClaims, HttpResponse> {
    if let Some(key_claims_res) = req.extensions().get::<Res<AdminKeyClaims>>() {
        match key_claims_res {
            Ok(claims) => Ok(claims.clone()),
            Err(app_error) => Err(app_error.to_http_response()),
        }
    } else {
        Err(AppError::Unauthorized("No admin key provided".to_string()).to_http_response())
    }
}
