use std::time::{Duration, Instant};

use async_trait::async_trait;
use common::{
    env_config::IdentityProviderConfig,
    error::{AppError, Res},
};
use jsonwebtoken::{
    Algorithm, DecodingKey, Validation,
    jwk::{Jwk, JwkSet},
};
use serde::Deserialize;
use tokio::sync::RwLock;

/// Claims taken from a verified phone OTP ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaims {
    pub subject_id: String,
    pub phone_number: Option<String>,
}

/// Verifies ID tokens issued by the phone OTP identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    async fn verify_token(&self, id_token: &str) -> Res<IdentityClaims>;
}

#[derive(Debug, Deserialize)]
struct ProviderTokenClaims {
    sub: String,
    phone_number: Option<String>,
}

struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
}

/// Firebase ID token verification against the securetoken JWK set.
pub struct FirebaseIdentityProvider {
    client: reqwest::Client,
    project_id: String,
    jwks_url: String,
    ttl: Duration,
    cache: RwLock<Option<CachedKeys>>,
}

fn invalid_token(reason: impl std::fmt::Display) -> AppError {
    AppError::Unauthorized(format!("Invalid identity token: {}", reason))
}

impl FirebaseIdentityProvider {
    pub fn new(config: &IdentityProviderConfig) -> Self {
        FirebaseIdentityProvider {
            client: reqwest::Client::new(),
            project_id: config.project_id.clone(),
            jwks_url: config.jwks_url.clone(),
            ttl: Duration::from_secs(config.jwks_cache_seconds),
            cache: RwLock::new(None),
        }
    }

    pub fn issuer(&self) -> String {
        format!("https://securetoken.google.com/{}", self.project_id)
    }

    async fn fetch_keys(&self) -> Res<JwkSet> {
        let response = self.client.get(&self.jwks_url).send().await?;
        if !response.status().is_success() {
            return Err(AppError::Internal(format!(
                "Identity key endpoint returned error status: {}",
                response.status()
            )));
        }
        response.json::<JwkSet>().await.map_err(AppError::from)
    }

    /// Key with the given id, refreshing the cached set when stale or when the id is unknown.
    async fn key_for(&self, kid: &str) -> Res<Jwk> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.fetched_at.elapsed() < self.ttl {
                    if let Some(jwk) = cached.keys.find(kid) {
                        return Ok(jwk.clone());
                    }
                }
            }
        }

        log::debug!("Refreshing identity provider keys from {}", self.jwks_url);
        let keys = self.fetch_keys().await?;
        let found = keys.find(kid).cloned();
        *self.cache.write().await = Some(CachedKeys {
            keys,
            fetched_at: Instant::now(),
        });
        found.ok_or_else(|| invalid_token("unknown signing key"))
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentityProvider {
    async fn verify_token(&self, id_token: &str) -> Res<IdentityClaims> {
        let header = jsonwebtoken::decode_header(id_token).map_err(invalid_token)?;
        if header.alg != Algorithm::RS256 {
            return Err(invalid_token("unexpected algorithm"));
        }
        let kid = header.kid.ok_or_else(|| invalid_token("missing key id"))?;

        let jwk = self.key_for(&kid).await?;
        let key = DecodingKey::from_jwk(&jwk).map_err(invalid_token)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[self.issuer()]);

        let data = jsonwebtoken::decode::<ProviderTokenClaims>(id_token, &key, &validation)
            .map_err(invalid_token)?;
        if data.claims.sub.is_empty() {
            return Err(invalid_token("empty subject"));
        }

        Ok(IdentityClaims {
            subject_id: data.claims.sub,
            phone_number: data.claims.phone_number,
        })
    }
}
