use common::{
    env_config::AdminBootstrap,
    error::{AppError, Res},
    key::{self, AdminKeyClaims},
};
use db::{Repository, dtos::admin::AdminCreateRequest, models::admin::Admin};

/// Stores a new admin and returns it with its `X-API-KEY` value.
pub async fn create_admin(repo: &dyn Repository, name: &str, secret: &str) -> Res<(Admin, String)> {
    if name.trim().is_empty() {
        return Err(AppError::validation("name", "is required"));
    }
    if secret.len() < 16 {
        return Err(AppError::validation(
            "secret",
            "must be at least 16 characters",
        ));
    }

    let admin = repo
        .insert_admin(AdminCreateRequest {
            name: name.trim().to_string(),
            key_hash: key::hash_secret(secret)?,
        })
        .await?;
    let api_key = AdminKeyClaims {
        admin_id: admin.id,
        secret: secret.to_string(),
    }
    .to_key()?;
    Ok((admin, api_key))
}

/// Creates the configured admin on first start. Returns the key only when it was created.
pub async fn bootstrap(repo: &dyn Repository, config: &AdminBootstrap) -> Res<Option<String>> {
    if let Some(existing) = repo.get_admin_by_name(&config.name).await? {
        log::info!("Admin '{}' already exists ({})", existing.name, existing.id);
        return Ok(None);
    }

    let (admin, api_key) = create_admin(repo, &config.name, &config.secret).await?;
    // printed once, the secret is only stored hashed
    log::warn!(
        "Created admin '{}' ({}). X-API-KEY: {}",
        admin.name,
        admin.id,
        api_key
    );
    Ok(Some(api_key))
}
