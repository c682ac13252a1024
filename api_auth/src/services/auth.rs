use common::{
    error::{AppError, Res},
    misc::{AuthAction, Role, VerificationStatus, normalize_phone},
};
use db::{
    Repository,
    dtos::user::{IdentitySync, UserCreateRequest},
    models::user::User,
};
use workflow::access::{self, Access};

use crate::{
    dtos::auth::PhoneAuthRequest,
    misc::identity::{IdentityClaims, IdentityProvider},
};

/// Outcome of a phone login or signup.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub user: User,
    pub is_new_user: bool,
    pub needs_verification: bool,
}

fn supplied(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

async fn verify_claims(
    provider: &dyn IdentityProvider,
    req: &PhoneAuthRequest,
) -> Res<Option<IdentityClaims>> {
    let token = supplied(&req.id_token)
        .ok_or_else(|| AppError::Unauthorized("Identity token required".to_string()))?;
    match provider.verify_token(token).await {
        Ok(claims) => Ok(Some(claims)),
        // the phone fallback only covers a token the provider refused
        Err(e) if supplied(&req.phone).is_some() => {
            log::warn!("Identity token rejected, continuing with supplied phone: {}", e);
            Ok(None)
        }
        Err(e @ AppError::Unauthorized(_)) => Err(e),
        Err(e) => {
            log::error!("Identity token verification failed: {}", e);
            Err(AppError::Unauthorized(
                "Identity token could not be verified".to_string(),
            ))
        }
    }
}

async fn find_existing(
    repo: &dyn Repository,
    phone: &str,
    claims: Option<&IdentityClaims>,
) -> Res<Option<User>> {
    if let Some(user) = repo.get_user_by_phone(phone).await? {
        return Ok(Some(user));
    }
    match claims {
        Some(claims) => repo.get_user_by_subject(&claims.subject_id).await,
        None => Ok(None),
    }
}

/// Field changes an existing account receives on this request.
fn identity_sync(
    user: &User,
    action: AuthAction,
    phone: &str,
    role: Role,
    claims: Option<&IdentityClaims>,
    heal_to_pending: bool,
) -> IdentitySync {
    let mut sync = IdentitySync {
        heal_to_pending,
        ..Default::default()
    };
    // reached through the subject id with a new phone, last writer wins
    if user.phone != phone {
        sync.phone = Some(phone.to_string());
    }
    if let Some(claims) = claims {
        let differs = user.subject_id.as_deref() != Some(claims.subject_id.as_str());
        if user.subject_id.is_none() || (action == AuthAction::Signup && differs) {
            sync.subject_id = Some(claims.subject_id.clone());
        }
    }
    if action == AuthAction::Signup && user.role != role {
        sync.role = Some(role);
    }
    sync
}

async fn apply_sync(repo: &dyn Repository, user: User, sync: IdentitySync) -> Res<User> {
    if sync.is_empty() {
        return Ok(user);
    }
    repo.sync_identity(user.id, sync).await
}

/// Resolves a phone login or signup to a user record, creating or syncing it as needed.
///
/// At most one user write happens per call.
pub async fn resolve_identity(
    repo: &dyn Repository,
    provider: &dyn IdentityProvider,
    req: PhoneAuthRequest,
) -> Res<Resolution> {
    let role = Role::from_str(&req.role)?;
    let claims = verify_claims(provider, &req).await?;

    let raw_phone = supplied(&req.phone)
        .map(str::to_string)
        .or_else(|| claims.as_ref().and_then(|c| c.phone_number.clone()))
        .ok_or_else(|| AppError::validation("phone", "phone number is required"))?;
    let phone = normalize_phone(&raw_phone)?;

    let existing = find_existing(repo, &phone, claims.as_ref()).await?;
    let access = access::decide(req.action, existing.as_ref().map(User::account_state))?;

    let (user, is_new_user) = match (access, existing) {
        (Access::Create, _) => {
            let created = repo
                .insert_user(UserCreateRequest {
                    phone: phone.clone(),
                    role,
                    subject_id: claims.as_ref().map(|c| c.subject_id.clone()),
                    verification_status: VerificationStatus::Pending,
                })
                .await;
            match created {
                Ok(user) => {
                    log::info!("Signed up user {} as {}", user.id, role);
                    (user, true)
                }
                Err(AppError::Conflict(_)) => {
                    // a concurrent signup won the insert, continue with its record
                    let winner = find_existing(repo, &phone, claims.as_ref())
                        .await?
                        .ok_or_else(|| AppError::Conflict("User already exists".to_string()))?;
                    log::warn!("Signup raced for user {}, reusing record", winner.id);
                    let heal = winner.verification_status == VerificationStatus::Unset;
                    let sync =
                        identity_sync(&winner, req.action, &phone, role, claims.as_ref(), heal);
                    (apply_sync(repo, winner, sync).await?, false)
                }
                Err(e) => return Err(e),
            }
        }
        (Access::Existing { heal_to_pending }, Some(user)) => {
            let sync = identity_sync(
                &user,
                req.action,
                &phone,
                role,
                claims.as_ref(),
                heal_to_pending,
            );
            let user = apply_sync(repo, user, sync).await?;
            log::info!("User {} passed {}", user.id, req.action);
            (user, false)
        }
        (Access::Existing { .. }, None) => {
            return Err(AppError::Internal(
                "Access granted without an account".to_string(),
            ));
        }
    };

    let needs_verification = access::needs_verification(&user.account_state());
    Ok(Resolution {
        user,
        is_new_user,
        needs_verification,
    })
}
