use std::sync::Arc;

use actix_web::{HttpResponse, post, web};
use common::{
    env_config::Config,
    error::Res,
    http::Success,
    jwt::{self, ClaimsSpec},
};
use db::Repository;

use crate::{
    dtos::auth::{PhoneAuthRequest, PhoneAuthResponse},
    misc::identity::IdentityProvider,
    services,
};

/// Logs in or signs up a user verified through phone OTP.
///
/// # Input
/// - `req`: JSON payload with the provider `id_token`, optional `phone`, `role`
///   (`client` | `freelancer`) and `action` (`login` | `signup`)
/// - `repo`: User storage
/// - `provider`: Identity provider verifying the ID token
/// - `config`: Application configuration for session token generation
///
/// # Output
/// - Success: 201 Created when the user was created, 200 OK otherwise, with the
///   session token and verification state
/// - Error: 401 for an unusable identity token, 404 when logging in without an
///   account, 403 when the account has no usable verification, 400 for bad input
///
/// # Frontend Example
/// ```javascript
/// const idToken = await firebase.auth().currentUser.getIdToken();
/// const response = await fetch('/api/auth/phone', {
///   method: 'POST',
///   headers: { 'Content-Type': 'application/json' },
///   body: JSON.stringify({
///     id_token: idToken,
///     phone: '+919876543210',
///     role: 'freelancer',
///     action: 'signup'
///   })
/// });
///
/// if (response.ok) {
///   const auth = await response.json();
///   localStorage.setItem('authToken', auth.token);
///   if (auth.needs_verification) {
///     // redirect to the verification form
///   }
/// }
/// ```
#[post("/phone")]
pub async fn post_phone(
    req: web::Json<PhoneAuthRequest>,
    repo: web::Data<Arc<dyn Repository>>,
    provider: web::Data<Arc<dyn IdentityProvider>>,
    config: web::Data<Arc<Config>>,
) -> Res<HttpResponse> {
    let resolution = services::auth::resolve_identity(
        repo.get_ref().as_ref(),
        provider.get_ref().as_ref(),
        req.into_inner(),
    )
    .await?;
    let user = resolution.user;

    let token = jwt::generate_jwt(
        ClaimsSpec {
            user_id: user.id,
            role: user.role,
        },
        &config.jwt_config,
    )?;

    Success::created_if(
        resolution.is_new_user,
        PhoneAuthResponse {
            token,
            user_id: user.id,
            role: user.role,
            is_new_user: resolution.is_new_user,
            needs_verification: resolution.needs_verification,
            verification_status: user.verification_status,
            is_rejected: user.is_rejected,
        },
    )
}
