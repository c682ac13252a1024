use std::sync::Arc;

use actix_web::{Responder, get, patch, put, web};
use common::{error::Res, http::Success, jwt::JwtClaims};
use db::Repository;

use crate::{
    dtos::user::{BankDetailsRequest, ProfileRequest},
    services,
};

/// Endpoint to retrieve the current authenticated user's information.
///
/// # Input
/// - `claims`: Session claims, containing the user ID
/// - `repo`: User storage
///
/// # Output
/// - Success: The user record plus `can_pick_up_jobs`, true only for verified freelancers
/// - Error: 401 Unauthorized without a valid token, 404 Not Found if the user doesn't exist
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/dashboard/user/me', {
///   headers: {
///     'Authorization': `Bearer ${localStorage.getItem('authToken')}`
///   }
/// });
/// const me = await response.json();
/// // { id, phone, role, verification_status, is_verified, ..., can_pick_up_jobs }
/// ```
#[get("/me")]
pub async fn get_me(
    claims: web::ReqData<JwtClaims>,
    repo: web::Data<Arc<dyn Repository>>,
) -> Res<impl Responder> {
    let me = services::user::get_me(repo.get_ref().as_ref(), claims.user_id).await?;
    Success::ok(me)
}

/// Fills optional profile fields; fields left out of the body keep their value.
///
/// # Input
/// - `req`: JSON with any of `email`, `address`, `gender`, `profile_photo`
///
/// # Output
/// - Success: The updated user record
/// - Error: 400 with `field: "email"` when the email has no `@`
#[patch("/profile")]
pub async fn patch_profile(
    claims: web::ReqData<JwtClaims>,
    req: web::Json<ProfileRequest>,
    repo: web::Data<Arc<dyn Repository>>,
) -> Res<impl Responder> {
    let user =
        services::user::update_profile(repo.get_ref().as_ref(), claims.user_id, req.into_inner())
            .await?;
    Success::ok(user)
}

/// Stores payout bank details.
///
/// # Input
/// - `req`: JSON with `account_number` (9-18 digits) and `ifsc_code`
///
/// # Output
/// - Success: The updated user record, IFSC code uppercased
/// - Error: 400 naming the offending field
#[put("/bank")]
pub async fn put_bank(
    claims: web::ReqData<JwtClaims>,
    req: web::Json<BankDetailsRequest>,
    repo: web::Data<Arc<dyn Repository>>,
) -> Res<impl Responder> {
    let user = services::user::update_bank_details(
        repo.get_ref().as_ref(),
        claims.user_id,
        req.into_inner(),
    )
    .await?;
    Success::ok(user)
}
