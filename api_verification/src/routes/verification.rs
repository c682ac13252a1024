use std::sync::Arc;

use actix_web::{HttpRequest, Responder, get, post, web};
use common::{
    error::Res,
    http::Success,
    jwt::{self, JwtClaims},
};
use db::Repository;

use crate::{
    dtos::verification::{SubmissionRequest, SubmissionResponse},
    services,
};

/// Submits identity documents and profile fields for manual review.
///
/// # Input
/// - `req`: JSON form with names, phone, role, date of birth, gender, address,
///   pincode, document image references and the delivery work flag
/// - `http_req`: Used to read an optional session; an invalid token is rejected
/// - `repo`: Storage
///
/// # Output
/// - Success: 201 Created with `{user_id, verification_id}`
/// - Error: 400 with the failing `field`, 401 for an invalid session token,
///   409 when the account is already verified
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/verification/submit', {
///   method: 'POST',
///   headers: {
///     'Content-Type': 'application/json',
///     'Authorization': `Bearer ${localStorage.getItem('authToken')}`
///   },
///   body: JSON.stringify({
///     first_name: 'Asha',
///     last_name: 'Sharma',
///     phone: '+919999999999',
///     role: 'freelancer',
///     date_of_birth: '1995-04-12',
///     gender: 'female',
///     address: '12 MG Road, Pune',
///     pincode: '411001',
///     aadhaar_front: uploads.aadhaarFront,
///     aadhaar_back: uploads.aadhaarBack,
///     pan_front: uploads.pan,
///     delivery_work: false,
///     profile_photo: uploads.photo
///   })
/// });
/// ```
#[post("/submit")]
pub async fn post_submit(
    http_req: HttpRequest,
    req: web::Json<SubmissionRequest>,
    repo: web::Data<Arc<dyn Repository>>,
) -> Res<impl Responder> {
    let claims = jwt::optional_claims(&http_req)?;
    let result =
        services::submission::submit(repo.get_ref().as_ref(), claims, req.into_inner()).await?;
    Success::created(SubmissionResponse {
        user_id: result.user.id,
        verification_id: result.verification.id,
    })
}

/// Verification state of the session user with their latest submission.
///
/// # Output
/// - Success: status fields, `can_pick_up_jobs` and `latest` (null before the first submission)
/// - Error: 401 without a session, 404 if the user no longer exists
#[get("/status")]
pub async fn get_status(
    claims: web::ReqData<JwtClaims>,
    repo: web::Data<Arc<dyn Repository>>,
) -> Res<impl Responder> {
    let status = services::submission::get_status(repo.get_ref().as_ref(), claims.user_id).await?;
    Success::ok(status)
}
