use std::sync::Arc;

use actix_web::{Responder, get, post, web};
use common::{error::Res, http::Success};
use db::Repository;
use uuid::Uuid;
use workflow::transition::ReviewDecision;

use crate::{
    dtos::review::{ListQuery, ReviewBody, ReviewResponse},
    middleware::admin::AdminIdentity,
    services,
};

/// Lists submissions oldest first, the review queue order.
///
/// # Input
/// - `query`: optional `status` (`pending` | `approved` | `rejected`), `user_id`,
///   `limit` (1-200, default 50) and `offset`
///
/// # Output
/// - Success: Array of verification records
/// - Error: 400 naming the bad query parameter, 401 without a valid admin key
///
/// # Example
/// ```bash
/// curl -H "X-API-KEY: $ADMIN_KEY" \
///   'http://localhost:8080/api/admin/verifications?status=pending&limit=20'
/// ```
#[get("")]
pub async fn get_verifications(
    query: web::Query<ListQuery>,
    repo: web::Data<Arc<dyn Repository>>,
) -> Res<impl Responder> {
    let verifications = services::review::list(repo.get_ref().as_ref(), query.into_inner()).await?;
    Success::ok(verifications)
}

#[get("/{id}")]
pub async fn get_verification(
    path: web::Path<Uuid>,
    repo: web::Data<Arc<dyn Repository>>,
) -> Res<impl Responder> {
    let verification = services::review::get(repo.get_ref().as_ref(), path.into_inner()).await?;
    Success::ok(verification)
}

/// Approves a pending submission and marks its owner verified.
///
/// # Input
/// - `path`: Verification id
/// - `body`: Optional JSON `{comments}`
///
/// # Output
/// - Success: The reviewed verification with `changed: false` when it was already approved
/// - Error: 404 for an unknown id, 409 when the submission was rejected
#[post("/{id}/approve")]
pub async fn post_approve(
    admin: web::ReqData<AdminIdentity>,
    path: web::Path<Uuid>,
    body: Option<web::Json<ReviewBody>>,
    repo: web::Data<Arc<dyn Repository>>,
) -> Res<impl Responder> {
    let comments = body.and_then(|b| b.into_inner().comments);
    let result = services::review::review(
        repo.get_ref().as_ref(),
        admin.admin_id,
        path.into_inner(),
        ReviewDecision::approve(comments),
    )
    .await?;
    Success::ok(ReviewResponse {
        verification: result.verification,
        changed: result.changed,
    })
}

/// Rejects a pending submission; the owner may resubmit afterwards.
///
/// # Input
/// - `path`: Verification id
/// - `body`: JSON `{comments}`, required and non-blank
///
/// # Output
/// - Success: The reviewed verification with `changed: false` when it was already rejected
/// - Error: 400 with `field: "comments"`, 404 for an unknown id, 409 when already approved
///
/// # Example
/// ```bash
/// curl -X POST -H "X-API-KEY: $ADMIN_KEY" -H 'Content-Type: application/json' \
///   -d '{"comments": "blurry photo"}' \
///   http://localhost:8080/api/admin/verifications/$ID/reject
/// ```
#[post("/{id}/reject")]
pub async fn post_reject(
    admin: web::ReqData<AdminIdentity>,
    path: web::Path<Uuid>,
    body: Option<web::Json<ReviewBody>>,
    repo: web::Data<Arc<dyn Repository>>,
) -> Res<impl Responder> {
    let decision = ReviewDecision::reject(body.and_then(|b| b.into_inner().comments))?;
    let result = services::review::review(
        repo.get_ref().as_ref(),
        admin.admin_id,
        path.into_inner(),
        decision,
    )
    .await?;
    Success::ok(ReviewResponse {
        verification: result.verification,
        changed: result.changed,
    })
}
