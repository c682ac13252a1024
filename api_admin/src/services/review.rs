use common::{
    error::{AppError, Res},
    misc::ReviewStatus,
};
use db::{
    Repository,
    dtos::verification::{ReviewRequest, ReviewResult, VerificationFilter},
    models::verification::Verification,
};
use uuid::Uuid;
use workflow::transition::ReviewDecision;

use crate::dtos::review::ListQuery;

const MAX_PAGE: i64 = 200;

pub fn filter_from_query(query: ListQuery) -> Res<VerificationFilter> {
    let status = query
        .status
        .as_deref()
        .map(ReviewStatus::from_str)
        .transpose()?;
    let defaults = VerificationFilter::default();
    let limit = query.limit.unwrap_or(defaults.limit);
    if !(1..=MAX_PAGE).contains(&limit) {
        return Err(AppError::validation(
            "limit",
            format!("must be between 1 and {}", MAX_PAGE),
        ));
    }
    let offset = query.offset.unwrap_or(defaults.offset);
    if offset < 0 {
        return Err(AppError::validation("offset", "must not be negative"));
    }
    Ok(VerificationFilter {
        status,
        user_id: query.user_id,
        limit,
        offset,
    })
}

pub async fn list(repo: &dyn Repository, query: ListQuery) -> Res<Vec<Verification>> {
    let filter = filter_from_query(query)?;
    repo.list_verifications(filter).await
}

pub async fn get(repo: &dyn Repository, verification_id: Uuid) -> Res<Verification> {
    repo.get_verification(verification_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Verification not found".to_string()))
}

/// Records an admin decision and cascades it to the owning user in one step.
pub async fn review(
    repo: &dyn Repository,
    admin_id: Uuid,
    verification_id: Uuid,
    decision: ReviewDecision,
) -> Res<ReviewResult> {
    let status = decision.status();
    let result = repo
        .review_verification(ReviewRequest {
            verification_id,
            admin_id,
            decision,
        })
        .await?;

    if result.changed {
        log::info!(
            "Admin {} marked verification {} {}, user {} is now {}",
            admin_id,
            verification_id,
            status,
            result.user.id,
            result.user.verification_status
        );
    } else {
        log::info!(
            "Verification {} was already {}, nothing changed",
            verification_id,
            status
        );
    }
    Ok(result)
}
