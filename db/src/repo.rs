use std::sync::Arc;

use async_trait::async_trait;
use common::{
    error::{AppError, Res},
    misc::VerificationStatus,
};
use sqlx::PgPool;
use uuid::Uuid;
use workflow::transition::{self, ReviewOutcome};

use crate::{
    admin,
    dtos::{
        admin::AdminCreateRequest,
        user::{BankDetailsUpdate, IdentitySync, ProfileUpdate, UserCreateRequest},
        verification::{
            ReviewRequest, ReviewResult, SubmissionOwner, SubmissionResult, VerificationFilter,
            VerificationSubmitRequest,
        },
    },
    models::{admin::Admin, user::User, verification::Verification},
    user, verification,
};

/// Storage seam used by the API crates.
///
/// `submit_verification` and `review_verification` write the user and the verification
/// record atomically; implementations must never leave one updated without the other.
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    // User operations
    async fn get_user_by_id(&self, user_id: Uuid) -> Res<Option<User>>;
    async fn get_user_by_phone(&self, phone: &str) -> Res<Option<User>>;
    async fn get_user_by_subject(&self, subject_id: &str) -> Res<Option<User>>;
    async fn insert_user(&self, data: UserCreateRequest) -> Res<User>;
    async fn sync_identity(&self, user_id: Uuid, sync: IdentitySync) -> Res<User>;
    async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Res<User>;
    async fn update_bank_details(&self, user_id: Uuid, update: BankDetailsUpdate) -> Res<User>;

    // Verification operations
    async fn submit_verification(&self, req: VerificationSubmitRequest) -> Res<SubmissionResult>;
    async fn review_verification(&self, req: ReviewRequest) -> Res<ReviewResult>;
    async fn get_verification(&self, verification_id: Uuid) -> Res<Option<Verification>>;
    async fn get_latest_verification(&self, user_id: Uuid) -> Res<Option<Verification>>;
    async fn list_verifications(&self, filter: VerificationFilter) -> Res<Vec<Verification>>;

    // Admin operations
    async fn get_admin_by_id(&self, admin_id: Uuid) -> Res<Option<Admin>>;
    async fn get_admin_by_name(&self, name: &str) -> Res<Option<Admin>>;
    async fn insert_admin(&self, data: AdminCreateRequest) -> Res<Admin>;
}

pub(crate) fn user_not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

pub(crate) fn verification_not_found() -> AppError {
    AppError::NotFound("Verification not found".to_string())
}

/// A phone-keyed submission may only take over an account that never submitted.
pub(crate) fn check_phone_owner(owner: &User) -> Res<()> {
    if owner.verification_status == VerificationStatus::Unset {
        return Ok(());
    }
    log::warn!(
        "Anonymous submission refused for existing user {} ({})",
        owner.id,
        owner.verification_status
    );
    Err(AppError::Unauthorized(
        "Sign in to update an existing verification".to_string(),
    ))
}

pub struct PgRepository {
    pool: Arc<PgPool>,
}

impl PgRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        PgRepository { pool }
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn get_user_by_id(&self, user_id: Uuid) -> Res<Option<User>> {
        user::get_user_by_id(&*self.pool, user_id).await
    }

    async fn get_user_by_phone(&self, phone: &str) -> Res<Option<User>> {
        user::get_user_by_phone(&*self.pool, phone).await
    }

    async fn get_user_by_subject(&self, subject_id: &str) -> Res<Option<User>> {
        user::get_user_by_subject(&*self.pool, subject_id).await
    }

    async fn insert_user(&self, data: UserCreateRequest) -> Res<User> {
        user::insert_user(&*self.pool, data).await
    }

    async fn sync_identity(&self, user_id: Uuid, sync: IdentitySync) -> Res<User> {
        user::sync_identity(&*self.pool, user_id, &sync).await
    }

    async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Res<User> {
        user::update_profile(&*self.pool, user_id, &update)
            .await?
            .ok_or_else(user_not_found)
    }

    async fn update_bank_details(&self, user_id: Uuid, update: BankDetailsUpdate) -> Res<User> {
        user::update_bank_details(&*self.pool, user_id, &update)
            .await?
            .ok_or_else(user_not_found)
    }

    async fn submit_verification(&self, req: VerificationSubmitRequest) -> Res<SubmissionResult> {
        let snapshot = &req.snapshot;
        let mut tx = self.pool.begin().await?;

        // lock the owner first, reviews take locks in the same order
        let existing = match req.owner {
            SubmissionOwner::User(user_id) => Some(
                user::lock_user_by_id(&mut *tx, user_id)
                    .await?
                    .ok_or_else(user_not_found)?,
            ),
            SubmissionOwner::Phone => {
                let owner = user::lock_user_by_phone(&mut *tx, &snapshot.phone).await?;
                if let Some(owner) = &owner {
                    check_phone_owner(owner)?;
                }
                owner
            }
        };
        let (owner, created_user) = match existing {
            Some(owner) => (owner, false),
            None => {
                let owner = user::insert_user(
                    &mut *tx,
                    UserCreateRequest {
                        phone: snapshot.phone.clone(),
                        role: snapshot.role,
                        subject_id: None,
                        verification_status: VerificationStatus::Unset,
                    },
                )
                .await?;
                (owner, true)
            }
        };

        let event = transition::submission_event(owner.verification_status)?;
        let transition = transition::apply(owner.verification_status, event)?;

        let verification = match verification::lock_pending_for_user(&mut *tx, owner.id).await? {
            Some(pending) => verification::replace_snapshot(&mut *tx, pending.id, snapshot).await?,
            None => verification::insert_verification(&mut *tx, owner.id, snapshot).await?,
        };
        let user =
            user::apply_submission(&mut *tx, owner.id, snapshot, &transition.effects()).await?;

        tx.commit().await?;
        Ok(SubmissionResult {
            user,
            verification,
            created_user,
            event,
        })
    }

    async fn review_verification(&self, req: ReviewRequest) -> Res<ReviewResult> {
        let user_id = verification::get_verification(&*self.pool, req.verification_id)
            .await?
            .ok_or_else(verification_not_found)?
            .user_id;

        let mut tx = self.pool.begin().await?;
        let owner = user::lock_user_by_id(&mut *tx, user_id)
            .await?
            .ok_or_else(user_not_found)?;
        let current = verification::lock_verification(&mut *tx, req.verification_id)
            .await?
            .ok_or_else(verification_not_found)?;

        if transition::review(current.status, &req.decision)? == ReviewOutcome::AlreadyApplied {
            tx.commit().await?;
            return Ok(ReviewResult {
                verification: current,
                user: owner,
                changed: false,
            });
        }

        let transition = transition::apply(owner.verification_status, req.decision.event())?;
        let verification =
            verification::record_review(&mut *tx, current.id, req.admin_id, &req.decision).await?;
        let user = user::apply_status(&mut *tx, owner.id, &transition.effects()).await?;

        tx.commit().await?;
        Ok(ReviewResult {
            verification,
            user,
            changed: true,
        })
    }

    async fn get_verification(&self, verification_id: Uuid) -> Res<Option<Verification>> {
        verification::get_verification(&*self.pool, verification_id).await
    }

    async fn get_latest_verification(&self, user_id: Uuid) -> Res<Option<Verification>> {
        verification::get_latest_for_user(&*self.pool, user_id).await
    }

    async fn list_verifications(&self, filter: VerificationFilter) -> Res<Vec<Verification>> {
        verification::list_verifications(&*self.pool, &filter).await
    }

    async fn get_admin_by_id(&self, admin_id: Uuid) -> Res<Option<Admin>> {
        admin::get_admin_by_id(&*self.pool, admin_id).await
    }

    async fn get_admin_by_name(&self, name: &str) -> Res<Option<Admin>> {
        admin::get_admin_by_name(&*self.pool, name).await
    }

    async fn insert_admin(&self, data: AdminCreateRequest) -> Res<Admin> {
        admin::insert_admin(&*self.pool, data).await
    }
}
