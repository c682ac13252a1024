use chrono::NaiveDate;
use common::misc::{ReviewStatus, Role};
use uuid::Uuid;
use workflow::transition::{Event, ReviewDecision};

use crate::models::{user::User, verification::Verification};

/// Validated submission contents.
#[derive(Debug, Clone)]
pub struct VerificationSnapshot {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub role: Role,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub address: String,
    pub pincode: String,
    pub aadhaar_front: String,
    pub aadhaar_back: String,
    pub pan_front: String,
    pub delivery_work: bool,
    pub license_front: Option<String>,
    pub license_back: Option<String>,
    pub profile_photo: String,
}

/// How the owning user of a submission is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOwner {
    /// Authenticated session; the user must exist.
    User(Uuid),
    /// First-time flow keyed by the snapshot phone; the user is created when missing
    /// and an existing user must still be `unset`.
    Phone,
}

pub struct VerificationSubmitRequest {
    pub owner: SubmissionOwner,
    pub snapshot: VerificationSnapshot,
}

#[derive(Debug, Clone)]
pub struct SubmissionResult {
    pub user: User,
    pub verification: Verification,
    pub created_user: bool,
    pub event: Event,
}

pub struct ReviewRequest {
    pub verification_id: Uuid,
    pub admin_id: Uuid,
    pub decision: ReviewDecision,
}

#[derive(Debug, Clone)]
pub struct ReviewResult {
    pub verification: Verification,
    pub user: User,
    /// `false` when the same decision had already been recorded.
    pub changed: bool,
}

#[derive(Debug, Clone)]
pub struct VerificationFilter {
    pub status: Option<ReviewStatus>,
    pub user_id: Option<Uuid>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for VerificationFilter {
    fn default() -> Self {
        VerificationFilter {
            status: None,
            user_id: None,
            limit: 50,
            offset: 0,
        }
    }
}
