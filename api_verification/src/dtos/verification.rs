use chrono::NaiveDateTime;
use common::misc::{VerificationMethod, VerificationStatus};
use db::models::verification::Verification;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Submission form as sent by the client. Every field is checked by the service,
/// so missing values surface as field errors rather than body parse errors.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    /// `YYYY-MM-DD` or `DD/MM/YYYY`
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub pincode: Option<String>,
    pub aadhaar_front: Option<String>,
    pub aadhaar_back: Option<String>,
    pub pan_front: Option<String>,
    #[serde(default)]
    pub delivery_work: bool,
    pub license_front: Option<String>,
    pub license_back: Option<String>,
    pub profile_photo: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub user_id: Uuid,
    pub verification_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub user_id: Uuid,
    pub verification_status: VerificationStatus,
    pub is_verified: bool,
    pub is_rejected: bool,
    pub verification_method: VerificationMethod,
    pub verified_at: Option<NaiveDateTime>,
    pub resubmission_count: i32,
    pub can_pick_up_jobs: bool,
    pub latest: Option<Verification>,
}
