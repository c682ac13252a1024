use chrono::{NaiveDate, NaiveDateTime};
use common::misc::{ReviewStatus, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Profile and document snapshot submitted for manual review.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Verification {
    pub id: Uuid,
    pub user_id: Uuid,
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
    pub status: ReviewStatus,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<NaiveDateTime>,
    pub comments: Option<String>,
    pub submitted_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
