use chrono::NaiveDateTime;
use common::misc::{Role, VerificationMethod, VerificationStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use workflow::access::AccountState;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Subject of the identity provider, unknown until the first verified token.
    pub subject_id: Option<String>,
    pub phone: String,
    pub role: Role,
    pub is_verified: bool,
    pub verification_status: VerificationStatus,
    pub verification_method: VerificationMethod,
    pub verified_at: Option<NaiveDateTime>,
    pub resubmission_count: i32,
    pub is_rejected: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub gender: Option<String>,
    pub profile_photo: Option<String>,
    pub bank_account_number: Option<String>,
    pub bank_ifsc_code: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl User {
    pub fn account_state(&self) -> AccountState {
        AccountState {
            role: self.role,
            status: self.verification_status,
            is_verified: self.is_verified,
        }
    }
}
