use common::misc::{AuthAction, Role, VerificationStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneAuthRequest {
    /// ID token from the phone OTP provider.
    pub id_token: Option<String>,
    pub phone: Option<String>,
    pub role: String,
    pub action: AuthAction,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PhoneAuthResponse {
    pub token: String,
    pub user_id: Uuid,
    pub role: Role,
    pub is_new_user: bool,
    pub needs_verification: bool,
    pub verification_status: VerificationStatus,
    pub is_rejected: bool,
}
