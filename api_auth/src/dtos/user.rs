use db::models::user::User;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: User,
    pub can_pick_up_jobs: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProfileRequest {
    pub email: Option<String>,
    pub address: Option<String>,
    pub gender: Option<String>,
    pub profile_photo: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BankDetailsRequest {
    pub account_number: String,
    pub ifsc_code: String,
}
