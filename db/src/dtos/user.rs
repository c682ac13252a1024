use common::misc::{Role, VerificationStatus};

pub struct UserCreateRequest {
    pub phone: String,
    pub role: Role,
    pub subject_id: Option<String>,
    pub verification_status: VerificationStatus,
}

/// Identity fields refreshed on login/signup. `None` leaves a field untouched.
#[derive(Debug, Default, Clone)]
pub struct IdentitySync {
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub subject_id: Option<String>,
    pub heal_to_pending: bool,
}

impl IdentitySync {
    pub fn is_empty(&self) -> bool {
        self.phone.is_none()
            && self.role.is_none()
            && self.subject_id.is_none()
            && !self.heal_to_pending
    }
}

#[derive(Debug, Default, Clone)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub address: Option<String>,
    pub gender: Option<String>,
    pub profile_photo: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BankDetailsUpdate {
    pub account_number: String,
    pub ifsc_code: String,
}
