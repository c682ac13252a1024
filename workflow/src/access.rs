use common::{
    error::{AppError, Res},
    misc::{AuthAction, Role, VerificationStatus},
};

const CREATE_ACCOUNT_FIRST: &str = "Create account first to login";

/// Verification-relevant view of a stored user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountState {
    pub role: Role,
    pub status: VerificationStatus,
    pub is_verified: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No account yet; signup creates one in `pending`.
    Create,
    /// Existing account may proceed.
    Existing { heal_to_pending: bool },
}

/// Login/signup guard.
///
/// Login needs an existing account outside `unset`/`rejected`; signup is always let through
/// and lifts `unset` to `pending`.
pub fn decide(action: AuthAction, existing: Option<AccountState>) -> Res<Access> {
    match (action, existing) {
        (AuthAction::Signup, None) => Ok(Access::Create),
        (AuthAction::Login, None) => Err(AppError::NotFound(CREATE_ACCOUNT_FIRST.to_string())),
        (AuthAction::Login, Some(state)) => match state.status {
            VerificationStatus::Unset | VerificationStatus::Rejected => {
                Err(AppError::Forbidden(CREATE_ACCOUNT_FIRST.to_string()))
            }
            VerificationStatus::Pending | VerificationStatus::Verified => {
                Ok(Access::Existing {
                    heal_to_pending: false,
                })
            }
        },
        (AuthAction::Signup, Some(state)) => Ok(Access::Existing {
            heal_to_pending: state.status == VerificationStatus::Unset,
        }),
    }
}

pub fn needs_verification(state: &AccountState) -> bool {
    state.role == Role::Freelancer
        && (!state.is_verified || state.status == VerificationStatus::Pending)
}

/// Paid-job pickup is reserved for verified freelancers.
pub fn can_pick_up_paid_jobs(state: &AccountState) -> bool {
    state.role == Role::Freelancer
        && state.is_verified
        && state.status == VerificationStatus::Verified
}
