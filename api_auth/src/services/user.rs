use common::error::{AppError, Res};
use db::{
    Repository,
    dtos::user::{BankDetailsUpdate, ProfileUpdate},
    models::user::User,
};
use uuid::Uuid;
use workflow::access;

use crate::dtos::user::{BankDetailsRequest, MeResponse, ProfileRequest};

pub async fn get_me(repo: &dyn Repository, user_id: Uuid) -> Res<MeResponse> {
    let user = repo
        .get_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    let can_pick_up_jobs = access::can_pick_up_paid_jobs(&user.account_state());
    Ok(MeResponse {
        user,
        can_pick_up_jobs,
    })
}

fn filled(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Absent or blank fields leave the stored value untouched.
pub fn validate_profile(req: ProfileRequest) -> Res<ProfileUpdate> {
    let email = filled(req.email);
    if let Some(email) = &email {
        if !email.contains('@') {
            return Err(AppError::validation("email", "must contain @"));
        }
    }
    Ok(ProfileUpdate {
        email,
        address: filled(req.address),
        gender: filled(req.gender),
        profile_photo: filled(req.profile_photo),
    })
}

fn is_ifsc(code: &str) -> bool {
    let bytes = code.as_bytes();
    bytes.len() == 11
        && bytes[..4].iter().all(u8::is_ascii_uppercase)
        && bytes[4] == b'0'
        && bytes[5..].iter().all(u8::is_ascii_alphanumeric)
}

pub fn validate_bank_details(req: BankDetailsRequest) -> Res<BankDetailsUpdate> {
    let account_number: String = req
        .account_number
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if !(9..=18).contains(&account_number.len())
        || !account_number.chars().all(|c| c.is_ascii_digit())
    {
        return Err(AppError::validation(
            "account_number",
            "expected 9 to 18 digits",
        ));
    }

    let ifsc_code = req.ifsc_code.trim().to_ascii_uppercase();
    if !is_ifsc(&ifsc_code) {
        return Err(AppError::validation(
            "ifsc_code",
            "expected 4 letters, a 0 and 6 letters or digits",
        ));
    }

    Ok(BankDetailsUpdate {
        account_number,
        ifsc_code,
    })
}

pub async fn update_profile(repo: &dyn Repository, user_id: Uuid, req: ProfileRequest) -> Res<User> {
    let update = validate_profile(req)?;
    repo.update_profile(user_id, update).await
}

pub async fn update_bank_details(
    repo: &dyn Repository,
    user_id: Uuid,
    req: BankDetailsRequest,
) -> Res<User> {
    let update = validate_bank_details(req)?;
    let user = repo.update_bank_details(user_id, update).await?;
    log::info!("Bank details updated for user {}", user.id);
    Ok(user)
}
