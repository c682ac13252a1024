use chrono::{NaiveDate, Utc};
use common::{
    error::{AppError, Res},
    jwt::JwtClaims,
    misc::{Role, normalize_phone},
};
use db::{
    Repository,
    dtos::verification::{
        SubmissionOwner, SubmissionResult, VerificationSnapshot, VerificationSubmitRequest,
    },
};
use uuid::Uuid;
use workflow::access;

use crate::dtos::verification::{StatusResponse, SubmissionRequest};

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

fn required(field: &str, value: Option<String>) -> Res<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::validation(field, "is required"))
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn parse_date_of_birth(raw: &str, today: NaiveDate) -> Res<NaiveDate> {
    let date = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .ok_or_else(|| {
            AppError::validation("date_of_birth", "expected YYYY-MM-DD or DD/MM/YYYY")
        })?;
    if date > today {
        return Err(AppError::validation(
            "date_of_birth",
            "cannot be in the future",
        ));
    }
    Ok(date)
}

fn check_pincode(pincode: &str) -> Res<()> {
    if pincode.len() == 6 && pincode.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(AppError::validation("pincode", "expected exactly 6 digits"))
    }
}

/// Turns a raw form into a snapshot, failing on the first invalid field.
pub fn validate(req: SubmissionRequest, today: NaiveDate) -> Res<VerificationSnapshot> {
    let first_name = required("first_name", req.first_name)?;
    let last_name = required("last_name", req.last_name)?;
    let phone = required("phone", req.phone)?;
    let role = required("role", req.role)?;
    let gender = required("gender", req.gender)?;
    let address = required("address", req.address)?;
    let date_of_birth = required("date_of_birth", req.date_of_birth)?;
    let pincode = required("pincode", req.pincode)?;
    let aadhaar_front = required("aadhaar_front", req.aadhaar_front)?;
    let aadhaar_back = required("aadhaar_back", req.aadhaar_back)?;
    let pan_front = required("pan_front", req.pan_front)?;
    let profile_photo = required("profile_photo", req.profile_photo)?;

    let phone = normalize_phone(&phone)?;
    let role = Role::from_str(&role)?;
    check_pincode(&pincode)?;
    let date_of_birth = parse_date_of_birth(&date_of_birth, today)?;

    let license_front = optional(req.license_front);
    let license_back = optional(req.license_back);
    if req.delivery_work {
        if license_front.is_none() {
            return Err(AppError::validation(
                "license_front",
                "is required for delivery work",
            ));
        }
        if license_back.is_none() {
            return Err(AppError::validation(
                "license_back",
                "is required for delivery work",
            ));
        }
    }

    Ok(VerificationSnapshot {
        first_name,
        last_name,
        phone,
        role,
        date_of_birth,
        gender,
        address,
        pincode,
        aadhaar_front,
        aadhaar_back,
        pan_front,
        delivery_work: req.delivery_work,
        license_front,
        license_back,
        profile_photo,
    })
}

/// Validates and stores a submission.
///
/// The owner is the session user when `claims` is present. Without a session the
/// phone may only create a new user or claim one that never submitted.
pub async fn submit(
    repo: &dyn Repository,
    claims: Option<JwtClaims>,
    req: SubmissionRequest,
) -> Res<SubmissionResult> {
    let snapshot = validate(req, Utc::now().date_naive())?;
    let owner = match claims {
        Some(claims) => SubmissionOwner::User(claims.user_id),
        None => SubmissionOwner::Phone,
    };

    let result = repo
        .submit_verification(VerificationSubmitRequest { owner, snapshot })
        .await?;
    log::info!(
        "Verification {} stored for user {} ({:?}, resubmissions: {})",
        result.verification.id,
        result.user.id,
        result.event,
        result.user.resubmission_count
    );
    Ok(result)
}

pub async fn get_status(repo: &dyn Repository, user_id: Uuid) -> Res<StatusResponse> {
    let user = repo
        .get_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    let latest = repo.get_latest_verification(user.id).await?;

    Ok(StatusResponse {
        user_id: user.id,
        verification_status: user.verification_status,
        is_verified: user.is_verified,
        is_rejected: user.is_rejected,
        verification_method: user.verification_method,
        verified_at: user.verified_at,
        resubmission_count: user.resubmission_count,
        can_pick_up_jobs: access::can_pick_up_paid_jobs(&user.account_state()),
        latest,
    })
}
