use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Res};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Freelancer,
}
impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Freelancer => "freelancer",
        }
    }

    pub fn from_str(s: &str) -> Res<Self> {
        match s.trim().to_lowercase().as_str() {
            "client" => Ok(Role::Client),
            "freelancer" => Ok(Role::Freelancer),
            other => Err(AppError::validation(
                "role",
                format!("unknown role '{}', expected client or freelancer", other),
            )),
        }
    }
}
impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Onboarding state of a user account.
///
/// `Unset` (never submitted, legacy records) and `Rejected` are kept apart even though
/// both block login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "verification_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Unset,
    Pending,
    Verified,
    Rejected,
}
impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Unset => "unset",
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Rejected => "rejected",
        }
    }
}
impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "verification_method", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VerificationMethod {
    Pending,
    Manual,
}

/// Review state of a single verification submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "review_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}
impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Res<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(ReviewStatus::Pending),
            "approved" => Ok(ReviewStatus::Approved),
            "rejected" => Ok(ReviewStatus::Rejected),
            other => Err(AppError::validation(
                "status",
                format!("unknown review status '{}'", other),
            )),
        }
    }
}
impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthAction {
    Login,
    Signup,
}
impl fmt::Display for AuthAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthAction::Login => write!(f, "login"),
            AuthAction::Signup => write!(f, "signup"),
        }
    }
}

/// Strips spaces and dashes; the result must be an optional `+` and 10 to 15 digits.
pub fn normalize_phone(raw: &str) -> Res<String> {
    let phone: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    let digits = phone.strip_prefix('+').unwrap_or(&phone);
    if (10..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit()) {
        Ok(phone)
    } else {
        Err(AppError::validation(
            "phone",
            "expected 10 to 15 digits with an optional leading +",
        ))
    }
}
