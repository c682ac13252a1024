use std::fmt;

use common::{
    error::{AppError, Res},
    misc::{ReviewStatus, VerificationMethod, VerificationStatus},
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Event {
    Submit,
    Resubmit,
    Approve,
    Reject,
}
impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Event::Submit => "submit",
            Event::Resubmit => "resubmit",
            Event::Approve => "approve",
            Event::Reject => "reject",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: VerificationStatus,
    pub to: VerificationStatus,
    pub event: Event,
}

/// User fields written when a transition is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusEffects {
    pub status: VerificationStatus,
    pub is_verified: bool,
    pub is_rejected: bool,
    pub method: VerificationMethod,
    /// `verified_at` becomes "now" when set, NULL otherwise.
    pub stamp_verified_at: bool,
    pub resubmission_increment: i32,
}

impl Transition {
    pub fn effects(&self) -> StatusEffects {
        let verified = self.to == VerificationStatus::Verified;
        StatusEffects {
            status: self.to,
            is_verified: verified,
            is_rejected: self.to == VerificationStatus::Rejected,
            method: if verified {
                VerificationMethod::Manual
            } else {
                VerificationMethod::Pending
            },
            stamp_verified_at: verified,
            resubmission_increment: if self.event == Event::Resubmit { 1 } else { 0 },
        }
    }
}

/// Applies `event` to `current`.
///
/// `verified` is terminal and `rejected` only leaves through a resubmission.
pub fn apply(current: VerificationStatus, event: Event) -> Res<Transition> {
    use VerificationStatus::*;

    let to = match (current, event) {
        (Unset, Event::Submit) => Pending,
        // a pending snapshot may be replaced before review
        (Pending, Event::Submit) => Pending,
        (Pending, Event::Approve) => Verified,
        (Pending, Event::Reject) => Rejected,
        (Rejected, Event::Resubmit) => Pending,
        (from, event) => {
            return Err(AppError::Conflict(format!(
                "Cannot {} a verification while status is {}",
                event, from
            )));
        }
    };

    log::debug!("verification transition {} --{}--> {}", current, event, to);
    Ok(Transition {
        from: current,
        to,
        event,
    })
}

/// Event produced by submitting documents for a user currently in `current`.
pub fn submission_event(current: VerificationStatus) -> Res<Event> {
    match current {
        VerificationStatus::Unset | VerificationStatus::Pending => Ok(Event::Submit),
        VerificationStatus::Rejected => Ok(Event::Resubmit),
        VerificationStatus::Verified => Err(AppError::Conflict(
            "Account is already verified".to_string(),
        )),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve { comments: Option<String> },
    Reject { comments: String },
}

impl ReviewDecision {
    /// Blank comments are dropped.
    pub fn approve(comments: Option<String>) -> Self {
        ReviewDecision::Approve {
            comments: comments
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
        }
    }

    pub fn reject(comments: Option<String>) -> Res<Self> {
        let comments = comments.map(|c| c.trim().to_string()).unwrap_or_default();
        if comments.is_empty() {
            return Err(AppError::validation(
                "comments",
                "a reason is required when rejecting a verification",
            ));
        }
        Ok(ReviewDecision::Reject { comments })
    }

    pub fn event(&self) -> Event {
        match self {
            ReviewDecision::Approve { .. } => Event::Approve,
            ReviewDecision::Reject { .. } => Event::Reject,
        }
    }

    pub fn status(&self) -> ReviewStatus {
        match self {
            ReviewDecision::Approve { .. } => ReviewStatus::Approved,
            ReviewDecision::Reject { .. } => ReviewStatus::Rejected,
        }
    }

    pub fn comments(&self) -> Option<&str> {
        match self {
            ReviewDecision::Approve { comments } => comments.as_deref(),
            ReviewDecision::Reject { comments } => Some(comments.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// Record the decision and cascade it to the user.
    Apply,
    /// The same decision is already recorded; nothing is written.
    AlreadyApplied,
}

/// Decides what a review does to a submission currently in `current`.
pub fn review(current: ReviewStatus, decision: &ReviewDecision) -> Res<ReviewOutcome> {
    match current {
        ReviewStatus::Pending => Ok(ReviewOutcome::Apply),
        status if status == decision.status() => Ok(ReviewOutcome::AlreadyApplied),
        status => Err(AppError::Conflict(format!(
            "Verification was already {}",
            status
        ))),
    }
}
