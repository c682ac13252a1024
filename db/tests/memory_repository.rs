use chrono::NaiveDate;
use common::{
    error::AppError,
    misc::{ReviewStatus, Role, VerificationStatus},
};
use db::{
    MemoryRepository, Repository,
    dtos::{
        user::{IdentitySync, UserCreateRequest},
        verification::{
            ReviewRequest, SubmissionOwner, VerificationFilter, VerificationSnapshot,
            VerificationSubmitRequest,
        },
    },
};
use uuid::Uuid;
use workflow::transition::{Event, ReviewDecision};

const PHONE: &str = "+919999999999";

fn snapshot(first_name: &str) -> VerificationSnapshot {
    VerificationSnapshot {
        first_name: first_name.to_string(),
        last_name: "Sharma".to_string(),
        phone: PHONE.to_string(),
        role: Role::Freelancer,
        date_of_birth: NaiveDate::from_ymd_opt(1995, 4, 12).unwrap(),
        gender: "female".to_string(),
        address: "12 MG Road, Pune".to_string(),
        pincode: "411001".to_string(),
        aadhaar_front: "docs/aadhaar-front.jpg".to_string(),
        aadhaar_back: "docs/aadhaar-back.jpg".to_string(),
        pan_front: "docs/pan.jpg".to_string(),
        delivery_work: false,
        license_front: None,
        license_back: None,
        profile_photo: "docs/photo.jpg".to_string(),
    }
}

async fn submit(repo: &MemoryRepository, name: &str) -> db::dtos::verification::SubmissionResult {
    repo.submit_verification(VerificationSubmitRequest {
        owner: SubmissionOwner::Phone,
        snapshot: snapshot(name),
    })
    .await
    .unwrap()
}

async fn submit_as(
    repo: &MemoryRepository,
    user_id: Uuid,
    name: &str,
) -> db::dtos::verification::SubmissionResult {
    repo.submit_verification(VerificationSubmitRequest {
        owner: SubmissionOwner::User(user_id),
        snapshot: snapshot(name),
    })
    .await
    .unwrap()
}

async fn review(repo: &MemoryRepository, id: Uuid, decision: ReviewDecision) -> db::dtos::verification::ReviewResult {
    repo.review_verification(ReviewRequest {
        verification_id: id,
        admin_id: Uuid::new_v4(),
        decision,
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn first_submission_creates_pending_owner() {
    let repo = MemoryRepository::new();
    let result = submit(&repo, "Asha").await;

    assert!(result.created_user);
    assert_eq!(result.event, Event::Submit);
    assert_eq!(result.user.verification_status, VerificationStatus::Pending);
    assert!(!result.user.is_verified);
    assert_eq!(result.user.first_name.as_deref(), Some("Asha"));
    assert_eq!(result.verification.status, ReviewStatus::Pending);
    assert_eq!(result.verification.user_id, result.user.id);
}

#[tokio::test]
async fn second_submission_while_pending_replaces_snapshot() {
    let repo = MemoryRepository::new();
    let first = submit(&repo, "Asha").await;
    let second = submit_as(&repo, first.user.id, "Asha R").await;

    assert!(!second.created_user);
    assert_eq!(first.verification.id, second.verification.id);
    assert_eq!(second.verification.first_name, "Asha R");
    assert_eq!(second.user.resubmission_count, 0);
}

#[tokio::test]
async fn rejection_then_resubmission_keeps_history_and_counts() {
    let repo = MemoryRepository::new();
    let first = submit(&repo, "Asha").await;

    for round in 1..=3 {
        let pending = repo
            .get_latest_verification(first.user.id)
            .await
            .unwrap()
            .unwrap();
        let rejected = review(
            &repo,
            pending.id,
            ReviewDecision::reject(Some("blurry photo".to_string())).unwrap(),
        )
        .await;
        assert_eq!(rejected.user.verification_status, VerificationStatus::Rejected);
        assert!(rejected.user.is_rejected);

        let resubmitted = submit_as(&repo, first.user.id, "Asha").await;
        assert_eq!(resubmitted.event, Event::Resubmit);
        assert_ne!(resubmitted.verification.id, pending.id);
        assert_eq!(resubmitted.user.resubmission_count, round);
        assert_eq!(resubmitted.user.verification_status, VerificationStatus::Pending);
        assert!(!resubmitted.user.is_rejected);
    }

    let history = repo
        .list_verifications(VerificationFilter {
            user_id: Some(first.user.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(
        history.iter().filter(|v| v.status == ReviewStatus::Rejected).count(),
        3
    );
}

#[tokio::test]
async fn approval_cascades_and_is_idempotent() {
    let repo = MemoryRepository::new();
    let submitted = submit(&repo, "Asha").await;

    let approved = review(&repo, submitted.verification.id, ReviewDecision::approve(None)).await;
    assert!(approved.changed);
    assert!(approved.user.is_verified);
    assert_eq!(approved.user.verification_status, VerificationStatus::Verified);
    assert!(approved.verification.reviewed_at.is_some());
    assert!(approved.verification.reviewed_by.is_some());
    let verified_at = approved.user.verified_at;
    assert!(verified_at.is_some());

    let again = review(&repo, submitted.verification.id, ReviewDecision::approve(None)).await;
    assert!(!again.changed);
    assert_eq!(again.user.verified_at, verified_at);
    assert_eq!(again.verification.reviewed_by, approved.verification.reviewed_by);

    let err = repo
        .review_verification(ReviewRequest {
            verification_id: submitted.verification.id,
            admin_id: Uuid::new_v4(),
            decision: ReviewDecision::reject(Some("late".to_string())).unwrap(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn anonymous_submission_cannot_take_over_an_existing_account() {
    let repo = MemoryRepository::new();
    let first = submit(&repo, "Asha").await;

    let err = repo
        .submit_verification(VerificationSubmitRequest {
            owner: SubmissionOwner::Phone,
            snapshot: snapshot("Mallory"),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    let stored = repo.get_verification(first.verification.id).await.unwrap().unwrap();
    assert_eq!(stored.first_name, "Asha");
    let owner = repo.get_user_by_id(first.user.id).await.unwrap().unwrap();
    assert_eq!(owner.first_name.as_deref(), Some("Asha"));
}

#[tokio::test]
async fn anonymous_submission_claims_an_unset_account() {
    let repo = MemoryRepository::new();
    let unset = repo
        .insert_user(UserCreateRequest {
            phone: PHONE.to_string(),
            role: Role::Client,
            subject_id: None,
            verification_status: VerificationStatus::Unset,
        })
        .await
        .unwrap();

    let result = submit(&repo, "Asha").await;
    assert!(!result.created_user);
    assert_eq!(result.user.id, unset.id);
    assert_eq!(result.user.role, Role::Freelancer);
    assert_eq!(result.user.verification_status, VerificationStatus::Pending);
}

#[tokio::test]
async fn replaced_snapshot_moves_to_the_back_of_the_queue() {
    let repo = MemoryRepository::new();
    let first = submit(&repo, "Asha").await;
    let other = repo
        .submit_verification(VerificationSubmitRequest {
            owner: SubmissionOwner::Phone,
            snapshot: VerificationSnapshot {
                phone: "+918888888888".to_string(),
                ..snapshot("Ravi")
            },
        })
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let replaced = submit_as(&repo, first.user.id, "Asha R").await;

    let queue = repo
        .list_verifications(VerificationFilter {
            status: Some(ReviewStatus::Pending),
            ..Default::default()
        })
        .await
        .unwrap();
    let ids: Vec<Uuid> = queue.iter().map(|v| v.id).collect();
    assert_eq!(ids, vec![other.verification.id, replaced.verification.id]);
}

#[tokio::test]
async fn verified_user_cannot_submit_again() {
    let repo = MemoryRepository::new();
    let submitted = submit(&repo, "Asha").await;
    review(&repo, submitted.verification.id, ReviewDecision::approve(None)).await;

    let err = repo
        .submit_verification(VerificationSubmitRequest {
            owner: SubmissionOwner::User(submitted.user.id),
            snapshot: snapshot("Asha"),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn unknown_verification_is_not_found() {
    let repo = MemoryRepository::new();
    let err = repo
        .review_verification(ReviewRequest {
            verification_id: Uuid::new_v4(),
            admin_id: Uuid::new_v4(),
            decision: ReviewDecision::approve(None),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn duplicate_phone_or_subject_is_a_conflict() {
    let repo = MemoryRepository::new();
    let user = repo
        .insert_user(UserCreateRequest {
            phone: PHONE.to_string(),
            role: Role::Client,
            subject_id: Some("subject-1".to_string()),
            verification_status: VerificationStatus::Pending,
        })
        .await
        .unwrap();

    let err = repo
        .insert_user(UserCreateRequest {
            phone: PHONE.to_string(),
            role: Role::Freelancer,
            subject_id: None,
            verification_status: VerificationStatus::Pending,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let other = repo
        .insert_user(UserCreateRequest {
            phone: "+918888888888".to_string(),
            role: Role::Client,
            subject_id: None,
            verification_status: VerificationStatus::Pending,
        })
        .await
        .unwrap();
    let err = repo
        .sync_identity(
            other.id,
            IdentitySync {
                subject_id: user.subject_id.clone(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}
