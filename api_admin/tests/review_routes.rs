use std::sync::Arc;

use actix_web::{App, http::StatusCode, test, web};
use api_admin::services::admin::create_admin;
use chrono::NaiveDate;
use common::{
    env_config::Config,
    key::AdminKeyClaims,
    misc::{Role, VerificationStatus},
};
use db::{
    MemoryRepository, Repository,
    dtos::verification::{SubmissionOwner, VerificationSnapshot, VerificationSubmitRequest},
};
use serde_json::{Value, json};
use uuid::Uuid;

macro_rules! app {
    ($repo:expr) => {{
        let repo: Arc<dyn Repository> = $repo.clone();
        test::init_service(
            App::new()
                .app_data(web::Data::new(repo))
                .app_data(web::Data::new(Arc::new(Config::default())))
                .wrap(extractor::middleware())
                .service(
                    web::scope("/api").service(
                        web::scope("/admin")
                            .wrap(api_admin::admin_middleware())
                            .service(api_admin::mount_review()),
                    ),
                ),
        )
        .await
    }};
}

async fn admin_key(repo: &MemoryRepository) -> String {
    create_admin(repo, "reviewer", "a-long-enough-admin-secret")
        .await
        .unwrap()
        .1
}

async fn pending_submission(repo: &MemoryRepository, phone: &str) -> (Uuid, Uuid) {
    let result = repo
        .submit_verification(VerificationSubmitRequest {
            owner: SubmissionOwner::Phone,
            snapshot: VerificationSnapshot {
                first_name: "Asha".to_string(),
                last_name: "Sharma".to_string(),
                phone: phone.to_string(),
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
            },
        })
        .await
        .unwrap();
    (result.user.id, result.verification.id)
}

fn review(id: Uuid, action: &str, key: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri(&format!("/api/admin/verifications/{}/{}", id, action))
        .insert_header(("X-API-KEY", key.to_string()))
}

#[actix_web::test]
async fn missing_or_forged_key_is_unauthorized() {
    let repo = Arc::new(MemoryRepository::new());
    let key = admin_key(&repo).await;
    let app = app!(repo);

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/admin/verifications").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let mut forged = AdminKeyClaims::from_key(&key).unwrap();
    forged.secret = "guessed-secret-value".to_string();
    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/admin/verifications")
            .insert_header(("X-API-KEY", forged.to_key().unwrap()))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn reject_needs_comments_then_cascades() {
    let repo = Arc::new(MemoryRepository::new());
    let key = admin_key(&repo).await;
    let (user_id, verification_id) = pending_submission(&repo, "+919999999999").await;
    let app = app!(repo);

    let res = test::call_service(
        &app,
        review(verification_id, "reject", &key)
            .set_json(json!({"comments": ""}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: Value = test::read_body_json(res).await;
    assert_eq!(err["field"], "comments");

    let res = test::call_service(&app, review(verification_id, "reject", &key).to_request()).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = test::call_service(
        &app,
        review(verification_id, "reject", &key)
            .set_json(json!({"comments": "blurry photo"}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["comments"], "blurry photo");
    assert!(body["reviewed_at"].is_string());
    assert!(body["reviewed_by"].is_string());
    assert_eq!(body["changed"], true);

    let user = repo.get_user_by_id(user_id).await.unwrap().unwrap();
    assert_eq!(user.verification_status, VerificationStatus::Rejected);
    assert!(user.is_rejected);
}

#[actix_web::test]
async fn approving_twice_keeps_first_stamp() {
    let repo = Arc::new(MemoryRepository::new());
    let key = admin_key(&repo).await;
    let (user_id, verification_id) = pending_submission(&repo, "+919999999999").await;
    let app = app!(repo);

    let res = test::call_service(&app, review(verification_id, "approve", &key).to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
    let first = repo.get_user_by_id(user_id).await.unwrap().unwrap();
    assert!(first.is_verified);
    assert_eq!(first.verification_status, VerificationStatus::Verified);
    assert!(first.verified_at.is_some());

    let res = test::call_service(
        &app,
        review(verification_id, "approve", &key)
            .set_json(json!({"comments": "looks fine"}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["changed"], false);

    let second = repo.get_user_by_id(user_id).await.unwrap().unwrap();
    assert_eq!(second.verified_at, first.verified_at);

    let res = test::call_service(
        &app,
        review(verification_id, "reject", &key)
            .set_json(json!({"comments": "changed my mind"}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn unknown_verification_is_not_found() {
    let repo = Arc::new(MemoryRepository::new());
    let key = admin_key(&repo).await;
    let app = app!(repo);

    let res = test::call_service(&app, review(Uuid::new_v4(), "approve", &key).to_request()).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/admin/verifications/{}", Uuid::new_v4()))
            .insert_header(("X-API-KEY", key))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn queue_lists_pending_in_arrival_order() {
    let repo = Arc::new(MemoryRepository::new());
    let key = admin_key(&repo).await;
    let (_, first) = pending_submission(&repo, "+919999999991").await;
    let (_, second) = pending_submission(&repo, "+919999999992").await;
    let (_, third) = pending_submission(&repo, "+919999999993").await;
    repo.review_verification(db::dtos::verification::ReviewRequest {
        verification_id: second,
        admin_id: Uuid::new_v4(),
        decision: workflow::transition::ReviewDecision::approve(None),
    })
    .await
    .unwrap();
    let app = app!(repo);

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/admin/verifications?status=pending")
            .insert_header(("X-API-KEY", key.clone()))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![first.to_string(), third.to_string()]);

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/admin/verifications?limit=0")
            .insert_header(("X-API-KEY", key))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
