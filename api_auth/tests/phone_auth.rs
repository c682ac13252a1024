use std::{collections::HashMap, sync::Arc};

use actix_web::{App, http::StatusCode, test, web};
use api_auth::{IdentityClaims, IdentityProvider};
use async_trait::async_trait;
use common::{
    env_config::Config,
    error::{AppError, Res},
    misc::{Role, VerificationStatus},
};
use db::{MemoryRepository, Repository, dtos::user::UserCreateRequest};
use serde_json::{Value, json};

/// Accepts the tokens it was seeded with.
struct StubProvider {
    tokens: HashMap<String, IdentityClaims>,
}

impl StubProvider {
    fn new(entries: &[(&str, &str, Option<&str>)]) -> Self {
        let tokens = entries
            .iter()
            .map(|(token, subject, phone)| {
                (
                    token.to_string(),
                    IdentityClaims {
                        subject_id: subject.to_string(),
                        phone_number: phone.map(str::to_string),
                    },
                )
            })
            .collect();
        StubProvider { tokens }
    }
}

#[async_trait]
impl IdentityProvider for StubProvider {
    async fn verify_token(&self, id_token: &str) -> Res<IdentityClaims> {
        self.tokens
            .get(id_token)
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Invalid identity token".to_string()))
    }
}

const PHONE: &str = "+919876543210";

fn provider() -> Arc<dyn IdentityProvider> {
    Arc::new(StubProvider::new(&[
        ("token-asha", "subject-asha", Some(PHONE)),
        ("token-ravi", "subject-ravi", None),
    ]))
}

macro_rules! app {
    ($repo:expr) => {{
        let repo: Arc<dyn Repository> = $repo.clone();
        test::init_service(
            App::new()
                .app_data(web::Data::new(repo))
                .app_data(web::Data::new(provider()))
                .app_data(web::Data::new(Arc::new(Config::default())))
                .wrap(extractor::middleware())
                .service(
                    web::scope("/api")
                        .service(api_auth::mount_auth())
                        .service(
                            web::scope("/dashboard")
                                .wrap(api_auth::auth_middleware())
                                .service(api_auth::mount_user()),
                        ),
                ),
        )
        .await
    }};
}

fn phone_auth(body: Value) -> actix_web::test::TestRequest {
    test::TestRequest::post().uri("/api/auth/phone").set_json(body)
}

async fn seed(repo: &MemoryRepository, status: VerificationStatus) {
    repo.insert_user(UserCreateRequest {
        phone: PHONE.to_string(),
        role: Role::Freelancer,
        subject_id: None,
        verification_status: status,
    })
    .await
    .unwrap();
}

#[actix_web::test]
async fn signup_creates_pending_user_and_login_reuses_it() {
    let repo = Arc::new(MemoryRepository::new());
    let app = app!(repo);

    let res = test::call_service(
        &app,
        phone_auth(json!({"id_token": "token-asha", "role": "freelancer", "action": "signup"}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["is_new_user"], true);
    assert_eq!(body["needs_verification"], true);
    assert_eq!(body["verification_status"], "pending");
    assert_eq!(body["role"], "freelancer");
    assert!(body["token"].as_str().is_some());

    let res = test::call_service(
        &app,
        phone_auth(json!({"id_token": "token-asha", "role": "freelancer", "action": "login"}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let login: Value = test::read_body_json(res).await;
    assert_eq!(login["user_id"], body["user_id"]);
    assert_eq!(login["is_new_user"], false);

    let user = repo.get_user_by_phone(PHONE).await.unwrap().unwrap();
    assert_eq!(user.subject_id.as_deref(), Some("subject-asha"));
}

#[actix_web::test]
async fn login_without_account_is_not_found() {
    let repo = Arc::new(MemoryRepository::new());
    let app = app!(repo);

    let res = test::call_service(
        &app,
        phone_auth(json!({"id_token": "token-asha", "role": "client", "action": "login"}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(res).await;
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains("Create account first to login")
    );
    assert!(repo.get_user_by_phone(PHONE).await.unwrap().is_none());
}

#[actix_web::test]
async fn login_with_unset_or_rejected_status_is_forbidden() {
    for status in [VerificationStatus::Unset, VerificationStatus::Rejected] {
        let repo = Arc::new(MemoryRepository::new());
        seed(&repo, status).await;
        let app = app!(repo);

        let res = test::call_service(
            &app,
            phone_auth(json!({"id_token": "token-asha", "role": "freelancer", "action": "login"}))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN, "status {}", status);
    }
}

#[actix_web::test]
async fn signup_heals_unset_account_to_pending() {
    let repo = Arc::new(MemoryRepository::new());
    seed(&repo, VerificationStatus::Unset).await;
    let app = app!(repo);

    let res = test::call_service(
        &app,
        phone_auth(json!({"id_token": "token-asha", "role": "client", "action": "signup"}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let user = repo.get_user_by_phone(PHONE).await.unwrap().unwrap();
    assert_eq!(user.verification_status, VerificationStatus::Pending);
    assert_eq!(user.role, Role::Client);
    assert_eq!(user.subject_id.as_deref(), Some("subject-asha"));
}

#[actix_web::test]
async fn rejected_token_falls_back_to_supplied_phone_only() {
    let repo = Arc::new(MemoryRepository::new());
    let app = app!(repo);

    let res = test::call_service(
        &app,
        phone_auth(json!({"id_token": "forged", "role": "client", "action": "signup"}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = test::call_service(
        &app,
        phone_auth(json!({
            "id_token": "forged",
            "phone": "+91 98765 43210",
            "role": "client",
            "action": "signup"
        }))
        .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let user = repo.get_user_by_phone(PHONE).await.unwrap().unwrap();
    assert!(user.subject_id.is_none());
}

#[actix_web::test]
async fn missing_token_is_unauthorized_even_with_phone() {
    let repo = Arc::new(MemoryRepository::new());
    seed(&repo, VerificationStatus::Verified).await;
    let app = app!(repo);

    for action in ["signup", "login"] {
        let res = test::call_service(
            &app,
            phone_auth(json!({"phone": PHONE, "role": "client", "action": action})).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", action);
    }
    let user = repo.get_user_by_phone(PHONE).await.unwrap().unwrap();
    assert_eq!(user.role, Role::Freelancer);
}

#[actix_web::test]
async fn token_without_phone_claim_needs_supplied_phone() {
    let repo = Arc::new(MemoryRepository::new());
    let app = app!(repo);

    let res = test::call_service(
        &app,
        phone_auth(json!({"id_token": "token-ravi", "role": "client", "action": "signup"}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["field"], "phone");
}

#[actix_web::test]
async fn subject_match_moves_phone_number() {
    let repo = Arc::new(MemoryRepository::new());
    let app = app!(repo);

    let res = test::call_service(
        &app,
        phone_auth(json!({
            "id_token": "token-ravi",
            "phone": "+918888888888",
            "role": "client",
            "action": "signup"
        }))
        .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = test::call_service(
        &app,
        phone_auth(json!({
            "id_token": "token-ravi",
            "phone": "+917777777777",
            "role": "client",
            "action": "login"
        }))
        .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let user = repo.get_user_by_subject("subject-ravi").await.unwrap().unwrap();
    assert_eq!(user.phone, "+917777777777");
    assert!(repo.get_user_by_phone("+918888888888").await.unwrap().is_none());
}

#[actix_web::test]
async fn dashboard_requires_session_and_reports_job_eligibility() {
    let repo = Arc::new(MemoryRepository::new());
    let app = app!(repo);

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/dashboard/user/me").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = test::call_service(
        &app,
        phone_auth(json!({"id_token": "token-asha", "role": "freelancer", "action": "signup"}))
            .to_request(),
    )
    .await;
    let auth: Value = test::read_body_json(res).await;
    let bearer = format!("Bearer {}", auth["token"].as_str().unwrap());

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/dashboard/user/me")
            .insert_header(("Authorization", bearer.clone()))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let me: Value = test::read_body_json(res).await;
    assert_eq!(me["phone"], PHONE);
    assert_eq!(me["can_pick_up_jobs"], false);

    let res = test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/api/dashboard/user/bank")
            .insert_header(("Authorization", bearer.clone()))
            .set_json(json!({"account_number": "123456789012", "ifsc_code": "sbin0001234"}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let user: Value = test::read_body_json(res).await;
    assert_eq!(user["bank_ifsc_code"], "SBIN0001234");

    let res = test::call_service(
        &app,
        test::TestRequest::patch()
            .uri("/api/dashboard/user/profile")
            .insert_header(("Authorization", bearer))
            .set_json(json!({"email": "not-an-email"}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
