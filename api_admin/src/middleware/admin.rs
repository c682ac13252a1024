use std::{future::Future, pin::Pin, sync::Arc};

use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    web,
};
use common::{
    error::AppError,
    key::{self, AdminKeyClaims},
};
use db::Repository;
use futures::future::{Ready, ok};
use uuid::Uuid;

/// Admin authenticated for the current request, available as `ReqData<AdminIdentity>`.
#[derive(Debug, Clone)]
pub struct AdminIdentity {
    pub admin_id: Uuid,
    pub name: String,
}

pub struct AdminKeyMiddleware {}

impl AdminKeyMiddleware {
    pub fn new() -> Self {
        AdminKeyMiddleware {}
    }
}

impl Default for AdminKeyMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, B> Transform<S, ServiceRequest> for AdminKeyMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Transform = AdminKeyMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AdminKeyMiddlewareService {
            service: Arc::new(service),
        })
    }
}

pub struct AdminKeyMiddlewareService<S> {
    service: Arc<S>,
}

fn invalid_key() -> AppError {
    AppError::Unauthorized("Invalid admin key".to_string())
}

/// Checks the key secret against the stored argon2 hash of an active admin.
async fn authenticate(repo: &dyn Repository, claims: &AdminKeyClaims) -> Result<AdminIdentity, AppError> {
    let admin = repo
        .get_admin_by_id(claims.admin_id)
        .await?
        .ok_or_else(invalid_key)?;
    if !admin.active || !key::verify_secret(&claims.secret, &admin.key_hash) {
        log::warn!("Rejected admin key for {}", claims.admin_id);
        return Err(invalid_key());
    }
    Ok(AdminIdentity {
        admin_id: admin.id,
        name: admin.name,
    })
}

impl<S, B> Service<ServiceRequest> for AdminKeyMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = Arc::clone(&self.service);
        let repo = req
            .app_data::<web::Data<Arc<dyn Repository>>>()
            .map(|data| Arc::clone(data.get_ref()));

        Box::pin(async move {
            let claims = match key::get_admin_claims_or_error(&req) {
                Ok(claims) => claims,
                Err(response) => return Ok(req.into_response(response)),
            };
            let Some(repo) = repo else {
                log::error!("Repository missing from app data");
                return Ok(req.error_response(AppError::Internal(
                    "Repository unavailable".to_string(),
                )));
            };

            match authenticate(&*repo, &claims).await {
                Ok(identity) => {
                    req.extensions_mut().insert(identity);
                    srv.call(req).await.map(|res| res.map_into_boxed_body())
                }
                Err(e) => Ok(req.error_response(e)),
            }
        })
    }
}
