use std::{future::Future, pin::Pin, sync::Arc};

use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    web,
};
use futures::future::{Ready, ok};

use common::{
    env_config::Config,
    error::{AppError, Res},
    jwt::{self, JwtClaims},
    key::AdminKeyClaims,
};

pub const ADMIN_KEY_HEADER: &str = "X-API-KEY";

pub struct ExtractionMiddleware {}

impl ExtractionMiddleware {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for ExtractionMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, B> Transform<S, ServiceRequest> for ExtractionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Transform = ExtractionMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(ExtractionMiddlewareService {
            service: Arc::new(service),
        })
    }
}

pub struct ExtractionMiddlewareService<S> {
    service: Arc<S>,
}

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_owned())
}

impl<S, B> Service<ServiceRequest> for ExtractionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = bearer_token(&req);
        let admin_key = req
            .headers()
            .get(ADMIN_KEY_HEADER)
            .map(|v| v.to_str().unwrap_or_default().to_string());

        let secret = req
            .app_data::<web::Data<Arc<Config>>>()
            .map(|config| config.jwt_config.secret.clone());
        let srv = Arc::clone(&self.service);

        Box::pin(async move {
            if let Some(token) = token {
                // a failed validation is kept so optional routes can reject it
                let claims_res = match &secret {
                    Some(secret) => jwt::validate_jwt(&token, secret),
                    None => {
                        log::error!("Configuration missing from app data");
                        Err(AppError::Internal("Configuration unavailable".to_string()))
                    }
                };
                req.extensions_mut().insert::<Res<JwtClaims>>(claims_res);
            }
            if let Some(key) = admin_key {
                let claims_res = AdminKeyClaims::from_key(key.as_str());
                req.extensions_mut().insert::<Res<AdminKeyClaims>>(claims_res);
            }
            srv.call(req).await.map(|res| res.map_into_boxed_body())
        })
    }
}
