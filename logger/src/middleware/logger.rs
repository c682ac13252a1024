use std::{sync::Arc, time::Instant};

use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    web,
};
use colored::Colorize;
use common::{
    env_config::Config,
    error::Res,
    jwt::JwtClaims,
    key::AdminKeyClaims,
};
use futures::future::{LocalBoxFuture, Ready, ready};
use log::info;

/// Writes one colored line per request: status, method, path, latency and caller.
pub struct LoggerMiddleware {}

impl LoggerMiddleware {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for LoggerMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, B> Transform<S, ServiceRequest> for LoggerMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = LoggerMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(LoggerMiddlewareService {
            service: Arc::new(service),
        }))
    }
}

pub struct LoggerMiddlewareService<S> {
    service: Arc<S>,
}

/// Caller shown in the log line; session user first, then admin key.
fn caller(req: &ServiceRequest) -> String {
    let extensions = req.extensions();
    if let Some(Ok(claims)) = extensions.get::<Res<JwtClaims>>() {
        return format!("user_id={}", claims.user_id);
    }
    if let Some(Ok(claims)) = extensions.get::<Res<AdminKeyClaims>>() {
        return format!("admin_id={}", claims.admin_id);
    }
    "anonymous".to_string()
}

impl<S, B> Service<ServiceRequest> for LoggerMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let method = req.method().to_string();
        let path = req.path().to_string();
        let query_string = req.query_string().to_string();
        let who = caller(&req);

        let console_logging_enabled = req
            .app_data::<web::Data<Arc<Config>>>()
            .map(|config| config.console_logging_enabled)
            .unwrap_or(true);
        let srv = Arc::clone(&self.service);
        let started = Instant::now();

        Box::pin(async move {
            let res = srv.call(req).await?;

            if console_logging_enabled {
                let status_code = res.status().as_u16();
                let colored_status = match status_code {
                    200..=299 => status_code.to_string().green(),
                    300..=399 => status_code.to_string().yellow(),
                    400..=499 => status_code.to_string().bright_red(),
                    _ => status_code.to_string().red(),
                };

                let colored_method = match method.as_str() {
                    "GET" => method.blue(),
                    "POST" => method.yellow(),
                    "PUT" => method.purple(),
                    "PATCH" => method.cyan(),
                    "DELETE" => method.red(),
                    _ => method.normal(),
                };

                let target = if query_string.is_empty() {
                    path
                } else {
                    format!("{}?{}", path, query_string)
                };

                // request bodies carry identity documents and are never logged
                info!(
                    "[{}] {} {} {} {}",
                    colored_status,
                    colored_method,
                    target.bright_white(),
                    format!("({}ms)", started.elapsed().as_millis()).bright_black(),
                    who.bright_blue(),
                );
            }

            Ok(res)
        })
    }
}
