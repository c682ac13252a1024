use actix_web::web::{self};
use middleware::admin::AdminKeyMiddleware;

pub mod middleware {
    pub mod admin;
}

pub mod routes {
    pub mod review;
}

pub mod services {
    pub mod admin;
    pub mod review;
}

pub mod dtos {
    pub mod review;
}

pub use middleware::admin::AdminIdentity;
pub use services::admin::bootstrap;

/// Requires a valid `X-API-KEY` admin key on every route of the wrapped scope.
pub fn admin_middleware() -> AdminKeyMiddleware {
    AdminKeyMiddleware::new()
}

pub fn mount_review() -> actix_web::Scope {
    web::scope("/verifications")
        .service(routes::review::get_verifications)
        .service(routes::review::get_verification)
        .service(routes::review::post_approve)
        .service(routes::review::post_reject)
}
