use actix_web::web::{self};
use middleware::auth::AuthMiddleware;

pub mod dtos {
    pub mod auth;
    pub mod user;
}

pub mod middleware {
    pub mod auth;
}

pub mod misc {
    pub mod identity;
}

pub mod routes {
    pub mod auth;
    pub mod user;
}

pub mod services {
    pub mod auth;
    pub mod user;
}

pub use misc::identity::{FirebaseIdentityProvider, IdentityClaims, IdentityProvider};

/// Requires a valid session token on every route of the wrapped scope.
pub fn auth_middleware() -> AuthMiddleware {
    AuthMiddleware::new()
}

pub fn mount_auth() -> actix_web::Scope {
    web::scope("/auth").service(routes::auth::post_phone)
}

pub fn mount_user() -> actix_web::Scope {
    web::scope("/user")
        .service(routes::user::get_me)
        .service(routes::user::patch_profile)
        .service(routes::user::put_bank)
}
