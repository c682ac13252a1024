use actix_web::web::{self};

pub mod routes {
    pub mod verification;
}

pub mod services {
    pub mod submission;
}

pub mod dtos {
    pub mod verification;
}

/// Submission endpoint; a session is optional for the first-time flow.
pub fn mount_verification() -> actix_web::Scope {
    web::scope("/verification").service(routes::verification::post_submit)
}

/// Status endpoint, mounted under the session-protected dashboard scope.
pub fn mount_verification_status() -> actix_web::Scope {
    web::scope("/verification").service(routes::verification::get_status)
}
