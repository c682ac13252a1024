mod cors;

use std::sync::Arc;

use actix_web::{
    App, HttpServer,
    web::{self},
};
use api_auth::{FirebaseIdentityProvider, IdentityProvider};
use common::env_config::Config;
use db::{PgRepository, Repository};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // get env vars
    let config = Config::from_env();
    let config_data = config.clone();
    let origin = config.cors_allowed_origin.clone();

    // init logger
    if config.console_logging_enabled {
        logger::setup().expect("Failed to set up logger");
    }

    // init db connection
    let pool = db::setup(&config.database_url, config.is_production())
        .await
        .expect("Failed to set up database");
    let repo: Arc<dyn Repository> = Arc::new(PgRepository::new(pool));

    let identity: Arc<dyn IdentityProvider> =
        Arc::new(FirebaseIdentityProvider::new(&config.identity));

    if let Some(admin) = &config.admin_bootstrap {
        api_admin::bootstrap(repo.as_ref(), admin)
            .await
            .expect("Failed to bootstrap admin");
    }

    log::info!(
        "Listening on {}:{} with {} workers",
        config.server_host,
        config.server_port,
        config.num_workers
    );

    let permits = config.rate_limit_per_second;
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(repo.clone()))
            .app_data(web::Data::new(identity.clone()))
            .app_data(web::Data::new(config_data.clone()))
            .wrap(limiter::global_middleware(permits)) // 4th
            .wrap(logger::middleware()) // 3rd
            .wrap(extractor::middleware()) // 2nd
            .wrap(cors::middleware(&origin)) // 1st
            .service(
                web::scope("/api")
                    .service(api_auth::mount_auth())
                    .service(api_verification::mount_verification())
                    .service(
                        web::scope("/dashboard")
                            .wrap(api_auth::auth_middleware())
                            .service(api_auth::mount_user())
                            .service(api_verification::mount_verification_status()),
                    )
                    .service(
                        web::scope("/admin")
                            .wrap(api_admin::admin_middleware())
                            .service(api_admin::mount_review()),
                    ),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .workers(config.num_workers)
    .run()
    .await
}
