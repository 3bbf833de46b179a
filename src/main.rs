use std::io::Write; // for env_logger custom formatter
use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use chrono::Local;
use env_logger::{Env, Target};

use membership_backend::{
    config::Config,
    database::{create_connection, run_migrations},
    external::XenditService,
    handlers,
    middlewares::{create_cors, AuthMiddleware},
    services::{MembershipService, PackageService},
    swagger::swagger_config,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    let config = Config::from_toml().expect("Failed to load configuration file");

    let db = Arc::new(
        create_connection(&config.database)
            .await
            .expect("Failed to create database connection"),
    );

    run_migrations(db.as_ref())
        .await
        .expect("Failed to run database migrations");

    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.access_token_expires_in);

    let xendit_service = XenditService::new(config.xendit.clone());

    let package_service = PackageService::new(db.clone());
    let membership_service = MembershipService::new(
        db.clone(),
        xendit_service.clone(),
        config.checkout.clone(),
    );

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .app_data(web::Data::new(package_service.clone()))
            .app_data(web::Data::new(membership_service.clone()))
            .app_data(web::Data::new(xendit_service.clone()))
            .configure(swagger_config)
            .configure(handlers::webhook_config)
            .service(web::scope("/api/v1").configure(handlers::membership_config))
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
