use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{Authenticator, CredentialVerifier, TokenService};
use crate::avatar_client::AvatarClient;
use crate::configuration::{DatabaseSettings, Settings};
use crate::error::AppError;
use crate::logger::LoggerMiddleware;
use crate::middleware::JwtMiddleware;
use crate::routes::{
    create_contact, delete_contact, get_contact, get_current_user, health_check,
    list_all_contacts, list_contacts, login, refresh_token, reset_password, signup,
    update_contact, upload_avatar, verify_email, MAX_AVATAR_BYTES,
};
use crate::store::PgPrincipalStore;

/// Pool that connects on first use
pub fn get_connection_pool(configuration: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_lazy(&configuration.connection_string())
}

/// Wire the Postgres-backed services described by `configuration`
pub fn build_services(
    configuration: &Settings,
    pool: PgPool,
) -> Result<(Authenticator, AvatarClient), AppError> {
    let tokens = TokenService::new(&configuration.jwt)?;
    let verifier = CredentialVerifier::new(configuration.password.cost);
    let authenticator = Authenticator::new(
        Arc::new(PgPrincipalStore::new(pool)),
        tokens,
        verifier,
    );
    let avatars = AvatarClient::new(&configuration.avatar_storage)?;

    Ok((authenticator, avatars))
}

pub fn run(
    listener: TcpListener,
    connection: PgPool,
    authenticator: Authenticator,
    avatars: AvatarClient,
) -> Result<Server, std::io::Error> {
    let connection = web::Data::new(connection);
    let authenticator_data = web::Data::new(authenticator.clone());
    let avatars = web::Data::new(avatars);

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)

            // Shared state
            .app_data(connection.clone())
            .app_data(authenticator_data.clone())
            .app_data(avatars.clone())
            .app_data(web::PayloadConfig::new(MAX_AVATAR_BYTES))

            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/signup", web::post().to(signup))
            .route("/login", web::post().to(login))
            .route("/refresh_token", web::get().to(refresh_token))
            .route("/verify-email/{email}", web::get().to(verify_email))
            .route("/reset-password", web::post().to(reset_password))

            // Protected routes (require an access token)
            .service(
                web::resource("/me")
                    .wrap(JwtMiddleware::new(authenticator.clone()))
                    .route(web::get().to(get_current_user)),
            )
            .service(
                web::scope("/contacts")
                    .wrap(JwtMiddleware::new(authenticator.clone()))
                    .route("/all", web::get().to(list_all_contacts))
                    .route("", web::get().to(list_contacts))
                    .route("", web::post().to(create_contact))
                    .route("/{id}", web::get().to(get_contact))
                    .route("/{id}", web::put().to(update_contact))
                    .route("/{id}", web::delete().to(delete_contact)),
            )
            .service(
                web::scope("/users")
                    .wrap(JwtMiddleware::new(authenticator.clone()))
                    .route("/{id}/avatar", web::post().to(upload_avatar)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
