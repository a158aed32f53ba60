use std::net::TcpListener;

use contacts_api::configuration::get_configuration;
use contacts_api::startup::{build_services, get_connection_pool, run};
use contacts_api::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    let pool = get_connection_pool(&configuration.database).map_err(|e| {
        tracing::error!("Invalid database settings: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Database configuration error")
    })?;

    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
        tracing::error!("Failed to migrate the database: {}", e);
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "Database migration error")
    })?;
    tracing::info!("Database migrations applied");

    // Fails fast on a missing or placeholder signing secret
    let (authenticator, avatars) = build_services(&configuration, pool.clone()).map_err(|e| {
        tracing::error!("Failed to build services: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    run(listener, pool, authenticator, avatars)?.await
}
