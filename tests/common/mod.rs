#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;

use actix_web::{web, App, HttpResponse, HttpServer};
use sqlx::PgPool;

use contacts_api::auth::{Authenticator, CredentialVerifier, TokenService};
use contacts_api::avatar_client::AvatarClient;
use contacts_api::configuration::{AvatarStorageSettings, DatabaseSettings, JwtSettings};
use contacts_api::startup::{get_connection_pool, run};
use contacts_api::store::{InMemoryPrincipalStore, PrincipalStore};

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-characters-long";
pub const EMAIL: &str = "john@example.com";
pub const PASSWORD: &str = "SecurePass123";

pub struct TestApp {
    pub address: String,
    pub authenticator: Authenticator,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn signup(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(format!("{}/signup", self.address))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(format!("{}/login", self.address))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn refresh(&self, refresh_token: &str) -> reqwest::Response {
        self.client
            .get(format!("{}/refresh_token", self.address))
            .bearer_auth(refresh_token)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Sign up and log in, returning the token pair body
    pub async fn logged_in(&self) -> serde_json::Value {
        assert_eq!(201, self.signup(EMAIL, PASSWORD).await.status().as_u16());
        let response = self.login(EMAIL, PASSWORD).await;
        assert_eq!(200, response.status().as_u16());
        response.json().await.expect("Failed to parse response")
    }

    pub fn store(&self) -> &Arc<dyn PrincipalStore> {
        self.authenticator.store()
    }
}

pub fn test_database_settings() -> DatabaseSettings {
    DatabaseSettings {
        username: "postgres".to_string(),
        password: "password".to_string(),
        port: 5432,
        host: "localhost".to_string(),
        database_name: uuid::Uuid::new_v4().to_string(),
    }
}

pub fn test_token_service() -> TokenService {
    TokenService::new(&JwtSettings {
        secret: TEST_SECRET.to_string(),
        algorithm: "HS256".to_string(),
        access_token_expiry: 900,
        refresh_token_expiry: 604800,
    })
    .expect("Failed to build token service")
}

/// Fake avatar storage answering every upload with a fixed URL
pub fn spawn_avatar_storage() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let server = HttpServer::new(|| {
        App::new().route(
            "/v1_1/test/image/upload",
            web::post().to(|| async {
                HttpResponse::Ok().json(serde_json::json!({
                    "secure_url": "https://cdn.example.com/avatars/test.png"
                }))
            }),
        )
    })
    .listen(listener)
    .unwrap()
    .run();
    let _ = tokio::spawn(server);
    format!("http://127.0.0.1:{}", port)
}

/// Spawn the app on a random port with an in-memory principal store.
/// The Postgres pool connects lazily, so only contact routes need a database.
pub async fn spawn_app() -> TestApp {
    spawn_app_with_pool(
        get_connection_pool(&test_database_settings()).expect("Failed to build pool"),
    )
}

pub fn spawn_app_with_pool(pool: PgPool) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let authenticator = Authenticator::new(
        Arc::new(InMemoryPrincipalStore::new()),
        test_token_service(),
        CredentialVerifier::new(4),
    );
    let avatars = AvatarClient::new(&AvatarStorageSettings {
        base_url: spawn_avatar_storage(),
        cloud_name: "test".to_string(),
        api_key: "key".to_string(),
        api_secret: "secret".to_string(),
        timeout_milliseconds: 2_000,
    })
    .expect("Failed to build avatar client");

    let server = run(listener, pool, authenticator.clone(), avatars)
        .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        authenticator,
        client: reqwest::Client::new(),
    }
}
