mod common;

use common::{spawn_app, spawn_app_with_pool, test_database_settings, TestApp};
use contacts_api::configuration::DatabaseSettings;
use serde_json::{json, Value};
use sqlx::{Connection, Executor, PgConnection, PgPool};

pub async fn configure_database(config: &DatabaseSettings) -> PgPool {
    let mut connection = PgConnection::connect(&config.connection_string_without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, config.database_name))
        .await
        .expect("Failed to create database.");

    let connection_pool = PgPool::connect(&config.connection_string())
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database.");
    connection_pool
}

async fn spawn_app_with_database() -> (TestApp, String) {
    let pool = configure_database(&test_database_settings()).await;
    let app = spawn_app_with_pool(pool);
    let tokens = app.logged_in().await;
    let access = tokens["access_token"].as_str().unwrap().to_string();
    (app, access)
}

fn ada() -> Value {
    json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": "ada@example.com",
        "phone_number": "+44 20 7946 0958",
        "birth_date": "1815-12-10",
        "additional_data": "Analytical engine"
    })
}

#[tokio::test]
async fn contact_routes_require_access_token() {
    let app = spawn_app().await;

    let routes = [
        app.client.get(format!("{}/contacts/all", app.address)),
        app.client.get(format!("{}/contacts", app.address)),
        app.client.get(format!("{}/contacts/1", app.address)),
        app.client.post(format!("{}/contacts", app.address)).json(&ada()),
        app.client.put(format!("{}/contacts/1", app.address)).json(&ada()),
        app.client.delete(format!("{}/contacts/1", app.address)),
    ];

    for request in routes {
        let response = request.send().await.expect("Failed to execute request.");
        assert_eq!(401, response.status().as_u16());
    }
}

#[tokio::test]
async fn contact_routes_reject_refresh_token() {
    let app = spawn_app().await;
    let tokens = app.logged_in().await;

    let response = app
        .client
        .get(format!("{}/contacts/all", app.address))
        .bearer_auth(tokens["refresh_token"].as_str().unwrap())
        .send()
        .await
        .unwrap();

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn pagination_limits_are_validated_before_querying() {
    let app = spawn_app().await;
    let tokens = app.logged_in().await;
    let access = tokens["access_token"].as_str().unwrap();

    for query in ["limit=5", "limit=101", "skip=-1"] {
        let response = app
            .client
            .get(format!("{}/contacts?{}", app.address, query))
            .bearer_auth(access)
            .send()
            .await
            .unwrap();
        assert_eq!(400, response.status().as_u16(), "Should reject {}", query);
    }
}

#[tokio::test]
#[ignore = "requires a running Postgres instance"]
async fn contact_crud_round_trip() {
    let (app, access) = spawn_app_with_database().await;

    let created = app
        .client
        .post(format!("{}/contacts", app.address))
        .bearer_auth(&access)
        .json(&ada())
        .send()
        .await
        .unwrap();
    assert_eq!(201, created.status().as_u16());
    let contact: Value = created.json().await.unwrap();
    let id = contact["id"].as_i64().unwrap();
    assert_eq!(contact["first_name"], "Ada");

    let fetched: Value = app
        .client
        .get(format!("{}/contacts/{}", app.address, id))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["email"], "ada@example.com");

    let mut updated = ada();
    updated["last_name"] = json!("King");
    let response = app
        .client
        .put(format!("{}/contacts/{}", app.address, id))
        .bearer_auth(&access)
        .json(&updated)
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());

    let all: Value = app
        .client
        .get(format!("{}/contacts/all", app.address))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.as_array().unwrap().len(), 1);
    assert_eq!(all[0]["last_name"], "King");

    let deleted = app
        .client
        .delete(format!("{}/contacts/{}", app.address, id))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap();
    assert_eq!(200, deleted.status().as_u16());

    let missing = app
        .client
        .get(format!("{}/contacts/{}", app.address, id))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap();
    assert_eq!(404, missing.status().as_u16());
}

#[tokio::test]
#[ignore = "requires a running Postgres instance"]
async fn duplicate_contact_email_returns_409() {
    let (app, access) = spawn_app_with_database().await;

    for expected in [201, 409] {
        let response = app
            .client
            .post(format!("{}/contacts", app.address))
            .bearer_auth(&access)
            .json(&ada())
            .send()
            .await
            .unwrap();
        assert_eq!(expected, response.status().as_u16());
    }
}

#[tokio::test]
#[ignore = "requires a running Postgres instance"]
async fn update_and_delete_missing_contact_return_404() {
    let (app, access) = spawn_app_with_database().await;

    let update = app
        .client
        .put(format!("{}/contacts/9999", app.address))
        .bearer_auth(&access)
        .json(&ada())
        .send()
        .await
        .unwrap();
    assert_eq!(404, update.status().as_u16());

    let delete = app
        .client
        .delete(format!("{}/contacts/9999", app.address))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap();
    assert_eq!(404, delete.status().as_u16());
}

#[tokio::test]
#[ignore = "requires a running Postgres instance"]
async fn paginated_listing_respects_skip() {
    let (app, access) = spawn_app_with_database().await;

    for i in 0..12 {
        let mut contact = ada();
        contact["email"] = json!(format!("ada{}@example.com", i));
        let response = app
            .client
            .post(format!("{}/contacts", app.address))
            .bearer_auth(&access)
            .json(&contact)
            .send()
            .await
            .unwrap();
        assert_eq!(201, response.status().as_u16());
    }

    let page: Value = app
        .client
        .get(format!("{}/contacts?skip=10&limit=10", app.address))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page.as_array().unwrap().len(), 2);
}
