mod common;

use common::spawn_app;

#[tokio::test]
async fn health_check_works() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(&format!("{}/health_check", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert_eq!(Some(0), response.content_length());
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(&format!("{}/health_check", app.address))
        .header("x-request-id", "trace-123")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.headers().get("x-request-id").unwrap(), "trace-123");
}
