mod common;

use common::{json_body, TestApp, ADMIN_EMAIL, USER_PASSWORD};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn register_returns_token_and_user_without_password() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.api("/auth/register"))
        .json(&json!({
            "name": "Ada Lovelace",
            "email": "Ada@Example.com",
            "password": USER_PASSWORD
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["status"], "success");
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));

    let user = &body["data"]["user"];
    assert_eq!(user["email"], "ada@example.com");
    assert_eq!(user["role"], "user");
    assert!(user.get("password").is_none());
    assert!(user.get("__v").is_none());
}

#[tokio::test]
async fn self_registration_cannot_grant_admin() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.api("/auth/register"))
        .json(&json!({
            "name": "Mallory",
            "email": "mallory@example.com",
            "password": USER_PASSWORD,
            "role": "admin"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["data"]["user"]["role"], "user");

    let token = body["token"].as_str().unwrap();
    let response = app
        .post("/plans", token, json!({ "name": "Free", "price": 1, "duration": 1 }))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn duplicate_registration_is_a_bad_request() {
    let app = TestApp::spawn().await;
    app.register_user("Ada", "ada@example.com").await;

    let response = app
        .client
        .post(app.api("/auth/register"))
        .json(&json!({
            "name": "Impostor",
            "email": "ADA@example.com",
            "password": USER_PASSWORD
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "User already exists");
}

#[tokio::test]
async fn weak_password_reports_field_errors() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.api("/auth/register"))
        .json(&json!({ "name": "", "email": "bob@example.com", "password": "password" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Validation failed");

    let paths: Vec<&str> = body["errors"]
        .as_array()
        .expect("errors missing")
        .iter()
        .map(|e| e["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, vec!["name", "password"]);
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.api("/auth/login"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_with_correct_and_incorrect_password() {
    let app = TestApp::spawn().await;
    app.register_user("Ada", "ada@example.com").await;

    let ok = app.login("ada@example.com", USER_PASSWORD).await;
    assert_eq!(ok.status(), StatusCode::OK);
    let body = json_body(ok).await;
    assert!(body["token"].is_string());
    assert_eq!(body["data"]["user"]["name"], "Ada");

    let wrong = app.login("ada@example.com", "Wrong#Pass1").await;
    assert_eq!(wrong.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(wrong).await["message"], "Incorrect email or password");

    let unknown = app.login("nobody@example.com", USER_PASSWORD).await;
    assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(unknown).await["message"], "Incorrect email or password");
}

#[tokio::test]
async fn bootstrap_admin_can_log_in() {
    let app = TestApp::spawn().await;

    let response = app.login(ADMIN_EMAIL, common::ADMIN_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["data"]["user"]["role"], "admin");
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.api("/plans"))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await["message"],
        "You are not logged in! Please log in to get access."
    );

    let response = app.get("/plans", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_mutation_without_token_is_401() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.api("/plans"))
        .json(&json!({ "name": "Alfa", "price": 10, "duration": 1 }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_mutation_with_user_token_is_403() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_user("Ada", "ada@example.com").await;

    let response = app
        .post("/plans", &token, json!({ "name": "Alfa", "price": 10, "duration": 1 }))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        json_body(response).await["message"],
        "You do not have permission to perform this action"
    );

    // reads stay open to any signed-in user
    let response = app.get("/plans", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn token_of_a_deleted_user_is_rejected() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let (token, user_id) = app.register_user("Ada", "ada@example.com").await;

    let response = app.delete(&format!("/users/{}", user_id), &admin).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.get("/plans", &token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await["message"],
        "The user belonging to this token no longer exists."
    );
}
