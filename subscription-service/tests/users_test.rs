mod common;

use common::{json_body, TestApp, USER_PASSWORD};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn list_hides_passwords_and_supports_search() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.register_user("Ada Lovelace", "ada@example.com").await;
    app.register_user("Bob", "bob@example.com").await;

    let body = json_body(app.get("/users", &admin).await).await;
    // the bootstrap admin counts too
    assert_eq!(body["total"], 3);
    for user in body["data"].as_array().unwrap() {
        assert!(user.get("password").is_none());
        assert!(user.get("__v").is_none());
    }

    let body = json_body(app.get("/users?search=lovelace", &admin).await).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["email"], "ada@example.com");

    let body = json_body(app.get("/users?role=admin", &admin).await).await;
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn password_cannot_be_projected() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;

    let response = app.get("/users?fields=name,password", &admin).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.get("/users?sort=password", &admin).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn regular_users_can_read_but_not_write() {
    let app = TestApp::spawn().await;
    let (token, user_id) = app.register_user("Ada", "ada@example.com").await;

    let response = app.get(&format!("/users/{}", user_id), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["data"]["name"], "Ada");

    let response = app
        .patch(&format!("/users/{}", user_id), &token, json!({ "role": "admin" }))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_creates_and_updates_users() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;

    let response = app
        .post(
            "/users",
            &admin,
            json!({ "name": "Carol", "email": "carol@example.com", "password": USER_PASSWORD }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await["data"].clone();
    assert_eq!(created["role"], "user");
    let id = created["_id"].as_str().unwrap();

    let response = app
        .patch(
            &format!("/users/{}", id),
            &admin,
            json!({ "name": "Caroline", "role": "admin" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response).await["data"].clone();
    assert_eq!(updated["name"], "Caroline");
    assert_eq!(updated["role"], "admin");
    assert_eq!(updated["email"], "carol@example.com");

    // the new role is effective on the user's next request
    let login = json_body(app.login("carol@example.com", USER_PASSWORD).await).await;
    let token = login["token"].as_str().unwrap();
    let response = app
        .post("/plans", token, json!({ "name": "Alfa", "price": 5, "duration": 1 }))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn duplicate_email_is_a_bad_request_not_a_500() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.register_user("Ada", "ada@example.com").await;
    let (_, bob) = app.register_user("Bob", "bob@example.com").await;

    let response = app
        .post(
            "/users",
            &admin,
            json!({ "name": "Ada 2", "email": "ADA@example.com", "password": USER_PASSWORD }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["message"],
        "Duplicate field value entered"
    );

    let response = app
        .patch(
            &format!("/users/{}", bob),
            &admin,
            json!({ "email": "ada@example.com" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["message"],
        "Duplicate field value entered"
    );
}

#[tokio::test]
async fn missing_user_is_not_found() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;

    let response = app.get("/users/does-not-exist", &admin).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["message"], "User not found");

    let response = app
        .patch("/users/does-not-exist", &admin, json!({ "name": "X" }))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
