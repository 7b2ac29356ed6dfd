#![allow(dead_code)]

use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use service_core::config::Config as CoreConfig;
use subscription_service::config::{
    AdminBootstrap, Environment, JwtConfig, MongoConfig, StoreBackend, SubscriptionConfig,
};
use subscription_service::startup::Application;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "Admin#Pass123";
pub const USER_PASSWORD: &str = "Secure#Pass1";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: Client,
}

impl TestApp {
    /// Starts the full application on a random port with the in-memory store
    /// and a bootstrap admin.
    pub async fn spawn() -> Self {
        let config = SubscriptionConfig {
            common: CoreConfig {
                port: 0, // Random port for testing
                log_level: "info".to_string(),
            },
            environment: Environment::Dev,
            store: StoreBackend::Memory,
            mongodb: MongoConfig {
                uri: "mongodb://localhost:27017".to_string(),
                database: "subscription_test".to_string(),
            },
            jwt: JwtConfig {
                secret: "integration-test-secret".to_string(),
                expires_in_minutes: 60,
            },
            admin: Some(AdminBootstrap {
                name: "Admin".to_string(),
                email: ADMIN_EMAIL.to_string(),
                password: ADMIN_PASSWORD.to_string(),
            }),
            otlp_endpoint: None,
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let port = app.port();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        TestApp {
            address: format!("http://127.0.0.1:{}", port),
            port,
            client: Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub fn api(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.address, path)
    }

    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.client
            .post(self.api("/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn admin_token(&self) -> String {
        let body: Value = self
            .login(ADMIN_EMAIL, ADMIN_PASSWORD)
            .await
            .json()
            .await
            .expect("Failed to parse JSON");
        body["token"].as_str().expect("token missing").to_string()
    }

    /// Registers a regular user and returns `(token, user id)`.
    pub async fn register_user(&self, name: &str, email: &str) -> (String, String) {
        let response = self
            .client
            .post(self.api("/auth/register"))
            .json(&json!({ "name": name, "email": email, "password": USER_PASSWORD }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), StatusCode::CREATED);

        let body: Value = response.json().await.expect("Failed to parse JSON");
        (
            body["token"].as_str().expect("token missing").to_string(),
            body["data"]["user"]["_id"]
                .as_str()
                .expect("user id missing")
                .to_string(),
        )
    }

    pub async fn get(&self, path: &str, token: &str) -> Response {
        self.client
            .get(self.api(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> Response {
        self.client
            .post(self.api(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn patch(&self, path: &str, token: &str, body: Value) -> Response {
        self.client
            .patch(self.api(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn delete(&self, path: &str, token: &str) -> Response {
        self.client
            .delete(self.api(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn create_plan(&self, token: &str, name: &str, price: f64, duration: i32) -> String {
        let response = self
            .post(
                "/plans",
                token,
                json!({ "name": name, "price": price, "duration": duration }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body: Value = response.json().await.expect("Failed to parse JSON");
        body["data"]["_id"].as_str().expect("plan id missing").to_string()
    }
}

pub async fn json_body(response: Response) -> Value {
    response.json().await.expect("Failed to parse JSON")
}
