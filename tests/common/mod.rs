// Common test utilities for integration tests
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use migration::{AuditMigrator, AuthMigrator, MigratorTrait};
use poem::Route;
use poem::test::TestClient;
use rootsreach_backend::api::build_routes;
use rootsreach_backend::app_data::AppData;
use rootsreach_backend::config::{DatabaseConnections, SecretManager};
use rootsreach_backend::errors::InternalError;
use rootsreach_backend::providers::OtpDelivery;
use sea_orm::{Database, DatabaseConnection};

pub const JWT_SECRET: &str = "integration-jwt-secret-with-at-least-32-chars";
pub const PEPPER: &str = "integration-pepper-16";

/// Creates a test auth database with migrations applied
pub async fn setup_test_auth_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    AuthMigrator::up(&db, None)
        .await
        .expect("Failed to run auth migrations");

    db
}

/// Creates a test audit database with migrations applied
pub async fn setup_test_audit_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create audit database");

    AuditMigrator::up(&db, None)
        .await
        .expect("Failed to run audit migrations");

    db
}

/// Keeps every delivered (recipient, code) pair
#[derive(Default)]
pub struct CaptureDelivery {
    delivered: Mutex<Vec<(String, String)>>,
}

impl CaptureDelivery {
    pub fn last_code(&self) -> Option<String> {
        self.delivered
            .lock()
            .unwrap()
            .last()
            .map(|(_, code)| code.clone())
    }
}

impl OtpDelivery for CaptureDelivery {
    fn deliver(&self, recipient: &str, code: &str) -> Result<(), InternalError> {
        self.delivered
            .lock()
            .unwrap()
            .push((recipient.to_string(), code.to_string()));
        Ok(())
    }
}

pub struct TestApp {
    pub app_data: Arc<AppData>,
    pub delivery: Arc<CaptureDelivery>,
    pub client: TestClient<Route>,
}

/// Full application over in-memory databases, served through poem's test client
pub async fn spawn_app() -> TestApp {
    let connections = DatabaseConnections {
        auth: setup_test_auth_db().await,
        audit: setup_test_audit_db().await,
    };
    let secret_manager = Arc::new(SecretManager::from_values(JWT_SECRET, PEPPER).unwrap());
    let delivery = Arc::new(CaptureDelivery::default());
    let app_data = Arc::new(AppData::build(connections, secret_manager, delivery.clone()));

    let client = TestClient::new(build_routes(app_data.clone(), "http://localhost:3000/api"));

    TestApp {
        app_data,
        delivery,
        client,
    }
}

impl TestApp {
    pub async fn register(&self, username: &str, password: &str, role: &str) -> serde_json::Value {
        let response = self
            .client
            .post("/api/auth/register")
            .body_json(&serde_json::json!({
                "username": username,
                "password": password,
                "role": role,
            }))
            .send()
            .await;
        response.assert_status_is_ok();
        response.json().await.value().deserialize()
    }

    /// Log in and return the raw response
    pub async fn login(&self, username: &str, password: &str) -> poem::test::TestResponse {
        self.client
            .post("/api/auth/login")
            .body_json(&serde_json::json!({
                "username": username,
                "password": password,
            }))
            .send()
            .await
    }

    pub async fn token(&self, username: &str, password: &str) -> String {
        let response = self.login(username, password).await;
        response.assert_status_is_ok();
        let body: serde_json::Value = response.json().await.value().deserialize();
        body["access_token"].as_str().unwrap().to_string()
    }
}

/// Helper to manage environment variables in tests
///
/// Cleans up specified environment variables on creation and drop,
/// ensuring test isolation when dealing with global environment state.
pub struct EnvGuard {
    vars: Vec<String>,
}

impl EnvGuard {
    pub fn new(vars: Vec<&str>) -> Self {
        for var in &vars {
            unsafe {
                std::env::remove_var(var);
            }
        }
        Self {
            vars: vars.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for var in &self.vars {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }
}

/// Global mutex for tests that modify environment variables
pub static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());
