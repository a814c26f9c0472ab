// Test utilities shared across unit tests
// Only compiled when running tests

use std::sync::{Arc, Mutex};

use migration::{AuditMigrator, AuthMigrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};

use crate::app_data::AppData;
use crate::config::{DatabaseConnections, SecretManager};
use crate::errors::InternalError;
use crate::providers::OtpDelivery;

pub const TEST_JWT_SECRET: &str = "test-secret-key-minimum-32-characters-long";
pub const TEST_PEPPER: &str = "test-pepper-for-unit-tests";

/// In-memory account database with migrations applied
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    AuthMigrator::up(&db, None)
        .await
        .expect("Failed to run auth migrations");

    db
}

/// In-memory audit database with migrations applied
pub async fn setup_test_audit_db() -> DatabaseConnection {
    let audit_db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create audit database");

    AuditMigrator::up(&audit_db, None)
        .await
        .expect("Failed to run audit migrations");

    audit_db
}

pub fn test_secret_manager() -> Arc<SecretManager> {
    Arc::new(SecretManager::from_values(TEST_JWT_SECRET, TEST_PEPPER).expect("Failed to build test SecretManager"))
}

/// OTP delivery that keeps every (recipient, code) pair it is handed
#[derive(Debug, Default)]
pub struct CapturingOtpDelivery {
    delivered: Mutex<Vec<(String, String)>>,
}

impl CapturingOtpDelivery {
    pub fn last(&self) -> Option<(String, String)> {
        self.delivered.lock().expect("delivery mutex poisoned").last().cloned()
    }

    pub fn count(&self) -> usize {
        self.delivered.lock().expect("delivery mutex poisoned").len()
    }
}

impl OtpDelivery for CapturingOtpDelivery {
    fn deliver(&self, recipient: &str, code: &str) -> Result<(), InternalError> {
        self.delivered
            .lock()
            .expect("delivery mutex poisoned")
            .push((recipient.to_string(), code.to_string()));
        Ok(())
    }
}

/// Fully wired AppData over fresh in-memory databases
///
/// Returns the capturing delivery so tests can read issued codes.
pub async fn setup_test_app_data() -> (Arc<AppData>, Arc<CapturingOtpDelivery>) {
    let connections = DatabaseConnections {
        auth: setup_test_db().await,
        audit: setup_test_audit_db().await,
    };
    let delivery = Arc::new(CapturingOtpDelivery::default());
    let app_data = AppData::build(connections, test_secret_manager(), delivery.clone());

    (Arc::new(app_data), delivery)
}
