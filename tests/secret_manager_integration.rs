mod common;

use std::sync::Arc;

use rootsreach_backend::config::{SecretError, SecretManager};

const JWT: &str = "this-is-a-valid-jwt-secret-with-32-characters";
const PEPPER: &str = "valid-pepper-16ch";

#[test]
fn test_application_startup_with_valid_secrets() {
    let _lock = common::ENV_TEST_MUTEX.lock().unwrap();
    let _guard = common::EnvGuard::new(vec!["JWT_SECRET", "PEPPER"]);

    unsafe {
        std::env::set_var("JWT_SECRET", JWT);
        std::env::set_var("PEPPER", PEPPER);
    }

    let secret_manager = Arc::new(SecretManager::init().expect("valid secrets must load"));

    assert_eq!(secret_manager.jwt_secret(), JWT);
    assert_eq!(secret_manager.pepper(), PEPPER);

    let shared = Arc::clone(&secret_manager);
    assert_eq!(shared.jwt_secret(), JWT);
}

#[test]
fn test_application_fails_gracefully_with_missing_jwt_secret() {
    let _lock = common::ENV_TEST_MUTEX.lock().unwrap();
    let _guard = common::EnvGuard::new(vec!["JWT_SECRET", "PEPPER"]);

    unsafe {
        std::env::set_var("PEPPER", PEPPER);
    }

    let err = SecretManager::init().err().expect("missing JWT_SECRET must fail");
    assert_eq!(
        err,
        SecretError::Missing {
            secret_name: "JWT_SECRET".to_string()
        }
    );
    assert!(err.to_string().contains("JWT_SECRET"));
}

#[test]
fn test_application_fails_gracefully_with_short_pepper() {
    let _lock = common::ENV_TEST_MUTEX.lock().unwrap();
    let _guard = common::EnvGuard::new(vec!["JWT_SECRET", "PEPPER"]);

    unsafe {
        std::env::set_var("JWT_SECRET", JWT);
        std::env::set_var("PEPPER", "short");
    }

    let err = SecretManager::init().err().expect("short PEPPER must fail");
    assert_eq!(
        err,
        SecretError::InvalidLength {
            secret_name: "PEPPER".to_string(),
            expected: 16,
            actual: 5,
        }
    );
}

#[test]
fn test_secrets_are_not_printed() {
    let secret_manager = SecretManager::from_values(JWT, PEPPER).unwrap();

    let debug = format!("{:?}", secret_manager);
    assert!(!debug.contains(JWT));
    assert!(!debug.contains(PEPPER));
}
