use std::sync::Arc;

use crate::app_data::AppData;
use crate::audit::audit_logger;
use crate::coordinators::AdminCoordinator;
use crate::errors::InternalError;
use crate::types::internal::context::RequestContext;

/// Create an administrator; a strong password is generated when none is given
///
/// A generated password is printed once and never stored in plaintext.
pub async fn create_admin(
    app_data: Arc<AppData>,
    username: &str,
    password: Option<String>,
) -> Result<(), InternalError> {
    let ctx = RequestContext::for_cli("create-admin");
    audit_logger::report(
        app_data
            .audit_logger
            .log_cli_session_start(&ctx, "create-admin", vec![format!("--username={}", username)])
            .await,
        "cli_session_start",
    );

    let (password, generated) = match password {
        Some(password) => (password, false),
        None => (app_data.providers.crypto_provider.generate_secure_password(), true),
    };

    let coordinator = AdminCoordinator::new(app_data);
    let account = coordinator.create_admin(&ctx, username, &password).await?;

    println!("Administrator '{}' created (id {})", account.username, account.id);
    if generated {
        println!("Generated password: {}", password);
        println!("Store it now; it will not be shown again.");
    }

    Ok(())
}

/// Clear failed-login attempts and lock for `username`
pub async fn unlock(app_data: Arc<AppData>, username: &str) -> Result<(), InternalError> {
    let ctx = RequestContext::for_cli("unlock");
    audit_logger::report(
        app_data
            .audit_logger
            .log_cli_session_start(&ctx, "unlock", vec![format!("--username={}", username)])
            .await,
        "cli_session_start",
    );

    let coordinator = AdminCoordinator::new(app_data);
    let account_id = coordinator.unlock_username(&ctx, username).await?;

    println!("Account '{}' ({}) unlocked", username, account_id);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Role;
    use crate::stores::account_store::role_from_model;
    use crate::test::utils::setup_test_app_data;

    #[tokio::test]
    async fn test_create_admin_with_generated_password() {
        let (app_data, _) = setup_test_app_data().await;

        create_admin(app_data.clone(), "operator", None).await.unwrap();

        let account = app_data
            .account_store
            .get_by_username(&app_data.connections.auth, "operator")
            .await
            .unwrap();
        assert_eq!(role_from_model(&account).unwrap(), Role::Admin);
        assert_eq!(app_data.audit_store.events_of_type("cli_session_start").await.unwrap().len(), 1);
    }
}
