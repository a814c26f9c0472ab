use std::sync::Arc;

use crate::audit::AuditLogger;
use crate::config::{DatabaseConnections, SecretManager};
use crate::errors::InternalError;
use crate::policy::AccessPolicy;
use crate::providers::{
    AuthenticationProvider, AuthorizationProvider, CryptoProvider, LogOtpDelivery, OtpDelivery, OtpProvider,
    PasswordValidatorProvider, TokenProvider,
};
use crate::stores::{AccountStore, AuditStore};

/// Providers shared by every coordinator
pub struct Providers {
    pub crypto_provider: Arc<CryptoProvider>,
    pub token_provider: Arc<TokenProvider>,
    pub authentication_provider: Arc<AuthenticationProvider>,
    pub authorization_provider: Arc<AuthorizationProvider>,
    pub otp_provider: Arc<OtpProvider>,
}

/// Centralized application data following the main-owned stores pattern
///
/// All dependencies are created once in main.rs and shared across coordinators.
///
/// ```text
/// main.rs
///   ↓
/// AppData::init()
///   ↓ creates once
///   ├─ connections (auth + audit DatabaseConnection)
///   ├─ secret_manager (Arc<SecretManager>)
///   ├─ audit_store → audit_logger
///   ├─ account_store
///   └─ providers (crypto, token, authentication, authorization, otp)
///   ↓ wrapped in Arc<AppData>
///   ↓ passed to coordinators
/// ```
pub struct AppData {
    pub connections: DatabaseConnections,
    pub secret_manager: Arc<SecretManager>,
    pub audit_store: Arc<AuditStore>,
    pub account_store: Arc<AccountStore>,
    pub audit_logger: Arc<AuditLogger>,
    pub providers: Providers,
}

impl AppData {
    /// Initialize all application data from the process environment
    ///
    /// Database connections should be initialized and migrated before calling this.
    ///
    /// # Errors
    ///
    /// Returns `InternalError` when secret manager initialization fails
    pub async fn init(connections: DatabaseConnections) -> Result<Self, InternalError> {
        tracing::info!("Initializing AppData...");

        tracing::debug!("Initializing secret manager...");
        let secret_manager = Arc::new(
            SecretManager::init()
                .map_err(|e| InternalError::parse("secret_manager", format!("Secret manager init failed: {}", e)))?,
        );
        tracing::debug!("Secret manager initialized");

        let app_data = Self::build(connections, secret_manager, Arc::new(LogOtpDelivery));

        tracing::info!("AppData initialization complete");
        Ok(app_data)
    }

    /// Wire stores and providers around existing connections and secrets
    pub fn build(
        connections: DatabaseConnections,
        secret_manager: Arc<SecretManager>,
        otp_delivery: Arc<dyn OtpDelivery>,
    ) -> Self {
        // Order matters: audit_store first, then others that depend on it
        let audit_store = Arc::new(AuditStore::new(connections.audit.clone()));
        let audit_logger = Arc::new(AuditLogger::new(audit_store.clone()));
        let account_store = Arc::new(AccountStore::new());

        let crypto_provider = Arc::new(CryptoProvider::new(secret_manager.clone()));
        let token_provider = Arc::new(TokenProvider::new(secret_manager.clone(), audit_logger.clone()));
        let authentication_provider = Arc::new(AuthenticationProvider::new(
            account_store.clone(),
            crypto_provider.clone(),
            Arc::new(PasswordValidatorProvider::new()),
            audit_logger.clone(),
        ));
        let authorization_provider = Arc::new(AuthorizationProvider::new(
            AccessPolicy::global(),
            account_store.clone(),
            audit_logger.clone(),
        ));
        let otp_provider = Arc::new(OtpProvider::new(
            account_store.clone(),
            crypto_provider.clone(),
            otp_delivery,
            audit_logger.clone(),
        ));
        tracing::debug!("Stores and providers created");

        Self {
            connections,
            secret_manager,
            audit_store,
            account_store,
            audit_logger,
            providers: Providers {
                crypto_provider,
                token_provider,
                authentication_provider,
                authorization_provider,
                otp_provider,
            },
        }
    }
}
