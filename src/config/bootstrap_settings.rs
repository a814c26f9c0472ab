use std::fmt;
use std::sync::Arc;

use crate::config::config_spec::ConfigSpec;
use crate::config::errors::ConfigError;
use crate::config::{EnvironmentProvider, SystemEnvironment};

/// Infrastructure settings needed before anything else can start
pub struct BootstrapSettings {
    database_url: String,
    audit_database_url: String,
    server_host: String,
    server_port: u16,
}

impl BootstrapSettings {
    pub fn from_env_provider(env: Arc<dyn EnvironmentProvider>) -> Result<Self, ConfigError> {
        let database_url = ConfigSpec::new(env.clone(), "DATABASE_URL")
            .default_value("sqlite://rootsreach.db?mode=rwc")
            .min_length(1)
            .load()?
            .value;

        let audit_database_url = ConfigSpec::new(env.clone(), "AUDIT_DATABASE_URL")
            .default_value("sqlite://rootsreach_audit.db?mode=rwc")
            .min_length(1)
            .load()?
            .value;

        let server_host = ConfigSpec::new(env.clone(), "HOST")
            .default_value("0.0.0.0")
            .validator(ConfigSpec::validate_host_address)
            .load()?
            .value;

        let port_value = ConfigSpec::new(env, "PORT").default_value("3000").load()?.value;
        let server_port = ConfigSpec::parse_port(&port_value, "PORT")?;

        Ok(Self {
            database_url,
            audit_database_url,
            server_host,
            server_port,
        })
    }

    /// Convenience method that uses the system environment provider
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_provider(Arc::new(SystemEnvironment))
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn audit_database_url(&self) -> &str {
        &self.audit_database_url
    }

    pub fn server_host(&self) -> &str {
        &self.server_host
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn server_address(&self) -> String {
        if self.server_host.contains(':') {
            format!("[{}]:{}", self.server_host, self.server_port)
        } else {
            format!("{}:{}", self.server_host, self.server_port)
        }
    }
}

impl fmt::Debug for BootstrapSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapSettings")
            .field("database_url", &self.database_url)
            .field("audit_database_url", &self.audit_database_url)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MockEnvironment;

    fn load(vars: &[(&str, &str)]) -> Result<BootstrapSettings, ConfigError> {
        BootstrapSettings::from_env_provider(Arc::new(MockEnvironment::empty().with_vars(vars)))
    }

    #[test]
    fn test_bootstrap_settings_with_all_vars() {
        let settings = load(&[
            ("DATABASE_URL", "sqlite://test.db"),
            ("AUDIT_DATABASE_URL", "sqlite://test_audit.db"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
        ])
        .unwrap();

        assert_eq!(settings.database_url(), "sqlite://test.db");
        assert_eq!(settings.audit_database_url(), "sqlite://test_audit.db");
        assert_eq!(settings.server_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_bootstrap_settings_with_defaults() {
        let settings = load(&[]).unwrap();

        assert_eq!(settings.database_url(), "sqlite://rootsreach.db?mode=rwc");
        assert_eq!(settings.audit_database_url(), "sqlite://rootsreach_audit.db?mode=rwc");
        assert_eq!(settings.server_host(), "0.0.0.0");
        assert_eq!(settings.server_port(), 3000);
    }

    #[test]
    fn test_ipv6_host_is_bracketed_in_address() {
        let settings = load(&[("HOST", "::1"), ("PORT", "9000")]).unwrap();
        assert_eq!(settings.server_address(), "[::1]:9000");
    }

    #[test]
    fn test_empty_database_url_fails_validation() {
        match load(&[("DATABASE_URL", "")]) {
            Err(ConfigError::InvalidSetting { setting_name, .. }) => assert_eq!(setting_name, "DATABASE_URL"),
            other => panic!("Expected InvalidSetting for DATABASE_URL, got: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_port_fails() {
        assert!(matches!(load(&[("PORT", "not-a-port")]), Err(ConfigError::ParseError { .. })));
    }
}
