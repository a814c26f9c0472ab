use std::net::IpAddr;
use std::sync::Arc;

use crate::config::errors::ConfigError;
use crate::config::EnvironmentProvider;

/// Where a loaded setting came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValueSource {
    EnvironmentVariable { name: String },
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValue {
    pub value: String,
    pub source: ConfigValueSource,
}

/// Setting specification: environment override first, then default
pub struct ConfigSpec {
    env: Arc<dyn EnvironmentProvider>,
    name: String,
    default_value: Option<String>,
    min_length: Option<usize>,
    validator: Option<fn(&str) -> Result<(), String>>,
}

impl ConfigSpec {
    pub fn new(env: Arc<dyn EnvironmentProvider>, name: &str) -> Self {
        Self {
            env,
            name: name.to_string(),
            default_value: None,
            min_length: None,
            validator: None,
        }
    }

    pub fn default_value(mut self, value: &str) -> Self {
        self.default_value = Some(value.to_string());
        self
    }

    pub fn min_length(mut self, length: usize) -> Self {
        self.min_length = Some(length);
        self
    }

    pub fn validator(mut self, f: fn(&str) -> Result<(), String>) -> Self {
        self.validator = Some(f);
        self
    }

    /// Resolve the setting
    ///
    /// A value present in the environment is validated and wins even when
    /// invalid; it never silently falls back to the default.
    pub fn load(&self) -> Result<ConfigValue, ConfigError> {
        if let Some(value) = self.env.get_var(&self.name) {
            self.validate_value(&value)?;
            return Ok(ConfigValue {
                value,
                source: ConfigValueSource::EnvironmentVariable {
                    name: self.name.clone(),
                },
            });
        }

        match &self.default_value {
            Some(default) => {
                self.validate_value(default)?;
                Ok(ConfigValue {
                    value: default.clone(),
                    source: ConfigValueSource::Default,
                })
            }
            None => Err(ConfigError::MissingSetting {
                setting_name: self.name.clone(),
            }),
        }
    }

    fn validate_value(&self, value: &str) -> Result<(), ConfigError> {
        if let Some(min_len) = self.min_length {
            if value.len() < min_len {
                return Err(ConfigError::invalid(
                    &self.name,
                    format!("must be at least {} characters long", min_len),
                ));
            }
        }

        if let Some(validator) = self.validator {
            validator(value).map_err(|reason| ConfigError::invalid(&self.name, reason))?;
        }

        Ok(())
    }

    /// Parse a port number in 1..=65535
    pub fn parse_port(value: &str, setting_name: &str) -> Result<u16, ConfigError> {
        let port = value.trim().parse::<u16>().map_err(|e| {
            ConfigError::parse(
                setting_name,
                format!("Expected port number (1-65535), got '{}': {}", value, e),
            )
        })?;

        if port == 0 {
            return Err(ConfigError::invalid(setting_name, "Port number must be between 1 and 65535"));
        }

        Ok(port)
    }

    /// Accept IP literals and plain hostnames; no DNS resolution
    pub fn validate_host_address(value: &str) -> Result<(), String> {
        if value.is_empty() {
            return Err("Host address cannot be empty".to_string());
        }

        if value.parse::<IpAddr>().is_ok() {
            return Ok(());
        }

        if value.contains(':') {
            return Err(format!("Invalid IP address: {}", value));
        }

        if value.chars().any(char::is_whitespace) {
            return Err("Host address cannot contain whitespace characters".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MockEnvironment;

    fn env(vars: &[(&str, &str)]) -> Arc<dyn EnvironmentProvider> {
        Arc::new(MockEnvironment::empty().with_vars(vars))
    }

    #[test]
    fn test_environment_overrides_default() {
        let spec = ConfigSpec::new(env(&[("PORT", "8080")]), "PORT").default_value("3000");

        let loaded = spec.load().unwrap();

        assert_eq!(loaded.value, "8080");
        assert_eq!(
            loaded.source,
            ConfigValueSource::EnvironmentVariable { name: "PORT".to_string() }
        );
    }

    #[test]
    fn test_default_used_when_unset() {
        let spec = ConfigSpec::new(env(&[]), "PORT").default_value("3000");

        let loaded = spec.load().unwrap();

        assert_eq!(loaded.value, "3000");
        assert_eq!(loaded.source, ConfigValueSource::Default);
    }

    #[test]
    fn test_missing_without_default() {
        let result = ConfigSpec::new(env(&[]), "DATABASE_URL").load();

        assert_eq!(
            result,
            Err(ConfigError::MissingSetting { setting_name: "DATABASE_URL".to_string() })
        );
    }

    #[test]
    fn test_invalid_environment_value_does_not_fall_back() {
        let spec = ConfigSpec::new(env(&[("DATABASE_URL", "")]), "DATABASE_URL")
            .default_value("sqlite://rootsreach.db?mode=rwc")
            .min_length(1);

        match spec.load() {
            Err(ConfigError::InvalidSetting { setting_name, reason }) => {
                assert_eq!(setting_name, "DATABASE_URL");
                assert!(reason.contains("at least 1 characters"));
            }
            other => panic!("Expected InvalidSetting, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(ConfigSpec::parse_port("8080", "PORT").unwrap(), 8080);
        assert!(matches!(ConfigSpec::parse_port("0", "PORT"), Err(ConfigError::InvalidSetting { .. })));
        assert!(matches!(ConfigSpec::parse_port("http", "PORT"), Err(ConfigError::ParseError { .. })));
        assert!(matches!(ConfigSpec::parse_port("70000", "PORT"), Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_validate_host_address() {
        assert!(ConfigSpec::validate_host_address("0.0.0.0").is_ok());
        assert!(ConfigSpec::validate_host_address("::1").is_ok());
        assert!(ConfigSpec::validate_host_address("api.rootsreach.local").is_ok());
        assert!(ConfigSpec::validate_host_address("").is_err());
        assert!(ConfigSpec::validate_host_address("bad host").is_err());
        assert!(ConfigSpec::validate_host_address("1:2:zz").is_err());
    }
}
