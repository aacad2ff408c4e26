use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Sync page size is positive and fits under the offset ceiling
/// - Catalog endpoint is set
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Sync validation
    if config.sync.page_size == 0 {
        return Err(ConfigError::ValidationError(
            "sync.page_size must be positive".to_string(),
        ));
    }
    if config.sync.max_offset < config.sync.page_size {
        return Err(ConfigError::ValidationError(format!(
            "sync.max_offset ({}) is smaller than sync.page_size ({})",
            config.sync.max_offset, config.sync.page_size
        )));
    }

    // Catalog source validation
    if config.catalog_source.endpoint.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "catalog_source.endpoint cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use std::net::IpAddr;

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                host: "0.0.0.0".parse::<IpAddr>().unwrap(),
                port: 0,
            },
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_page_size_zero_fails() {
        let mut config = Config::default();
        config.sync.page_size = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_ceiling_below_page_size_fails() {
        let mut config = Config::default();
        config.sync.page_size = 100;
        config.sync.max_offset = 50;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("max_offset"));
    }

    #[test]
    fn test_validate_empty_endpoint_fails() {
        let mut config = Config::default();
        config.catalog_source.endpoint = String::new();
        assert!(validate_config(&config).is_err());
    }
}
