use tracing::warn;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Subsonic/fetcher URLs are http(s) and credentials are non-empty
/// - Server port is not 0
/// - Scan worker count is at least 1
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    for (name, url) in [
        ("subsonic.url", &config.subsonic.url),
        ("fetcher.url", &config.fetcher.url),
    ] {
        if url.is_empty() {
            return Err(ConfigError::ValidationError(format!("{name} is empty")));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "{name} must start with http:// or https:// (got {url})"
            )));
        }
        if url.ends_with('/') {
            warn!("{} ends with '/', it will be stripped", name);
        }
    }

    if config.subsonic.username.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "subsonic.username is empty".to_string(),
        ));
    }
    if config.subsonic.password.is_empty() {
        return Err(ConfigError::ValidationError(
            "subsonic.password is empty".to_string(),
        ));
    }

    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.scan.workers == 0 {
        return Err(ConfigError::ValidationError(
            "scan.workers must be at least 1".to_string(),
        ));
    }

    if config.resolver.download_delay_secs == 0 {
        warn!("resolver.download_delay_secs is 0, fetched tracks may be missed by the rescan");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    fn base_config() -> Config {
        load_config_from_str(
            r#"
[subsonic]
url = "http://localhost:4533"
username = "admin"
password = "secret"

[fetcher]
url = "http://localhost:8686"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&base_config()).is_ok());
    }

    #[test]
    fn test_validate_bad_url_scheme_fails() {
        let mut config = base_config();
        config.subsonic.url = "localhost:4533".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_empty_password_fails() {
        let mut config = base_config();
        config.subsonic.password = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = base_config();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_zero_workers_fails() {
        let mut config = base_config();
        config.scan.workers = 0;
        assert!(validate_config(&config).is_err());
    }
}
