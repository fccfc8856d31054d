//! Configuration commands.

use std::path::Path;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Dump the current configuration to stdout.
pub fn dump(config: &ClientConfig, path: &Path) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", path.display());
    println!("{}", toml_str);
    Ok(())
}

/// Validate the configuration, including credential references.
pub fn validate(config: &ClientConfig) -> ClientResult<()> {
    for warning in check(config)? {
        println!("warning: {}", warning);
    }
    println!("Configuration is valid.");
    Ok(())
}

/// Returns warnings for a usable but incomplete configuration.
fn check(config: &ClientConfig) -> ClientResult<Vec<String>> {
    config.to_remote_config().map_err(ClientError::Config)?;
    let credentials = config.resolve_credentials().map_err(ClientError::Config)?;

    if config.expiry.days < 0 {
        return Err(ClientError::Config("[expiry] days must not be negative".to_string()));
    }

    let mut warnings = Vec::new();
    if !credentials.has_api_credentials() {
        warnings.push("api_key/auth_token missing: versioned API calls will fail".to_string());
    }
    if !credentials.has_login_credentials() {
        warnings.push("username/password missing: tagging and scheduling will fail".to_string());
    }
    if config.service.organization_id.is_none() {
        warnings.push("organization_id missing: organizer search is unavailable".to_string());
    }
    Ok(warnings)
}

/// Show the configuration file path.
pub fn path(path: &Path) -> ClientResult<()> {
    println!("config: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate_with_warnings() {
        let warnings = check(&ClientConfig::default()).unwrap();
        assert_eq!(warnings.len(), 3);
    }

    #[test]
    fn complete_config_has_no_warnings() {
        let config: ClientConfig = toml::from_str(
            r#"
[service]
organization_id = "47"

[credentials]
api_key = "key"
auth_token = "token"
username = "rider@example.com"
password = "hunter2"
"#,
        )
        .unwrap();
        assert!(check(&config).unwrap().is_empty());
    }

    #[test]
    fn negative_expiry_is_invalid() {
        let mut config = ClientConfig::default();
        config.expiry.days = -1;
        assert!(matches!(check(&config), Err(ClientError::Config(_))));
    }

    #[test]
    fn dump_serializes_defaults() {
        assert!(dump(&ClientConfig::default(), Path::new("config.toml")).is_ok());
    }
}
