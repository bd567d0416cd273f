//! Configuration validation.

use std::collections::HashSet;

use super::error::{ConfigError, ConfigResult};
use super::schema::{DispatchConfig, LogOutput, LoggingConfig, PluginsConfig, ZebrasConfig};

/// Validates the merged configuration.
pub fn validate_config(config: &ZebrasConfig) -> ConfigResult<()> {
    validate_logging(&config.logging)?;
    validate_dispatch(&config.dispatch)?;
    validate_plugins(&config.plugins)?;
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.file_path is required when logging.output = \"file\"",
        ));
    }
    if logging.filters.keys().any(|target| target.trim().is_empty()) {
        return Err(ConfigError::validation("logging.filters keys must not be blank"));
    }
    Ok(())
}

fn validate_dispatch(dispatch: &DispatchConfig) -> ConfigResult<()> {
    if dispatch.timeout_ms == Some(0) {
        return Err(ConfigError::validation(
            "dispatch.timeout_ms must be greater than 0",
        ));
    }
    Ok(())
}

fn validate_plugins(plugins: &PluginsConfig) -> ConfigResult<()> {
    let mut seen = HashSet::new();
    for name in &plugins.disabled {
        if name.trim().is_empty() {
            return Err(ConfigError::validation(
                "plugins.disabled must not contain blank names",
            ));
        }
        if !seen.insert(name) {
            return Err(ConfigError::validation(format!(
                "plugin '{name}' is listed twice in plugins.disabled"
            )));
        }
    }

    for (name, section) in &plugins.settings {
        if !(section.is_object() || section.is_null()) {
            return Err(ConfigError::validation(format!(
                "plugins.settings.{name} must be a table"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ZebrasConfig::default()).is_ok());
    }

    #[test]
    fn test_file_output_needs_path() {
        let mut config = ZebrasConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some(PathBuf::from("logs/zebras.log"));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = ZebrasConfig::default();
        config.dispatch.timeout_ms = Some(0);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_disabled_names() {
        let mut config = ZebrasConfig::default();
        config.plugins.disabled = vec!["debug".into(), "debug".into()];
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("listed twice"));

        config.plugins.disabled = vec![" ".into()];
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_settings_must_be_tables() {
        let mut config = ZebrasConfig::default();
        config
            .plugins
            .settings
            .insert("autoresponder".into(), json!({ "list_limit": 10 }));
        assert!(validate_config(&config).is_ok());

        config.plugins.settings.insert("invite".into(), json!(3));
        assert!(validate_config(&config).is_err());
    }
}
