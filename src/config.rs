//! # Feature: Configuration System
//!
//! Bot configuration from environment variables or a YAML file with
//! environment variable interpolation.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: YAML configuration file with `${VAR}` interpolation
//! - 1.0.0: Initial environment variable configuration

use anyhow::{Context, Result};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Bot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Discord bot token (required)
    pub discord_token: String,

    /// ID of the Google spreadsheet expenses are written to (required)
    pub google_sheet_id: String,

    /// Path to the Google service-account key file
    #[serde(default = "default_credentials_path")]
    pub google_credentials_path: String,

    /// Tab inside the spreadsheet holding the expense rows
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,

    /// Prefix that marks a guild message as an expense
    #[serde(default = "default_expense_prefix")]
    pub expense_prefix: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dev mode guild ID (for faster command registration)
    #[serde(default)]
    pub discord_guild_id: Option<String>,
}

// Default value functions for serde
fn default_credentials_path() -> String {
    "credentials.json".to_string()
}

fn default_sheet_name() -> String {
    "Sheet1".to_string()
}

fn default_expense_prefix() -> String {
    "!expense".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let config = Config {
            discord_token: env::var("DISCORD_TOKEN")
                .map_err(|_| anyhow::anyhow!("DISCORD_TOKEN environment variable not set"))?,
            google_sheet_id: env::var("GOOGLE_SHEET_ID")
                .map_err(|_| anyhow::anyhow!("GOOGLE_SHEET_ID environment variable not set"))?,
            google_credentials_path: env::var("GOOGLE_CREDENTIALS_PATH")
                .unwrap_or_else(|_| default_credentials_path()),
            sheet_name: env::var("SHEET_NAME").unwrap_or_else(|_| default_sheet_name()),
            expense_prefix: env::var("EXPENSE_PREFIX")
                .unwrap_or_else(|_| default_expense_prefix()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| default_log_level()),
            discord_guild_id: env::var("DISCORD_GUILD_ID").ok().filter(|id| !id.is_empty()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable interpolation
    ///
    /// Supports `${VAR_NAME}` syntax for environment variable substitution.
    /// Example: `discord_token: "${DISCORD_TOKEN}"`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?;

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate YAML configuration text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let interpolated = interpolate_env_vars(content)?;
        let config: Config = serde_yaml::from_str(&interpolated)?;
        config.validate()?;
        Ok(config)
    }

    /// Auto-detect and load configuration
    ///
    /// Priority order:
    /// 1. If CONFIG_FILE env var is set, load from that file
    /// 2. If config.yaml exists in current directory, load from it
    /// 3. Fall back to environment variables
    pub fn auto_load() -> Result<Self> {
        if let Ok(config_path) = env::var("CONFIG_FILE") {
            info!("Loading config from CONFIG_FILE: {}", config_path);
            return Self::from_file(&config_path);
        }

        let default_config_path = "config.yaml";
        if Path::new(default_config_path).exists() {
            info!("Loading config from {}", default_config_path);
            return Self::from_file(default_config_path);
        }

        info!("No config file found, using environment variables");
        Self::from_env()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.discord_token.is_empty() {
            anyhow::bail!("discord_token is required");
        }
        if self.google_sheet_id.is_empty() {
            anyhow::bail!("google_sheet_id is required");
        }
        if self.sheet_name.is_empty() {
            anyhow::bail!("sheet_name must not be empty");
        }
        if self.expense_prefix.is_empty() {
            anyhow::bail!("expense_prefix must not be empty");
        }
        if self.expense_prefix.chars().any(char::is_whitespace) {
            anyhow::bail!(
                "Invalid expense_prefix '{}'. The prefix must not contain whitespace",
                self.expense_prefix
            );
        }
        if let Some(ref guild_id) = self.discord_guild_id {
            if guild_id.parse::<u64>().is_err() {
                anyhow::bail!("Invalid discord_guild_id '{}'. Use a numeric guild ID", guild_id);
            }
        }
        Ok(())
    }

    /// Dev guild to register commands on, if configured
    pub fn guild_id(&self) -> Option<u64> {
        self.discord_guild_id
            .as_ref()
            .and_then(|id| id.parse::<u64>().ok())
    }
}

// ============================================================================
// Environment Variable Interpolation
// ============================================================================

// Pattern: ${VAR_NAME} or ${VAR_NAME:-default}
static ENV_VAR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").expect("Invalid regex")
});

/// Interpolate environment variables in a string
///
/// Supports `${VAR_NAME}` syntax. If a variable is not set, returns an error.
/// Use `${VAR_NAME:-default}` for default values.
fn interpolate_env_vars(content: &str) -> Result<String> {
    let mut errors = Vec::new();

    let result = ENV_VAR_PATTERN.replace_all(content, |cap: &regex::Captures| {
        let var_name = &cap[1];
        match env::var(var_name) {
            Ok(value) => value,
            Err(_) => match cap.get(2) {
                Some(default) => default.as_str().to_string(),
                None => {
                    errors.push(format!("Environment variable '{}' is not set", var_name));
                    String::new()
                }
            },
        }
    });

    if !errors.is_empty() {
        anyhow::bail!("Missing environment variables:\n  - {}", errors.join("\n  - "));
    }

    Ok(result.into_owned())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn sample_config() -> Config {
        Config {
            discord_token: "token".to_string(),
            google_sheet_id: "sheet".to_string(),
            google_credentials_path: default_credentials_path(),
            sheet_name: default_sheet_name(),
            expense_prefix: default_expense_prefix(),
            log_level: default_log_level(),
            discord_guild_id: None,
        }
    }

    #[test]
    fn test_config_from_env_missing_required() {
        env::remove_var("DISCORD_TOKEN");
        env::remove_var("GOOGLE_SHEET_ID");

        let result = Config::from_env();
        assert!(result.is_err());
    }

    #[test]
    fn test_interpolate_env_vars_simple() {
        env::set_var("EXPENSE_TEST_VAR_1", "value1");
        let input = "key: ${EXPENSE_TEST_VAR_1}";
        let result = interpolate_env_vars(input).unwrap();
        assert_eq!(result, "key: value1");
        env::remove_var("EXPENSE_TEST_VAR_1");
    }

    #[test]
    fn test_interpolate_env_vars_with_default() {
        env::remove_var("EXPENSE_NONEXISTENT_VAR");
        let input = "key: ${EXPENSE_NONEXISTENT_VAR:-default_value}";
        let result = interpolate_env_vars(input).unwrap();
        assert_eq!(result, "key: default_value");
    }

    #[test]
    fn test_interpolate_env_vars_missing_no_default() {
        env::remove_var("EXPENSE_MISSING_VAR_FOR_TEST");
        let input = "key: ${EXPENSE_MISSING_VAR_FOR_TEST}";
        let result = interpolate_env_vars(input);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("EXPENSE_MISSING_VAR_FOR_TEST"));
    }

    #[test]
    fn test_config_from_yaml() {
        env::set_var("EXPENSE_TEST_DISCORD_TOKEN", "test_token_123");

        let yaml = r#"
discord_token: "${EXPENSE_TEST_DISCORD_TOKEN}"
google_sheet_id: "1AbCdEf"
sheet_name: "Expenses"
discord_guild_id: "123456789"
"#;

        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.discord_token, "test_token_123");
        assert_eq!(config.google_sheet_id, "1AbCdEf");
        assert_eq!(config.sheet_name, "Expenses");
        assert_eq!(config.guild_id(), Some(123456789));
        // Defaults
        assert_eq!(config.google_credentials_path, "credentials.json");
        assert_eq!(config.expense_prefix, "!expense");
        assert_eq!(config.log_level, "info");

        env::remove_var("EXPENSE_TEST_DISCORD_TOKEN");
    }

    #[test]
    fn test_validation_rejects_empty_sheet_id() {
        let config = Config {
            google_sheet_id: String::new(),
            ..sample_config()
        };

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("google_sheet_id"));
    }

    #[test]
    fn test_validation_rejects_prefix_with_whitespace() {
        let config = Config {
            expense_prefix: "! expense".to_string(),
            ..sample_config()
        };

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid expense_prefix"));
    }

    #[test]
    fn test_validation_rejects_non_numeric_guild() {
        let config = Config {
            discord_guild_id: Some("my-guild".to_string()),
            ..sample_config()
        };

        assert!(config.validate().is_err());
        assert!(sample_config().validate().is_ok());
    }
}
