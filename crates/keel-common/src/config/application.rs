use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{CommonError, CommonResult};

const DEFAULT_CONFIG: &str = include_str!("default.toml");

/// The prefix of environment variables that override the default configuration.
/// Nested keys are separated by `__`, e.g. `KEEL__PARTITION__CASE_SENSITIVE=true`.
pub const CONFIG_ENV_PREFIX: &str = "KEEL__";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub partition: PartitionConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn load() -> CommonResult<Self> {
        Self::figment()
            .extract()
            .map_err(|e| CommonError::invalid(e.to_string()))
    }

    fn figment() -> Figment {
        Figment::from(Toml::string(DEFAULT_CONFIG))
            .admerge(Env::prefixed(CONFIG_ENV_PREFIX).map(|p| p.as_str().replace("__", ".").into()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionConfig {
    pub case_sensitive: bool,
    pub first_field_id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub default_filter: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        figment::Jail::expect_with(|_| {
            let config = AppConfig::load().unwrap();
            assert!(!config.partition.case_sensitive);
            assert_eq!(config.partition.first_field_id, 1000);
            assert_eq!(config.logging.default_filter, "info");
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("KEEL__PARTITION__CASE_SENSITIVE", "true");
            jail.set_env("KEEL__PARTITION__FIRST_FIELD_ID", "2000");
            jail.set_env("KEEL__LOGGING__DEFAULT_FILTER", "debug");
            let config = AppConfig::load().unwrap();
            assert!(config.partition.case_sensitive);
            assert_eq!(config.partition.first_field_id, 2000);
            assert_eq!(config.logging.default_filter, "debug");
            Ok(())
        });
    }

    #[test]
    fn test_invalid_env_value() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("KEEL__PARTITION__FIRST_FIELD_ID", "not-a-number");
            assert!(matches!(
                AppConfig::load(),
                Err(CommonError::InvalidArgument(_))
            ));
            Ok(())
        });
    }
}
