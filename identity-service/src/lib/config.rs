use std::env;

use auth::jwt::SEED_LENGTH;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::identity::models::IdentityConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub idp: IdpConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Settings for the local identity provider.
#[derive(Debug, Deserialize, Clone)]
pub struct IdpConfig {
    pub seed: String,
    pub issuer: String,
    pub audience: String,
    pub access_time_in_minutes: i64,
    pub refresh_time_in_hours: i64,
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, IDP__SEED, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;

        Ok(config)
    }
}

impl IdpConfig {
    /// Convert the raw settings into the provider's immutable configuration.
    ///
    /// # Errors
    /// * `ConfigError::Message` - Seed is not exactly 32 bytes
    pub fn to_identity_config(&self) -> Result<IdentityConfig, ConfigError> {
        let seed: [u8; SEED_LENGTH] = self.seed.as_bytes().try_into().map_err(|_| {
            ConfigError::Message(format!(
                "idp.seed must be exactly {} bytes, got {}",
                SEED_LENGTH,
                self.seed.len()
            ))
        })?;

        Ok(IdentityConfig::new(
            seed,
            self.issuer.clone(),
            self.audience.clone(),
            self.access_time_in_minutes,
            self.refresh_time_in_hours,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idp_config(seed: &str) -> IdpConfig {
        IdpConfig {
            seed: seed.to_string(),
            issuer: "issuer".to_string(),
            audience: "audience".to_string(),
            access_time_in_minutes: 15,
            refresh_time_in_hours: 24,
        }
    }

    #[test]
    fn test_to_identity_config() {
        let config = idp_config("SzceVsT4GdFOlrZn60XMgrFcvMNUMuuJ")
            .to_identity_config()
            .expect("Conversion failed");

        assert_eq!(config.issuer, "issuer");
        assert_eq!(config.audience, "audience");
        assert_eq!(config.access_token_ttl, chrono::Duration::minutes(15));
        assert_eq!(config.refresh_token_ttl, chrono::Duration::hours(24));
    }

    #[test]
    fn test_seed_length_is_enforced() {
        let result = idp_config("too-short").to_identity_config();
        assert!(result.is_err());
    }
}
