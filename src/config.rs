//! Env-driven configuration for the service and library.
//!
//! Values are read from the process environment; `dotenv` is loaded on demand
//! by the binary. Defaults are provided for convenience during development.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::ConfirmPolicy;
use crate::error::{AppError, AppResult};
use crate::gemini::client::{DEFAULT_ANALYSIS_MODEL, DEFAULT_BASE_URL, DEFAULT_IMAGE_MODEL};

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub analysis_model: String,
    pub image_model: String,
    pub output_dir: PathBuf,
    pub api_host: String,
    pub api_port: String,
    pub auth_confirm_attempts: u32,
    pub auth_confirm_interval_ms: u64,
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn dotenv_load() {
        dotenv::dotenv().ok();
    }

    pub fn new() -> AppResult<Self> {
        Ok(Config {
            gemini_api_key: env::var("GEMINI_API_KEY")
                .or_else(|_| env::var("API_KEY"))
                .ok()
                .filter(|k| !k.trim().is_empty()),
            gemini_base_url: env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            analysis_model: env::var("ANALYSIS_MODEL").unwrap_or_else(|_| DEFAULT_ANALYSIS_MODEL.to_string()),
            image_model: env::var("IMAGE_MODEL").unwrap_or_else(|_| DEFAULT_IMAGE_MODEL.to_string()),
            output_dir: PathBuf::from(env::var("OUTPUT_DIR").unwrap_or_else(|_| "./downloads".to_string())),
            api_host: env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            api_port: env::var("API_PORT").unwrap_or_else(|_| "8190".to_string()),
            auth_confirm_attempts: parse_var("AUTH_CONFIRM_ATTEMPTS", 3)?,
            auth_confirm_interval_ms: parse_var("AUTH_CONFIRM_INTERVAL_MS", 250)?,
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", 120)?,
        })
    }

    pub fn confirm_policy(&self) -> ConfirmPolicy {
        ConfirmPolicy {
            attempts: self.auth_confirm_attempts,
            interval: Duration::from_millis(self.auth_confirm_interval_ms),
        }
    }

    pub fn print_env_vars(&self) {
        let key = if self.gemini_api_key.is_some() { "<set>" } else { "<unset>" };
        tracing::info!("GEMINI_API_KEY: {}", key);
        tracing::info!("GEMINI_BASE_URL: {}", self.gemini_base_url);
        tracing::info!("ANALYSIS_MODEL: {}", self.analysis_model);
        tracing::info!("IMAGE_MODEL: {}", self.image_model);
        tracing::info!("OUTPUT_DIR: {}", self.output_dir.display());
        tracing::info!("API_HOST: {}", self.api_host);
        tracing::info!("API_PORT: {}", self.api_port);
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> AppResult<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("Invalid value for {}: '{}'", name, raw))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_var_defaults_when_unset() {
        assert_eq!(parse_var("VIBESHIFT_TEST_UNSET_VAR", 7u32).unwrap(), 7);
    }

    #[test]
    fn parse_var_rejects_garbage() {
        env::set_var("VIBESHIFT_TEST_BAD_VAR", "many");
        let err = parse_var::<u32>("VIBESHIFT_TEST_BAD_VAR", 3).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        env::remove_var("VIBESHIFT_TEST_BAD_VAR");
    }

    #[test]
    fn confirm_policy_uses_configured_values() {
        let mut config = Config::new().unwrap();
        config.auth_confirm_attempts = 5;
        config.auth_confirm_interval_ms = 10;
        let policy = config.confirm_policy();
        assert_eq!(policy.attempts, 5);
        assert_eq!(policy.interval, Duration::from_millis(10));
    }
}
