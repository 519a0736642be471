//! Service configuration
//!
//! Read once per process from the environment (after loading `.env`).
//! A missing provider credential is not a startup failure: it is carried as
//! `None` and rejected per request.

use crate::error::ReportError;
use crate::prompt::DEFAULT_ANNUAL_SAVINGS_TARGET;
use crate::provider::ModelConfig;
use crate::Result;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;

pub const CREDENTIAL_VAR: &str = "CLIENT_KEY";
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    pub provider: ProviderConfig,
    pub model_config: ModelConfig,
    pub annual_savings_target: Decimal,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            provider: ProviderConfig::default(),
            model_config: ModelConfig::default(),
            annual_savings_target: DEFAULT_ANNUAL_SAVINGS_TARGET,
        }
    }
}

impl ServiceConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let defaults = ServiceConfig::default();

        let port = match get("PORT").or_else(|| get("API_PORT")) {
            Some(raw) => parse_value("PORT", &raw)?,
            None => defaults.port,
        };

        let timeout_secs = match get("REPORT_TIMEOUT_SECS") {
            Some(raw) => parse_value::<u64>("REPORT_TIMEOUT_SECS", &raw)?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            port,
            provider: ProviderConfig {
                api_key: get(CREDENTIAL_VAR),
                api_url: get("REPORT_API_URL").unwrap_or(defaults.provider.api_url),
                model: get("REPORT_MODEL").unwrap_or(defaults.provider.model),
                timeout: Duration::from_secs(timeout_secs),
            },
            model_config: ModelConfig {
                temperature: get_or("REPORT_TEMPERATURE", &get, defaults.model_config.temperature)?,
                max_output_tokens: get_or(
                    "REPORT_MAX_TOKENS",
                    &get,
                    defaults.model_config.max_output_tokens,
                )?,
            },
            annual_savings_target: get_or(
                "ANNUAL_SAVINGS_TARGET",
                &get,
                defaults.annual_savings_target,
            )?,
        })
    }
}

fn get_or<T, G>(name: &str, get: &G, default: T) -> Result<T>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(raw) => parse_value(name, &raw),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| ReportError::Configuration(format!("invalid value for {}: {:?}", name, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.provider.api_key, None);
        assert_eq!(config.provider.api_url, DEFAULT_API_URL);
        assert_eq!(config.provider.model, "gpt-4o-mini");
        assert_eq!(config.provider.timeout, Duration::from_secs(30));
        assert_eq!(config.model_config.max_output_tokens, 700);
        assert_eq!(config.annual_savings_target, Decimal::from(15_600));
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("CLIENT_KEY", "sk-test"),
            ("API_PORT", "3000"),
            ("REPORT_MODEL", "gpt-4.1-mini"),
            ("REPORT_TEMPERATURE", "0.2"),
            ("REPORT_MAX_TOKENS", "1200"),
            ("REPORT_TIMEOUT_SECS", "10"),
            ("ANNUAL_SAVINGS_TARGET", "20000"),
        ]))
        .unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.provider.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.provider.model, "gpt-4.1-mini");
        assert_eq!(config.model_config.temperature, 0.2);
        assert_eq!(config.model_config.max_output_tokens, 1200);
        assert_eq!(config.provider.timeout, Duration::from_secs(10));
        assert_eq!(config.annual_savings_target, Decimal::from(20_000));
    }

    #[test]
    fn test_port_prefers_port_over_api_port() {
        let config =
            ServiceConfig::from_lookup(lookup(&[("PORT", "9000"), ("API_PORT", "3000")])).unwrap();
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_blank_credential_is_unset() {
        let config = ServiceConfig::from_lookup(lookup(&[("CLIENT_KEY", "  ")])).unwrap();
        assert_eq!(config.provider.api_key, None);
    }

    #[test]
    fn test_fractional_savings_target_is_exact() {
        let config =
            ServiceConfig::from_lookup(lookup(&[("ANNUAL_SAVINGS_TARGET", "15600.10")])).unwrap();
        assert_eq!(config.annual_savings_target, Decimal::new(1_560_010, 2));
    }

    #[test]
    fn test_malformed_number_is_configuration_error() {
        let err = ServiceConfig::from_lookup(lookup(&[("REPORT_MAX_TOKENS", "many")])).unwrap_err();
        assert!(matches!(err, ReportError::Configuration(_)));
    }
}
