//! Runtime configuration
//!
//! Defaults can be overridden from `MICROPAY_*` environment variables.
//! Endpoints are checked with the `url` crate before use.

use std::time::Duration;
use url::Url;

use crate::error::{CoreError, CoreResult};
use crate::types::Network;

pub const DEFAULT_FUNDS_API: &str = "http://localhost:8080/api";
pub const DEFAULT_PRICE_API: &str = "https://api.coingecko.com/api/v3";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub network: Network,
    /// Base URL of the funds query service
    pub funds_api_url: String,
    /// Base URL of the price feed
    pub price_api_url: String,
    pub request_timeout: Duration,
    /// Account used when a caller gives no derivation path
    pub default_account: u32,
    pub debug_logging: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            funds_api_url: DEFAULT_FUNDS_API.to_string(),
            price_api_url: DEFAULT_PRICE_API.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            default_account: 0,
            debug_logging: false,
        }
    }
}

impl CoreConfig {
    pub fn from_env() -> CoreResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, applying it over the defaults
    pub fn from_lookup<F>(lookup: F) -> CoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(network) = lookup("MICROPAY_NETWORK") {
            config.network = network.parse()?;
        }
        if let Some(url) = lookup("MICROPAY_FUNDS_API") {
            config.funds_api_url = url.trim().to_string();
        }
        if let Some(url) = lookup("MICROPAY_PRICE_API") {
            config.price_api_url = url.trim().to_string();
        }
        if let Some(secs) = lookup("MICROPAY_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                CoreError::config_error(format!("MICROPAY_TIMEOUT_SECS must be an integer, got '{}'", secs))
            })?;
            if secs == 0 {
                return Err(CoreError::config_error("MICROPAY_TIMEOUT_SECS must be positive"));
            }
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(account) = lookup("MICROPAY_ACCOUNT") {
            config.default_account = account.trim().parse().map_err(|_| {
                CoreError::config_error(format!("MICROPAY_ACCOUNT must be an integer, got '{}'", account))
            })?;
        }
        if let Some(debug) = lookup("MICROPAY_DEBUG") {
            config.debug_logging = parse_flag(&debug)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CoreResult<()> {
        validate_endpoint("funds API", &self.funds_api_url)?;
        validate_endpoint("price API", &self.price_api_url)?;
        if self.default_account >= crate::wallet::HARDENED {
            return Err(CoreError::config_error("default account is out of range"));
        }
        Ok(())
    }

    /// Switch the global logger to match this configuration
    pub fn apply_logging(&self) {
        if self.debug_logging {
            crate::utils::logging::enable_debug();
        } else {
            crate::utils::logging::disable_debug();
        }
    }

    pub fn http_client(&self) -> CoreResult<reqwest::blocking::Client> {
        reqwest::blocking::Client::builder()
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| CoreError::network_error(format!("Failed to create client: {}", e)))
    }
}

fn parse_flag(value: &str) -> CoreResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(CoreError::config_error(format!("MICROPAY_DEBUG: unrecognised flag '{}'", other))),
    }
}

/// HTTPS required except for loopback hosts; no embedded credentials
fn validate_endpoint(name: &str, raw: &str) -> CoreResult<()> {
    let url = Url::parse(raw)
        .map_err(|e| CoreError::config_error(format!("{} URL is invalid: {}", name, e)))?;

    if !url.username().is_empty() || url.password().is_some() {
        return Err(CoreError::config_error(format!("{} URL must not carry credentials", name)));
    }

    let host = url
        .host_str()
        .ok_or_else(|| CoreError::config_error(format!("{} URL has no host", name)))?;
    let local = matches!(host, "localhost" | "127.0.0.1" | "[::1]");

    match url.scheme() {
        "https" => Ok(()),
        "http" if local => Ok(()),
        "http" => Err(CoreError::config_error(format!("{} must use HTTPS", name))),
        other => Err(CoreError::config_error(format!("{} URL scheme '{}' is not supported", name, other))),
    }
}
