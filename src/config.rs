//! Runtime configuration for the tracker
//!
//! Defaults come from `constants`. `TrackerConfig::from_env` lets a deployment
//! point the SDK at other hosts, another category or another token without a
//! rebuild.

use crate::{
    constants::{
        BELIEVE_CATEGORY, BSCREENER_NAME, BSCREENER_SYMBOL, BSCREENER_TOKEN_ADDRESS,
        COINGECKO_API_URL, DEXSCREENER_API_URL, JUPITER_API_URL, REQUEST_TIMEOUT_SECS,
        SOLSCAN_API_URL, USER_AGENT, VS_CURRENCY,
    },
    error::ConfigError,
};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::time::Duration;

/// The token the multi-source aggregator tracks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenIdentity {
    pub address: Pubkey,
    pub name: String,
    pub symbol: String,
}

impl TokenIdentity {
    /// Builds an identity, validating the mint address
    pub fn new(
        address: &str,
        name: impl Into<String>,
        symbol: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let address =
            Pubkey::from_str(address).map_err(|e| ConfigError::InvalidTokenAddress {
                address: address.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            address,
            name: name.into(),
            symbol: symbol.into(),
        })
    }

    /// The BSCREENER token
    pub fn bscreener() -> Self {
        Self {
            address: Pubkey::from_str_const(BSCREENER_TOKEN_ADDRESS),
            name: BSCREENER_NAME.to_string(),
            symbol: BSCREENER_SYMBOL.to_string(),
        }
    }

    /// Base58 mint address
    pub fn address_string(&self) -> String {
        self.address.to_string()
    }
}

/// Upstream endpoints and HTTP client settings
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub coingecko_url: String,
    pub jupiter_url: String,
    pub solscan_url: String,
    pub dexscreener_url: String,
    /// CoinGecko category the listing is scoped to
    pub category: String,
    pub vs_currency: String,
    pub token: TokenIdentity,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            coingecko_url: COINGECKO_API_URL.to_string(),
            jupiter_url: JUPITER_API_URL.to_string(),
            solscan_url: SOLSCAN_API_URL.to_string(),
            dexscreener_url: DEXSCREENER_API_URL.to_string(),
            category: BELIEVE_CATEGORY.to_string(),
            vs_currency: VS_CURRENCY.to_string(),
            token: TokenIdentity::bscreener(),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl TrackerConfig {
    /// Defaults with `BELIEVE_*` environment overrides applied
    ///
    /// Recognized variables: `BELIEVE_COINGECKO_URL`, `BELIEVE_JUPITER_URL`,
    /// `BELIEVE_SOLSCAN_URL`, `BELIEVE_DEXSCREENER_URL`, `BELIEVE_CATEGORY`,
    /// `BELIEVE_TOKEN_ADDRESS`, `BELIEVE_TOKEN_NAME`, `BELIEVE_TOKEN_SYMBOL`
    /// and `BELIEVE_REQUEST_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("BELIEVE_COINGECKO_URL") {
            config.coingecko_url = url;
        }
        if let Some(url) = lookup("BELIEVE_JUPITER_URL") {
            config.jupiter_url = url;
        }
        if let Some(url) = lookup("BELIEVE_SOLSCAN_URL") {
            config.solscan_url = url;
        }
        if let Some(url) = lookup("BELIEVE_DEXSCREENER_URL") {
            config.dexscreener_url = url;
        }
        if let Some(category) = lookup("BELIEVE_CATEGORY") {
            config.category = category;
        }

        if let Some(address) = lookup("BELIEVE_TOKEN_ADDRESS") {
            let name = lookup("BELIEVE_TOKEN_NAME").unwrap_or_else(|| config.token.name.clone());
            let symbol =
                lookup("BELIEVE_TOKEN_SYMBOL").unwrap_or_else(|| config.token.symbol.clone());
            config.token = TokenIdentity::new(&address, name, symbol)?;
        }

        if let Some(raw) = lookup("BELIEVE_REQUEST_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidValue {
                    var: "BELIEVE_REQUEST_TIMEOUT_SECS",
                    value: raw.clone(),
                })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}
