//! CoinGecko provider: category listing, coin detail and spot token price

use crate::{
    config::TrackerConfig,
    error::FetchError,
    format::{format_large_number, format_price, or_na},
    provider::{MarketListingProvider, TokenSource},
    providers::http::get_json,
    types::{CoinDetail, PriceQuote, RawToken},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;

const UPSTREAM: &str = "CoinGecko";

/// Entry of the `/simple/token_price/solana` response, keyed by lowercase address
#[derive(Debug, Deserialize)]
struct SimpleTokenPrice {
    usd: f64,
    #[serde(default)]
    usd_market_cap: Option<f64>,
    #[serde(default)]
    usd_24h_vol: Option<f64>,
    #[serde(default)]
    usd_24h_change: Option<f64>,
    #[serde(default)]
    last_updated_at: Option<i64>,
}

type SimpleTokenPriceResponse = HashMap<String, SimpleTokenPrice>;

/// CoinGecko provider
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
    category: String,
    vs_currency: String,
}

impl CoinGeckoProvider {
    /// Creates a new CoinGecko provider on a shared client
    pub fn new(client: Client, config: &TrackerConfig) -> Self {
        Self {
            client,
            base_url: config.coingecko_url.trim_end_matches('/').to_string(),
            category: config.category.clone(),
            vs_currency: config.vs_currency.clone(),
        }
    }

    /// Builds the category-scoped markets URL
    fn markets_url(&self, page: u32, per_page: u32) -> String {
        format!(
            "{}/coins/markets?vs_currency={}&category={}&order=market_cap_desc&per_page={}&page={}&sparkline=false&price_change_percentage=1h%2C24h%2C7d",
            self.base_url, self.vs_currency, self.category, per_page, page
        )
    }

    fn coin_url(&self, id: &str) -> String {
        format!(
            "{}/coins/{}?localization=false&tickers=false&market_data=true&community_data=false&developer_data=false&sparkline=true",
            self.base_url, id
        )
    }

    fn token_price_url(&self, token: &Pubkey) -> String {
        format!(
            "{}/simple/token_price/solana?contract_addresses={}&vs_currencies=usd&include_market_cap=true&include_24hr_vol=true&include_24hr_change=true&include_last_updated_at=true",
            self.base_url, token
        )
    }
}

/// Picks the tracked token out of a simple token price response
fn parse_token_price(
    mut response: SimpleTokenPriceResponse,
    token: &Pubkey,
) -> Result<PriceQuote, FetchError> {
    // CoinGecko keys the response by the lowercased address
    let key = token.to_string().to_lowercase();
    let data = response
        .remove(&key)
        .ok_or_else(|| FetchError::missing("Token not found in CoinGecko"))?;

    Ok(PriceQuote {
        source: "coingecko".to_string(),
        price: data.usd,
        market_cap: data.usd_market_cap,
        volume_24h: data.usd_24h_vol,
        price_change_24h: data.usd_24h_change,
        last_updated: data
            .last_updated_at
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
        formatted_price: format_price(data.usd),
        formatted_market_cap: or_na(data.usd_market_cap, |v| format_large_number(v, 0)),
        formatted_volume: or_na(data.usd_24h_vol, |v| format_large_number(v, 0)),
    })
}

#[async_trait]
impl MarketListingProvider for CoinGeckoProvider {
    async fn fetch_markets(&self, page: u32, per_page: u32) -> Result<Vec<RawToken>, FetchError> {
        let tokens: Vec<RawToken> =
            get_json(&self.client, UPSTREAM, &self.markets_url(page, per_page)).await?;

        tracing::debug!(
            count = tokens.len(),
            page,
            per_page,
            "Fetched market listing from CoinGecko"
        );

        Ok(tokens)
    }

    async fn fetch_coin(&self, id: &str) -> Result<CoinDetail, FetchError> {
        get_json(&self.client, UPSTREAM, &self.coin_url(id)).await
    }

    fn provider_name(&self) -> &'static str {
        "coingecko"
    }
}

#[async_trait]
impl TokenSource<PriceQuote> for CoinGeckoProvider {
    async fn fetch(&self, token: &Pubkey) -> Result<PriceQuote, FetchError> {
        let response: SimpleTokenPriceResponse =
            get_json(&self.client, UPSTREAM, &self.token_price_url(token)).await?;
        parse_token_price(response, token)
    }

    fn provider_name(&self) -> &'static str {
        "coingecko"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenIdentity;
    use crate::providers::http::tests::serve_once;
    use serde_json::json;

    fn provider() -> CoinGeckoProvider {
        let config = TrackerConfig {
            coingecko_url: "http://localhost:9000/".to_string(),
            ..TrackerConfig::default()
        };
        CoinGeckoProvider::new(Client::new(), &config)
    }

    #[test]
    fn test_markets_url() {
        let url = provider().markets_url(2, 25);
        assert!(url.starts_with("http://localhost:9000/coins/markets?vs_currency=usd"));
        assert!(url.contains("category=believe-app-ecosystem"));
        assert!(url.contains("per_page=25&page=2"));
        assert!(url.contains("price_change_percentage=1h%2C24h%2C7d"));
    }

    #[test]
    fn test_parse_token_price() {
        let token = TokenIdentity::bscreener().address;
        let key = token.to_string().to_lowercase();
        let response: SimpleTokenPriceResponse = serde_json::from_value(json!({
            key: {
                "usd": 0.00421,
                "usd_market_cap": 4_210_000.0,
                "usd_24h_vol": 152_300.0,
                "usd_24h_change": -4.2,
                "last_updated_at": 1_717_200_000
            }
        }))
        .unwrap();

        let quote = parse_token_price(response, &token).unwrap();
        assert_eq!(quote.source, "coingecko");
        assert_eq!(quote.price, 0.00421);
        assert_eq!(quote.formatted_price, "$0.004210");
        assert_eq!(quote.formatted_market_cap, "4.21M");
        assert_eq!(quote.formatted_volume, "152.30K");
        assert_eq!(quote.last_updated.unwrap().timestamp(), 1_717_200_000);
    }

    #[test]
    fn test_parse_token_price_missing_token() {
        let token = TokenIdentity::bscreener().address;
        let err = parse_token_price(HashMap::new(), &token).unwrap_err();
        assert!(matches!(err, FetchError::MissingRecord(_)));
        assert_eq!(err.to_string(), "Token not found in CoinGecko");
    }

    #[test]
    fn test_raw_token_decodes_upstream_nulls() {
        let tokens: Vec<RawToken> = serde_json::from_value(json!([{
            "id": "fresh",
            "symbol": "frsh",
            "name": "Fresh",
            "image": null,
            "current_price": null,
            "market_cap": null,
            "market_cap_rank": null,
            "total_volume": 0,
            "price_change_percentage_24h": null,
            "atl_date": null,
            "last_updated": null
        }]))
        .unwrap();
        assert_eq!(tokens[0].total_volume, Some(0.0));
        assert!(tokens[0].price_change_percentage_24h.is_none());
    }

    #[tokio::test]
    async fn test_fetch_unlisted_token_is_missing_record() {
        let (base_url, request) = serve_once("200 OK", "{}").await;
        let config = TrackerConfig {
            coingecko_url: base_url,
            ..TrackerConfig::default()
        };
        let provider = CoinGeckoProvider::new(Client::new(), &config);
        let token = TokenIdentity::bscreener();

        let err = TokenSource::<PriceQuote>::fetch(&provider, &token.address)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::MissingRecord(_)));
        assert_eq!(err.to_string(), "Token not found in CoinGecko");

        let request = request.await.unwrap();
        assert!(request.starts_with("GET /simple/token_price/solana?contract_addresses="));
    }
}

