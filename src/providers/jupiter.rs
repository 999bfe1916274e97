//! Jupiter aggregated price provider

use crate::{
    error::FetchError, format::format_price, provider::TokenSource, providers::http::get_json,
    types::AggregatorQuote,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;

const UPSTREAM: &str = "Jupiter";

/// Jupiter `/price` response
#[derive(Debug, Deserialize)]
struct JupiterPriceResponse {
    #[serde(default)]
    data: HashMap<String, JupiterPrice>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JupiterPrice {
    price: f64,
    #[serde(default)]
    mint_symbol: Option<String>,
    #[serde(default)]
    vs_token: Option<String>,
    #[serde(default)]
    vs_token_symbol: Option<String>,
}

/// Jupiter price provider
pub struct JupiterProvider {
    client: Client,
    base_url: String,
}

impl JupiterProvider {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

fn parse_price(
    mut response: JupiterPriceResponse,
    token: &Pubkey,
) -> Result<AggregatorQuote, FetchError> {
    let data = response
        .data
        .remove(&token.to_string())
        .ok_or_else(|| FetchError::missing("Token not found in Jupiter"))?;

    Ok(AggregatorQuote {
        source: "jupiter".to_string(),
        price: data.price,
        mint_symbol: data.mint_symbol,
        vs_token: data.vs_token,
        vs_token_symbol: data.vs_token_symbol,
        formatted_price: format_price(data.price),
    })
}

#[async_trait]
impl TokenSource<AggregatorQuote> for JupiterProvider {
    async fn fetch(&self, token: &Pubkey) -> Result<AggregatorQuote, FetchError> {
        let url = format!("{}/price?ids={}", self.base_url, token);
        let response: JupiterPriceResponse = get_json(&self.client, UPSTREAM, &url).await?;
        parse_price(response, token)
    }

    fn provider_name(&self) -> &'static str {
        "jupiter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenIdentity;
    use serde_json::json;

    #[test]
    fn test_parse_price() {
        let token = TokenIdentity::bscreener().address;
        let response: JupiterPriceResponse = serde_json::from_value(json!({
            "data": {
                token.to_string(): {
                    "id": token.to_string(),
                    "mintSymbol": "BSCREENER",
                    "vsToken": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
                    "vsTokenSymbol": "USDC",
                    "price": 0.0043
                }
            },
            "timeTaken": 0.0012
        }))
        .unwrap();

        let quote = parse_price(response, &token).unwrap();
        assert_eq!(quote.price, 0.0043);
        assert_eq!(quote.vs_token_symbol.as_deref(), Some("USDC"));
        assert_eq!(quote.formatted_price, "$0.004300");
    }

    #[test]
    fn test_parse_price_without_token() {
        let token = TokenIdentity::bscreener().address;
        let response: JupiterPriceResponse =
            serde_json::from_value(json!({ "data": {} })).unwrap();
        let err = parse_price(response, &token).unwrap_err();
        assert!(matches!(err, FetchError::MissingRecord(_)));
    }
}
