//! DexScreener trading pair provider

use crate::{
    error::FetchError,
    provider::TokenSource,
    providers::http::get_json,
    types::{lenient, MainPair, PairToken, TradingData, TradingPair},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;

const UPSTREAM: &str = "DexScreener";

/// `/dex/tokens/{address}` response; `pairs` is `null` for unknown tokens
#[derive(Debug, Deserialize)]
struct PairsResponse {
    #[serde(default)]
    pairs: Option<Vec<PairRecord>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PairRecord {
    dex_id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    chain_id: Option<String>,
    #[serde(default)]
    base_token: Option<PairToken>,
    #[serde(default)]
    quote_token: Option<PairToken>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    price_native: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    price_usd: Option<f64>,
    #[serde(default)]
    volume: Option<Windows>,
    #[serde(default)]
    price_change: Option<Windows>,
    #[serde(default)]
    liquidity: Option<Liquidity>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    market_cap: Option<f64>,
    #[serde(default)]
    pair_created_at: Option<i64>,
}

/// Per-window figures (`h24`, `h6`, `h1`)
#[derive(Debug, Default, Deserialize)]
struct Windows {
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    h24: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    h6: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    h1: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Liquidity {
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    usd: Option<f64>,
}

impl From<PairRecord> for TradingPair {
    fn from(record: PairRecord) -> Self {
        let volume = record.volume.unwrap_or_default();
        let change = record.price_change.unwrap_or_default();
        Self {
            dex_id: record.dex_id,
            url: record.url,
            chain_id: record.chain_id,
            base_token: record.base_token,
            quote_token: record.quote_token,
            price_native: record.price_native,
            price_usd: record.price_usd,
            volume_24h: volume.h24,
            volume_6h: volume.h6,
            volume_1h: volume.h1,
            price_change_24h: change.h24,
            price_change_6h: change.h6,
            price_change_1h: change.h1,
            liquidity: record.liquidity.and_then(|l| l.usd),
            market_cap: record.market_cap,
            pair_created_at: record.pair_created_at,
        }
    }
}

/// Selects the pair with the highest USD liquidity
///
/// Missing liquidity counts as zero; among equal liquidity the first pair wins.
pub fn select_main_pair(pairs: &[TradingPair]) -> Option<&TradingPair> {
    pairs.iter().fold(None, |best: Option<&TradingPair>, pair| match best {
        Some(current) if current.liquidity.unwrap_or(0.0) >= pair.liquidity.unwrap_or(0.0) => {
            Some(current)
        }
        _ => Some(pair),
    })
}

fn parse_pairs(response: PairsResponse) -> Result<TradingData, FetchError> {
    let pairs: Vec<TradingPair> = response
        .pairs
        .unwrap_or_default()
        .into_iter()
        .map(TradingPair::from)
        .collect();

    let main_pair = select_main_pair(&pairs)
        .map(MainPair::from)
        .ok_or_else(|| FetchError::missing("No trading pairs found"))?;

    Ok(TradingData {
        source: "dexscreener".to_string(),
        pairs,
        main_pair,
    })
}

/// DexScreener provider
pub struct DexScreenerProvider {
    client: Client,
    base_url: String,
}

impl DexScreenerProvider {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TokenSource<TradingData> for DexScreenerProvider {
    async fn fetch(&self, token: &Pubkey) -> Result<TradingData, FetchError> {
        let url = format!("{}/dex/tokens/{}", self.base_url, token);
        let response: PairsResponse = get_json(&self.client, UPSTREAM, &url).await?;
        let data = parse_pairs(response)?;

        tracing::debug!(
            pairs = data.pairs.len(),
            main_dex = %data.main_pair.dex,
            "Fetched trading pairs from DexScreener"
        );

        Ok(data)
    }

    fn provider_name(&self) -> &'static str {
        "dexscreener"
    }
}
