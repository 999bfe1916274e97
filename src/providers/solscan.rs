//! Solscan chain explorer provider: token metadata, holders and transfers

use crate::{
    constants::TOP_HOLDERS,
    error::FetchError,
    format::{format_large_number, format_token_amount, NOT_AVAILABLE},
    provider::{HolderSource, TokenSource},
    providers::http::get_json,
    types::{lenient, Holder, HolderSnapshot, OnChainMetadata, Transfer, TransferHistory},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;

const UPSTREAM: &str = "Solscan";

/// `/token/meta` response
#[derive(Debug, Default, Deserialize)]
struct TokenMeta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    decimals: Option<u8>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    supply: Option<f64>,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    website: Option<String>,
    #[serde(default)]
    twitter: Option<String>,
    #[serde(default)]
    telegram: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// `/token/holders` response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HoldersResponse {
    #[serde(default)]
    total: Option<u64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    total_supply: Option<f64>,
    #[serde(default)]
    data: Vec<HolderRecord>,
}

#[derive(Debug, Deserialize)]
struct HolderRecord {
    address: String,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    amount: Option<f64>,
    #[serde(default)]
    decimals: Option<u8>,
    #[serde(default)]
    rank: Option<u32>,
}

/// `/token/transfer` response
#[derive(Debug, Deserialize)]
struct TransfersResponse {
    #[serde(default)]
    data: Vec<TransferRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferRecord {
    signature: String,
    #[serde(default)]
    block_time: Option<i64>,
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    amount: Option<f64>,
    #[serde(default)]
    decimals: Option<u8>,
    #[serde(default)]
    status: Option<String>,
}

/// Solscan provider
pub struct SolscanProvider {
    client: Client,
    base_url: String,
}

impl SolscanProvider {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

fn parse_meta(meta: TokenMeta) -> Result<OnChainMetadata, FetchError> {
    if meta.name.is_none() && meta.symbol.is_none() && meta.decimals.is_none() {
        return Err(FetchError::missing("Token not found in Solscan"));
    }

    let decimals = meta.decimals.unwrap_or(0);

    Ok(OnChainMetadata {
        source: "solscan".to_string(),
        formatted_supply: meta
            .supply
            .map(|supply| format_large_number(supply, decimals))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        name: meta.name,
        symbol: meta.symbol,
        decimals: meta.decimals,
        supply: meta.supply,
        icon: meta.icon,
        website: meta.website,
        twitter: meta.twitter,
        telegram: meta.telegram,
        description: meta.description,
    })
}

fn parse_holders(response: HoldersResponse) -> HolderSnapshot {
    let total_supply = response.total_supply.filter(|supply| *supply > 0.0);

    let holders: Vec<Holder> = response
        .data
        .into_iter()
        .map(|record| {
            let amount = record.amount.unwrap_or(0.0);
            Holder {
                percentage: total_supply.map(|supply| format!("{:.4}", amount / supply * 100.0)),
                address: record.address,
                amount,
                decimals: record.decimals,
                rank: record.rank,
            }
        })
        .collect();

    HolderSnapshot {
        source: "solscan".to_string(),
        total_holders: response.total,
        top_holders: holders.iter().take(TOP_HOLDERS).cloned().collect(),
        holders,
    }
}

fn parse_transfers(response: TransfersResponse) -> TransferHistory {
    let transactions = response
        .data
        .into_iter()
        .map(|record| {
            let amount = record.amount.unwrap_or(0.0);
            let decimals = record.decimals.unwrap_or(0);
            Transfer {
                signature: record.signature,
                block_time: record
                    .block_time
                    .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
                from: record.from,
                to: record.to,
                amount,
                decimals,
                formatted_amount: format_token_amount(amount, decimals),
                status: record.status,
            }
        })
        .collect();

    TransferHistory {
        source: "solscan".to_string(),
        transactions,
    }
}

#[async_trait]
impl TokenSource<OnChainMetadata> for SolscanProvider {
    async fn fetch(&self, token: &Pubkey) -> Result<OnChainMetadata, FetchError> {
        let url = format!("{}/token/meta?tokenAddress={}", self.base_url, token);
        let meta: TokenMeta = get_json(&self.client, UPSTREAM, &url).await?;
        parse_meta(meta)
    }

    fn provider_name(&self) -> &'static str {
        "solscan"
    }
}

#[async_trait]
impl HolderSource for SolscanProvider {
    async fn fetch_holders(&self, token: &Pubkey, limit: u32) -> Result<HolderSnapshot, FetchError> {
        let url = format!(
            "{}/token/holders?tokenAddress={}&offset=0&limit={}",
            self.base_url, token, limit
        );
        let response: HoldersResponse = get_json(&self.client, UPSTREAM, &url).await?;
        Ok(parse_holders(response))
    }

    async fn fetch_transfers(
        &self,
        token: &Pubkey,
        limit: u32,
    ) -> Result<TransferHistory, FetchError> {
        let url = format!(
            "{}/token/transfer?tokenAddress={}&offset=0&limit={}",
            self.base_url, token, limit
        );
        let response: TransfersResponse = get_json(&self.client, UPSTREAM, &url).await?;
        Ok(parse_transfers(response))
    }
}
