//! Types for the Believe market SDK

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::constants::{NEGATIVE_CHANGE_COLOR, POSITIVE_CHANGE_COLOR};
use crate::format::{
    format_market_cap, format_price, format_price_change, format_volume, or_na,
};

/// Upstream sources merged by the multi-source aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Spot price from CoinGecko
    Price,
    /// Aggregated swap price from Jupiter
    Aggregator,
    /// On-chain token metadata from Solscan
    Blockchain,
    /// DEX trading pairs from DexScreener
    Trading,
}

impl SourceKind {
    /// Key used in the `errors` map
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Price => "price",
            SourceKind::Aggregator => "aggregator",
            SourceKind::Blockchain => "blockchain",
            SourceKind::Trading => "trading",
        }
    }

    /// Human readable name used in error messages
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Price => "Price",
            SourceKind::Aggregator => "Jupiter price",
            SourceKind::Blockchain => "Solscan",
            SourceKind::Trading => "DexScreener",
        }
    }

    /// All sources, in merge order
    pub fn all() -> &'static [SourceKind] {
        &[
            SourceKind::Price,
            SourceKind::Aggregator,
            SourceKind::Blockchain,
            SourceKind::Trading,
        ]
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display color keyed by the sign of a price change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceChangeColor {
    Positive,
    Negative,
}

impl PriceChangeColor {
    /// Missing changes count as non-negative
    pub fn from_change(change: Option<f64>) -> Self {
        if change.unwrap_or(0.0) >= 0.0 {
            PriceChangeColor::Positive
        } else {
            PriceChangeColor::Negative
        }
    }

    pub fn hex(&self) -> &'static str {
        match self {
            PriceChangeColor::Positive => POSITIVE_CHANGE_COLOR,
            PriceChangeColor::Negative => NEGATIVE_CHANGE_COLOR,
        }
    }
}

impl Serialize for PriceChangeColor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.hex())
    }
}

/// Market listing record as returned by CoinGecko `/coins/markets`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawToken {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub total_volume: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_1h_in_currency: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_7d_in_currency: Option<f64>,
    #[serde(default)]
    pub atl_date: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl RawToken {
    /// ATL date parsed as RFC 3339, `None` if missing or malformed
    pub fn atl_date(&self) -> Option<DateTime<Utc>> {
        self.atl_date
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc))
    }
}

/// UI projection of a listing record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedToken {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub image: Option<String>,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub volume_24h: Option<f64>,
    pub price_change_24h: String,
    pub price_change_7d: String,
    pub rank: Option<u32>,
    pub last_updated: Option<String>,
    pub formatted_price: String,
    pub formatted_market_cap: String,
    pub formatted_volume: String,
    pub price_change_color: PriceChangeColor,
}

impl From<&RawToken> for FormattedToken {
    fn from(token: &RawToken) -> Self {
        Self {
            id: token.id.clone(),
            name: token.name.clone(),
            symbol: token.symbol.to_uppercase(),
            image: token.image.clone(),
            current_price: token.current_price,
            market_cap: token.market_cap,
            volume_24h: token.total_volume,
            price_change_24h: or_na(token.price_change_percentage_24h, format_price_change),
            price_change_7d: or_na(token.price_change_percentage_7d_in_currency, format_price_change),
            rank: token.market_cap_rank,
            last_updated: token.last_updated.clone(),
            formatted_price: or_na(token.current_price, format_price),
            formatted_market_cap: or_na(token.market_cap, format_market_cap),
            formatted_volume: or_na(token.total_volume, format_volume),
            price_change_color: PriceChangeColor::from_change(token.price_change_percentage_24h),
        }
    }
}

/// Extended single-coin record from CoinGecko `/coins/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinDetail {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub description: HashMap<String, String>,
    #[serde(default)]
    pub market_data: Option<CoinMarketData>,
}

impl CoinDetail {
    /// English description, if the coin has one
    pub fn description_en(&self) -> Option<&str> {
        self.description
            .get("en")
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// `market_data` block of a coin detail
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoinMarketData {
    #[serde(default)]
    pub current_price: HashMap<String, f64>,
    #[serde(default)]
    pub market_cap: HashMap<String, f64>,
    #[serde(default)]
    pub total_volume: HashMap<String, f64>,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    pub sparkline_7d: Option<Sparkline>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sparkline {
    #[serde(default)]
    pub price: Vec<f64>,
}

/// Spot price of the tracked token
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceQuote {
    pub source: String,
    pub price: f64,
    pub market_cap: Option<f64>,
    pub volume_24h: Option<f64>,
    pub price_change_24h: Option<f64>,
    pub last_updated: Option<DateTime<Utc>>,
    pub formatted_price: String,
    pub formatted_market_cap: String,
    pub formatted_volume: String,
}

/// Aggregated swap price of the tracked token
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatorQuote {
    pub source: String,
    pub price: f64,
    pub mint_symbol: Option<String>,
    pub vs_token: Option<String>,
    pub vs_token_symbol: Option<String>,
    pub formatted_price: String,
}

/// On-chain token metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OnChainMetadata {
    pub source: String,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub decimals: Option<u8>,
    /// Raw supply in base units
    pub supply: Option<f64>,
    pub icon: Option<String>,
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub telegram: Option<String>,
    pub description: Option<String>,
    pub formatted_supply: String,
}

/// Base or quote side of a trading pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairToken {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
}

/// One DEX trading pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradingPair {
    pub dex_id: String,
    pub url: Option<String>,
    pub chain_id: Option<String>,
    pub base_token: Option<PairToken>,
    pub quote_token: Option<PairToken>,
    pub price_native: Option<f64>,
    pub price_usd: Option<f64>,
    pub volume_24h: Option<f64>,
    pub volume_6h: Option<f64>,
    pub volume_1h: Option<f64>,
    pub price_change_24h: Option<f64>,
    pub price_change_6h: Option<f64>,
    pub price_change_1h: Option<f64>,
    pub liquidity: Option<f64>,
    pub market_cap: Option<f64>,
    pub pair_created_at: Option<i64>,
}

/// The most liquid pair, condensed for summary fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MainPair {
    pub dex: String,
    pub price: Option<f64>,
    pub volume_24h: Option<f64>,
    pub liquidity: Option<f64>,
    pub price_change_24h: Option<f64>,
    pub url: Option<String>,
}

impl From<&TradingPair> for MainPair {
    fn from(pair: &TradingPair) -> Self {
        Self {
            dex: pair.dex_id.clone(),
            price: pair.price_usd,
            volume_24h: pair.volume_24h,
            liquidity: pair.liquidity,
            price_change_24h: pair.price_change_24h,
            url: pair.url.clone(),
        }
    }
}

/// DEX trading data for the tracked token
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradingData {
    pub source: String,
    pub pairs: Vec<TradingPair>,
    pub main_pair: MainPair,
}

/// Merge of the four aggregation sources
///
/// Each payload is present or `None` independently. `errors` always holds an
/// entry for every source; the entry is `Some(message)` exactly when that
/// source failed.
#[derive(Debug, Clone, Serialize)]
pub struct TokenDetails {
    pub token_address: String,
    pub name: String,
    pub symbol: String,
    pub price: Option<PriceQuote>,
    pub aggregator: Option<AggregatorQuote>,
    pub blockchain: Option<OnChainMetadata>,
    pub trading: Option<TradingData>,
    pub last_updated: DateTime<Utc>,
    pub errors: BTreeMap<SourceKind, Option<String>>,
}

impl TokenDetails {
    /// Sources that failed in this aggregation
    pub fn failed_sources(&self) -> Vec<SourceKind> {
        self.errors
            .iter()
            .filter(|(_, err)| err.is_some())
            .map(|(kind, _)| *kind)
            .collect()
    }
}

/// Flattened, UI-shaped view of `TokenDetails`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenSummary {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub current_price: Option<f64>,
    pub formatted_price: String,
    pub price_change_24h: Option<f64>,
    pub market_cap: Option<f64>,
    pub formatted_market_cap: String,
    pub volume_24h: Option<f64>,
    pub formatted_volume: String,
    pub supply: Option<f64>,
    pub formatted_supply: String,
    pub decimals: Option<u8>,
    pub main_dex: String,
    pub liquidity: Option<f64>,
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub telegram: Option<String>,
    pub description: Option<String>,
    pub last_updated: DateTime<Utc>,
    pub price_change_color: PriceChangeColor,
}

/// One token holder
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Holder {
    pub address: String,
    pub amount: f64,
    pub decimals: Option<u8>,
    pub rank: Option<u32>,
    /// Share of total supply, four decimals; `None` without a known supply
    pub percentage: Option<String>,
}

/// Holder list of the tracked token
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HolderSnapshot {
    pub source: String,
    pub total_holders: Option<u64>,
    pub holders: Vec<Holder>,
    pub top_holders: Vec<Holder>,
}

/// One token transfer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transfer {
    pub signature: String,
    pub block_time: Option<DateTime<Utc>>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub amount: f64,
    pub decimals: u8,
    pub formatted_amount: String,
    pub status: Option<String>,
}

/// Recent transfers of the tracked token
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferHistory {
    pub source: String,
    pub transactions: Vec<Transfer>,
}

/// Overall health status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Every source answered
    Healthy,
    /// Some sources failed, the summary is partial
    Degraded,
    /// No source answered
    Unhealthy,
}

/// Component health information
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    pub message: Option<String>,
    pub details: HashMap<String, serde_json::Value>,
    pub last_checked: DateTime<Utc>,
}

/// Lenient numeric decoding for upstreams that send numbers as strings
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn f64_opt<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(change_24h: Option<f64>) -> RawToken {
        serde_json::from_value(json!({
            "id": "bscreener",
            "symbol": "bscr",
            "name": "BelieveScreener",
            "image": "https://example.com/b.png",
            "current_price": 0.004512,
            "market_cap": 4_512_000.0,
            "market_cap_rank": 812,
            "total_volume": 98_765.4,
            "price_change_percentage_24h": change_24h,
            "price_change_percentage_7d_in_currency": -3.456,
            "atl_date": "2025-05-20T10:11:12.345Z",
            "last_updated": "2025-06-01T00:00:00.000Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_formatted_token_projection() {
        let formatted = FormattedToken::from(&raw(Some(12.345)));
        assert_eq!(formatted.symbol, "BSCR");
        assert_eq!(formatted.formatted_price, "$0.004512");
        assert_eq!(formatted.formatted_market_cap, "$4.51M");
        assert_eq!(formatted.formatted_volume, "$98.77K");
        assert_eq!(formatted.price_change_24h, "+12.35%");
        assert_eq!(formatted.price_change_7d, "-3.46%");
        assert_eq!(formatted.price_change_color, PriceChangeColor::Positive);
    }

    #[test]
    fn test_missing_change_renders_na_and_positive_color() {
        let formatted = FormattedToken::from(&raw(None));
        assert_eq!(formatted.price_change_24h, "N/A");
        assert_eq!(formatted.price_change_color, PriceChangeColor::Positive);

        let falling = FormattedToken::from(&raw(Some(-0.5)));
        assert_eq!(falling.price_change_color, PriceChangeColor::Negative);
        assert_eq!(
            serde_json::to_value(falling.price_change_color).unwrap(),
            json!("#FF4747")
        );
    }

    #[test]
    fn test_atl_date_parsing() {
        let token = raw(None);
        assert!(token.atl_date().is_some());

        let mut broken = token.clone();
        broken.atl_date = Some("not a date".to_string());
        assert!(broken.atl_date().is_none());
    }

    #[test]
    fn test_source_kind_serializes_as_error_key() {
        for kind in SourceKind::all() {
            assert_eq!(serde_json::to_value(kind).unwrap(), json!(kind.as_str()));
        }
    }
}
