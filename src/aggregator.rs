//! Multi-source aggregation for the tracked token
//!
//! The four sources are fetched concurrently and every one is awaited to
//! completion, success or failure. A failing source only empties its own
//! field and records its message under `errors`; the aggregation itself never
//! fails.

use crate::{
    config::TokenIdentity,
    constants::{DEFAULT_HOLDERS_LIMIT, DEFAULT_TRANSFERS_LIMIT},
    error::{ServiceError, SourceError},
    format::NOT_AVAILABLE,
    metrics::MetricsCollector,
    polling::PollingSession,
    provider::{HolderSource, TokenSource},
    types::{
        AggregatorQuote, HolderSnapshot, OnChainMetadata, PriceChangeColor, PriceQuote,
        SourceKind, TokenDetails, TokenSummary, TradingData, TransferHistory,
    },
};
use chrono::Utc;
use futures::future::join4;
use solana_sdk::pubkey::Pubkey;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// The upstreams an aggregator reads from
#[derive(Clone)]
pub struct AggregatorSources {
    pub price: Arc<dyn TokenSource<PriceQuote>>,
    pub aggregator: Arc<dyn TokenSource<AggregatorQuote>>,
    pub blockchain: Arc<dyn TokenSource<OnChainMetadata>>,
    pub trading: Arc<dyn TokenSource<TradingData>>,
    pub explorer: Arc<dyn HolderSource>,
}

/// Multi-source aggregator for one token
pub struct TokenAggregator {
    token: TokenIdentity,
    sources: AggregatorSources,
    metrics: Arc<MetricsCollector>,
}

/// Fetches one source, records the sample and tags any failure with its source
async fn fetch_source<T>(
    kind: SourceKind,
    source: &dyn TokenSource<T>,
    token: &Pubkey,
    metrics: &MetricsCollector,
) -> Result<T, SourceError> {
    let start = Instant::now();
    let result = source.fetch(token).await;
    let elapsed = start.elapsed();
    metrics.record(kind, elapsed, result.is_ok()).await;

    match result {
        Ok(value) => {
            tracing::debug!(
                source = %kind,
                provider = source.provider_name(),
                latency_ms = elapsed.as_millis() as u64,
                "Source fetch succeeded"
            );
            Ok(value)
        }
        Err(error) => {
            tracing::warn!(
                source = %kind,
                provider = source.provider_name(),
                error = %error,
                "Source fetch failed"
            );
            Err(SourceError::new(kind, error))
        }
    }
}

/// Moves a settled result into its field, recording the failure message
fn settle<T>(
    result: Result<T, SourceError>,
    errors: &mut BTreeMap<SourceKind, Option<String>>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            errors.insert(err.kind, Some(err.to_string()));
            None
        }
    }
}

/// Merges four settled source results into one `TokenDetails`
pub fn merge(
    token: &TokenIdentity,
    price: Result<PriceQuote, SourceError>,
    aggregator: Result<AggregatorQuote, SourceError>,
    blockchain: Result<OnChainMetadata, SourceError>,
    trading: Result<TradingData, SourceError>,
) -> TokenDetails {
    let mut errors: BTreeMap<SourceKind, Option<String>> =
        SourceKind::all().iter().map(|kind| (*kind, None)).collect();

    TokenDetails {
        token_address: token.address_string(),
        name: token.name.clone(),
        symbol: token.symbol.clone(),
        price: settle(price, &mut errors),
        aggregator: settle(aggregator, &mut errors),
        blockchain: settle(blockchain, &mut errors),
        trading: settle(trading, &mut errors),
        last_updated: Utc::now(),
        errors,
    }
}

/// Flattens details into the UI summary, substituting defaults for missing sources
pub fn summarize(details: &TokenDetails) -> TokenSummary {
    let price = details.price.as_ref();
    let chain = details.blockchain.as_ref();
    let main_pair = details.trading.as_ref().map(|t| &t.main_pair);
    let na = || NOT_AVAILABLE.to_string();

    TokenSummary {
        address: details.token_address.clone(),
        name: details.name.clone(),
        symbol: details.symbol.clone(),
        current_price: price.map(|p| p.price),
        formatted_price: price.map(|p| p.formatted_price.clone()).unwrap_or_else(na),
        price_change_24h: price.and_then(|p| p.price_change_24h),
        market_cap: price.and_then(|p| p.market_cap),
        formatted_market_cap: price
            .map(|p| p.formatted_market_cap.clone())
            .unwrap_or_else(na),
        volume_24h: price.and_then(|p| p.volume_24h),
        formatted_volume: price.map(|p| p.formatted_volume.clone()).unwrap_or_else(na),
        supply: chain.and_then(|c| c.supply),
        formatted_supply: chain.map(|c| c.formatted_supply.clone()).unwrap_or_else(na),
        decimals: chain.and_then(|c| c.decimals),
        main_dex: main_pair
            .map(|p| p.dex.clone())
            .unwrap_or_else(|| "Unknown".to_string()),
        liquidity: main_pair.and_then(|p| p.liquidity),
        website: chain.and_then(|c| c.website.clone()),
        twitter: chain.and_then(|c| c.twitter.clone()),
        telegram: chain.and_then(|c| c.telegram.clone()),
        description: chain.and_then(|c| c.description.clone()),
        last_updated: details.last_updated,
        price_change_color: PriceChangeColor::from_change(price.and_then(|p| p.price_change_24h)),
    }
}

/// Live price subscription; stops on [`unsubscribe`](Self::unsubscribe) or drop
#[derive(Debug)]
pub struct Subscription {
    session: PollingSession,
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.session.id()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }

    /// Stops the subscription; no callback fires afterwards
    pub fn unsubscribe(&self) {
        self.session.cancel();
    }
}

impl TokenAggregator {
    pub fn new(token: TokenIdentity, sources: AggregatorSources) -> Self {
        Self::with_metrics(token, sources, Arc::new(MetricsCollector::new()))
    }

    pub fn with_metrics(
        token: TokenIdentity,
        sources: AggregatorSources,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            token,
            sources,
            metrics,
        }
    }

    pub fn token(&self) -> &TokenIdentity {
        &self.token
    }

    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    /// Fetches all four sources concurrently and merges whatever settled
    pub async fn get_token_details(&self) -> TokenDetails {
        let address = &self.token.address;
        let metrics = self.metrics.as_ref();

        let (price, aggregator, blockchain, trading) = join4(
            fetch_source(SourceKind::Price, self.sources.price.as_ref(), address, metrics),
            fetch_source(SourceKind::Aggregator, self.sources.aggregator.as_ref(), address, metrics),
            fetch_source(SourceKind::Blockchain, self.sources.blockchain.as_ref(), address, metrics),
            fetch_source(SourceKind::Trading, self.sources.trading.as_ref(), address, metrics),
        )
        .await;

        let details = merge(&self.token, price, aggregator, blockchain, trading);

        let failed = details.failed_sources();
        if !failed.is_empty() {
            tracing::warn!(
                token = %details.symbol,
                failed = ?failed,
                "Token details aggregated with failed sources"
            );
        }

        details
    }

    /// Aggregated details flattened for display
    pub async fn get_token_summary(&self) -> TokenSummary {
        summarize(&self.get_token_details().await)
    }

    /// Spot price of the token from the price source alone
    pub async fn get_price(&self) -> Result<PriceQuote, SourceError> {
        fetch_source(
            SourceKind::Price,
            self.sources.price.as_ref(),
            &self.token.address,
            &self.metrics,
        )
        .await
    }

    /// Fetches the price now and then once per `interval`
    ///
    /// `callback` receives either the quote or the failure of each fetch. The
    /// returned [`Subscription`] stops the polling when unsubscribed or dropped.
    pub fn subscribe_to_price<F>(&self, callback: F, interval: Duration) -> Subscription
    where
        F: Fn(Result<PriceQuote, SourceError>) + Send + Sync + 'static,
    {
        let source = self.sources.price.clone();
        let metrics = self.metrics.clone();
        let address = self.token.address;
        let callback = Arc::new(callback);

        let session = PollingSession::start("price", interval, true, move |session| {
            let source = source.clone();
            let metrics = metrics.clone();
            let callback = callback.clone();
            async move {
                let result =
                    fetch_source(SourceKind::Price, source.as_ref(), &address, &metrics).await;
                if session.is_active() {
                    callback(result);
                }
            }
        });

        Subscription { session }
    }

    /// Holder list from the chain explorer
    pub async fn holders(&self, limit: Option<u32>) -> Result<HolderSnapshot, ServiceError> {
        self.sources
            .explorer
            .fetch_holders(&self.token.address, limit.unwrap_or(DEFAULT_HOLDERS_LIMIT))
            .await
            .map_err(|e| ServiceError::new("fetch holders data", e))
    }

    /// Recent transfers from the chain explorer
    pub async fn transaction_history(
        &self,
        limit: Option<u32>,
    ) -> Result<TransferHistory, ServiceError> {
        self.sources
            .explorer
            .fetch_transfers(&self.token.address, limit.unwrap_or(DEFAULT_TRANSFERS_LIMIT))
            .await
            .map_err(|e| ServiceError::new("fetch transaction history", e))
    }
}
