//! Believe token tracker
//!
//! Wires the listing service and the multi-source aggregator to their
//! upstream providers over one shared HTTP client, and hands out refresh hooks
//! bound to them.

use crate::{
    aggregator::{AggregatorSources, TokenAggregator},
    config::TrackerConfig,
    error::ConfigError,
    listing::TokenListingService,
    metrics::{MetricsCollector, SourceMetrics},
    provider::{HolderSource, MarketListingProvider, TokenSource},
    providers::{
        http::build_client, CoinGeckoProvider, DexScreenerProvider, JupiterProvider,
        SolscanProvider,
    },
    refresh::{PriceFeed, RefreshHook, RefreshOptions},
    types::{
        ComponentHealth, FormattedToken, HealthStatus, OnChainMetadata, PriceQuote, SourceKind,
        TokenSummary,
    },
};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

/// Believe token tracker
///
/// # Example
/// ```no_run
/// use believe_market_sdk::TokenTracker;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tracker = TokenTracker::from_env()?;
/// let trending = tracker.listing().trending().await?;
/// for token in &trending {
///     println!("{}: {:?}", token.symbol, token.price_change_percentage_24h);
/// }
///
/// let summary = tracker.aggregator().get_token_summary().await;
/// println!("{} {}", summary.symbol, summary.formatted_price);
/// # Ok(())
/// # }
/// ```
pub struct TokenTracker {
    config: TrackerConfig,
    listing: Arc<TokenListingService>,
    aggregator: Arc<TokenAggregator>,
}

impl TokenTracker {
    /// Creates a tracker from `BELIEVE_*` environment overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_config(TrackerConfig::from_env()?)
    }

    /// Creates a tracker talking to the upstreams named in `config`
    pub fn from_config(config: TrackerConfig) -> Result<Self, ConfigError> {
        let client = build_client(&config)?;

        let coingecko = Arc::new(CoinGeckoProvider::new(client.clone(), &config));
        let solscan = Arc::new(SolscanProvider::new(client.clone(), &config.solscan_url));

        let listing_provider: Arc<dyn MarketListingProvider> = coingecko.clone();
        let price: Arc<dyn TokenSource<PriceQuote>> = coingecko;
        let blockchain: Arc<dyn TokenSource<OnChainMetadata>> = solscan.clone();
        let explorer: Arc<dyn HolderSource> = solscan;

        let sources = AggregatorSources {
            price,
            aggregator: Arc::new(JupiterProvider::new(client.clone(), &config.jupiter_url)),
            blockchain,
            trading: Arc::new(DexScreenerProvider::new(client, &config.dexscreener_url)),
            explorer,
        };

        tracing::info!(
            category = %config.category,
            token = %config.token.address,
            symbol = %config.token.symbol,
            "Creating Believe token tracker"
        );

        let listing = Arc::new(TokenListingService::new(listing_provider));
        let aggregator = Arc::new(TokenAggregator::with_metrics(
            config.token.clone(),
            sources,
            Arc::new(MetricsCollector::new()),
        ));

        Ok(Self::with_services(config, listing, aggregator))
    }

    /// Creates a tracker over prebuilt services
    ///
    /// This is primarily for testing with mock providers.
    pub fn with_services(
        config: TrackerConfig,
        listing: Arc<TokenListingService>,
        aggregator: Arc<TokenAggregator>,
    ) -> Self {
        Self {
            config,
            listing,
            aggregator,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn listing(&self) -> &Arc<TokenListingService> {
        &self.listing
    }

    pub fn aggregator(&self) -> &Arc<TokenAggregator> {
        &self.aggregator
    }

    /// Hook over the formatted default listing page
    pub fn watch_tokens(&self, options: RefreshOptions) -> RefreshHook<Vec<FormattedToken>> {
        let listing = self.listing.clone();
        RefreshHook::new(
            move || {
                let listing = listing.clone();
                async move { listing.formatted_view().await }
            },
            options,
        )
    }

    /// Hook over the tracked token's summary
    pub fn watch_token_summary(&self, options: RefreshOptions) -> RefreshHook<TokenSummary> {
        let aggregator = self.aggregator.clone();
        RefreshHook::new(
            move || {
                let aggregator = aggregator.clone();
                async move { Ok::<_, Infallible>(aggregator.get_token_summary().await) }
            },
            options,
        )
    }

    /// Live price of the tracked token
    pub fn watch_price(&self, interval: Duration) -> PriceFeed {
        PriceFeed::new(&self.aggregator, interval)
    }

    /// Fetch metrics of every aggregation source
    pub async fn source_metrics(&self) -> Vec<SourceMetrics> {
        self.aggregator.metrics().all().await
    }

    /// Perform a health check by running one aggregation
    ///
    /// # Returns
    /// Healthy when every source answered, Degraded when some failed and
    /// Unhealthy when none answered
    pub async fn health_check(&self) -> ComponentHealth {
        let details = self.aggregator.get_token_details().await;
        let failed = details.failed_sources();
        let total = SourceKind::all().len();

        let mut info = HashMap::new();
        info.insert(
            "token_address".to_string(),
            serde_json::json!(details.token_address),
        );
        info.insert(
            "failed_sources".to_string(),
            serde_json::json!(failed.iter().map(SourceKind::as_str).collect::<Vec<_>>()),
        );
        info.insert(
            "listing_provider".to_string(),
            serde_json::json!(self.listing.provider_name()),
        );

        let status = if failed.is_empty() {
            HealthStatus::Healthy
        } else if failed.len() < total {
            HealthStatus::Degraded
        } else {
            HealthStatus::Unhealthy
        };

        let message = match status {
            HealthStatus::Healthy => "All token data sources are responding".to_string(),
            HealthStatus::Degraded => format!(
                "{} of {} token data sources failed",
                failed.len(),
                total
            ),
            HealthStatus::Unhealthy => "No token data source is responding".to_string(),
        };

        ComponentHealth {
            name: "believe_token_tracker".to_string(),
            status,
            message: Some(message),
            details: info,
            last_checked: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::tests::{quote, sources_with};
    use crate::config::TokenIdentity;
    use crate::provider::mock::{EmptyExplorer, MockFailure, MockListingProvider, MockSource};
    use crate::types::{AggregatorQuote, RawToken, TradingData};

    fn listed(id: &str, change: f64) -> RawToken {
        RawToken {
            id: id.to_string(),
            symbol: id.to_string(),
            name: id.to_uppercase(),
            image: None,
            current_price: Some(1.25),
            market_cap: Some(2_000_000.0),
            market_cap_rank: None,
            total_volume: Some(12_000.0),
            price_change_percentage_24h: Some(change),
            price_change_percentage_1h_in_currency: None,
            price_change_percentage_7d_in_currency: None,
            atl_date: None,
            last_updated: None,
        }
    }

    fn tracker(sources: AggregatorSources) -> TokenTracker {
        let listing = Arc::new(TokenListingService::new(Arc::new(MockListingProvider::new(
            vec![listed("bscr", 4.0), listed("kash", -1.0)],
        ))));
        let aggregator = Arc::new(TokenAggregator::new(TokenIdentity::bscreener(), sources));
        TokenTracker::with_services(TrackerConfig::default(), listing, aggregator)
    }

    #[tokio::test]
    async fn test_health_reflects_failed_sources() {
        let healthy = tracker(sources_with(MockSource::ok(quote(1.0, None))));
        let health = healthy.health_check().await;
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.details["failed_sources"], serde_json::json!([]));

        let degraded = tracker(sources_with(MockSource::failing(MockFailure::Status(500))));
        let health = degraded.health_check().await;
        assert_eq!(health.status, HealthStatus::Degraded);
        assert_eq!(health.details["failed_sources"], serde_json::json!(["price"]));
        assert_eq!(
            health.message.as_deref(),
            Some("1 of 4 token data sources failed")
        );
    }

    #[tokio::test]
    async fn test_health_unhealthy_when_every_source_fails() {
        let tracker = tracker(AggregatorSources {
            price: Arc::new(MockSource::<PriceQuote>::failing(MockFailure::Status(500))),
            aggregator: Arc::new(MockSource::<AggregatorQuote>::failing(MockFailure::Status(500))),
            blockchain: Arc::new(MockSource::<OnChainMetadata>::failing(MockFailure::Status(500))),
            trading: Arc::new(MockSource::<TradingData>::failing(MockFailure::Status(500))),
            explorer: Arc::new(EmptyExplorer),
        });

        let health = tracker.health_check().await;
        assert_eq!(health.status, HealthStatus::Unhealthy);

        let metrics = tracker.source_metrics().await;
        assert!(metrics.iter().all(|m| m.total_requests == 1 && m.success_rate == 0.0));
    }

    #[tokio::test]
    async fn test_watch_tokens_loads_formatted_listing() {
        let tracker = tracker(sources_with(MockSource::ok(quote(1.0, None))));
        let hook = tracker.watch_tokens(RefreshOptions::default());
        hook.subscribe().wait_for(|s| !s.loading).await.unwrap();

        let tokens = hook.data().unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].symbol, "BSCR");
        assert_eq!(tokens[0].price_change_24h, "+4.00%");
        assert!(hook.error().is_none());
    }

    #[tokio::test]
    async fn test_watch_token_summary_never_errors() {
        let tracker = tracker(sources_with(MockSource::failing(MockFailure::Missing(
            "Token not found in CoinGecko",
        ))));
        let hook = tracker.watch_token_summary(RefreshOptions::default());
        hook.subscribe().wait_for(|s| !s.loading).await.unwrap();

        let summary = hook.data().unwrap();
        assert_eq!(summary.formatted_price, "N/A");
        assert_eq!(summary.main_dex, "raydium");
        assert!(hook.error().is_none());
    }

    #[tokio::test]
    async fn test_from_config_builds_live_providers() {
        let tracker = TokenTracker::from_config(TrackerConfig::default()).unwrap();
        assert_eq!(tracker.listing().provider_name(), "coingecko");
        assert_eq!(tracker.aggregator().token(), &TokenIdentity::bscreener());
        assert_eq!(tracker.config().category, "believe-app-ecosystem");
    }
}
