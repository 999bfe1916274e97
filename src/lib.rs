//! # Believe Market SDK
//!
//! Market data for tokens of the Believe app ecosystem.
//!
//! Two read paths are provided:
//!
//! - [`TokenListingService`] pages through the CoinGecko category listing and
//!   derives trending, search, market-cap range and recently launched views.
//! - [`TokenAggregator`] merges four independent upstreams (CoinGecko spot
//!   price, Jupiter price, Solscan metadata and DexScreener pairs) for one
//!   tracked token. A failing upstream degrades only its own fields.
//!
//! [`RefreshHook`] and [`PriceFeed`] keep the results fresh on a timer and
//! publish them through `tokio::sync::watch` channels.
//!
//! ## Usage
//!
//! ```no_run
//! use believe_market_sdk::{RefreshOptions, TokenTracker};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let tracker = TokenTracker::from_env()?;
//!
//! // One-shot listing view
//! let tokens = tracker.listing().formatted_view().await?;
//! for token in &tokens {
//!     println!("{} {} {}", token.symbol, token.formatted_price, token.price_change_24h);
//! }
//!
//! // Summary refreshed every 30 seconds
//! let summary = tracker.watch_token_summary(RefreshOptions::every(Duration::from_secs(30)));
//! let mut updates = summary.subscribe();
//! updates.changed().await?;
//! if let Some(data) = &updates.borrow().data {
//!     println!("{}: {}", data.symbol, data.formatted_price);
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod config;
pub mod constants;
pub mod error;
pub mod format;
pub mod listing;
pub mod metrics;
pub mod polling;
pub mod provider;
pub mod providers;
pub mod refresh;
pub mod tracker;
pub mod types;

// Re-export commonly used types
pub use aggregator::{AggregatorSources, Subscription, TokenAggregator};
pub use config::{TokenIdentity, TrackerConfig};
pub use error::{ConfigError, FetchError, ServiceError, SourceError};
pub use listing::TokenListingService;
pub use metrics::SourceMetrics;
pub use refresh::{PriceFeed, PriceFeedState, RefreshHook, RefreshOptions, RefreshState, RefreshStatus};
pub use tracker::TokenTracker;
pub use types::{
    ComponentHealth, FormattedToken, HealthStatus, PriceChangeColor, PriceQuote, RawToken,
    SourceKind, TokenDetails, TokenSummary,
};
