//! Category-scoped token listing with derived views
//!
//! Every view is computed from one fresh listing page. Failures propagate as a
//! single [`ServiceError`]; there are no retries and no partial results.

use crate::{
    constants::{DEFAULT_PAGE, DEFAULT_PER_PAGE, FULL_PAGE_SIZE, TRENDING_LIMIT, TRENDING_PAGE_SIZE},
    error::ServiceError,
    provider::MarketListingProvider,
    types::{CoinDetail, FormattedToken, RawToken},
};
use chrono::{DateTime, Duration, Utc};
use std::cmp::Ordering;
use std::sync::Arc;

/// Listing service over a [`MarketListingProvider`]
pub struct TokenListingService {
    provider: Arc<dyn MarketListingProvider>,
}

impl TokenListingService {
    pub fn new(provider: Arc<dyn MarketListingProvider>) -> Self {
        Self { provider }
    }

    /// Returns the name of the underlying provider
    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    /// Fetches one page of the category listing
    pub async fn list_all(&self, page: u32, per_page: u32) -> Result<Vec<RawToken>, ServiceError> {
        self.provider
            .fetch_markets(page, per_page)
            .await
            .map_err(|e| ServiceError::new("fetch Believe tokens", e))
    }

    /// Fetches the default listing page
    pub async fn list_default(&self) -> Result<Vec<RawToken>, ServiceError> {
        self.list_all(DEFAULT_PAGE, DEFAULT_PER_PAGE).await
    }

    async fn page_for(
        &self,
        per_page: u32,
        operation: &'static str,
    ) -> Result<Vec<RawToken>, ServiceError> {
        self.provider
            .fetch_markets(DEFAULT_PAGE, per_page)
            .await
            .map_err(|e| ServiceError::new(operation, e))
    }

    /// Top movers by 24h change
    pub async fn trending(&self) -> Result<Vec<RawToken>, ServiceError> {
        let tokens = self
            .page_for(TRENDING_PAGE_SIZE, "fetch trending tokens")
            .await?;
        Ok(top_movers(tokens, TRENDING_LIMIT))
    }

    /// Case-insensitive name or symbol search; an empty query matches everything
    pub async fn search(&self, query: &str) -> Result<Vec<RawToken>, ServiceError> {
        let tokens = self.page_for(FULL_PAGE_SIZE, "search tokens").await?;
        Ok(matching(tokens, query))
    }

    /// Tokens whose market cap lies in `[min, max]`
    pub async fn by_market_cap_range(
        &self,
        min: f64,
        max: f64,
    ) -> Result<Vec<RawToken>, ServiceError> {
        let tokens = self
            .page_for(FULL_PAGE_SIZE, "filter by market cap")
            .await?;
        Ok(in_market_cap_range(tokens, min, max))
    }

    /// Tokens whose all-time low is at most `days_old` days in the past
    pub async fn recently_launched(&self, days_old: i64) -> Result<Vec<RawToken>, ServiceError> {
        let tokens = self.page_for(FULL_PAGE_SIZE, "fetch new tokens").await?;
        Ok(launched_since(tokens, Utc::now() - Duration::days(days_old)))
    }

    /// Default page projected for display
    pub async fn formatted_view(&self) -> Result<Vec<FormattedToken>, ServiceError> {
        let tokens = self
            .page_for(DEFAULT_PER_PAGE, "format tokens")
            .await?;
        Ok(tokens.iter().map(FormattedToken::from).collect())
    }

    /// Extended record of one coin
    pub async fn token_details(&self, id: &str) -> Result<CoinDetail, ServiceError> {
        self.provider
            .fetch_coin(id)
            .await
            .map_err(|e| ServiceError::new("fetch token details", e))
    }
}

/// Drops tokens without a 24h change, sorts descending (stable) and truncates
fn top_movers(tokens: Vec<RawToken>, limit: usize) -> Vec<RawToken> {
    let mut movers: Vec<RawToken> = tokens
        .into_iter()
        .filter(|t| t.price_change_percentage_24h.is_some())
        .collect();

    movers.sort_by(|a, b| {
        let a = a.price_change_percentage_24h.unwrap_or_default();
        let b = b.price_change_percentage_24h.unwrap_or_default();
        b.partial_cmp(&a).unwrap_or(Ordering::Equal)
    });
    movers.truncate(limit);
    movers
}

fn matching(tokens: Vec<RawToken>, query: &str) -> Vec<RawToken> {
    let query = query.to_lowercase();
    tokens
        .into_iter()
        .filter(|t| t.name.to_lowercase().contains(&query) || t.symbol.to_lowercase().contains(&query))
        .collect()
}

fn in_market_cap_range(tokens: Vec<RawToken>, min: f64, max: f64) -> Vec<RawToken> {
    tokens
        .into_iter()
        .filter(|t| matches!(t.market_cap, Some(cap) if cap >= min && cap <= max))
        .collect()
}

fn launched_since(tokens: Vec<RawToken>, cutoff: DateTime<Utc>) -> Vec<RawToken> {
    tokens
        .into_iter()
        .filter(|t| matches!(t.atl_date(), Some(date) if date >= cutoff))
        .collect()
}
