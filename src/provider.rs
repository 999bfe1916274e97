//! Provider abstractions for the upstream market-data APIs

use crate::{
    error::FetchError,
    types::{CoinDetail, HolderSnapshot, RawToken, TransferHistory},
};
use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;

/// Category-scoped market listing (CoinGecko `/coins/markets`)
#[async_trait]
pub trait MarketListingProvider: Send + Sync {
    /// Fetches one page of the listing
    ///
    /// # Arguments
    /// * `page` - 1-based page number
    /// * `per_page` - Number of records per page
    async fn fetch_markets(&self, page: u32, per_page: u32) -> Result<Vec<RawToken>, FetchError>;

    /// Fetches the extended record of a single coin
    async fn fetch_coin(&self, id: &str) -> Result<CoinDetail, FetchError>;

    /// Returns the name of this provider
    fn provider_name(&self) -> &'static str;
}

/// One source of per-token data merged by the aggregator
///
/// Implementations must fail with [`FetchError::MissingRecord`] when the
/// upstream answers successfully but does not know the token.
#[async_trait]
pub trait TokenSource<T>: Send + Sync {
    async fn fetch(&self, token: &Pubkey) -> Result<T, FetchError>;

    /// Returns the name of this provider
    fn provider_name(&self) -> &'static str;
}

/// Holder and transfer records from a chain explorer
#[async_trait]
pub trait HolderSource: Send + Sync {
    async fn fetch_holders(&self, token: &Pubkey, limit: u32)
        -> Result<HolderSnapshot, FetchError>;

    async fn fetch_transfers(
        &self,
        token: &Pubkey,
        limit: u32,
    ) -> Result<TransferHistory, FetchError>;
}
