//! Upstream provider implementations

pub mod coingecko;
pub mod dexscreener;
pub mod http;
pub mod jupiter;
pub mod solscan;

pub use coingecko::CoinGeckoProvider;
pub use dexscreener::DexScreenerProvider;
pub use jupiter::JupiterProvider;
pub use solscan::SolscanProvider;
