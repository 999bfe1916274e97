//! Constants for the Believe market SDK
//!
//! Compile-time defaults for every upstream and polling setting. `TrackerConfig`
//! starts from these values and only environment overrides change them.

/// CoinGecko API base URL
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// Jupiter price API base URL
pub const JUPITER_API_URL: &str = "https://price.jup.ag/v6";

/// Solscan public API base URL
pub const SOLSCAN_API_URL: &str = "https://public-api.solscan.io";

/// DexScreener API base URL
pub const DEXSCREENER_API_URL: &str = "https://api.dexscreener.com/latest";

/// CoinGecko category the listing service is scoped to
pub const BELIEVE_CATEGORY: &str = "believe-app-ecosystem";

/// Quote currency for every listing request
pub const VS_CURRENCY: &str = "usd";

/// Mint address of the tracked BSCREENER token
pub const BSCREENER_TOKEN_ADDRESS: &str = "4PYijC1Xas63cxdoYnUg7SQgcg23UgNNcPmvbj6KNUSz";

/// Ticker of the tracked token
pub const BSCREENER_SYMBOL: &str = "BSCREENER";

/// Display name of the tracked token
pub const BSCREENER_NAME: &str = "BelieveScreener";

/// Default listing page
pub const DEFAULT_PAGE: u32 = 1;

/// Default listing page size
pub const DEFAULT_PER_PAGE: u32 = 60;

/// Page size used to build the trending view
pub const TRENDING_PAGE_SIZE: u32 = 50;

/// Number of entries in the trending view
pub const TRENDING_LIMIT: usize = 10;

/// Page size used by search and the filtered views
pub const FULL_PAGE_SIZE: u32 = 250;

/// Default age window for recently launched tokens (days)
pub const DEFAULT_NEW_TOKEN_DAYS: i64 = 7;

/// Default holder page size
pub const DEFAULT_HOLDERS_LIMIT: u32 = 100;

/// Number of holders reported as top holders
pub const TOP_HOLDERS: usize = 10;

/// Default transfer history page size
pub const DEFAULT_TRANSFERS_LIMIT: u32 = 50;

/// Refresh interval for auto-refreshing hooks (in milliseconds)
pub const REFRESH_INTERVAL_MS: u64 = 30_000;

/// Interval for price subscriptions (in milliseconds)
pub const PRICE_POLL_INTERVAL_MS: u64 = 10_000;

/// Smallest interval a polling session accepts (in milliseconds)
pub const MIN_POLL_INTERVAL_MS: u64 = 100;

/// HTTP request timeout when fetching upstream data (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// User agent for HTTP requests
pub const USER_AGENT: &str = "believe-market-sdk/0.1.0";

/// Display color for non-negative price changes
pub const POSITIVE_CHANGE_COLOR: &str = "#00D4AA";

/// Display color for negative price changes
pub const NEGATIVE_CHANGE_COLOR: &str = "#FF4747";
