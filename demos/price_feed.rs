use believe_market_sdk::{RefreshOptions, TokenTracker, constants::PRICE_POLL_INTERVAL_MS};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let tracker = TokenTracker::from_env()?;
    let symbol = tracker.config().token.symbol.clone();

    println!("{} live price", symbol);
    println!("{:-<40}", "");

    let feed = tracker.watch_price(Duration::from_millis(PRICE_POLL_INTERVAL_MS));
    let summary = tracker.watch_token_summary(RefreshOptions::every(Duration::from_secs(60)));

    let mut updates = feed.subscribe();
    for _ in 0..10 {
        updates.changed().await?;
        let state = updates.borrow_and_update().clone();
        match (state.price, state.error) {
            (_, Some(error)) => eprintln!("{:<10} error: {}", symbol, error),
            (Some(quote), None) => println!(
                "{:<10} {:>12} (24h: {:?})",
                symbol, quote.formatted_price, quote.price_change_24h
            ),
            (None, None) => {}
        }
    }

    if let Some(data) = summary.data() {
        println!("\nMain DEX: {} | Liquidity: {:?}", data.main_dex, data.liquidity);
    }

    let metrics = tracker.source_metrics().await;
    for m in metrics {
        println!(
            "{:<10} p50={:.0}ms p99={:.0}ms success={:.1}%",
            m.source,
            m.latency_p50_ms,
            m.latency_p99_ms,
            m.success_rate * 100.0
        );
    }

    Ok(())
}
