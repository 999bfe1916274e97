use believe_market_sdk::{TokenTracker, constants::DEFAULT_NEW_TOKEN_DAYS};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let tracker = TokenTracker::from_env()?;

    println!("Believe Ecosystem Dashboard");
    println!("===========================");

    // 1. Trending
    println!("\nTrending (24h):");
    match tracker.listing().trending().await {
        Ok(tokens) => {
            for token in &tokens {
                println!(
                    "  {:<12} {:>8.2}%",
                    token.symbol.to_uppercase(),
                    token.price_change_percentage_24h.unwrap_or_default()
                );
            }
        }
        Err(e) => eprintln!("  {}", e),
    }

    // 2. Formatted listing
    println!("\nTop of the category:");
    match tracker.listing().formatted_view().await {
        Ok(tokens) => {
            for token in tokens.iter().take(15) {
                println!(
                    "  {:<12} {:>12} {:>10} {:>10} {}",
                    token.symbol,
                    token.formatted_price,
                    token.formatted_market_cap,
                    token.formatted_volume,
                    token.price_change_24h
                );
            }
        }
        Err(e) => eprintln!("  {}", e),
    }

    // 3. New launches
    match tracker.listing().recently_launched(DEFAULT_NEW_TOKEN_DAYS).await {
        Ok(tokens) => println!("\n{} tokens launched in the last {} days", tokens.len(), DEFAULT_NEW_TOKEN_DAYS),
        Err(e) => eprintln!("\n{}", e),
    }

    // 4. Tracked token across all sources
    let details = tracker.aggregator().get_token_details().await;
    for (source, error) in &details.errors {
        if let Some(error) = error {
            eprintln!("  {} unavailable: {}", source, error);
        }
    }

    let summary = believe_market_sdk::aggregator::summarize(&details);
    println!("\n{} ({})", summary.name, summary.symbol);
    println!("  Price:      {}", summary.formatted_price);
    println!("  Market cap: {}", summary.formatted_market_cap);
    println!("  Volume 24h: {}", summary.formatted_volume);
    println!("  Supply:     {}", summary.formatted_supply);
    println!("  Main DEX:   {}", summary.main_dex);

    let health = tracker.health_check().await;
    println!("\nHealth: {:?} ({})", health.status, health.message.unwrap_or_default());

    Ok(())
}
