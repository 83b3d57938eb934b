use bitrue_client::core::{config::ExchangeConfig, traits::MarketDataSource, types::KlineInterval};
use bitrue_client::exchanges::bitrue::create_bitrue_connector;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let symbol = std::env::args().nth(1).unwrap_or_else(|| "btrusdt".to_string());

    // Market data needs no credentials
    let connector = create_bitrue_connector(ExchangeConfig::read_only())?;

    println!("📊 Bitrue market data stream");
    println!("============================");
    println!("Endpoint: {}", connector.get_websocket_url());

    let mut depth = connector.subscribe_depth(&symbol).await?;
    let mut kline = connector
        .subscribe_kline(&symbol, KlineInterval::Minutes1)
        .await?;
    println!("Subscribed to {}", depth.subscription().channel);
    println!("Subscribed to {}", kline.subscription().channel);

    let deadline = tokio::time::sleep(Duration::from_secs(30));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            () = &mut deadline => break,
            update = depth.recv() => match update {
                Some(update) => {
                    let bid = update.best_bid().map(|level| level.price.to_string());
                    let ask = update.best_ask().map(|level| level.price.to_string());
                    println!(
                        "📖 {} bid={} ask={} spread={:?}",
                        update.timestamp,
                        bid.as_deref().unwrap_or("-"),
                        ask.as_deref().unwrap_or("-"),
                        update.spread()
                    );
                }
                None => {
                    eprintln!("Depth stream closed");
                    break;
                }
            },
            update = kline.recv() => match update {
                Some(update) => {
                    let candle = update.candle;
                    println!(
                        "🕯️ {} o={} h={} l={} c={} vol={}",
                        candle.id, candle.open, candle.high, candle.low, candle.close, candle.volume
                    );
                }
                None => {
                    eprintln!("Kline stream closed");
                    break;
                }
            },
        }
    }

    println!(
        "\nframes={} heartbeats={} decode_failures={} dropped={}",
        depth.stats().frames_received(),
        depth.stats().heartbeats_answered(),
        depth.stats().decode_failures(),
        depth.stats().dropped()
    );

    depth.close().await;
    kline.close().await;
    Ok(())
}
