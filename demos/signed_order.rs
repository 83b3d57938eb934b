use bitrue_client::core::config::ExchangeConfig;
use bitrue_client::exchanges::bitrue::create_bitrue_connector;
use rust_decimal::Decimal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // You need to set BITRUE_API_KEY and BITRUE_SECRET_KEY
    let config = match ExchangeConfig::from_env_file("BITRUE") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            eprintln!("Please set BITRUE_API_KEY and BITRUE_SECRET_KEY environment variables");
            return Ok(());
        }
    };

    let connector = create_bitrue_connector(config)?;
    let symbol = "BTRUSDT";

    let Some(info) = connector.market.symbol_info(symbol).await? else {
        eprintln!("{} is not listed", symbol);
        return Ok(());
    };

    // Quote well below the market so the order rests on the book
    let bid = connector.market.buy_price(symbol).await?;
    let price = info.trunc_price(bid / Decimal::from(2));
    let quantity = info.trunc_amount(Decimal::from(100));
    println!("💰 Placing BUY {} {} @ {}", quantity, symbol, price);

    let order_id = connector.trading.buy_limit(symbol, price, quantity).await?;
    println!("Order accepted: {}", order_id);

    let order = connector.trading.query_order(symbol, order_id).await?;
    println!(
        "Status: {} filled={} remaining={}",
        order.status,
        order.filled_quantity(),
        order.unfilled_quantity()
    );

    let open = connector.trading.order_map(symbol).await?;
    println!("Open orders on {}: {}", symbol, open.len());

    let cancelled = connector.trading.cancel(symbol, order_id).await?;
    println!("❌ Cancelled order {}", cancelled.order_id);

    if let Some(balance) = connector.account.balance("USDT").await? {
        println!("USDT free={} locked={}", balance.free, balance.locked);
    }

    Ok(())
}
