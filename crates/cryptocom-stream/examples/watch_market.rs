/*
[INPUT]:  A spot symbol (default BTC/USDT) and optional API credentials in env
[OUTPUT]: A few order book, trade and ticker updates printed to stdout
[POS]:    Examples - streaming client usage
[UPDATE]: When the watch API changes
*/

use cryptocom_stream::*;

/// Example: following public channels, and the balance channel when
/// `CRYPTOCOM_API_KEY` / `CRYPTOCOM_SECRET` are set.
#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Crypto.com Stream Example ===\n");

    let symbol = std::env::args().nth(1).unwrap_or_else(|| "BTC/USDT".to_string());

    let mut config = StreamConfig::default();
    if let (Ok(key), Ok(secret)) = (
        std::env::var("CRYPTOCOM_API_KEY"),
        std::env::var("CRYPTOCOM_SECRET"),
    ) {
        config = config.with_credentials(Credentials::new(key, secret));
    }
    let private = config.credentials.is_some();
    let client = CryptocomStream::new(config)?;

    for _ in 0..3 {
        let book = client.watch_order_book(&symbol, Some(5), None).await?;
        println!(
            "book {} best bid {:?} best ask {:?} (seq {:?})",
            book.symbol,
            book.best_bid().map(|l| l.price),
            book.best_ask().map(|l| l.price),
            book.nonce
        );
    }

    let trades = client.watch_trades(&symbol, None, Some(5), None).await?;
    for trade in &trades {
        println!("trade {:?} {:?} {} @ {}", trade.id, trade.side, trade.amount, trade.price);
    }

    let ticker = client.watch_ticker(&symbol, None).await?;
    println!("ticker last {:?} bid {:?} ask {:?}", ticker.last, ticker.bid, ticker.ask);

    if private {
        let balances = client.watch_balance(None).await?;
        for (currency, account) in &balances.accounts {
            println!("balance {currency}: free {:?} total {:?}", account.free, account.total);
        }
    } else {
        println!("\n(no credentials in env, skipping balance)");
    }

    client.close().await;
    Ok(())
}
