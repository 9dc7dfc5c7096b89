//! Live ladder - streams a BTSE futures order book and prints the top rows
//!
//! Usage:
//!   cargo run --example live_ladder
//!
//! Optional:
//!   FEED_SYMBOL=ETHPFC  # Market symbol (default: BTCPFC)
//!   FEED_DEPTH=10       # Rows per side (default: 8)
//!   RUST_LOG=orderbook_feed=debug

use orderbook_feed::feed::BookView;
use orderbook_feed::orderbook::LadderRow;
use orderbook_feed::types::{FlashColor, PriceDirection, Size};
use orderbook_feed::{Config, Session};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for debug output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("orderbook_feed=info".parse()?),
        )
        .init();

    let symbol = std::env::var("FEED_SYMBOL").unwrap_or_else(|_| "BTCPFC".to_string());
    let mut config = Config::new(&symbol);
    if let Ok(depth) = std::env::var("FEED_DEPTH") {
        config = config.with_depth(depth.parse()?);
    }

    println!("=== Live Ladder: {} ===", symbol);
    println!("book:   {} ({})", config.orderbook_url(), config.orderbook_channel());
    println!("trades: {} ({})", config.trade_url(), config.trade_channel());
    println!("(Press Ctrl+C to stop)\n");

    let session = Session::new(config)?;
    let handle = session.handle();
    let mut changes = handle.subscribe();

    let mut task = tokio::spawn(session.run(async {
        let _ = tokio::signal::ctrl_c().await;
    }));

    loop {
        tokio::select! {
            result = &mut task => {
                result??;
                break;
            }
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                print_view(&handle.view());
            }
        }
    }

    println!("\nStopped.");
    Ok(())
}

fn print_view(view: &BookView) {
    println!("{:>14} {:>12} {:>12}", "price", "size", "total");
    for row in view.asks.iter().rev() {
        print_row(row, view.max_ask_total);
    }

    let arrow = match view.price_direction {
        PriceDirection::Up => "▲",
        PriceDirection::Down => "▼",
        PriceDirection::Same => " ",
    };
    match view.last_price {
        Some(price) => println!("{:>14} {}", price, arrow),
        None => println!("{:>14}", "-"),
    }

    for row in view.bids.iter() {
        print_row(row, view.max_bid_total);
    }
    println!();
}

fn print_row(row: &LadderRow, max_total: Size) {
    let bar = "#".repeat((row.depth_ratio(max_total) * 20.0).round() as usize);
    println!(
        "{:>14}{} {:>12}{} {:>12} {}",
        row.price,
        marker(row.flash_color),
        row.size,
        marker(row.flash_size_color),
        row.total,
        bar
    );
}

fn marker(flash: Option<FlashColor>) -> char {
    match flash {
        Some(FlashColor::Green) => '+',
        Some(FlashColor::Red) => '-',
        None => ' ',
    }
}
