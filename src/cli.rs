use std::sync::{Arc, Mutex};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::{
    orderbook::OrderBook,
    orders::{Order, Side},
    price::Price,
};

/// Simple CLI to exercise the order book engine
#[derive(Parser)]
#[command(name = "clob-engine")]
#[command(version = "0.1", about = "A demo of an in-memory limit order book")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk through add, cancel, amend and matching on a small book
    Demo,

    /// Throw random orders at the book and report throughput
    Simulate {
        /// Number of orders to submit
        #[arg(long, default_value_t = 100_000)]
        orders: u64,

        /// Seed for the order flow (random if omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Print the final snapshot as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

/// Timestamps come from the driver, never from the engine.
fn timestamp_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

fn price(value: f64) -> Price {
    // Driver-side prices are literals; rejecting here keeps NaN out of the engine.
    Price::from_f64(value).expect("driver prices are finite")
}

fn print_book(book: &OrderBook, depth: usize) {
    let snapshot = book.snapshot(depth);

    println!("------ Order Book ------");
    println!("Asks (lowest first):");
    for (price, total_quantity) in &snapshot.asks {
        println!("  {:>10}  | {:>8}", format!("{price}"), total_quantity);
    }
    println!("Bids (highest first):");
    for (price, total_quantity) in &snapshot.bids {
        println!("  {:>10}  | {:>8}", format!("{price}"), total_quantity);
    }
    match (book.best_bid(), book.best_ask()) {
        (Some((bid, _)), Some((ask, _))) => {
            println!("Spread: {:.4}", ask.to_f64() - bid.to_f64());
        }
        _ => println!("Spread: n/a"),
    }
    println!(
        "Stats: added={} cancelled={} matched={} levels={}/{} pool_blocks={}",
        book.total_orders_added(),
        book.total_orders_cancelled(),
        book.total_orders_matched(),
        book.bid_levels(),
        book.ask_levels(),
        book.pool_blocks(),
    );
    println!("------------------------");
}

fn run_demo() {
    let mut book = OrderBook::new();

    println!("Adding 3 bids and 3 asks...");
    for order in [
        Order::new(1, Side::Buy, price(100.0), 50, timestamp_ns()),
        Order::new(2, Side::Buy, price(99.5), 100, timestamp_ns()),
        Order::new(3, Side::Buy, price(99.0), 75, timestamp_ns()),
        Order::new(4, Side::Sell, price(101.0), 60, timestamp_ns()),
        Order::new(5, Side::Sell, price(101.5), 80, timestamp_ns()),
        Order::new(6, Side::Sell, price(102.0), 90, timestamp_ns()),
    ] {
        if let Err(reject) = book.add_order(order) {
            eprintln!("rejected: {reject}");
        }
    }
    print_book(&book, 5);

    println!("Cancelling order #2 (bid @ 99.5)...");
    println!("  cancelled: {}", book.cancel_order(2));
    print_book(&book, 5);

    println!("Amending order #3 quantity 75 -> 125 (priority kept)...");
    match book.amend_order(3, price(99.0), 125) {
        Ok(_) => println!("  amended"),
        Err(reject) => eprintln!("  rejected: {reject}"),
    }
    print_book(&book, 5);

    println!("Adding aggressive buy @ 102.0 for 200 units...");
    match book.add_order(Order::new(105, Side::Buy, price(102.0), 200, timestamp_ns())) {
        Ok(trades) => {
            for t in &trades {
                println!(
                    "  TRADE buy #{} x sell #{} | qty {} @ {}",
                    t.buy_order_id, t.sell_order_id, t.quantity, t.price
                );
            }
        }
        Err(reject) => eprintln!("  rejected: {reject}"),
    }
    print_book(&book, 5);

    println!("FIFO at one price: three bids @ 100.0, then a sell for 100...");
    book.clear();
    for (id, quantity) in [(201, 50), (202, 75), (203, 100)] {
        let _ = book.add_order(Order::new(id, Side::Buy, price(100.0), quantity, timestamp_ns()));
    }
    match book.add_order(Order::new(204, Side::Sell, price(100.0), 100, timestamp_ns())) {
        Ok(trades) => {
            for t in &trades {
                println!(
                    "  TRADE buy #{} x sell #{} | qty {} @ {}",
                    t.buy_order_id, t.sell_order_id, t.quantity, t.price
                );
            }
        }
        Err(reject) => eprintln!("  rejected: {reject}"),
    }
    print_book(&book, 5);
}

fn run_simulate(orders: u64, seed: Option<u64>, json: bool) {
    let seed = seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    info!(orders, seed, "starting simulation");

    let mut book = OrderBook::new();

    // Count executed volume through the sink, the way an external trade
    // publisher would consume the feed.
    let volume = Arc::new(Mutex::new(0u64));
    let sink_volume = Arc::clone(&volume);
    book.set_trade_sink(move |trade| {
        *sink_volume.lock().unwrap() += trade.quantity;
    });

    let start = Instant::now();
    for id in 1..=orders {
        let side = if rng.random_bool(0.5) { Side::Buy } else { Side::Sell };
        // Two-decimal grid around 100.00, as a real tape would quote it.
        let price = Price::from_ticks(rng.random_range(9_500..=10_500) * 100);
        let quantity = rng.random_range(10..=1_000);
        let _ = book.add_order(Order::new(id, side, price, quantity, timestamp_ns()));

        // A tenth of the flow is cancels of earlier orders.
        if id % 10 == 0 {
            book.cancel_order(rng.random_range(1..=id));
        }
    }
    let elapsed = start.elapsed();

    let micros = elapsed.as_micros().max(1);
    println!("Submitted {orders} orders in {micros} us");
    println!(
        "  {:.3} us/order, {:.0} orders/s",
        micros as f64 / orders as f64,
        orders as f64 * 1_000_000.0 / micros as f64
    );
    println!("  executed volume: {}", volume.lock().unwrap());

    if json {
        match serde_json::to_string_pretty(&book.snapshot(10)) {
            Ok(text) => println!("{text}"),
            Err(err) => eprintln!("snapshot serialization failed: {err}"),
        }
    } else {
        print_book(&book, 10);
    }
}

pub fn run_cli() {
    let cli = Cli::parse();
    match cli.command {
        Commands::Demo => run_demo(),
        Commands::Simulate { orders, seed, json } => run_simulate(orders, seed, json),
    }
}
