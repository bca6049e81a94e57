use criterion::{criterion_group, criterion_main, Criterion};

use clob_engine::orderbook::OrderBook;
use clob_engine::orders::{Order, Side};
use clob_engine::price::Price;

/// Build a book with `depth` price levels per side and `orders_per_level`
/// resting orders at each, leaving a one-level gap between the sides.
fn setup_order_book(depth: u64, orders_per_level: u64) -> OrderBook {
    let mut book = OrderBook::new();
    let mut id = 1u64;
    for step in 0..depth {
        let bid_price = Price::from_ticks(1_000_000 - (step + 1) * 5_000);
        let ask_price = Price::from_ticks(1_000_000 + (step + 1) * 5_000);
        for _ in 0..orders_per_level {
            book.add_order(Order::new(id, Side::Buy, bid_price, 10, 0)).unwrap();
            id += 1;
            book.add_order(Order::new(id, Side::Sell, ask_price, 10, 0)).unwrap();
            id += 1;
        }
    }
    book
}

fn bench_order_book(c: &mut Criterion) {
    let mut book = setup_order_book(100, 10);
    let mut id = 1_000_000u64;
    c.bench_function("add then cancel 1 resting order", |b| {
        b.iter(|| {
            id += 1;
            book.add_order(Order::new(id, Side::Buy, Price::from_ticks(500_000), 10, 0))
                .unwrap();
            book.cancel_order(id);
        })
    });

    let mut book = setup_order_book(100, 10);
    let mut id = 2_000_000u64;
    c.bench_function("match 1 crossing order", |b| {
        b.iter(|| {
            // Rest a one-lot ask inside the spread, then lift it.
            id += 2;
            book.add_order(Order::new(id, Side::Sell, Price::from_ticks(1_000_000), 10, 0))
                .unwrap();
            book.add_order(Order::new(id + 1, Side::Buy, Price::from_ticks(1_000_000), 10, 0))
                .unwrap();
        })
    });

    let book = setup_order_book(100, 10);
    c.bench_function("snapshot depth 10", |b| b.iter(|| book.snapshot(10)));
}

criterion_group!(benches, bench_order_book);
criterion_main!(benches);
