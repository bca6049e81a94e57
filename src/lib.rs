//! In-memory continuous limit order book for a single instrument.
//!
//! Orders are added, cancelled and amended against two price-indexed sides;
//! whenever a new or amended order crosses the spread, the engine matches
//! it immediately under price-time priority and emits one trade event per
//! execution. Everything runs synchronously on the caller's thread.

pub mod cli;
pub mod errors;
pub mod level;
pub mod orderbook;
pub mod orders;
pub mod pool;
pub mod price;
pub mod trade;

pub use errors::Reject;
pub use orderbook::{BookSnapshot, OrderBook, TradeSink};
pub use orders::{Order, Side};
pub use pool::{OrderHandle, OrderPool};
pub use price::Price;
pub use trade::Trade;
