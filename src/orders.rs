use serde::{Deserialize, Serialize};

use crate::price::Price;

/// Which side of the market an order rests on.
///
/// Bids are sorted best-first from **highest to lowest price**, asks from
/// **lowest to highest**, so the matching engine always sees the most
/// aggressive order on each side first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,  // Bid
    Sell, // Ask
}

impl Side {
    pub const fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// An order submitted to the book.
///
/// `quantity` is the remaining size and stays strictly positive while the
/// order is live. `timestamp` is caller-supplied and kept for audit only;
/// matching priority comes from queue position, never from the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub id: u64,
    pub side: Side,
    pub price: Price,
    pub quantity: u64,
    pub timestamp: u64,
}

impl Order {
    pub fn new(id: u64, side: Side, price: Price, quantity: u64, timestamp: u64) -> Self {
        Self {
            id,
            side,
            price,
            quantity,
            timestamp,
        }
    }
}

impl Default for Order {
    fn default() -> Self {
        Self {
            id: 0,
            side: Side::Buy,
            price: Price::from_ticks(0),
            quantity: 0,
            timestamp: 0,
        }
    }
}
