use serde::{Deserialize, Serialize};

use crate::price::Price;

/// A single execution between the heads of the two best levels.
///
/// The price is the **resting** order's price: the side that was already on
/// the book when the aggressor arrived sets the level the trade prints at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub buy_order_id: u64,
    pub sell_order_id: u64,
    pub quantity: u64,
    pub price: Price,
}
