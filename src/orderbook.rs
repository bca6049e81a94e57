use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    errors::Reject,
    level::PriceLevel,
    orders::{Order, Side},
    pool::{OrderHandle, OrderPool},
    price::Price,
    trade::Trade,
};

/// Callback invoked synchronously for every execution, inside the matching
/// loop. The sink MUST NOT re-enter the book: mid-loop the head orders hold
/// transiently inconsistent quantities. Buffer events and drain them after
/// the call returns — the `Vec<Trade>` returned by [`OrderBook::add_order`]
/// is exactly that buffer.
pub type TradeSink = Box<dyn FnMut(&Trade) + Send>;

/// Where a live order currently rests: everything cancel and amend need to
/// reach it in O(1). The handle is the stable queue position.
#[derive(Debug, Clone, Copy)]
struct OrderLocation {
    handle: OrderHandle,
    side: Side,
    price: Price,
}

/// Top-of-book depth view: best-first `(price, total_quantity)` pairs,
/// bids descending and asks ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub bids: Vec<(Price, u64)>,
    pub asks: Vec<(Price, u64)>,
}

/// An [`OrderBook`] keeps the resting liquidity of one instrument in two
/// price-indexed sides:
/// - `bids` (buy orders), matched best-first at the **highest** price
/// - `asks` (sell orders), matched best-first at the **lowest** price
///
/// Both sides key a [`BTreeMap`] by ascending price; the best bid is the
/// last entry, the best ask the first. Each price maps to a [`PriceLevel`]
/// FIFO queue, so priority is price first, then arrival order. A locator
/// table resolves order ids to their queue position for O(1) cancel and
/// amend, and all order records live in a block-allocating [`OrderPool`].
///
/// Every public operation runs to completion on the caller's thread and
/// leaves the book uncrossed. The book itself is single-threaded; callers
/// sharing it across threads must serialize access.
pub struct OrderBook {
    bids: BTreeMap<Price, PriceLevel>,
    asks: BTreeMap<Price, PriceLevel>,
    lookup: HashMap<u64, OrderLocation>,
    pool: OrderPool,
    sink: Option<TradeSink>,
    orders_added: u64,
    orders_cancelled: u64,
    orders_matched: u64,
}

impl OrderBook {
    pub fn new() -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            lookup: HashMap::new(),
            pool: OrderPool::new(),
            sink: None,
            orders_added: 0,
            orders_cancelled: 0,
            orders_matched: 0,
        }
    }

    /// Register the per-execution callback. See [`TradeSink`] for the
    /// re-entrancy contract.
    pub fn set_trade_sink(&mut self, sink: impl FnMut(&Trade) + Send + 'static) {
        self.sink = Some(Box::new(sink));
    }

    /// Add a limit order and match it against the opposite side.
    ///
    /// The order is enqueued at the tail of its price level, then the
    /// crossing loop runs; the order may be partially or fully consumed
    /// before this returns. Executions are forwarded to the trade sink and
    /// returned in emission order.
    ///
    /// Rejects zero quantity and ids that are already live; the book is
    /// untouched on rejection.
    pub fn add_order(&mut self, order: Order) -> Result<Vec<Trade>, Reject> {
        if order.quantity == 0 {
            return Err(Reject::ZeroQuantity);
        }
        if self.lookup.contains_key(&order.id) {
            return Err(Reject::DuplicateOrderId(order.id));
        }

        let (id, side, price) = (order.id, order.side, order.price);
        let quantity = order.quantity;
        let handle = self.pool.acquire(order);

        let book_side = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        book_side
            .entry(price)
            .or_insert_with(PriceLevel::new)
            .push_back(&mut self.pool, handle);

        self.lookup.insert(id, OrderLocation { handle, side, price });
        self.orders_added += 1;
        debug!(id, ?side, %price, quantity, "order added");

        Ok(self.match_orders(side))
    }

    /// Cancel a resting order. Returns `false` if the id is unknown.
    ///
    /// Removal never triggers matching: taking liquidity away cannot cross
    /// the book.
    pub fn cancel_order(&mut self, order_id: u64) -> bool {
        let Some(loc) = self.lookup.remove(&order_id) else {
            return false;
        };

        let book_side = match loc.side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        if let Some(level) = book_side.get_mut(&loc.price) {
            level.unlink(&mut self.pool, loc.handle);
            if level.is_empty() {
                book_side.remove(&loc.price);
            }
        }
        self.pool.release(loc.handle);
        self.orders_cancelled += 1;
        debug!(order_id, "order cancelled");
        true
    }

    /// Amend a resting order's price and/or quantity.
    ///
    /// A same-price amend updates the quantity in place and **keeps queue
    /// priority**, whichever direction the quantity moved; matching re-runs
    /// only on an increase, since a decrease cannot cross. A price amend is
    /// cancel-plus-add with the original timestamp: the order re-enters at
    /// the tail of the new level and both lifecycle counters move.
    ///
    /// Unknown ids and zero quantities are rejected; amending to zero is a
    /// cancel, not an amend.
    pub fn amend_order(
        &mut self,
        order_id: u64,
        new_price: Price,
        new_quantity: u64,
    ) -> Result<Vec<Trade>, Reject> {
        if new_quantity == 0 {
            return Err(Reject::ZeroQuantity);
        }
        let Some(&loc) = self.lookup.get(&order_id) else {
            return Err(Reject::UnknownOrder(order_id));
        };

        if new_price == loc.price {
            let old_quantity = self.pool.get(loc.handle).quantity;
            self.pool.get_mut(loc.handle).quantity = new_quantity;

            let book_side = match loc.side {
                Side::Buy => &mut self.bids,
                Side::Sell => &mut self.asks,
            };
            if let Some(level) = book_side.get_mut(&loc.price) {
                level.total_quantity = level.total_quantity - old_quantity + new_quantity;
            }
            debug!(order_id, old_quantity, new_quantity, "order amended in place");

            if new_quantity > old_quantity {
                return Ok(self.match_orders(loc.side));
            }
            return Ok(Vec::new());
        }

        // Price change: lose priority, re-enter at the tail of the new level.
        let resting = *self.pool.get(loc.handle);
        debug!(order_id, old_price = %loc.price, %new_price, "order amended to new price");
        self.cancel_order(order_id);
        self.add_order(Order {
            price: new_price,
            quantity: new_quantity,
            ..resting
        })
    }

    /// Price-time-priority crossing loop.
    ///
    /// While the best bid meets or exceeds the best ask, the heads of the
    /// two best levels trade `min` of their remaining quantities. The
    /// resting side sets the trade price; `aggressor` is the side whose add
    /// or amend re-ran the loop, so the opposite head is the resting one.
    /// Filled heads and emptied levels are removed before the next
    /// iteration, which is what makes the loop terminate.
    fn match_orders(&mut self, aggressor: Side) -> Vec<Trade> {
        let mut trades = Vec::new();

        loop {
            let Some((&bid_price, _)) = self.bids.last_key_value() else {
                break;
            };
            let Some((&ask_price, _)) = self.asks.first_key_value() else {
                break;
            };
            if bid_price < ask_price {
                break;
            }

            let Some(buy) = self.bids.get(&bid_price).and_then(PriceLevel::front) else {
                break;
            };
            let Some(sell) = self.asks.get(&ask_price).and_then(PriceLevel::front) else {
                break;
            };

            let trade_qty = self.pool.get(buy).quantity.min(self.pool.get(sell).quantity);
            let trade_price = match aggressor {
                Side::Buy => ask_price,
                Side::Sell => bid_price,
            };

            let trade = Trade {
                buy_order_id: self.pool.get(buy).id,
                sell_order_id: self.pool.get(sell).id,
                quantity: trade_qty,
                price: trade_price,
            };
            self.orders_matched += 1;
            trace!(
                buy = trade.buy_order_id,
                sell = trade.sell_order_id,
                quantity = trade_qty,
                price = %trade_price,
                "trade"
            );
            if let Some(sink) = self.sink.as_mut() {
                sink(&trade);
            }
            trades.push(trade);

            self.pool.get_mut(buy).quantity -= trade_qty;
            self.pool.get_mut(sell).quantity -= trade_qty;
            if let Some(level) = self.bids.get_mut(&bid_price) {
                level.total_quantity -= trade_qty;
            }
            if let Some(level) = self.asks.get_mut(&ask_price) {
                level.total_quantity -= trade_qty;
            }

            if self.pool.get(buy).quantity == 0 {
                self.remove_filled(Side::Buy, bid_price, buy);
            }
            if self.pool.get(sell).quantity == 0 {
                self.remove_filled(Side::Sell, ask_price, sell);
            }
        }

        trades
    }

    /// Drop a fully-filled head order: unlink, erase the level if empty,
    /// forget the locator entry, recycle the record.
    fn remove_filled(&mut self, side: Side, price: Price, handle: OrderHandle) {
        let id = self.pool.get(handle).id;
        let book_side = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        if let Some(level) = book_side.get_mut(&price) {
            level.unlink(&mut self.pool, handle);
            if level.is_empty() {
                book_side.remove(&price);
            }
        }
        self.lookup.remove(&id);
        self.pool.release(handle);
    }

    /// Copy the top `depth` levels of each side. Read-only and O(depth).
    pub fn snapshot(&self, depth: usize) -> BookSnapshot {
        BookSnapshot {
            bids: self
                .bids
                .iter()
                .rev()
                .take(depth)
                .map(|(price, level)| (*price, level.total_quantity))
                .collect(),
            asks: self
                .asks
                .iter()
                .take(depth)
                .map(|(price, level)| (*price, level.total_quantity))
                .collect(),
        }
    }

    /// Best bid price and the total quantity resting at it.
    pub fn best_bid(&self) -> Option<(Price, u64)> {
        self.bids
            .last_key_value()
            .map(|(price, level)| (*price, level.total_quantity))
    }

    /// Best ask price and the total quantity resting at it.
    pub fn best_ask(&self) -> Option<(Price, u64)> {
        self.asks
            .first_key_value()
            .map(|(price, level)| (*price, level.total_quantity))
    }

    pub fn bid_levels(&self) -> usize {
        self.bids.len()
    }

    pub fn ask_levels(&self) -> usize {
        self.asks.len()
    }

    /// Orders currently resting on the book.
    pub fn live_orders(&self) -> usize {
        self.lookup.len()
    }

    pub fn total_orders_added(&self) -> u64 {
        self.orders_added
    }

    pub fn total_orders_cancelled(&self) -> u64 {
        self.orders_cancelled
    }

    /// Executions emitted since construction or the last [`clear`](Self::clear).
    pub fn total_orders_matched(&self) -> u64 {
        self.orders_matched
    }

    /// Blocks the order pool has allocated so far.
    pub fn pool_blocks(&self) -> usize {
        self.pool.blocks()
    }

    /// Drop all resting orders and reset the counters. Pool blocks are kept
    /// for reuse; the trade sink stays registered.
    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.lookup.clear();
        self.pool.clear();
        self.orders_added = 0;
        self.orders_cancelled = 0;
        self.orders_matched = 0;
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}
