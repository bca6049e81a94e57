//! A price level: the FIFO queue of resting orders at one exact price.
//!
//! The queue is an intrusive doubly-linked list threaded through the pool
//! records, so removal of an arbitrary order is O(1) given the handle
//! obtained at insertion. A plain growable array cannot provide that
//! without breaking FIFO order or leaving tombstones.

use crate::pool::{OrderHandle, OrderPool};

/// FIFO queue of live orders at a single price with its aggregate quantity.
///
/// `total_quantity` is maintained incrementally and always equals the sum of
/// the remaining quantities of the queued orders. A level is never left
/// empty inside a side index; the book erases it as soon as its last order
/// goes away.
#[derive(Debug)]
pub struct PriceLevel {
    head: OrderHandle,
    tail: OrderHandle,
    len: usize,
    pub total_quantity: u64,
}

impl PriceLevel {
    pub(crate) fn new() -> Self {
        Self {
            head: OrderHandle::INVALID,
            tail: OrderHandle::INVALID,
            len: 0,
            total_quantity: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Handle of the order at the front of the queue.
    pub(crate) fn front(&self) -> Option<OrderHandle> {
        if self.head.is_valid() {
            Some(self.head)
        } else {
            None
        }
    }

    /// Enqueue at the tail, preserving arrival order.
    pub(crate) fn push_back(&mut self, pool: &mut OrderPool, handle: OrderHandle) {
        let quantity = pool.get(handle).quantity;
        if self.tail.is_valid() {
            pool.node_mut(self.tail).next = handle;
            pool.node_mut(handle).prev = self.tail;
        } else {
            self.head = handle;
        }
        self.tail = handle;
        self.len += 1;
        self.total_quantity += quantity;
    }

    /// Unlink an order anywhere in the queue, subtracting its remaining
    /// quantity from the aggregate. O(1); the handle must belong to this
    /// level.
    pub(crate) fn unlink(&mut self, pool: &mut OrderPool, handle: OrderHandle) {
        let (prev, next, quantity) = {
            let node = pool.node(handle);
            (node.prev, node.next, node.order.quantity)
        };

        if prev.is_valid() {
            pool.node_mut(prev).next = next;
        } else {
            self.head = next;
        }
        if next.is_valid() {
            pool.node_mut(next).prev = prev;
        } else {
            self.tail = prev;
        }

        let node = pool.node_mut(handle);
        node.prev = OrderHandle::INVALID;
        node.next = OrderHandle::INVALID;

        self.len -= 1;
        self.total_quantity -= quantity;
    }

    /// Walk the queue front to back. Only the invariant checks need this;
    /// the engine itself never scans a level.
    #[cfg(test)]
    pub(crate) fn iter<'a>(&self, pool: &'a OrderPool) -> LevelIter<'a> {
        LevelIter {
            pool,
            cursor: self.head,
        }
    }
}

#[cfg(test)]
pub(crate) struct LevelIter<'a> {
    pool: &'a OrderPool,
    cursor: OrderHandle,
}

#[cfg(test)]
impl Iterator for LevelIter<'_> {
    type Item = OrderHandle;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.cursor.is_valid() {
            return None;
        }
        let handle = self.cursor;
        self.cursor = self.pool.node(handle).next;
        Some(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::{Order, Side};
    use crate::price::Price;

    fn enqueue(pool: &mut OrderPool, level: &mut PriceLevel, id: u64, quantity: u64) -> OrderHandle {
        let handle = pool.acquire(Order::new(
            id,
            Side::Buy,
            Price::from_ticks(1_000_000),
            quantity,
            0,
        ));
        level.push_back(pool, handle);
        handle
    }

    #[test]
    fn test_fifo_order_preserved() {
        let mut pool = OrderPool::new();
        let mut level = PriceLevel::new();

        enqueue(&mut pool, &mut level, 1, 50);
        enqueue(&mut pool, &mut level, 2, 75);
        enqueue(&mut pool, &mut level, 3, 100);

        assert_eq!(level.len(), 3);
        assert_eq!(level.total_quantity, 225);

        let ids: Vec<u64> = level.iter(&pool).map(|h| pool.get(h).id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_unlink_front() {
        let mut pool = OrderPool::new();
        let mut level = PriceLevel::new();

        let h1 = enqueue(&mut pool, &mut level, 1, 50);
        enqueue(&mut pool, &mut level, 2, 75);

        level.unlink(&mut pool, h1);
        assert_eq!(level.len(), 1);
        assert_eq!(level.total_quantity, 75);
        assert_eq!(level.front().map(|h| pool.get(h).id), Some(2));
    }

    #[test]
    fn test_unlink_middle_keeps_neighbors_linked() {
        let mut pool = OrderPool::new();
        let mut level = PriceLevel::new();

        enqueue(&mut pool, &mut level, 1, 10);
        let h2 = enqueue(&mut pool, &mut level, 2, 20);
        enqueue(&mut pool, &mut level, 3, 30);

        level.unlink(&mut pool, h2);

        let ids: Vec<u64> = level.iter(&pool).map(|h| pool.get(h).id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(level.total_quantity, 40);
    }

    #[test]
    fn test_unlink_last_empties_level() {
        let mut pool = OrderPool::new();
        let mut level = PriceLevel::new();

        let h = enqueue(&mut pool, &mut level, 1, 10);
        level.unlink(&mut pool, h);

        assert!(level.is_empty());
        assert_eq!(level.total_quantity, 0);
        assert_eq!(level.front(), None);
    }

    #[test]
    fn test_handles_stay_valid_across_unrelated_removals() {
        let mut pool = OrderPool::new();
        let mut level = PriceLevel::new();

        let h1 = enqueue(&mut pool, &mut level, 1, 10);
        let h2 = enqueue(&mut pool, &mut level, 2, 20);
        let h3 = enqueue(&mut pool, &mut level, 3, 30);

        level.unlink(&mut pool, h1);
        level.unlink(&mut pool, h3);

        // h2 is untouched and still unlinkable.
        assert_eq!(pool.get(h2).id, 2);
        level.unlink(&mut pool, h2);
        assert!(level.is_empty());
    }
}
