//! The order book: every finalized order, keyed by id, most recent first.

use std::collections::HashSet;

use common::OrderId;

use super::{Order, OrderStatus};

/// Single store of finalized orders.
///
/// History is every order in the book; the pending queue is the subset that
/// is still open. Each id appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderBook {
    orders: Vec<Order>,
}

impl OrderBook {
    /// Creates an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the book from persisted history and pending blobs.
    ///
    /// Duplicate ids in history keep their first occurrence. When a pending
    /// blob is present it decides which orders are open: a pending entry
    /// overrides the status and notes of the matching history entry, pending
    /// entries missing from history are added by date, and open history
    /// entries missing from it are closed as delivered. Without a pending
    /// blob, history statuses stand as they are.
    pub fn from_persisted(history: Vec<Order>, pending: Option<Vec<Order>>) -> Self {
        let mut book = Self::new();
        for order in history {
            if book.get(order.id()).is_none() {
                book.orders.push(order);
            }
        }

        let Some(pending) = pending else {
            return book;
        };

        let open: HashSet<OrderId> = pending.iter().map(Order::id).collect();
        for order in book.orders.iter_mut() {
            if order.is_open() && !open.contains(&order.id()) {
                order.close_as_delivered();
            }
        }

        for entry in pending {
            match book.get_mut(entry.id()) {
                Some(existing) => existing.adopt_progress(&entry),
                None => book.insert_by_date(entry),
            }
        }
        book
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Looks up an order by id.
    pub fn get(&self, id: OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| o.id() == id)
    }

    pub(crate) fn get_mut(&mut self, id: OrderId) -> Option<&mut Order> {
        self.orders.iter_mut().find(|o| o.id() == id)
    }

    /// Adds an order as the most recent. Returns false if the id is taken.
    pub fn insert_front(&mut self, order: Order) -> bool {
        if self.get(order.id()).is_some() {
            return false;
        }
        self.orders.insert(0, order);
        true
    }

    pub(crate) fn insert_by_date(&mut self, order: Order) {
        let idx = self
            .orders
            .iter()
            .position(|o| o.date() < order.date())
            .unwrap_or(self.orders.len());
        self.orders.insert(idx, order);
    }

    /// All orders, most recent first.
    pub fn history(&self) -> &[Order] {
        &self.orders
    }

    /// Open orders, most recent first.
    pub fn pending(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter().filter(|o| o.is_open())
    }

    /// Orders in the given status, most recent first.
    pub fn orders_by_status(&self, status: OrderStatus) -> impl Iterator<Item = &Order> {
        self.orders.iter().filter(move |o| o.status() == status)
    }

    /// Puts back a previously taken copy of an order.
    pub(crate) fn restore(&mut self, order: Order) {
        match self.get_mut(order.id()) {
            Some(existing) => *existing = order,
            None => self.insert_by_date(order),
        }
    }

    /// Deletes an order. Returns it if it was present.
    pub fn purge(&mut self, id: OrderId) -> Option<Order> {
        let idx = self.orders.iter().position(|o| o.id() == id)?;
        Some(self.orders.remove(idx))
    }
}
