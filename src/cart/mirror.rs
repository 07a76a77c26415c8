//! Server cart mirror
//!
//! Local cache of the last known server cart. The server stays
//! authoritative; the mirror only exists so reads need no round trip, and
//! is replaced wholesale after every confirmed mutation.

use crate::api::RemoteCart;
use crate::cart::CartLine;
use rust_decimal::Decimal;

/// Cached server cart state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerCartMirror {
    /// Lines in server-declared order
    pub items: Vec<CartLine>,

    /// Server-declared total, when the backend sends one
    pub total: Option<Decimal>,
}

impl ServerCartMirror {
    /// Sum of quantities across all lines
    pub fn count(&self) -> u32 {
        self.items.iter().map(|l| l.quantity).sum()
    }

    /// Cart total: the server-declared figure when present, otherwise
    /// recomputed from the lines
    pub fn total(&self) -> Decimal {
        self.total.unwrap_or_else(|| self.computed_total())
    }

    /// Total recomputed from line items
    pub fn computed_total(&self) -> Decimal {
        self.items.iter().map(CartLine::line_total).sum()
    }

    /// Optimistically merge an add before the server confirms. A known
    /// item's line grows; an unseen item gets a placeholder line that the
    /// refresh replaces.
    pub fn apply_add(&mut self, item_id: u64, quantity: u32) {
        match self.items.iter_mut().find(|l| l.item_id == item_id) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.items.push(CartLine::placeholder(item_id, quantity)),
        }
        // A stale declared total would misreport until the refresh lands
        self.total = None;
    }

    /// Optimistically drop a line before the server confirms
    pub fn apply_remove(&mut self, line_id: u64) {
        self.items.retain(|l| l.line_id != line_id);
        self.total = None;
    }
}

impl From<RemoteCart> for ServerCartMirror {
    fn from(cart: RemoteCart) -> Self {
        Self {
            items: cart.items.into_iter().map(CartLine::from).collect(),
            total: cart.total,
        }
    }
}
