//! Guest cart: the unauthenticated customer's cart
//!
//! Lives entirely in local persistence under the `cart` key. Hydrated once
//! at startup, written back synchronously after every guest mutation, and
//! discarded the moment it has been fully drained into the server cart
//! after login.

use crate::cart::CartLine;
use crate::error::CartResult;
use crate::storage::{KeyValueStore, CART_KEY};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Ordered guest cart lines plus the persistence timestamp
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuestCart {
    /// Lines in insertion order
    pub items: Vec<CartLine>,

    /// When this cart was last written to storage
    pub saved_at: Option<DateTime<Utc>>,
}

impl GuestCart {
    /// Load the persisted guest cart, starting empty when nothing (or
    /// something unreadable) is stored
    pub fn hydrate(store: &dyn KeyValueStore) -> Self {
        let blob = match store.read(CART_KEY) {
            Ok(Some(blob)) => blob,
            Ok(None) => return Self::default(),
            Err(e) => {
                warn!("Could not read persisted guest cart: {}", e);
                return Self::default();
            }
        };

        match serde_json::from_str(&blob) {
            Ok(cart) => cart,
            Err(e) => {
                warn!("Discarding corrupt guest cart blob: {}", e);
                Self::default()
            }
        }
    }

    /// Write the cart back to storage
    pub fn persist(&mut self, store: &dyn KeyValueStore) -> CartResult<()> {
        self.saved_at = Some(Utc::now());
        let blob = serde_json::to_string(self)?;
        store.write(CART_KEY, &blob)?;
        debug!("Persisted guest cart with {} line(s)", self.items.len());
        Ok(())
    }

    /// Empty the cart and delete its persisted copy
    pub fn wipe(&mut self, store: &dyn KeyValueStore) -> CartResult<()> {
        self.items.clear();
        self.saved_at = None;
        store.remove(CART_KEY)
    }

    /// Merge `quantity` into an existing line for `item_id`; false when the
    /// item is not in the cart yet
    pub fn increment(&mut self, item_id: u64, quantity: u32) -> bool {
        match self.items.iter_mut().find(|l| l.item_id == item_id) {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(quantity);
                true
            }
            None => false,
        }
    }

    /// Append a new line
    pub fn push_line(&mut self, line: CartLine) {
        self.items.push(line);
    }

    /// Set the quantity of a line; quantity 0 removes it. Returns false
    /// when no line matches.
    pub fn set_quantity(&mut self, line_id: u64, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(line_id);
        }
        match self.items.iter_mut().find(|l| l.line_id == line_id) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Delete a line. Returns false when no line matches.
    pub fn remove(&mut self, line_id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|l| l.line_id != line_id);
        self.items.len() != before
    }

    /// First pending line, in insertion order
    pub fn front(&self) -> Option<&CartLine> {
        self.items.first()
    }

    /// Drop the first pending line after its migration confirmed
    pub fn shift(&mut self) -> Option<CartLine> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.items.remove(0))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Sum of quantities across all lines
    pub fn count(&self) -> u32 {
        self.items.iter().map(|l| l.quantity).sum()
    }

    /// Sum of line totals
    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartLine::line_total).sum()
    }
}
