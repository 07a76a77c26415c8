//! Cart line model

use crate::api::RemoteLine;
use crate::catalog::ItemDetail;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One (item, quantity) pairing plus denormalized display fields
///
/// Guest lines are keyed by the catalog item id; server lines carry the
/// server-assigned row id. `quantity` is always at least 1 — removing the
/// last unit deletes the line instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Identifier used by update/remove operations
    pub line_id: u64,

    /// Catalog id of the product
    pub item_id: u64,

    /// Units in the cart, >= 1
    pub quantity: u32,

    /// Unit price captured when the line was created
    pub unit_price: Decimal,

    /// Denormalized title for display
    pub title: String,

    /// Denormalized cover image URL
    #[serde(default)]
    pub cover_image: Option<String>,

    /// Denormalized author display name
    #[serde(default)]
    pub author_name: Option<String>,
}

impl CartLine {
    /// Build a guest line from a catalog detail record
    pub fn from_detail(detail: ItemDetail, quantity: u32) -> Self {
        Self {
            line_id: detail.id,
            item_id: detail.id,
            quantity,
            unit_price: detail.price,
            title: detail.title,
            cover_image: detail.cover_image,
            author_name: detail.author_name,
        }
    }

    /// Optimistic placeholder for an item the mirror has not seen yet;
    /// display fields arrive with the server refresh
    pub fn placeholder(item_id: u64, quantity: u32) -> Self {
        Self {
            line_id: item_id,
            item_id,
            quantity,
            unit_price: Decimal::ZERO,
            title: String::new(),
            cover_image: None,
            author_name: None,
        }
    }

    /// Price contribution of this line
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

impl From<RemoteLine> for CartLine {
    fn from(line: RemoteLine) -> Self {
        Self {
            line_id: line.id,
            item_id: line.book_id,
            quantity: line.quantity,
            unit_price: line.price,
            title: line.title,
            cover_image: line.cover_image,
            author_name: line.author_name,
        }
    }
}
