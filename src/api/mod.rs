//! Remote cart API abstraction
//!
//! Provides a trait for the server-side cart endpoints so the cart cache can
//! be driven by the real HTTP backend or by a mock in tests.

pub mod http;

pub use http::{HttpCartApi, HttpClient};

use crate::error::CartResult;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One line of the server cart, as the backend returns it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteLine {
    /// Server-assigned cart row id
    pub id: u64,

    /// Catalog id of the book in this line
    pub book_id: u64,

    /// Units of the book in the cart
    pub quantity: u32,

    /// Unit price at the time the line was added
    #[serde(default)]
    pub price: Decimal,

    /// Denormalized book title
    #[serde(default)]
    pub title: String,

    /// Denormalized cover image URL
    #[serde(default)]
    pub cover_image: Option<String>,

    /// Denormalized author display name
    #[serde(default)]
    pub author_name: Option<String>,
}

/// Server cart payload: lines plus the server-declared total
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteCart {
    #[serde(default)]
    pub items: Vec<RemoteLine>,

    #[serde(default)]
    pub total: Option<Decimal>,
}

/// Abstract server cart interface
///
/// Every mutation returns the authoritative cart state so the caller can
/// refresh its mirror without an extra round trip.
#[async_trait]
pub trait CartApi: Send + Sync {
    /// Fetch the current server cart; `None` means the server has no cart
    /// for this customer yet
    async fn show(&self) -> CartResult<Option<RemoteCart>>;

    /// Add `quantity` units of `item_id`, merging into an existing line
    async fn add(&self, item_id: u64, quantity: u32) -> CartResult<RemoteCart>;

    /// Set the quantity of cart row `line_id`
    async fn update(&self, line_id: u64, quantity: u32) -> CartResult<RemoteCart>;

    /// Delete cart row `line_id`
    async fn remove(&self, line_id: u64) -> CartResult<RemoteCart>;

    /// Empty the server cart
    async fn clear(&self) -> CartResult<()>;
}
