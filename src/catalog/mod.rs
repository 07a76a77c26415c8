//! Catalog detail lookup
//!
//! Guest-mode cart additions need title, price, cover and author for a book
//! the cart has never seen; this module fetches that detail. Authenticated
//! carts get the same fields embedded in the server cart response and never
//! touch this path.

use crate::api::http::run_blocking;
use crate::api::HttpClient;
use crate::error::CartResult;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Catalog detail for one book, as needed to build a cart line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDetail {
    pub id: u64,

    pub title: String,

    pub price: Decimal,

    #[serde(default)]
    pub cover_image: Option<String>,

    #[serde(default)]
    pub author_name: Option<String>,
}

/// Abstract catalog lookup interface
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch the detail record for `item_id`
    async fn get_item(&self, item_id: u64) -> CartResult<ItemDetail>;
}

/// [`CatalogClient`] implementation against the `/books/{id}` endpoint
pub struct HttpCatalog {
    http: HttpClient,
}

impl HttpCatalog {
    /// Wrap an [`HttpClient`]
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl CatalogClient for HttpCatalog {
    async fn get_item(&self, item_id: u64) -> CartResult<ItemDetail> {
        let http = self.http.clone();
        let path = format!("books/{item_id}");
        run_blocking(move || http.get_json::<ItemDetail>(&path, false)).await
    }
}
