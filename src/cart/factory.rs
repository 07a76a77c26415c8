//! Wiring for the production cart stack

use crate::api::{HttpCartApi, HttpClient};
use crate::auth::AuthSession;
use crate::cart::CartCache;
use crate::catalog::HttpCatalog;
use crate::config::Config;
use crate::error::CartResult;
use crate::storage::{FileStore, KeyValueStore};
use std::sync::Arc;

/// Build a cart cache wired to the HTTP backend and file-backed storage
///
/// Returns the auth session alongside the cart so the login flow can drive
/// the signal the cart watches.
pub fn create_cart(config: &Config) -> CartResult<(Arc<AuthSession>, CartCache)> {
    let store: Arc<dyn KeyValueStore> = match &config.storage.dir {
        Some(dir) => Arc::new(FileStore::new(dir.clone())?),
        None => Arc::new(FileStore::open_default()?),
    };

    let auth = Arc::new(AuthSession::new(store.clone())?);
    let http = HttpClient::new(config.api.base_url.clone(), auth.clone());

    let cart = CartCache::new(
        Arc::new(HttpCartApi::new(http.clone())),
        Arc::new(HttpCatalog::new(http)),
        store,
        auth.clone(),
    );

    Ok((auth, cart))
}
