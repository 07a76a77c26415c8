//! Local key-value persistence
//!
//! The cart core keeps two pieces of browser-local-equivalent state: the
//! serialized guest cart (key `cart`) and the customer session token (key
//! `customer_token`). Both go through the [`KeyValueStore`] trait so the
//! backing medium can be swapped in tests.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::{CartError, CartResult};

/// Storage key for the serialized guest cart
pub const CART_KEY: &str = "cart";

/// Storage key for the customer session token
pub const TOKEN_KEY: &str = "customer_token";

/// Synchronous string key-value storage
///
/// Writes are expected to be cheap and non-blocking; all callers run on the
/// single cart operation queue, so implementations need no locking beyond
/// interior mutability.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any
    fn read(&self, key: &str) -> CartResult<Option<String>>;

    /// Write `value` under `key`, replacing any previous value
    fn write(&self, key: &str, value: &str) -> CartResult<()>;

    /// Remove the value stored under `key`, if any
    fn remove(&self, key: &str) -> CartResult<()>;
}

/// Reject keys that could escape the storage namespace
fn validate_key(key: &str) -> CartResult<()> {
    let ok = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(CartError::StorageKey(key.to_string()))
    }
}
