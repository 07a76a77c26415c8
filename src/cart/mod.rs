//! Dual-mode shopping cart cache
//!
//! One read/write cart interface regardless of authentication mode. While
//! the customer is anonymous the cart lives in local persistence; once a
//! session exists the server cart is authoritative and this module keeps a
//! mirror of it, mutating optimistically and rolling back on rejection.
//! The two sources are never mixed within a single read.
//!
//! All mutations run through one per-cart async lock, so a rollback always
//! restores the exact snapshot it took — no concurrent optimistic write can
//! land in between. Reads go straight to the current state at any time.

mod factory;
mod guest;
mod line;
mod mirror;

pub use factory::create_cart;
pub use guest::GuestCart;
pub use line::CartLine;
pub use mirror::ServerCartMirror;

use crate::api::CartApi;
use crate::auth::AuthSession;
use crate::catalog::CatalogClient;
use crate::error::{CartError, CartResult};
use crate::storage::KeyValueStore;
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Mutex as OpLock;
use tracing::{debug, info, warn};

struct CartState {
    guest: GuestCart,
    mirror: Option<ServerCartMirror>,
    was_authenticated: bool,
}

/// The dual-mode cart store
///
/// Construct one per application session with its collaborators injected;
/// there is no ambient singleton.
pub struct CartCache {
    api: Arc<dyn CartApi>,
    catalog: Arc<dyn CatalogClient>,
    store: Arc<dyn KeyValueStore>,
    auth: Arc<AuthSession>,
    state: Mutex<CartState>,
    // Serializes every mutating operation, sync included
    op_lock: OpLock<()>,
}

impl CartCache {
    /// Create a cart cache, hydrating any persisted guest cart
    pub fn new(
        api: Arc<dyn CartApi>,
        catalog: Arc<dyn CatalogClient>,
        store: Arc<dyn KeyValueStore>,
        auth: Arc<AuthSession>,
    ) -> Self {
        let guest = GuestCart::hydrate(store.as_ref());
        if !guest.is_empty() {
            debug!("Hydrated guest cart with {} line(s)", guest.len());
        }
        let was_authenticated = auth.is_authenticated();
        Self {
            api,
            catalog,
            store,
            auth,
            state: Mutex::new(CartState {
                guest,
                mirror: None,
                was_authenticated,
            }),
            op_lock: OpLock::new(()),
        }
    }

    fn state(&self) -> MutexGuard<'_, CartState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn authenticated(&self) -> bool {
        self.auth.is_authenticated()
    }

    // ----- derived reads -----

    /// Sum of quantities across the live cart's lines
    pub fn count(&self) -> u32 {
        let state = self.state();
        if self.authenticated() {
            state.mirror.as_ref().map(ServerCartMirror::count).unwrap_or(0)
        } else {
            state.guest.count()
        }
    }

    /// The live cart's lines, in insertion (guest) or server-declared order
    pub fn items(&self) -> Vec<CartLine> {
        let state = self.state();
        if self.authenticated() {
            state
                .mirror
                .as_ref()
                .map(|m| m.items.clone())
                .unwrap_or_default()
        } else {
            state.guest.items.clone()
        }
    }

    /// Cart total: computed locally for guests, server-declared (when
    /// present) for authenticated customers
    pub fn total(&self) -> Decimal {
        let state = self.state();
        if self.authenticated() {
            state
                .mirror
                .as_ref()
                .map(ServerCartMirror::total)
                .unwrap_or(Decimal::ZERO)
        } else {
            state.guest.total()
        }
    }

    // ----- operations -----

    /// Refresh the mirror from the server; a no-op for guests
    pub async fn load(&self) -> CartResult<()> {
        let _op = self.op_lock.lock().await;
        self.load_inner().await
    }

    async fn load_inner(&self) -> CartResult<()> {
        if !self.authenticated() {
            return Ok(());
        }
        // No cart on the server yet reads as an empty cart, not an error
        let mirror = match self.api.show().await? {
            Some(cart) => ServerCartMirror::from(cart),
            None => ServerCartMirror::default(),
        };
        debug!("Loaded server cart with {} line(s)", mirror.items.len());
        self.state().mirror = Some(mirror);
        Ok(())
    }

    /// Add `quantity` units of `item_id` to the live cart
    pub async fn add_item(&self, item_id: u64, quantity: u32) -> CartResult<()> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        let _op = self.op_lock.lock().await;

        if !self.authenticated() {
            return self.guest_add(item_id, quantity).await;
        }

        // Optimistic apply, then confirm with the server
        let snapshot = {
            let mut state = self.state();
            let snapshot = state.mirror.clone().unwrap_or_default();
            let mut next = snapshot.clone();
            next.apply_add(item_id, quantity);
            state.mirror = Some(next);
            snapshot
        };

        match self.api.add(item_id, quantity).await {
            Ok(cart) => {
                self.state().mirror = Some(cart.into());
                Ok(())
            }
            Err(e) => {
                warn!("Server rejected cart add for item {}: {}", item_id, e);
                self.state().mirror = Some(snapshot);
                Err(CartError::mutation("add", &e))
            }
        }
    }

    async fn guest_add(&self, item_id: u64, quantity: u32) -> CartResult<()> {
        {
            let mut state = self.state();
            if state.guest.increment(item_id, quantity) {
                state.guest.persist(self.store.as_ref())?;
                return Ok(());
            }
        }

        // Unseen item: materialize display fields from the catalog first
        let detail = self
            .catalog
            .get_item(item_id)
            .await
            .map_err(|e| CartError::lookup(item_id, &e))?;

        let mut state = self.state();
        state.guest.push_line(CartLine::from_detail(detail, quantity));
        state.guest.persist(self.store.as_ref())
    }

    /// Set the quantity of a line; zero removes it
    pub async fn update_quantity(&self, line_id: u64, quantity: u32) -> CartResult<()> {
        let _op = self.op_lock.lock().await;

        if quantity == 0 {
            // A line must never exist with quantity 0
            return self.remove_inner(line_id).await;
        }

        if !self.authenticated() {
            let mut state = self.state();
            if state.guest.set_quantity(line_id, quantity) {
                state.guest.persist(self.store.as_ref())?;
            }
            return Ok(());
        }

        // No optimistic pre-mutation here: on failure the mirror simply
        // stays at the last confirmed state
        match self.api.update(line_id, quantity).await {
            Ok(cart) => {
                self.state().mirror = Some(cart.into());
                Ok(())
            }
            Err(e) => Err(CartError::mutation("update", &e)),
        }
    }

    /// Delete a line from the live cart
    pub async fn remove_item(&self, line_id: u64) -> CartResult<()> {
        let _op = self.op_lock.lock().await;
        self.remove_inner(line_id).await
    }

    async fn remove_inner(&self, line_id: u64) -> CartResult<()> {
        if !self.authenticated() {
            let mut state = self.state();
            if state.guest.remove(line_id) {
                state.guest.persist(self.store.as_ref())?;
            }
            return Ok(());
        }

        let snapshot = {
            let mut state = self.state();
            let snapshot = state.mirror.clone().unwrap_or_default();
            let mut next = snapshot.clone();
            next.apply_remove(line_id);
            state.mirror = Some(next);
            snapshot
        };

        match self.api.remove(line_id).await {
            Ok(cart) => {
                self.state().mirror = Some(cart.into());
                Ok(())
            }
            Err(e) => {
                warn!("Server rejected cart remove for line {}: {}", line_id, e);
                self.state().mirror = Some(snapshot);
                Err(CartError::mutation("remove", &e))
            }
        }
    }

    /// Empty the cart
    ///
    /// The customer's intent is unambiguous, so the local wipe proceeds
    /// even when the remote clear fails; that failure is only logged.
    pub async fn clear(&self) -> CartResult<()> {
        let _op = self.op_lock.lock().await;

        if self.authenticated() {
            match self.api.clear().await {
                Ok(()) => {
                    if let Err(e) = self.load_inner().await {
                        warn!("Could not refresh cart after clear: {}", e);
                        self.state().mirror = Some(ServerCartMirror::default());
                    }
                }
                Err(e) => {
                    warn!("Server cart clear failed, emptying locally: {}", e);
                    self.state().mirror = Some(ServerCartMirror::default());
                }
            }
        }

        let mut state = self.state();
        state.guest.wipe(self.store.as_ref())
    }

    /// Drain the guest cart into the server cart after login
    ///
    /// Lines are submitted sequentially in insertion order, and each leaves
    /// the pending set only once its remote add confirms — so a retry after
    /// a partial failure resumes from the first unconfirmed line instead of
    /// duplicating migrated ones. Returns the number of lines migrated.
    pub async fn sync_on_login(&self) -> CartResult<usize> {
        let _op = self.op_lock.lock().await;
        self.sync_inner().await
    }

    async fn sync_inner(&self) -> CartResult<usize> {
        if !self.authenticated() {
            return Err(CartError::NotAuthenticated);
        }
        if self.state().guest.is_empty() {
            return Ok(0);
        }

        let mut migrated = 0usize;
        loop {
            let next = match self.state().guest.front().cloned() {
                Some(line) => line,
                None => break,
            };

            match self.api.add(next.item_id, next.quantity).await {
                Ok(_) => {
                    let mut state = self.state();
                    state.guest.shift();
                    migrated += 1;
                    let remaining = state.guest.len();
                    // The line is on the server; a persist failure must
                    // still surface with sync progress so the caller can
                    // resume from the in-memory pending set
                    if let Err(e) = state.guest.persist(self.store.as_ref()) {
                        warn!(
                            "Could not persist guest cart after migrating line: {}",
                            e
                        );
                        return Err(CartError::SyncFailed {
                            migrated,
                            remaining,
                            reason: e.to_string(),
                        });
                    }
                }
                Err(e) => {
                    let remaining = self.state().guest.len();
                    warn!(
                        "Guest cart sync stopped after {} line(s), {} pending: {}",
                        migrated, remaining, e
                    );
                    return Err(CartError::SyncFailed {
                        migrated,
                        remaining,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!("Migrated {} guest cart line(s) into server cart", migrated);
        self.state().guest.wipe(self.store.as_ref())?;
        self.load_inner().await?;
        Ok(migrated)
    }

    /// React to an authentication transition
    ///
    /// Call after the auth signal may have flipped. A false-to-true edge
    /// triggers [`Self::sync_on_login`] exactly once; a true-to-false edge
    /// discards the mirror. Guest persistence survives logout, so a
    /// customer who logs back out starts with whatever anonymous cart they
    /// had before.
    pub async fn on_auth_change(&self) -> CartResult<()> {
        let now = self.authenticated();
        let was = {
            let mut state = self.state();
            std::mem::replace(&mut state.was_authenticated, now)
        };

        match (was, now) {
            (false, true) => {
                self.sync_on_login().await?;
                // An empty guest cart skips the sync's refresh; fetch the
                // server cart so the view is populated either way
                let needs_load = self.state().mirror.is_none();
                if needs_load {
                    self.load().await?;
                }
                Ok(())
            }
            (true, false) => {
                let _op = self.op_lock.lock().await;
                self.state().mirror = None;
                debug!("Discarded server cart mirror on logout");
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
