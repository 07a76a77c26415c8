//! Customer session state
//!
//! Holds the bearer token for the authenticated customer and exposes the
//! "is a valid session present" signal the cart watches. Token storage and
//! refresh against the auth endpoints live outside this crate; this module
//! only persists the token locally so a restarted client resumes its
//! session, mirroring what the storefront keeps in localStorage.

use crate::error::CartResult;
use crate::storage::{KeyValueStore, TOKEN_KEY};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info};

/// Customer session: bearer token plus a watchable authenticated flag
pub struct AuthSession {
    store: Arc<dyn KeyValueStore>,
    token: Mutex<Option<String>>,
    authenticated: watch::Sender<bool>,
}

impl AuthSession {
    /// Create a session, rehydrating any persisted token
    pub fn new(store: Arc<dyn KeyValueStore>) -> CartResult<Self> {
        let token = store.read(TOKEN_KEY)?;
        if token.is_some() {
            debug!("Rehydrated customer session token");
        }
        let (authenticated, _) = watch::channel(token.is_some());
        Ok(Self {
            store,
            token: Mutex::new(token),
            authenticated,
        })
    }

    /// Record a successful login, persisting the token and raising the signal
    pub fn login(&self, token: impl Into<String>) -> CartResult<()> {
        let token = token.into();
        self.store.write(TOKEN_KEY, &token)?;
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token);
        self.authenticated.send_replace(true);
        info!("Customer session started");
        Ok(())
    }

    /// End the session, dropping the token and lowering the signal
    ///
    /// Server-side token invalidation is a collaborator concern; local state
    /// is always cleared even if that call never happens.
    pub fn logout(&self) -> CartResult<()> {
        self.store.remove(TOKEN_KEY)?;
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.authenticated.send_replace(false);
        info!("Customer session ended");
        Ok(())
    }

    /// Current bearer token, if a session is active
    pub fn token(&self) -> Option<String> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a valid session is present
    pub fn is_authenticated(&self) -> bool {
        *self.authenticated.borrow()
    }

    /// Subscribe to authenticated-state transitions
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.authenticated.subscribe()
    }
}
