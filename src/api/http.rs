//! HTTP backend for the storefront REST API
//!
//! Thin JSON client over `ureq`. The agent is blocking, so the async trait
//! impls hop through `spawn_blocking`; the cart queue awaits the result and
//! the rest of the application stays responsive.

use crate::api::{CartApi, RemoteCart};
use crate::auth::AuthSession;
use crate::error::{CartError, CartResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Backend responses wrap their payload in a `data` envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Serialize)]
struct AddPayload {
    book_id: u64,
    quantity: u32,
}

#[derive(Debug, Serialize)]
struct UpdatePayload {
    quantity: u32,
}

/// Shared JSON client: base URL, agent, and the session supplying the
/// bearer token
#[derive(Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
    base_url: String,
    auth: Arc<AuthSession>,
}

impl HttpClient {
    /// Create a client for `base_url`, attaching tokens from `auth`
    pub fn new(base_url: impl Into<String>, auth: Arc<AuthSession>) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            base_url: base_url.into(),
            auth,
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Bearer header for the current session
    ///
    /// Cart endpoints require a session; catalog reads work anonymously.
    fn auth_header(&self, required: bool) -> CartResult<Option<String>> {
        match self.auth.token() {
            Some(token) => Ok(Some(format!("Bearer {token}"))),
            None if required => Err(CartError::NotAuthenticated),
            None => Ok(None),
        }
    }

    pub(crate) fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        auth_required: bool,
    ) -> CartResult<T> {
        let url = self.url(path);
        let mut req = self.agent.get(url.as_str());
        if let Some(header) = self.auth_header(auth_required)? {
            req = req.header("Authorization", header.as_str());
        }
        let mut resp = req.call().map_err(from_ureq)?;
        let envelope: Envelope<T> = resp.body_mut().read_json().map_err(from_ureq)?;
        Ok(envelope.data)
    }

    fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> CartResult<T> {
        let url = self.url(path);
        let mut req = self.agent.post(url.as_str());
        if let Some(header) = self.auth_header(true)? {
            req = req.header("Authorization", header.as_str());
        }
        let mut resp = req.send_json(body).map_err(from_ureq)?;
        let envelope: Envelope<T> = resp.body_mut().read_json().map_err(from_ureq)?;
        Ok(envelope.data)
    }

    fn put_json<T: DeserializeOwned>(&self, path: &str, body: &impl Serialize) -> CartResult<T> {
        let url = self.url(path);
        let mut req = self.agent.put(url.as_str());
        if let Some(header) = self.auth_header(true)? {
            req = req.header("Authorization", header.as_str());
        }
        let mut resp = req.send_json(body).map_err(from_ureq)?;
        let envelope: Envelope<T> = resp.body_mut().read_json().map_err(from_ureq)?;
        Ok(envelope.data)
    }

    fn delete_json<T: DeserializeOwned>(&self, path: &str) -> CartResult<T> {
        let url = self.url(path);
        let mut req = self.agent.delete(url.as_str());
        if let Some(header) = self.auth_header(true)? {
            req = req.header("Authorization", header.as_str());
        }
        let mut resp = req.call().map_err(from_ureq)?;
        let envelope: Envelope<T> = resp.body_mut().read_json().map_err(from_ureq)?;
        Ok(envelope.data)
    }

    fn delete_ok(&self, path: &str) -> CartResult<()> {
        let url = self.url(path);
        let mut req = self.agent.delete(url.as_str());
        if let Some(header) = self.auth_header(true)? {
            req = req.header("Authorization", header.as_str());
        }
        req.call().map_err(from_ureq)?;
        Ok(())
    }
}

fn from_ureq(err: ureq::Error) -> CartError {
    match err {
        ureq::Error::StatusCode(status) => CartError::Api { status },
        other => CartError::Transport(other.to_string()),
    }
}

/// Drive a blocking request off the async runtime
pub(crate) async fn run_blocking<T, F>(f: F) -> CartResult<T>
where
    F: FnOnce() -> CartResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CartError::Internal(format!("blocking request task failed: {e}")))?
}

/// [`CartApi`] implementation speaking to the `/cart` endpoints
pub struct HttpCartApi {
    http: HttpClient,
}

impl HttpCartApi {
    /// Wrap an [`HttpClient`]
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl CartApi for HttpCartApi {
    async fn show(&self) -> CartResult<Option<RemoteCart>> {
        let http = self.http.clone();
        run_blocking(move || match http.get_json::<RemoteCart>("cart", true) {
            Ok(cart) => Ok(Some(cart)),
            // A customer who has never carted anything gets a 404, not an
            // empty cart.
            Err(CartError::Api { status: 404 }) => Ok(None),
            Err(e) => Err(e),
        })
        .await
    }

    async fn add(&self, item_id: u64, quantity: u32) -> CartResult<RemoteCart> {
        let http = self.http.clone();
        debug!("POST /cart book_id={} quantity={}", item_id, quantity);
        run_blocking(move || {
            http.post_json(
                "cart",
                &AddPayload {
                    book_id: item_id,
                    quantity,
                },
            )
        })
        .await
    }

    async fn update(&self, line_id: u64, quantity: u32) -> CartResult<RemoteCart> {
        let http = self.http.clone();
        debug!("PUT /cart/{} quantity={}", line_id, quantity);
        run_blocking(move || http.put_json(&format!("cart/{line_id}"), &UpdatePayload { quantity }))
            .await
    }

    async fn remove(&self, line_id: u64) -> CartResult<RemoteCart> {
        let http = self.http.clone();
        debug!("DELETE /cart/{}", line_id);
        run_blocking(move || http.delete_json(&format!("cart/{line_id}"))).await
    }

    async fn clear(&self) -> CartResult<()> {
        let http = self.http.clone();
        debug!("DELETE /cart");
        run_blocking(move || http.delete_ok("cart")).await
    }
}
