//! Error types for the Bookstall cart core
//!
//! All modules use `CartResult<T>` as their return type.

use thiserror::Error;

/// Result type alias for cart operations
pub type CartResult<T> = Result<T, CartError>;

/// All errors that can occur in the cart core
#[derive(Error, Debug)]
pub enum CartError {
    // Mutation boundary errors
    #[error("quantity must be a positive integer")]
    InvalidQuantity,

    #[error("could not fetch catalog detail for item {item_id}: {reason}")]
    ItemLookupFailed { item_id: u64, reason: String },

    #[error("cart {operation} was rejected by the server: {reason}")]
    CartMutationFailed {
        operation: &'static str,
        reason: String,
    },

    #[error("cart sync interrupted after migrating {migrated} line(s), {remaining} still pending: {reason}")]
    SyncFailed {
        migrated: usize,
        remaining: usize,
        reason: String,
    },

    // Remote API errors
    #[error("server returned HTTP {status}")]
    Api { status: u16 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("no customer session is active")]
    NotAuthenticated,

    // Storage errors
    #[error("invalid storage key: {0}")]
    StorageKey(String),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // General errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl CartError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an item lookup error from an underlying failure
    pub fn lookup(item_id: u64, source: &CartError) -> Self {
        Self::ItemLookupFailed {
            item_id,
            reason: source.to_string(),
        }
    }

    /// Create a mutation error from an underlying remote failure
    pub fn mutation(operation: &'static str, source: &CartError) -> Self {
        Self::CartMutationFailed {
            operation,
            reason: source.to_string(),
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_)
            | Self::ItemLookupFailed { .. }
            | Self::CartMutationFailed { .. }
            | Self::SyncFailed { .. } => true,
            Self::Api { status } => *status >= 500,
            _ => false,
        }
    }
}
