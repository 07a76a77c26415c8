//! Bookstall cart core
//!
//! Client-side state for the Bookstall storefront's shopping cart: a
//! guest cart held in local persistence, a mirror of the server cart once
//! the customer is authenticated, optimistic mutation with rollback, and a
//! one-shot guest-to-server merge at login.

pub mod api;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod storage;

pub use cart::{create_cart, CartCache, CartLine};
pub use error::{CartError, CartResult};
