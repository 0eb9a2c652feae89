//! Core types and trait definitions for the Agora forum store.
//!
//! This crate is deliberately free of HTTP and runtime dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod chat;
pub mod comment;
pub mod document;
pub mod error;
pub mod post;
pub mod store;
pub mod user;
pub mod vote;

pub use error::{Error, Result};
pub use user::SYSTEM_USER_ID;
