//! Core types, policies and the storage trait for the haul backend.
//!
//! This crate is deliberately free of HTTP and database dependencies. It holds
//! the caller-identity resolver, the ownership guard, the default-address
//! transition rules and the carrier query composer; the storage and transport
//! crates depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod address;
pub mod carrier;
pub mod default_flag;
pub mod error;
pub mod identity;
pub mod ownership;
pub mod query;
pub mod store;
pub mod user;

pub use error::{Error, Result};
