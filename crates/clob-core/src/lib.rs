//! CLOB Core Library
//!
//! Order amount conversion, EIP-712 order signing and request authentication
//! headers for the Polymarket CLOB. Everything here is synchronous and
//! CPU-bound; transport belongs to the caller.

pub mod amounts;
pub mod auth;
pub mod config;
pub mod error;
pub mod order_builder;
pub mod signing;

pub use error::{Error, Result};
