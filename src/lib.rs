//! CLOB order signer
//!
//! This is the root crate that provides benchmark and integration-test access
//! to the workspace. For actual functionality, use `clob-core` directly:
//!
//! - `amounts`: tick-size rounding and maker/taker amount conversion
//! - `signing`: key custody, EIP-712 domains and order structs
//! - `auth`: L1 (wallet signature) and L2 (HMAC) request headers
//! - `order_builder`: signed order assembly

pub use clob_core as core;
