//! EIP-712 typed data signing for CLOB orders and L1 authentication.
//!
//! # Architecture
//!
//! ```text
//! KeyAgent ──────────── sign_typed_data ──────────┐
//!    ▲                                            │
//!    │                                            ▼
//! DigestSigner        Eip712Domain / ClobAuthDomain + struct hash
//! (local key or mock)            │
//!                                ▼
//!                OrderData ──► SignedOrder ──► PostOrderRequest
//! ```
//!
//! # Example
//!
//! ```ignore
//! use clob_core::signing::{Eip712Domain, KeyAgent, POLYGON_CHAIN_ID};
//!
//! let agent = KeyAgent::from_env()?;
//! let domain = Eip712Domain::exchange(POLYGON_CHAIN_ID, false)?;
//! let signature = agent.sign_typed_data(domain.separator(), order.struct_hash())?;
//! ```

pub mod domain;
pub mod encoding;
pub mod key_agent;
pub mod order_types;

pub use domain::{
    ClobAuthDomain, ContractConfig, Eip712Domain, OrderSide, SignatureType,
    POLYGON_AMOY_CHAIN_ID, POLYGON_CHAIN_ID,
};

pub use key_agent::{DigestSigner, KeyAgent, LocalDigestSigner, Signature};

pub use order_types::{
    ClobAuth, OrderData, OrderType, PostOrderRequest, SignedOrder, CLOB_AUTH_MESSAGE,
};
