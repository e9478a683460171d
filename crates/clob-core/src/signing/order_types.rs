//! Typed structs signed for the CLOB, and the signed order handed to transport.
//!
//! Field order and type strings follow the CTF Exchange and CLOB auth
//! schemas exactly; any deviation produces a signature the venue rejects.

use alloy_primitives::{keccak256, Address, B256, U256};
use serde::{Deserialize, Serialize};

use super::domain::{ClobAuthDomain, Eip712Domain, OrderSide, SignatureType};
use super::encoding::{
    encode_address, encode_string, encode_uint256, encode_uint8, hash_struct, parse_address,
    parse_uint256, typed_data_hash,
};
use super::key_agent::Signature;
use crate::Result;

const ORDER_TYPE: &[u8] = b"Order(uint256 salt,address maker,address signer,address taker,uint256 tokenId,uint256 makerAmount,uint256 takerAmount,uint256 expiration,uint256 nonce,uint256 feeRateBps,uint8 side,uint8 signatureType)";

const CLOB_AUTH_TYPE: &[u8] =
    b"ClobAuth(address address,string timestamp,uint256 nonce,string message)";

/// Attestation text signed for L1 authentication.
pub const CLOB_AUTH_MESSAGE: &str = "This message attests that I control the given wallet";

/// Raw order data for EIP-712 signing.
///
/// This matches the struct used by the CTF Exchange contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderData {
    /// Per-order salt for uniqueness.
    pub salt: U256,
    /// Maker address (funder).
    pub maker: Address,
    /// Signer address (the key that signs).
    pub signer: Address,
    /// Taker address (zero for any taker).
    pub taker: Address,
    /// Token ID of the outcome being traded.
    pub token_id: U256,
    /// Maker amount in base units.
    pub maker_amount: U256,
    /// Taker amount in base units.
    pub taker_amount: U256,
    /// Order expiration timestamp (unix seconds, 0 for none).
    pub expiration: U256,
    /// Nonce for onchain cancellation.
    pub nonce: U256,
    /// Fee rate in basis points.
    pub fee_rate_bps: U256,
    pub side: OrderSide,
    pub signature_type: SignatureType,
}

impl OrderData {
    /// Compute the EIP-712 struct hash for this order.
    pub fn struct_hash(&self) -> B256 {
        hash_struct(
            keccak256(ORDER_TYPE),
            &[
                encode_uint256(self.salt),
                encode_address(self.maker),
                encode_address(self.signer),
                encode_address(self.taker),
                encode_uint256(self.token_id),
                encode_uint256(self.maker_amount),
                encode_uint256(self.taker_amount),
                encode_uint256(self.expiration),
                encode_uint256(self.nonce),
                encode_uint256(self.fee_rate_bps),
                encode_uint8(self.side.as_u8()),
                encode_uint8(self.signature_type.as_u8()),
            ],
        )
    }

    /// Digest the signer signs for this order under `domain`.
    pub fn signing_hash(&self, domain: &Eip712Domain) -> B256 {
        typed_data_hash(domain.separator(), self.struct_hash())
    }
}

/// L1 authentication payload.
///
/// `ClobAuth(address address,string timestamp,uint256 nonce,string message)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClobAuth {
    pub address: Address,
    /// Unix seconds rendered as a decimal string.
    pub timestamp: String,
    pub nonce: U256,
    pub message: String,
}

impl ClobAuth {
    pub fn new(address: Address, timestamp: i64, nonce: u64) -> Self {
        Self {
            address,
            timestamp: timestamp.to_string(),
            nonce: U256::from(nonce),
            message: CLOB_AUTH_MESSAGE.to_string(),
        }
    }

    pub fn struct_hash(&self) -> B256 {
        hash_struct(
            keccak256(CLOB_AUTH_TYPE),
            &[
                encode_address(self.address),
                encode_string(&self.timestamp),
                encode_uint256(self.nonce),
                encode_string(&self.message),
            ],
        )
    }

    pub fn signing_hash(&self, domain: &ClobAuthDomain) -> B256 {
        typed_data_hash(domain.separator(), self.struct_hash())
    }
}

/// A signed order ready for submission.
///
/// Built only by signing; fields are read through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedOrder {
    /// Order salt (must be a JSON number).
    salt: u64,
    maker: String,
    signer: String,
    taker: String,
    token_id: String,
    maker_amount: String,
    taker_amount: String,
    expiration: String,
    nonce: String,
    fee_rate_bps: String,
    side: OrderSide,
    signature_type: u8,
    /// `0x` + 130 hex characters.
    signature: String,
}

impl SignedOrder {
    /// Create from order data and signature.
    pub(crate) fn from_order_data(order: &OrderData, salt: u64, signature: &Signature) -> Self {
        Self {
            salt,
            maker: order.maker.to_checksum(None),
            signer: order.signer.to_checksum(None),
            taker: order.taker.to_checksum(None),
            token_id: order.token_id.to_string(),
            maker_amount: order.maker_amount.to_string(),
            taker_amount: order.taker_amount.to_string(),
            expiration: order.expiration.to_string(),
            nonce: order.nonce.to_string(),
            fee_rate_bps: order.fee_rate_bps.to_string(),
            side: order.side,
            signature_type: order.signature_type.as_u8(),
            signature: signature.to_hex(),
        }
    }

    pub fn salt(&self) -> u64 {
        self.salt
    }

    pub fn maker(&self) -> &str {
        &self.maker
    }

    pub fn signer(&self) -> &str {
        &self.signer
    }

    pub fn taker(&self) -> &str {
        &self.taker
    }

    pub fn token_id(&self) -> &str {
        &self.token_id
    }

    pub fn maker_amount(&self) -> &str {
        &self.maker_amount
    }

    pub fn taker_amount(&self) -> &str {
        &self.taker_amount
    }

    pub fn expiration(&self) -> &str {
        &self.expiration
    }

    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    pub fn fee_rate_bps(&self) -> &str {
        &self.fee_rate_bps
    }

    pub fn side(&self) -> OrderSide {
        self.side
    }

    pub fn signature_type(&self) -> u8 {
        self.signature_type
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Rebuild the signed struct from the transport fields.
    ///
    /// Fails with an encoding error if any field is malformed.
    pub fn to_order_data(&self) -> Result<OrderData> {
        Ok(OrderData {
            salt: U256::from(self.salt),
            maker: parse_address(&self.maker)?,
            signer: parse_address(&self.signer)?,
            taker: parse_address(&self.taker)?,
            token_id: parse_uint256(&self.token_id)?,
            maker_amount: parse_uint256(&self.maker_amount)?,
            taker_amount: parse_uint256(&self.taker_amount)?,
            expiration: parse_uint256(&self.expiration)?,
            nonce: parse_uint256(&self.nonce)?,
            fee_rate_bps: parse_uint256(&self.fee_rate_bps)?,
            side: self.side,
            signature_type: SignatureType::try_from(self.signature_type)?,
        })
    }

    /// Recover the address that signed this order under `domain`.
    pub fn recover_signer(&self, domain: &Eip712Domain) -> Result<Address> {
        let digest = self.to_order_data()?.signing_hash(domain);
        let signature: Signature = self.signature.parse()?;
        signature.recover_signer(&digest)
    }
}

/// Order type for submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// Good-till-cancelled limit order.
    #[default]
    Gtc,
    /// Fill-or-kill market order.
    Fok,
    /// Good-till-date limit order.
    Gtd,
    /// Fill-and-kill market order.
    Fak,
}

/// Request body for posting an order.
#[derive(Debug, Clone, Serialize)]
pub struct PostOrderRequest {
    pub order: SignedOrder,
    /// API key of the order owner.
    pub owner: String,
    #[serde(rename = "orderType")]
    pub order_type: OrderType,
}

impl PostOrderRequest {
    pub fn new(order: SignedOrder, owner: impl Into<String>, order_type: OrderType) -> Self {
        Self {
            order,
            owner: owner.into(),
            order_type,
        }
    }
}
