//! EIP-712 domain separators for Polymarket CLOB.
//!
//! Orders are signed against the CTF Exchange domain (which names a verifying
//! contract). L1 authentication uses the `ClobAuthDomain`, which has none.

use alloy_primitives::{address, keccak256, Address, B256, U256};
use serde::{Deserialize, Serialize};

use super::encoding::{encode_address, encode_string, encode_uint256, hash_struct};
use crate::{Error, Result};

/// Chain ID for Polygon mainnet.
pub const POLYGON_CHAIN_ID: u64 = 137;

/// Chain ID for Polygon Amoy testnet.
pub const POLYGON_AMOY_CHAIN_ID: u64 = 80002;

const EXCHANGE_DOMAIN_NAME: &str = "Polymarket CTF Exchange";
const CLOB_AUTH_DOMAIN_NAME: &str = "ClobAuthDomain";
const DOMAIN_VERSION: &str = "1";

const EXCHANGE_DOMAIN_TYPE: &[u8] =
    b"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";
const CLOB_AUTH_DOMAIN_TYPE: &[u8] = b"EIP712Domain(string name,string version,uint256 chainId)";

/// Contract addresses the exchange settles against on a given chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractConfig {
    /// Exchange contract, used as the order domain's verifying contract.
    pub exchange: Address,
    /// Collateral (USDC) token.
    pub collateral: Address,
    /// Conditional tokens framework contract.
    pub conditional_tokens: Address,
}

impl ContractConfig {
    /// Look up the contract set for a chain, choosing the neg-risk exchange
    /// when `neg_risk` is set.
    pub fn for_chain(chain_id: u64, neg_risk: bool) -> Result<Self> {
        let config = match (chain_id, neg_risk) {
            (POLYGON_CHAIN_ID, false) => Self {
                exchange: address!("0x4bFb41d5B3570DeFd03C39a9A4D8dE6Bd8B8982E"),
                collateral: address!("0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174"),
                conditional_tokens: address!("0x4D97DCd97eC945f40cF65F87097ACe5EA0476045"),
            },
            (POLYGON_CHAIN_ID, true) => Self {
                exchange: address!("0xC5d563A36AE78145C45a50134d48A1215220f80a"),
                collateral: address!("0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174"),
                conditional_tokens: address!("0x4D97DCd97eC945f40cF65F87097ACe5EA0476045"),
            },
            (POLYGON_AMOY_CHAIN_ID, false) => Self {
                exchange: address!("0xdFE02Eb6733538f8Ea35D585af8DE5958AD99E40"),
                collateral: address!("0x9c4e1703476e875070ee25b56a58b008cfb8fa78"),
                conditional_tokens: address!("0x69308FB512518e39F9b16112fA8d994F4e2Bf8bB"),
            },
            (POLYGON_AMOY_CHAIN_ID, true) => Self {
                exchange: address!("0xd91E80cF2E7be2e162c6513ceD06f1dD0dA35296"),
                collateral: address!("0x9c4e1703476e875070ee25b56a58b008cfb8fa78"),
                conditional_tokens: address!("0x69308FB512518e39F9b16112fA8d994F4e2Bf8bB"),
            },
            (other, _) => return Err(Error::UnsupportedChain(other)),
        };
        Ok(config)
    }
}

/// EIP-712 domain for order signing.
#[derive(Debug, Clone)]
pub struct Eip712Domain {
    /// Domain name.
    pub name: String,
    /// Domain version.
    pub version: String,
    /// Chain ID.
    pub chain_id: U256,
    /// Verifying contract address.
    pub verifying_contract: Address,
}

impl Eip712Domain {
    /// Create the CTF Exchange domain for a chain, picking the neg-risk
    /// exchange when requested.
    pub fn exchange(chain_id: u64, neg_risk: bool) -> Result<Self> {
        let contracts = ContractConfig::for_chain(chain_id, neg_risk)?;
        Ok(Self::custom(
            EXCHANGE_DOMAIN_NAME,
            DOMAIN_VERSION,
            chain_id,
            contracts.exchange,
        ))
    }

    /// Create domain with custom parameters.
    pub fn custom(
        name: impl Into<String>,
        version: impl Into<String>,
        chain_id: u64,
        verifying_contract: Address,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            chain_id: U256::from(chain_id),
            verifying_contract,
        }
    }

    /// Compute the EIP-712 domain separator hash.
    pub fn separator(&self) -> B256 {
        hash_struct(
            keccak256(EXCHANGE_DOMAIN_TYPE),
            &[
                encode_string(&self.name),
                encode_string(&self.version),
                encode_uint256(self.chain_id),
                encode_address(self.verifying_contract),
            ],
        )
    }
}

/// EIP-712 domain for CLOB authentication (no verifyingContract).
#[derive(Debug, Clone)]
pub struct ClobAuthDomain {
    pub name: String,
    pub version: String,
    pub chain_id: U256,
}

impl ClobAuthDomain {
    pub fn new(chain_id: u64) -> Self {
        Self {
            name: CLOB_AUTH_DOMAIN_NAME.to_string(),
            version: DOMAIN_VERSION.to_string(),
            chain_id: U256::from(chain_id),
        }
    }

    /// Compute the EIP-712 domain separator hash.
    pub fn separator(&self) -> B256 {
        hash_struct(
            keccak256(CLOB_AUTH_DOMAIN_TYPE),
            &[
                encode_string(&self.name),
                encode_string(&self.version),
                encode_uint256(self.chain_id),
            ],
        )
    }
}

/// Order side (buy/sell).
///
/// Serialized as `"BUY"` / `"SELL"`; signed as `0` / `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    Buy = 0,
    Sell = 1,
}

impl OrderSide {
    /// Get the numeric value for signing.
    pub fn as_u8(&self) -> u8 {
        match self {
            OrderSide::Buy => 0,
            OrderSide::Sell => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderSide {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "BUY" => Ok(OrderSide::Buy),
            "SELL" => Ok(OrderSide::Sell),
            other => Err(Error::InvalidSide(other.to_string())),
        }
    }
}

impl TryFrom<u8> for OrderSide {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(OrderSide::Buy),
            1 => Ok(OrderSide::Sell),
            other => Err(Error::InvalidSide(other.to_string())),
        }
    }
}

/// Signature type for orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SignatureType {
    /// EOA signature (most common).
    #[default]
    Eoa = 0,
    /// Polymarket proxy wallet.
    PolyProxy = 1,
    /// Gnosis Safe wallet.
    PolyGnosisSafe = 2,
}

impl SignatureType {
    /// Get the numeric value for signing.
    pub fn as_u8(&self) -> u8 {
        match self {
            SignatureType::Eoa => 0,
            SignatureType::PolyProxy => 1,
            SignatureType::PolyGnosisSafe => 2,
        }
    }
}

impl TryFrom<u8> for SignatureType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(SignatureType::Eoa),
            1 => Ok(SignatureType::PolyProxy),
            2 => Ok(SignatureType::PolyGnosisSafe),
            other => Err(Error::Encoding {
                message: format!("unknown signature type {}", other),
            }),
        }
    }
}

impl From<SignatureType> for u8 {
    fn from(value: SignatureType) -> Self {
        value.as_u8()
    }
}
