//! EIP-712 `encodeData` helpers.
//!
//! Each field of a typed struct is encoded to a single 32-byte word before the
//! words are concatenated and hashed:
//!
//! | Type      | Word                                   |
//! |-----------|----------------------------------------|
//! | `address` | 20 bytes, left-padded with zeros       |
//! | `uint256` | big-endian integer                     |
//! | `string`  | `keccak256` of the UTF-8 bytes         |
//! | `uint8`   | value in the last byte                 |

use alloy_primitives::{keccak256, Address, B256, U256};
use std::str::FromStr;

use crate::{Error, Result};

/// Prefix of the final typed-data digest (`"\x19\x01"`).
const TYPED_DATA_PREFIX: [u8; 2] = [0x19, 0x01];

pub fn encode_address(address: Address) -> B256 {
    B256::left_padding_from(address.as_slice())
}

pub fn encode_uint256(value: U256) -> B256 {
    B256::from(value.to_be_bytes::<32>())
}

pub fn encode_string(value: &str) -> B256 {
    keccak256(value.as_bytes())
}

pub fn encode_uint8(value: u8) -> B256 {
    let mut word = B256::ZERO;
    word.0[31] = value;
    word
}

/// Inverse of [`encode_uint256`].
pub fn decode_uint256(word: &B256) -> U256 {
    U256::from_be_bytes(word.0)
}

/// Parse a `0x`-prefixed (or bare) 40 hex character address.
pub fn parse_address(value: &str) -> Result<Address> {
    Address::from_str(value.trim())
        .map_err(|e| Error::encoding(format!("malformed address {:?}: {}", value, e)))
}

/// Parse a base-10 unsigned integer that must fit in 256 bits.
pub fn parse_uint256(value: &str) -> Result<U256> {
    let trimmed = value.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::encoding(format!(
            "malformed uint256 {:?}: expected decimal digits",
            value
        )));
    }

    U256::from_str_radix(trimmed, 10)
        .map_err(|e| Error::encoding(format!("malformed uint256 {:?}: {}", value, e)))
}

/// `keccak256(typeHash ‖ field1 ‖ field2 ‖ …)`.
pub fn hash_struct(type_hash: B256, fields: &[B256]) -> B256 {
    let mut encoded = Vec::with_capacity(32 * (fields.len() + 1));
    encoded.extend_from_slice(type_hash.as_slice());
    for field in fields {
        encoded.extend_from_slice(field.as_slice());
    }
    keccak256(&encoded)
}

/// Compute the EIP-712 signing digest:
/// `keccak256("\x19\x01" ‖ domainSeparator ‖ structHash)`.
pub fn typed_data_hash(domain_separator: B256, struct_hash: B256) -> B256 {
    let mut data = [0u8; 66];
    data[..2].copy_from_slice(&TYPED_DATA_PREFIX);
    data[2..34].copy_from_slice(domain_separator.as_slice());
    data[34..].copy_from_slice(struct_hash.as_slice());
    keccak256(data)
}
