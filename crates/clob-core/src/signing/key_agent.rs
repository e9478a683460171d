//! Key custody and digest signing.
//!
//! [`KeyAgent`] owns the private key for the lifetime of the process, derives
//! the account address once, and signs 32-byte digests. The secp256k1
//! primitive sits behind [`DigestSigner`] so tests can swap in fixed-output
//! signers.

use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::{Address, B256};
use alloy_signer::{Signer, SignerSync};
use alloy_signer_local::PrivateKeySigner;
use tracing::debug;

use super::encoding::typed_data_hash;
use crate::{Error, Result};

/// Environment variable holding the hex-encoded private key.
pub const PRIVATE_KEY_ENV: &str = "WALLET_PRIVATE_KEY";

/// Length in bytes of a recoverable ECDSA signature (r ‖ s ‖ v).
pub const SIGNATURE_LENGTH: usize = 65;

/// Narrow interface over the elliptic-curve signing primitive.
#[cfg_attr(test, mockall::automock)]
pub trait DigestSigner: Send + Sync {
    /// Address of the key this signer holds.
    fn address(&self) -> Address;

    /// Sign a prehashed 32-byte digest, returning `r ‖ s ‖ v`.
    ///
    /// `v` may be either the raw recovery id (0/1) or 27/28.
    fn sign_digest(&self, digest: &B256) -> Result<[u8; SIGNATURE_LENGTH]>;
}

/// [`DigestSigner`] backed by an in-memory secp256k1 key.
pub struct LocalDigestSigner {
    inner: PrivateKeySigner,
}

impl LocalDigestSigner {
    pub fn new(inner: PrivateKeySigner) -> Self {
        Self { inner }
    }
}

impl DigestSigner for LocalDigestSigner {
    fn address(&self) -> Address {
        Signer::address(&self.inner)
    }

    fn sign_digest(&self, digest: &B256) -> Result<[u8; SIGNATURE_LENGTH]> {
        let signature = self
            .inner
            .sign_hash_sync(digest)
            .map_err(|e| Error::Signing {
                message: format!("Failed to sign digest: {}", e),
            })?;
        Ok(signature.as_bytes())
    }
}

/// A 65-byte recoverable signature with `v` in {27, 28}.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_LENGTH]);

impl Signature {
    /// Wrap raw signature bytes, normalizing a 0/1 recovery id to 27/28.
    pub fn from_raw(mut bytes: [u8; SIGNATURE_LENGTH]) -> Result<Self> {
        if bytes[64] < 27 {
            bytes[64] += 27;
        }
        if bytes[64] != 27 && bytes[64] != 28 {
            return Err(Error::Signing {
                message: format!("unexpected recovery id {}", bytes[64]),
            });
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    pub fn r(&self) -> B256 {
        B256::from_slice(&self.0[..32])
    }

    pub fn s(&self) -> B256 {
        B256::from_slice(&self.0[32..64])
    }

    pub fn v(&self) -> u8 {
        self.0[64]
    }

    /// `0x` followed by 130 lowercase hex characters.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Recover the address that produced this signature over `digest`.
    pub fn recover_signer(&self, digest: &B256) -> Result<Address> {
        let signature = alloy_primitives::Signature::from_raw(&self.0).map_err(|e| {
            Error::Signing {
                message: format!("Malformed signature: {}", e),
            }
        })?;
        signature
            .recover_address_from_prehash(digest)
            .map_err(|e| Error::Signing {
                message: format!("Failed to recover signer: {}", e),
            })
    }
}

impl FromStr for Signature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let raw = hex::decode(s.trim_start_matches("0x")).map_err(|e| Error::Encoding {
            message: format!("signature is not hex: {}", e),
        })?;
        let bytes: [u8; SIGNATURE_LENGTH] = raw.try_into().map_err(|raw: Vec<u8>| {
            Error::Encoding {
                message: format!("signature must be 65 bytes, got {}", raw.len()),
            }
        })?;
        Self::from_raw(bytes)
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Signature").field(&self.to_hex()).finish()
    }
}

/// Holds the trading key and signs digests and typed data with it.
///
/// Immutable after construction; clones share the same key.
#[derive(Clone)]
pub struct KeyAgent {
    signer: Arc<dyn DigestSigner>,
    address: Address,
}

impl KeyAgent {
    /// Create an agent from a hex-encoded private key.
    ///
    /// The key must be 64 hex characters, optionally prefixed with `0x`.
    pub fn from_private_key(key: &str) -> Result<Self> {
        let key_clean = key.trim();
        let key_clean = key_clean.strip_prefix("0x").unwrap_or(key_clean);

        if key_clean.len() != 64 {
            return Err(Error::InvalidKeyMaterial {
                message: format!("expected 64 hex characters, got {}", key_clean.len()),
            });
        }

        let bytes = hex::decode(key_clean).map_err(|e| Error::InvalidKeyMaterial {
            message: format!("private key is not hex: {}", e),
        })?;

        let signer = PrivateKeySigner::from_bytes(&B256::from_slice(&bytes)).map_err(|e| {
            Error::InvalidKeyMaterial {
                message: format!("not a valid secp256k1 scalar: {}", e),
            }
        })?;

        Ok(Self::with_signer(Arc::new(LocalDigestSigner::new(signer))))
    }

    /// Load the key from the `WALLET_PRIVATE_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let private_key = std::env::var(PRIVATE_KEY_ENV).map_err(|_| Error::Config {
            message: format!("{} environment variable not set", PRIVATE_KEY_ENV),
        })?;

        Self::from_private_key(&private_key)
    }

    /// Create an agent around any signing primitive.
    pub fn with_signer(signer: Arc<dyn DigestSigner>) -> Self {
        let address = signer.address();
        Self { signer, address }
    }

    /// Get the derived account address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Get the address as an EIP-55 checksummed hex string.
    pub fn address_string(&self) -> String {
        self.address.to_checksum(None)
    }

    /// Sign a 32-byte digest.
    pub fn sign(&self, digest: &B256) -> Result<Signature> {
        let raw = self.signer.sign_digest(digest)?;
        Signature::from_raw(raw)
    }

    /// Sign `keccak256("\x19\x01" ‖ domainSeparator ‖ structHash)`.
    pub fn sign_typed_data(&self, domain_separator: B256, struct_hash: B256) -> Result<Signature> {
        let digest = typed_data_hash(domain_separator, struct_hash);
        debug!(
            signer = %self.address,
            digest = %digest,
            "Signing EIP-712 digest"
        );
        self.sign(&digest)
    }
}

impl std::fmt::Debug for KeyAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose the private key in debug output
        f.debug_struct("KeyAgent")
            .field("address", &self.address_string())
            .finish()
    }
}
