//! Authentication headers for CLOB requests.
//!
//! Level 1 proves control of the wallet with an EIP-712 `ClobAuth` signature
//! and is used to create or derive API keys. Level 2 signs each request with
//! HMAC-SHA256 under the API secret.

use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use tracing::debug;

use crate::signing::{ClobAuth, ClobAuthDomain, KeyAgent};
use crate::{Error, Result};

pub const POLY_ADDRESS: &str = "POLY_ADDRESS";
pub const POLY_SIGNATURE: &str = "POLY_SIGNATURE";
pub const POLY_TIMESTAMP: &str = "POLY_TIMESTAMP";
pub const POLY_NONCE: &str = "POLY_NONCE";
pub const POLY_API_KEY: &str = "POLY_API_KEY";
pub const POLY_PASSPHRASE: &str = "POLY_PASSPHRASE";

/// What a client holding the given material is able to sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AuthLevel {
    /// Public endpoints only.
    L0,
    /// Wallet key present.
    L1,
    /// Wallet key and API credentials present.
    L2,
}

impl AuthLevel {
    pub fn resolve(has_key: bool, has_credentials: bool) -> Self {
        match (has_key, has_credentials) {
            (true, true) => AuthLevel::L2,
            (true, false) => AuthLevel::L1,
            (false, _) => AuthLevel::L0,
        }
    }
}

/// API credentials for authenticated CLOB requests.
#[derive(Clone)]
pub struct ApiCredentials {
    /// API key (derived from wallet).
    pub api_key: String,
    /// Base64url-encoded secret for HMAC signing.
    pub api_secret: String,
    pub api_passphrase: String,
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &"[REDACTED]")
            .field("api_secret", &"[REDACTED]")
            .field("api_passphrase", &"[REDACTED]")
            .finish()
    }
}

impl ApiCredentials {
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        api_passphrase: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            api_passphrase: api_passphrase.into(),
        }
    }

    /// Load from environment variables.
    #[allow(clippy::result_large_err)]
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_key = std::env::var("POLY_API_KEY").map_err(|_| Error::Config {
            message: "POLY_API_KEY environment variable not set".to_string(),
        })?;
        let api_secret = std::env::var("POLY_API_SECRET").map_err(|_| Error::Config {
            message: "POLY_API_SECRET environment variable not set".to_string(),
        })?;
        let api_passphrase = std::env::var("POLY_API_PASSPHRASE").map_err(|_| Error::Config {
            message: "POLY_API_PASSPHRASE environment variable not set".to_string(),
        })?;

        Ok(Self {
            api_key,
            api_secret,
            api_passphrase,
        })
    }
}

/// The parts of an HTTP request covered by the L2 signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestArgs {
    pub method: String,
    pub request_path: String,
    /// Serialized JSON body, signed verbatim.
    pub body: Option<String>,
}

impl RequestArgs {
    pub fn new(method: impl Into<String>, request_path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            request_path: request_path.into(),
            body: None,
        }
    }

    /// Serialize `body` compactly and attach it.
    pub fn with_json_body<T: Serialize>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_string(body)?);
        Ok(self)
    }
}

/// Level-1 headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L1Headers {
    pub address: String,
    pub signature: String,
    pub timestamp: String,
    pub nonce: String,
}

impl L1Headers {
    pub fn to_headers(&self) -> Vec<(&'static str, String)> {
        vec![
            (POLY_ADDRESS, self.address.clone()),
            (POLY_SIGNATURE, self.signature.clone()),
            (POLY_TIMESTAMP, self.timestamp.clone()),
            (POLY_NONCE, self.nonce.clone()),
        ]
    }
}

/// Level-2 headers.
#[derive(Clone, PartialEq, Eq)]
pub struct L2Headers {
    pub address: String,
    pub signature: String,
    pub timestamp: String,
    pub api_key: String,
    pub passphrase: String,
}

impl std::fmt::Debug for L2Headers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("L2Headers")
            .field("address", &self.address)
            .field("signature", &self.signature)
            .field("timestamp", &self.timestamp)
            .field("api_key", &"[REDACTED]")
            .field("passphrase", &"[REDACTED]")
            .finish()
    }
}

impl L2Headers {
    pub fn to_headers(&self) -> Vec<(&'static str, String)> {
        vec![
            (POLY_ADDRESS, self.address.clone()),
            (POLY_SIGNATURE, self.signature.clone()),
            (POLY_TIMESTAMP, self.timestamp.clone()),
            (POLY_API_KEY, self.api_key.clone()),
            (POLY_PASSPHRASE, self.passphrase.clone()),
        ]
    }
}

/// Builds L1 and L2 headers for one wallet on one chain.
#[derive(Debug, Clone)]
pub struct HeaderBuilder {
    agent: KeyAgent,
    domain: ClobAuthDomain,
}

impl HeaderBuilder {
    pub fn new(agent: KeyAgent, chain_id: u64) -> Self {
        Self {
            agent,
            domain: ClobAuthDomain::new(chain_id),
        }
    }

    pub fn agent(&self) -> &KeyAgent {
        &self.agent
    }

    /// L1 headers stamped with the current time.
    pub fn create_level1_headers(&self, nonce: u64) -> Result<L1Headers> {
        self.create_level1_headers_at(chrono::Utc::now().timestamp(), nonce)
    }

    /// L1 headers for an explicit unix timestamp.
    pub fn create_level1_headers_at(&self, timestamp: i64, nonce: u64) -> Result<L1Headers> {
        let auth = ClobAuth::new(self.agent.address(), timestamp, nonce);
        let signature = self
            .agent
            .sign_typed_data(self.domain.separator(), auth.struct_hash())?;

        debug!(address = %self.agent.address(), timestamp, nonce, "Built L1 headers");

        Ok(L1Headers {
            address: self.agent.address_string(),
            signature: signature.to_hex(),
            timestamp: auth.timestamp,
            nonce: nonce.to_string(),
        })
    }

    /// L2 headers stamped with the current time.
    pub fn create_level2_headers(
        &self,
        credentials: &ApiCredentials,
        request: &RequestArgs,
    ) -> Result<L2Headers> {
        self.create_level2_headers_at(chrono::Utc::now().timestamp(), credentials, request)
    }

    /// L2 headers for an explicit unix timestamp.
    pub fn create_level2_headers_at(
        &self,
        timestamp: i64,
        credentials: &ApiCredentials,
        request: &RequestArgs,
    ) -> Result<L2Headers> {
        let timestamp = timestamp.to_string();
        let signature = build_hmac_signature(
            &credentials.api_secret,
            &timestamp,
            &request.method,
            &request.request_path,
            request.body.as_deref(),
        )?;

        debug!(
            address = %self.agent.address(),
            method = %request.method,
            path = %request.request_path,
            "Built L2 headers"
        );

        Ok(L2Headers {
            address: self.agent.address_string(),
            signature,
            timestamp,
            api_key: credentials.api_key.clone(),
            passphrase: credentials.api_passphrase.clone(),
        })
    }
}

/// `base64url(HMAC-SHA256(secret, timestamp ‖ method ‖ path ‖ body))`.
///
/// The secret is base64url, padded or not. Single quotes in the body are
/// replaced with double quotes before signing.
pub fn build_hmac_signature(
    secret: &str,
    timestamp: &str,
    method: &str,
    request_path: &str,
    body: Option<&str>,
) -> Result<String> {
    let mut message = format!("{}{}{}", timestamp, method, request_path);
    if let Some(body) = body {
        message.push_str(&body.replace('\'', "\""));
    }

    let secret_bytes = decode_secret(secret)?;

    let mut mac =
        Hmac::<Sha256>::new_from_slice(&secret_bytes).map_err(|e| Error::InvalidCredentialSecret {
            message: format!("Failed to create HMAC: {}", e),
        })?;
    mac.update(message.as_bytes());

    Ok(base64::engine::general_purpose::URL_SAFE.encode(mac.finalize().into_bytes()))
}

fn decode_secret(secret: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::URL_SAFE
        .decode(secret)
        .or_else(|_| base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(secret))
        .map_err(|e| Error::InvalidCredentialSecret {
            message: format!("secret is not base64url: {}", e),
        })
}
