//! Signer configuration.
//!
//! Values come from the environment (optionally a `.env` file) or from a
//! config file layered with `CLOB_`-prefixed environment variables.

use crate::signing::{ContractConfig, SignatureType, POLYGON_CHAIN_ID};
use crate::signing::encoding::parse_address;
use crate::{Error, Result};
use alloy_primitives::Address;
use serde::Deserialize;
use std::env;
use std::path::Path;

const ENV_PREFIX: &str = "CLOB";

/// Which chain to sign for and on whose behalf.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignerConfig {
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default)]
    pub signature_type: SignatureType,
    /// Maker address when it differs from the signing key (proxy and Safe wallets).
    #[serde(default)]
    pub funder: Option<String>,
}

fn default_chain_id() -> u64 {
    POLYGON_CHAIN_ID
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            signature_type: SignatureType::default(),
            funder: None,
        }
    }
}

impl SignerConfig {
    /// Load configuration from environment variables.
    #[allow(clippy::result_large_err)]
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Load a TOML/JSON/YAML file (format picked by extension), then apply
    /// `CLOB_*` environment overrides.
    #[allow(clippy::result_large_err)]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let parsed: Self = settings.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let chain_id = match lookup("CLOB_CHAIN_ID") {
            Some(raw) => raw.trim().parse().map_err(|_| Error::Config {
                message: format!("CLOB_CHAIN_ID is not a chain id: {:?}", raw),
            })?,
            None => default_chain_id(),
        };

        let signature_type = match lookup("CLOB_SIGNATURE_TYPE") {
            Some(raw) => {
                let ordinal: u8 = raw.trim().parse().map_err(|_| Error::Config {
                    message: format!("CLOB_SIGNATURE_TYPE is not 0, 1 or 2: {:?}", raw),
                })?;
                SignatureType::try_from(ordinal)?
            }
            None => SignatureType::default(),
        };

        let config = Self {
            chain_id,
            signature_type,
            funder: lookup("CLOB_FUNDER").filter(|s| !s.trim().is_empty()),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        ContractConfig::for_chain(self.chain_id, false)?;
        self.funder_address()?;
        Ok(())
    }

    /// Parsed funder address, if one is configured.
    pub fn funder_address(&self) -> Result<Option<Address>> {
        self.funder.as_deref().map(parse_address).transpose()
    }

    /// Contract set for the configured chain.
    pub fn contracts(&self, neg_risk: bool) -> Result<ContractConfig> {
        ContractConfig::for_chain(self.chain_id, neg_risk)
    }
}
