//! Order assembly: amounts, salt, struct hash and signature in one step.
//!
//! # Example
//!
//! ```ignore
//! use clob_core::order_builder::{CreateOrderOptions, OrderArgs, OrderBuilder};
//! use clob_core::signing::{KeyAgent, OrderSide, POLYGON_CHAIN_ID};
//! use rust_decimal::Decimal;
//!
//! let builder = OrderBuilder::new(KeyAgent::from_env()?, POLYGON_CHAIN_ID);
//! let args = OrderArgs::new(token_id, Decimal::new(55, 2), Decimal::from(10), OrderSide::Buy);
//! let signed = builder.create_order(&args, CreateOrderOptions::default())?;
//! ```

use alloy_primitives::{Address, U256};
use rand::Rng;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::amounts::{AmountConverter, OrderAmounts, TickSize};
use crate::config::SignerConfig;
use crate::signing::encoding::parse_uint256;
use crate::signing::{
    Eip712Domain, KeyAgent, OrderData, OrderSide, OrderType, SignatureType, SignedOrder,
};
use crate::{Error, Result};

/// Salts stay below 2^53 so they survive a round trip through JSON numbers.
pub const SALT_MASK: u64 = (1 << 53) - 1;

/// Source of per-order salts.
pub trait SaltGenerator: Send + Sync {
    fn next_salt(&self) -> u64;
}

/// `round(unix_seconds × uniform[0, 1))`, masked to 53 bits.
///
/// Draws from the thread-local RNG, so concurrent builders never share a
/// generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeRandomSalt;

impl SaltGenerator for TimeRandomSalt {
    fn next_salt(&self) -> u64 {
        let seconds = chrono::Utc::now().timestamp() as f64;
        let fraction = rand::rng().random::<f64>();
        ((seconds * fraction).round() as u64) & SALT_MASK
    }
}

/// Always returns the same salt. Useful for golden vectors.
#[derive(Debug, Clone, Copy)]
pub struct FixedSalt(pub u64);

impl SaltGenerator for FixedSalt {
    fn next_salt(&self) -> u64 {
        self.0 & SALT_MASK
    }
}

/// A limit order intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderArgs {
    pub token_id: U256,
    pub price: Decimal,
    /// Size in outcome shares.
    pub size: Decimal,
    pub side: OrderSide,
    pub fee_rate_bps: u64,
    pub nonce: U256,
    /// Unix seconds, 0 for no expiration.
    pub expiration: u64,
    /// Zero address for a public order.
    pub taker: Address,
}

impl OrderArgs {
    pub fn new(token_id: U256, price: Decimal, size: Decimal, side: OrderSide) -> Self {
        Self {
            token_id,
            price,
            size,
            side,
            fee_rate_bps: 0,
            nonce: U256::ZERO,
            expiration: 0,
            taker: Address::ZERO,
        }
    }

    /// Build from the wire forms: decimal token id and `"BUY"`/`"SELL"`.
    pub fn parse(token_id: &str, price: Decimal, size: Decimal, side: &str) -> Result<Self> {
        Ok(Self::new(parse_uint256(token_id)?, price, size, side.parse()?))
    }

    pub fn fee_rate_bps(mut self, fee_rate_bps: u64) -> Self {
        self.fee_rate_bps = fee_rate_bps;
        self
    }

    pub fn nonce(mut self, nonce: U256) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn expiration(mut self, expiration: u64) -> Self {
        self.expiration = expiration;
        self
    }

    pub fn taker(mut self, taker: Address) -> Self {
        self.taker = taker;
        self
    }
}

/// A market order intent.
///
/// `amount` is collateral to spend for BUY and shares to sell for SELL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketOrderArgs {
    pub token_id: U256,
    pub amount: Decimal,
    pub side: OrderSide,
    /// Worst acceptable price.
    pub price: Decimal,
    pub fee_rate_bps: u64,
    pub nonce: U256,
    pub taker: Address,
    pub order_type: OrderType,
}

impl MarketOrderArgs {
    pub fn new(token_id: U256, amount: Decimal, side: OrderSide, price: Decimal) -> Self {
        Self {
            token_id,
            amount,
            side,
            price,
            fee_rate_bps: 0,
            nonce: U256::ZERO,
            taker: Address::ZERO,
            order_type: OrderType::Fok,
        }
    }

    pub fn parse(token_id: &str, amount: Decimal, side: &str, price: Decimal) -> Result<Self> {
        Ok(Self::new(parse_uint256(token_id)?, amount, side.parse()?, price))
    }

    pub fn fee_rate_bps(mut self, fee_rate_bps: u64) -> Self {
        self.fee_rate_bps = fee_rate_bps;
        self
    }

    pub fn nonce(mut self, nonce: U256) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn taker(mut self, taker: Address) -> Self {
        self.taker = taker;
        self
    }

    pub fn order_type(mut self, order_type: OrderType) -> Self {
        self.order_type = order_type;
        self
    }
}

/// Per-market settings resolved by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CreateOrderOptions {
    pub tick_size: TickSize,
    pub neg_risk: bool,
}

impl CreateOrderOptions {
    pub fn new(tick_size: TickSize, neg_risk: bool) -> Self {
        Self {
            tick_size,
            neg_risk,
        }
    }
}

/// Turns order intents into signed orders.
#[derive(Debug, Clone)]
pub struct OrderBuilder<S = TimeRandomSalt> {
    agent: KeyAgent,
    chain_id: u64,
    signature_type: SignatureType,
    funder: Option<Address>,
    salt: S,
}

impl OrderBuilder<TimeRandomSalt> {
    /// EOA builder where the signer is also the maker.
    pub fn new(agent: KeyAgent, chain_id: u64) -> Self {
        Self {
            agent,
            chain_id,
            signature_type: SignatureType::Eoa,
            funder: None,
            salt: TimeRandomSalt,
        }
    }

    /// Builder for the chain, signature type and funder in `config`.
    pub fn from_config(agent: KeyAgent, config: &SignerConfig) -> Result<Self> {
        config.contracts(false)?;
        let mut builder = Self::new(agent, config.chain_id).signature_type(config.signature_type);
        builder.funder = config.funder_address()?;
        Ok(builder)
    }
}

impl<S: SaltGenerator> OrderBuilder<S> {
    pub fn signature_type(mut self, signature_type: SignatureType) -> Self {
        self.signature_type = signature_type;
        self
    }

    /// Maker address for proxy and Safe wallets. Defaults to the signer.
    pub fn funder(mut self, funder: Address) -> Self {
        self.funder = Some(funder);
        self
    }

    pub fn with_salt_generator<T: SaltGenerator>(self, salt: T) -> OrderBuilder<T> {
        OrderBuilder {
            agent: self.agent,
            chain_id: self.chain_id,
            signature_type: self.signature_type,
            funder: self.funder,
            salt,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn maker(&self) -> Address {
        self.funder.unwrap_or_else(|| self.agent.address())
    }

    /// Create and sign a limit order.
    pub fn create_order(
        &self,
        args: &OrderArgs,
        options: CreateOrderOptions,
    ) -> Result<SignedOrder> {
        let amounts = AmountConverter::new(options.tick_size)
            .limit_amounts(args.side, args.size, args.price)
            .map_err(|e| log_rejection(e, args.price, options.tick_size))?;

        let order = self.order_data(
            args.token_id,
            amounts,
            args.taker,
            args.fee_rate_bps,
            args.nonce,
            U256::from(args.expiration),
        );
        self.sign(order, options.neg_risk)
    }

    /// Create and sign a market order. Market orders never expire.
    pub fn create_market_order(
        &self,
        args: &MarketOrderArgs,
        options: CreateOrderOptions,
    ) -> Result<SignedOrder> {
        let amounts = AmountConverter::new(options.tick_size)
            .market_amounts(args.side, args.amount, args.price)
            .map_err(|e| log_rejection(e, args.price, options.tick_size))?;

        let order = self.order_data(
            args.token_id,
            amounts,
            args.taker,
            args.fee_rate_bps,
            args.nonce,
            U256::ZERO,
        );
        self.sign(order, options.neg_risk)
    }

    fn order_data(
        &self,
        token_id: U256,
        amounts: OrderAmounts,
        taker: Address,
        fee_rate_bps: u64,
        nonce: U256,
        expiration: U256,
    ) -> OrderData {
        OrderData {
            salt: U256::ZERO,
            maker: self.maker(),
            signer: self.agent.address(),
            taker,
            token_id,
            maker_amount: amounts.maker_amount,
            taker_amount: amounts.taker_amount,
            expiration,
            nonce,
            fee_rate_bps: U256::from(fee_rate_bps),
            side: amounts.side,
            signature_type: self.signature_type,
        }
    }

    fn sign(&self, mut order: OrderData, neg_risk: bool) -> Result<SignedOrder> {
        let domain = Eip712Domain::exchange(self.chain_id, neg_risk)?;

        let salt = self.salt.next_salt();
        order.salt = U256::from(salt);

        let signature = self
            .agent
            .sign_typed_data(domain.separator(), order.struct_hash())?;
        let signed = SignedOrder::from_order_data(&order, salt, &signature);

        info!(
            side = %signed.side(),
            token_id = %signed.token_id(),
            maker_amount = %signed.maker_amount(),
            taker_amount = %signed.taker_amount(),
            neg_risk,
            "Signed order"
        );

        Ok(signed)
    }
}

fn log_rejection(err: Error, price: Decimal, tick_size: TickSize) -> Error {
    warn!(price = %price, tick_size = %tick_size, error = %err, "Order rejected");
    err
}
