//! Integration tests for component interactions.
//!
//! These tests drive the full pipeline: key agent, amount conversion, typed
//! data hashing, order assembly and request authentication.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use alloy_primitives::{Address, U256};
use base64::Engine;
use clob_core::amounts::{get_order_amounts, TickSize};
use clob_core::auth::{ApiCredentials, HeaderBuilder, RequestArgs};
use clob_core::order_builder::{
    CreateOrderOptions, FixedSalt, MarketOrderArgs, OrderArgs, OrderBuilder, SaltGenerator,
};
use clob_core::signing::{
    ClobAuth, ClobAuthDomain, Eip712Domain, KeyAgent, OrderSide, OrderType, PostOrderRequest,
    Signature, POLYGON_CHAIN_ID,
};
use clob_core::Error;
use hmac::{Hmac, Mac};
use rayon::prelude::*;
use rust_decimal::Decimal;
use sha2::Sha256;

// Well-known test key (DO NOT USE IN PRODUCTION)
const TEST_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
const TOKEN_ID: &str =
    "71321045679252212594626385532706912750332728571942532289631379312455583992563";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn signer_address() -> Address {
    TEST_ADDRESS.parse().unwrap()
}

/// Hands out 1, 2, 3, ... from a shared atomic counter.
#[derive(Default)]
struct CounterSalt(AtomicU64);

impl SaltGenerator for CounterSalt {
    fn next_salt(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// BUY 10 @ 0.55 on a 0.01 tick signs 5.5 USDC for 10 shares.
#[test]
fn test_scenario_a_limit_buy() -> anyhow::Result<()> {
    init_tracing();

    let agent = KeyAgent::from_private_key(TEST_PRIVATE_KEY)?;
    let builder = OrderBuilder::new(agent, POLYGON_CHAIN_ID).with_salt_generator(FixedSalt(1234));
    let args = OrderArgs::parse(TOKEN_ID, d("0.55"), d("10.0"), "BUY")?;

    let signed = builder.create_order(&args, CreateOrderOptions::new(TickSize::Hundredth, false))?;

    assert_eq!(signed.maker_amount(), "5500000");
    assert_eq!(signed.taker_amount(), "10000000");
    assert_eq!(signed.side(), OrderSide::Buy);
    assert_eq!(signed.to_order_data()?.side.as_u8(), 0);

    let domain = Eip712Domain::exchange(POLYGON_CHAIN_ID, false)?;
    assert_eq!(signed.recover_signer(&domain)?, signer_address());
    Ok(())
}

/// SELL 10 @ 0.33333 rounds the price to 0.33 before converting.
#[test]
fn test_scenario_b_limit_sell() -> anyhow::Result<()> {
    init_tracing();

    let agent = KeyAgent::from_private_key(TEST_PRIVATE_KEY)?;
    let builder = OrderBuilder::new(agent, POLYGON_CHAIN_ID).with_salt_generator(FixedSalt(99));
    let args = OrderArgs::parse(TOKEN_ID, d("0.33333"), d("10.0"), "SELL")?;

    let signed = builder.create_order(&args, CreateOrderOptions::default())?;

    assert_eq!(signed.maker_amount(), "10000000");
    assert_eq!(signed.taker_amount(), "3300000");
    assert_eq!(signed.side(), OrderSide::Sell);
    assert_eq!(signed.to_order_data()?.side.as_u8(), 1);
    Ok(())
}

/// L2 signature is base64url(HMAC-SHA256(decode(secret), T + method + path + body)).
#[test]
fn test_scenario_c_level2_headers() -> anyhow::Result<()> {
    let agent = KeyAgent::from_private_key(TEST_PRIVATE_KEY)?;
    let headers = HeaderBuilder::new(agent, POLYGON_CHAIN_ID);
    let credentials = ApiCredentials::new("api-key", "c2VjcmV0", "passphrase");
    let request = RequestArgs::new("POST", "/order").with_json_body(&serde_json::json!({"a": 1}))?;

    let built = headers.create_level2_headers_at(1_717_000_000, &credentials, &request)?;

    let key = base64::engine::general_purpose::URL_SAFE.decode("c2VjcmV0")?;
    let mut mac = Hmac::<Sha256>::new_from_slice(&key).unwrap();
    mac.update(b"1717000000POST/order{\"a\":1}");
    let expected = base64::engine::general_purpose::URL_SAFE.encode(mac.finalize().into_bytes());

    assert_eq!(built.signature, expected);
    assert_eq!(built.timestamp, "1717000000");
    assert_eq!(built.address, TEST_ADDRESS);
    Ok(())
}

/// L1 headers carry a ClobAuth signature that recovers to the wallet.
#[test]
fn test_level1_headers_recover() -> anyhow::Result<()> {
    let agent = KeyAgent::from_private_key(TEST_PRIVATE_KEY)?;
    let headers = HeaderBuilder::new(agent, POLYGON_CHAIN_ID).create_level1_headers(0)?;

    let timestamp: i64 = headers.timestamp.parse()?;
    let digest = ClobAuth::new(signer_address(), timestamp, 0)
        .signing_hash(&ClobAuthDomain::new(POLYGON_CHAIN_ID));
    let signature: Signature = headers.signature.parse()?;

    assert_eq!(signature.recover_signer(&digest)?, signer_address());
    assert!(matches!(signature.v(), 27 | 28));
    Ok(())
}

/// Scaled amounts reproduce price × size within the profile's amount precision.
#[test]
fn test_amounts_reconstruct_notional() {
    let scale = Decimal::from(1_000_000u64);
    let sizes = ["1", "2.5", "10", "33.33", "123.45", "1000"];

    for tick in [
        TickSize::Tenth,
        TickSize::Hundredth,
        TickSize::Thousandth,
        TickSize::TenThousandth,
    ] {
        let profile = tick.rounding_profile();
        let tolerance = Decimal::new(1, profile.amount);
        let step = tick.as_decimal();

        let mut price = step;
        while price <= Decimal::ONE - step {
            for size in sizes {
                let size = d(size);
                for side in [OrderSide::Buy, OrderSide::Sell] {
                    let amounts = get_order_amounts(side, size, price, profile).unwrap();
                    let maker = Decimal::from_str(&amounts.maker_amount.to_string()).unwrap() / scale;
                    let taker = Decimal::from_str(&amounts.taker_amount.to_string()).unwrap() / scale;

                    let (shares, collateral) = match side {
                        OrderSide::Buy => (taker, maker),
                        OrderSide::Sell => (maker, taker),
                    };
                    assert_eq!(shares, size.round_dp(profile.size));
                    assert!(
                        (collateral - shares * price).abs() <= tolerance,
                        "{} {} @ {} on {}: collateral {}",
                        side,
                        size,
                        price,
                        tick,
                        collateral
                    );
                }
            }
            // Coarse stride keeps the fine ticks fast
            price += step * Decimal::from(37);
        }
    }
}

/// Prices on the closed interval edges are accepted, one tick outside rejected.
#[test]
fn test_price_boundaries_through_builder() -> anyhow::Result<()> {
    let agent = KeyAgent::from_private_key(TEST_PRIVATE_KEY)?;
    let builder = OrderBuilder::new(agent, POLYGON_CHAIN_ID).with_salt_generator(FixedSalt(5));
    let options = CreateOrderOptions::new(TickSize::Thousandth, false);

    for price in ["0.001", "0.999"] {
        let args = OrderArgs::parse(TOKEN_ID, d(price), d("5"), "BUY")?;
        assert!(builder.create_order(&args, options).is_ok(), "rejected {}", price);
    }
    for price in ["0", "0.0009", "0.9991", "1"] {
        let args = OrderArgs::parse(TOKEN_ID, d(price), d("5"), "BUY")?;
        assert!(
            matches!(builder.create_order(&args, options), Err(Error::InvalidPrice { .. })),
            "accepted {}",
            price
        );
    }
    Ok(())
}

/// Orders signed in parallel from one agent get distinct salts and all verify.
#[test]
fn test_concurrent_signing() -> anyhow::Result<()> {
    init_tracing();

    let agent = KeyAgent::from_private_key(TEST_PRIVATE_KEY)?;
    let builder =
        OrderBuilder::new(agent, POLYGON_CHAIN_ID).with_salt_generator(CounterSalt::default());
    let domain = Eip712Domain::exchange(POLYGON_CHAIN_ID, true)?;

    let orders: Vec<_> = (0..128u64)
        .into_par_iter()
        .map(|i| {
            let args = OrderArgs::new(
                U256::from(1000 + i),
                Decimal::new(50, 2),
                Decimal::from(10),
                OrderSide::Buy,
            );
            builder.create_order(&args, CreateOrderOptions::new(TickSize::Hundredth, true))
        })
        .collect::<Result<_, _>>()?;

    let salts: HashSet<u64> = orders.iter().map(|o| o.salt()).collect();
    assert_eq!(salts.len(), orders.len());

    for order in &orders {
        assert_eq!(order.recover_signer(&domain)?, signer_address());
    }
    Ok(())
}

/// Market BUY spends collateral; the order never expires.
#[test]
fn test_market_order_pipeline() -> anyhow::Result<()> {
    let agent = KeyAgent::from_private_key(TEST_PRIVATE_KEY)?;
    let builder = OrderBuilder::new(agent, POLYGON_CHAIN_ID).with_salt_generator(FixedSalt(11));
    let args = MarketOrderArgs::parse(TOKEN_ID, d("100"), "BUY", d("0.5"))?;

    let signed = builder.create_market_order(&args, CreateOrderOptions::new(TickSize::Tenth, false))?;

    assert_eq!(signed.maker_amount(), "100000000");
    assert_eq!(signed.taker_amount(), "200000000");
    assert_eq!(signed.expiration(), "0");

    let domain = Eip712Domain::exchange(POLYGON_CHAIN_ID, false)?;
    assert_eq!(signed.recover_signer(&domain)?, signer_address());
    Ok(())
}

/// The post body has the transport shapes the venue expects.
#[test]
fn test_post_order_request_json() -> anyhow::Result<()> {
    let agent = KeyAgent::from_private_key(TEST_PRIVATE_KEY)?;
    let builder = OrderBuilder::new(agent, POLYGON_CHAIN_ID).with_salt_generator(FixedSalt(777));
    let args = OrderArgs::parse(TOKEN_ID, d("0.55"), d("10"), "BUY")?;
    let signed = builder.create_order(&args, CreateOrderOptions::default())?;

    let request = PostOrderRequest::new(signed, "owner-key", OrderType::Gtc);
    let json = serde_json::to_value(&request)?;

    assert_eq!(json["orderType"], "GTC");
    assert_eq!(json["owner"], "owner-key");
    assert_eq!(json["order"]["salt"], 777);
    assert_eq!(json["order"]["side"], "BUY");
    assert_eq!(json["order"]["tokenId"], TOKEN_ID);
    assert_eq!(json["order"]["makerAmount"], "5500000");
    assert_eq!(json["order"]["signatureType"], 0);

    let signature = json["order"]["signature"].as_str().unwrap_or_default();
    assert!(signature.starts_with("0x"));
    assert_eq!(signature.len(), 132);
    Ok(())
}

/// Malformed key material never yields an agent.
#[test]
fn test_invalid_key_material() {
    for key in ["", "0x1234", "zz74bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"] {
        assert!(matches!(
            KeyAgent::from_private_key(key),
            Err(Error::InvalidKeyMaterial { .. })
        ));
    }
}
