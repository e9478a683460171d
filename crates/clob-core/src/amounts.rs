//! Conversion of human price/size into the integer amounts that get signed.
//!
//! The venue and counterpart SDKs re-derive these amounts independently, so
//! the rounding here must match the official clients' decisions exactly,
//! including their two-stage precision repair. All arithmetic is done in
//! `Decimal`; amounts leave this module scaled by 10^6 and truncated.

use alloy_primitives::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::signing::OrderSide;
use crate::{Error, Result};

/// Collateral and outcome tokens both carry 6 decimals.
pub const TOKEN_DECIMALS: u32 = 6;

/// Digits kept by the first repair stage beyond the profile's amount decimals.
const REPAIR_GUARD_DIGITS: u32 = 4;

/// `decimal_places` looks at this many fractional digits, like `%.10f`.
const DECIMAL_PLACES_PRECISION: u32 = 10;

/// Minimum price increment of a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TickSize {
    #[serde(rename = "0.1")]
    Tenth,
    #[default]
    #[serde(rename = "0.01")]
    Hundredth,
    #[serde(rename = "0.001")]
    Thousandth,
    #[serde(rename = "0.0001")]
    TenThousandth,
}

impl TickSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            TickSize::Tenth => "0.1",
            TickSize::Hundredth => "0.01",
            TickSize::Thousandth => "0.001",
            TickSize::TenThousandth => "0.0001",
        }
    }

    pub fn as_decimal(&self) -> Decimal {
        match self {
            TickSize::Tenth => Decimal::new(1, 1),
            TickSize::Hundredth => Decimal::new(1, 2),
            TickSize::Thousandth => Decimal::new(1, 3),
            TickSize::TenThousandth => Decimal::new(1, 4),
        }
    }

    /// Rounding precision used for orders on a market with this tick size.
    pub fn rounding_profile(&self) -> RoundingProfile {
        match self {
            TickSize::Tenth => RoundingProfile::new(1, 2, 3),
            TickSize::Hundredth => RoundingProfile::new(2, 2, 4),
            TickSize::Thousandth => RoundingProfile::new(3, 2, 5),
            TickSize::TenThousandth => RoundingProfile::new(4, 2, 6),
        }
    }
}

impl std::fmt::Display for TickSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TickSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "0.1" => Ok(TickSize::Tenth),
            "0.01" => Ok(TickSize::Hundredth),
            "0.001" => Ok(TickSize::Thousandth),
            "0.0001" => Ok(TickSize::TenThousandth),
            other => Err(Error::Encoding {
                message: format!("unknown tick size {:?}", other),
            }),
        }
    }
}

/// Decimal places allowed for price, size and derived amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundingProfile {
    pub price: u32,
    pub size: u32,
    pub amount: u32,
}

impl RoundingProfile {
    pub const fn new(price: u32, size: u32, amount: u32) -> Self {
        Self {
            price,
            size,
            amount,
        }
    }
}

/// Integer amounts and side ordinal for the signed order struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderAmounts {
    pub side: OrderSide,
    pub maker_amount: U256,
    pub taker_amount: U256,
}

impl OrderAmounts {
    pub fn side_ordinal(&self) -> u8 {
        self.side.as_u8()
    }
}

/// Price/size converter bound to one market's tick size.
///
/// Unlike the free functions it validates the price before converting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountConverter {
    tick_size: TickSize,
}

impl AmountConverter {
    pub fn new(tick_size: TickSize) -> Self {
        Self { tick_size }
    }

    pub fn tick_size(&self) -> TickSize {
        self.tick_size
    }

    /// Amounts for a resting limit order of `size` shares at `price`.
    pub fn limit_amounts(
        &self,
        side: OrderSide,
        size: Decimal,
        price: Decimal,
    ) -> Result<OrderAmounts> {
        validate_price(price, self.tick_size)?;
        get_order_amounts(side, size, price, self.tick_size.rounding_profile())
    }

    /// Amounts for a market order. `amount` is collateral for BUY and shares
    /// for SELL.
    pub fn market_amounts(
        &self,
        side: OrderSide,
        amount: Decimal,
        price: Decimal,
    ) -> Result<OrderAmounts> {
        validate_price(price, self.tick_size)?;
        get_market_order_amounts(side, amount, price, self.tick_size.rounding_profile())
    }
}

/// Check `tick_size <= price <= 1 - tick_size`.
pub fn validate_price(price: Decimal, tick_size: TickSize) -> Result<()> {
    let tick = tick_size.as_decimal();
    if price < tick || price > Decimal::ONE - tick {
        return Err(Error::InvalidPrice {
            price,
            tick_size: tick,
        });
    }
    Ok(())
}

/// Maker/taker amounts for a limit order.
///
/// BUY: the taker leg is the share size and the maker pays `size × price`.
/// SELL: the maker leg is the share size and receives `size × price`.
pub fn get_order_amounts(
    side: OrderSide,
    size: Decimal,
    price: Decimal,
    profile: RoundingProfile,
) -> Result<OrderAmounts> {
    ensure_non_negative(size, "size")?;
    let raw_price = round_normal(price, profile.price);
    let shares = round_down(size, profile.size);
    let collateral = fit_to_amount_precision(checked_product(shares, raw_price)?, profile.amount);

    let (maker, taker) = match side {
        OrderSide::Buy => (collateral, shares),
        OrderSide::Sell => (shares, collateral),
    };

    debug!(
        side = %side,
        price = %raw_price,
        maker = %maker,
        taker = %taker,
        "Computed limit order amounts"
    );

    Ok(OrderAmounts {
        side,
        maker_amount: to_token_decimals(maker)?,
        taker_amount: to_token_decimals(taker)?,
    })
}

/// Maker/taker amounts for a market order.
///
/// BUY spends `amount` collateral and receives `amount ÷ price` shares.
/// SELL gives `amount` shares and receives `amount × price` collateral.
pub fn get_market_order_amounts(
    side: OrderSide,
    amount: Decimal,
    price: Decimal,
    profile: RoundingProfile,
) -> Result<OrderAmounts> {
    ensure_non_negative(amount, "amount")?;
    let raw_price = round_normal(price, profile.price);
    let maker = round_down(amount, profile.size);

    let raw_taker = match side {
        OrderSide::Buy => maker.checked_div(raw_price).ok_or(Error::InvalidPrice {
            price,
            tick_size: Decimal::new(1, profile.price),
        })?,
        OrderSide::Sell => checked_product(maker, raw_price)?,
    };
    let taker = fit_to_amount_precision(raw_taker, profile.amount);

    debug!(
        side = %side,
        price = %raw_price,
        maker = %maker,
        taker = %taker,
        "Computed market order amounts"
    );

    Ok(OrderAmounts {
        side,
        maker_amount: to_token_decimals(maker)?,
        taker_amount: to_token_decimals(taker)?,
    })
}

fn checked_product(quantity: Decimal, price: Decimal) -> Result<Decimal> {
    quantity
        .checked_mul(price)
        .ok_or_else(|| Error::InvalidAmount {
            message: format!("{} x {} overflows", quantity, price),
        })
}

fn ensure_non_negative(value: Decimal, what: &str) -> Result<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(Error::InvalidAmount {
            message: format!("{} must not be negative, got {}", what, value),
        });
    }
    Ok(())
}

/// Bring a derived leg down to `amount_decimals` places.
///
/// First bump up at `amount_decimals + 4` places, which absorbs a trailing run
/// of nines; only if that still leaves too many places, truncate.
fn fit_to_amount_precision(value: Decimal, amount_decimals: u32) -> Decimal {
    if decimal_places(value) <= amount_decimals {
        return value;
    }

    let bumped = round_up(value, amount_decimals + REPAIR_GUARD_DIGITS);
    if decimal_places(bumped) > amount_decimals {
        round_down(bumped, amount_decimals)
    } else {
        bumped
    }
}

/// Half-up rounding.
pub fn round_normal(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
}

/// Truncation toward zero.
pub fn round_down(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp_with_strategy(decimals, RoundingStrategy::ToZero)
}

/// Truncate then add one unit in the last place.
///
/// The unit is added even when `value` already fits in `decimals` places.
pub fn round_up(value: Decimal, decimals: u32) -> Decimal {
    value.trunc_with_scale(decimals) + Decimal::new(1, decimals)
}

/// Significant fractional digits, looking no further than 10 places.
pub fn decimal_places(value: Decimal) -> u32 {
    value
        .round_dp(DECIMAL_PLACES_PRECISION)
        .normalize()
        .scale()
}

/// Scale by 10^6 and truncate to an integer.
pub fn to_token_decimals(value: Decimal) -> Result<U256> {
    let scaled = value
        .checked_mul(Decimal::from(10u64.pow(TOKEN_DECIMALS)))
        .ok_or_else(|| Error::InvalidAmount {
            message: format!("{} overflows token decimals", value),
        })?
        .trunc();

    scaled
        .to_u128()
        .map(U256::from)
        .ok_or_else(|| Error::InvalidAmount {
            message: format!("{} is not a non-negative token amount", value),
        })
}
