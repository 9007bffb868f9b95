//! Quantity and price primitives
//!
//! Validated at construction time so that a recorded movement can never
//! carry a zero or negative quantity, or a price the schema cannot hold.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest quantity accepted on a single record
const MAX_QUANTITY: i64 = 1_000_000;

/// Prices are stored as DECIMAL(10,2)
const PRICE_SCALE: u32 = 2;

/// Quantity of equipment units moved by one record.
///
/// # Invariants
/// - Value is always positive (> 0)
/// - Value never exceeds 1,000,000 units
///
/// # Example
/// ```
/// use military_assets::domain::Quantity;
///
/// let quantity = Quantity::new(20).unwrap();
/// assert_eq!(quantity.value(), 20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Quantity(i32);

/// Errors that can occur when creating a Quantity or UnitPrice
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuantityError {
    #[error("Quantity must be positive (got {0})")]
    NotPositive(i64),

    #[error("Quantity exceeds maximum allowed value ({MAX_QUANTITY})")]
    Overflow,

    #[error("Unit price cannot be negative (got {0})")]
    NegativePrice(Decimal),

    #[error("Unit price has too many decimal places (max {PRICE_SCALE}, got {0})")]
    TooManyDecimals(u32),

    #[error("Unit price exceeds the storable maximum")]
    PriceOverflow,

    #[error("Total amount {0} exceeds the storable maximum")]
    TotalOverflow(Decimal),

    #[error("Invalid number format: {0}")]
    ParseError(String),
}

impl Quantity {
    /// Create a new Quantity with validation.
    ///
    /// # Errors
    /// - `QuantityError::NotPositive` if value <= 0
    /// - `QuantityError::Overflow` if value > 1,000,000
    pub fn new(value: i64) -> Result<Self, QuantityError> {
        if value <= 0 {
            return Err(QuantityError::NotPositive(value));
        }
        if value > MAX_QUANTITY {
            return Err(QuantityError::Overflow);
        }

        // Bounded by MAX_QUANTITY, always fits
        Ok(Self(value as i32))
    }

    /// Get the underlying value.
    pub fn value(&self) -> i32 {
        self.0
    }

    /// Value widened for balance arithmetic.
    pub fn as_i64(&self) -> i64 {
        i64::from(self.0)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<i64>()
            .map_err(|e| QuantityError::ParseError(e.to_string()))?;
        Quantity::new(value)
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Quantity::new(value)
    }
}

impl From<Quantity> for i64 {
    fn from(quantity: Quantity) -> Self {
        quantity.as_i64()
    }
}

/// Price of a single unit on a purchase. Zero is allowed (donated stock).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UnitPrice(Decimal);

impl UnitPrice {
    pub fn new(value: Decimal) -> Result<Self, QuantityError> {
        if value < Decimal::ZERO {
            return Err(QuantityError::NegativePrice(value));
        }
        if value.scale() > PRICE_SCALE {
            return Err(QuantityError::TooManyDecimals(value.scale()));
        }
        if value > max_price() {
            return Err(QuantityError::PriceOverflow);
        }

        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Total cost of `quantity` units at this price
    pub fn total_for(&self, quantity: Quantity) -> Decimal {
        self.0 * Decimal::from(quantity.value())
    }

    /// Total cost, rejected when it would not fit the stored total column
    pub fn checked_total(&self, quantity: Quantity) -> Result<Decimal, QuantityError> {
        let total = self.total_for(quantity);
        if total > max_total() {
            return Err(QuantityError::TotalOverflow(total));
        }
        Ok(total)
    }
}

/// 99,999,999.99, the largest DECIMAL(10,2)
fn max_price() -> Decimal {
    Decimal::new(9_999_999_999, PRICE_SCALE)
}

/// 9,999,999,999.99, the largest DECIMAL(12,2)
fn max_total() -> Decimal {
    Decimal::new(999_999_999_999, PRICE_SCALE)
}

impl fmt::Display for UnitPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for UnitPrice {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal =
            Decimal::from_str(s.trim()).map_err(|e| QuantityError::ParseError(e.to_string()))?;
        UnitPrice::new(decimal)
    }
}

impl TryFrom<String> for UnitPrice {
    type Error = QuantityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        UnitPrice::from_str(&value)
    }
}

impl From<UnitPrice> for String {
    fn from(price: UnitPrice) -> Self {
        price.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quantity_positive() {
        let quantity = Quantity::new(50);
        assert!(quantity.is_ok());
        assert_eq!(quantity.unwrap().value(), 50);
    }

    #[test]
    fn test_quantity_zero_rejected() {
        assert!(matches!(Quantity::new(0), Err(QuantityError::NotPositive(0))));
    }

    #[test]
    fn test_quantity_negative_rejected() {
        assert!(matches!(
            Quantity::new(-15),
            Err(QuantityError::NotPositive(-15))
        ));
    }

    #[test]
    fn test_quantity_overflow() {
        assert!(matches!(
            Quantity::new(MAX_QUANTITY + 1),
            Err(QuantityError::Overflow)
        ));
        assert!(Quantity::new(MAX_QUANTITY).is_ok());
    }

    #[test]
    fn test_quantity_from_str() {
        let quantity: Quantity = " 12 ".parse().unwrap();
        assert_eq!(quantity.value(), 12);

        let bad: Result<Quantity, _> = "twelve".parse();
        assert!(matches!(bad, Err(QuantityError::ParseError(_))));
    }

    #[test]
    fn test_quantity_deserialize_rejects_zero() {
        let result: Result<Quantity, _> = serde_json::from_str("0");
        assert!(result.is_err());
    }

    #[test]
    fn test_unit_price_total() {
        let price: UnitPrice = "1000.00".parse().unwrap();
        let quantity = Quantity::new(10).unwrap();
        assert_eq!(price.total_for(quantity), dec!(10000.00));
    }

    #[test]
    fn test_unit_price_rules() {
        assert!(UnitPrice::new(Decimal::ZERO).is_ok());
        assert!(matches!(
            UnitPrice::new(dec!(-1)),
            Err(QuantityError::NegativePrice(_))
        ));
        assert!(matches!(
            UnitPrice::new(dec!(1.005)),
            Err(QuantityError::TooManyDecimals(3))
        ));
        assert!(matches!(
            UnitPrice::new(dec!(100000000)),
            Err(QuantityError::PriceOverflow)
        ));
        assert!(UnitPrice::new(dec!(99999999.99)).is_ok());
    }

    #[test]
    fn test_total_bounded_by_stored_column() {
        let price = UnitPrice::new(dec!(99999999.99)).unwrap();

        let fits = price.checked_total(Quantity::new(100).unwrap());
        assert_eq!(fits, Ok(dec!(9999999999.00)));

        let overflow = price.checked_total(Quantity::new(200).unwrap());
        assert!(matches!(overflow, Err(QuantityError::TotalOverflow(_))));
    }
}
