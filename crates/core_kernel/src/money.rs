//! Money types with precise decimal arithmetic
//!
//! Rent, payments and quotation amounts are all carried as `Money`, a
//! `rust_decimal` amount tagged with its currency. Amounts keep 4 decimal
//! places internally so that per-line tax splits stay exact; rounding to the
//! currency's minor unit happens only when an amount is displayed.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::format::round_half_up;

/// Internal precision for stored amounts
pub const INTERNAL_DECIMAL_PLACES: u32 = 4;

macro_rules! currencies {
    ($($variant:ident => $symbol:literal, $places:literal;)+) => {
        /// ISO 4217 currencies the billing core can price in
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "UPPERCASE")]
        pub enum Currency {
            $($variant,)+
        }

        impl Currency {
            pub const ALL: &'static [Currency] = &[$(Currency::$variant,)+];

            /// Minor-unit digits shown on documents
            pub fn decimal_places(&self) -> u32 {
                match self {
                    $(Currency::$variant => $places,)+
                }
            }

            /// Prefix printed before formatted amounts
            pub fn symbol(&self) -> &'static str {
                match self {
                    $(Currency::$variant => $symbol,)+
                }
            }

            pub fn code(&self) -> &'static str {
                match self {
                    $(Currency::$variant => stringify!($variant),)+
                }
            }
        }
    };
}

currencies! {
    INR => "₹", 2;
    USD => "$", 2;
    EUR => "€", 2;
    GBP => "£", 2;
    AED => "AED ", 2;
    SGD => "S$", 2;
    JPY => "¥", 0;
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    /// Case-insensitive ISO code, surrounding whitespace ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Currency::ALL
            .iter()
            .copied()
            .find(|c| c.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| MoneyError::UnknownCurrency(code.to_string()))
    }
}

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Currency mismatch: cannot operate on {0} and {1}")]
    CurrencyMismatch(String, String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),
}

/// A monetary amount with associated currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Creates a new Money value, rounded half up to internal precision
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount: round_half_up(amount, INTERNAL_DECIMAL_PLACES),
            currency,
        }
    }

    /// Creates a zero amount in the specified currency
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: dec!(0),
            currency,
        }
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is strictly greater than zero
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    /// Rounds to the currency's minor unit, half away from zero
    pub fn round_to_currency(&self) -> Self {
        Self {
            amount: round_half_up(self.amount, self.currency.decimal_places()),
            currency: self.currency,
        }
    }

    /// Checked addition that returns an error on currency mismatch
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(Self::new(self.amount + other.amount, self.currency))
    }

    /// Checked subtraction that returns an error on currency mismatch
    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(Self::new(self.amount - other.amount, self.currency))
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch(
                self.currency.to_string(),
                other.currency.to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dp = self.currency.decimal_places();
        write!(
            f,
            "{}{:.dp$}",
            self.currency.symbol(),
            round_half_up(self.amount, dp),
            dp = dp as usize
        )
    }
}

/// A percentage such as a GST rate, kept as the percentage itself
///
/// Always between 0 and 100, so applying it never grows an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rate(Decimal);

impl Rate {
    /// Percentages outside 0..=100 are clamped into range
    pub fn from_percentage(percentage: Decimal) -> Self {
        Self(percentage.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED))
    }

    pub fn as_percentage(&self) -> Decimal {
        self.0
    }

    /// The rate as a fraction, 0.18 for 18%
    pub fn as_decimal(&self) -> Decimal {
        self.0 / Decimal::ONE_HUNDRED
    }

    /// `money x percentage / 100` at internal precision
    pub fn apply(&self, money: &Money) -> Money {
        Money::new(money.amount() * self.as_decimal(), money.currency())
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_creation() {
        let m = Money::new(dec!(20000), Currency::INR);
        assert_eq!(m.amount(), dec!(20000));
        assert_eq!(m.currency(), Currency::INR);
    }

    #[test]
    fn test_internal_precision_rounds_half_up() {
        assert_eq!(Money::new(dec!(10.123456), Currency::INR).amount(), dec!(10.1235));
        assert_eq!(Money::new(dec!(1.00005), Currency::INR).amount(), dec!(1.0001));
        assert_eq!(Money::new(dec!(2.00025), Currency::INR).amount(), dec!(2.0003));
        assert_eq!(Money::new(dec!(-1.00005), Currency::INR).amount(), dec!(-1.0001));
    }

    #[test]
    fn test_currency_mismatch() {
        let inr = Money::new(dec!(100), Currency::INR);
        let usd = Money::new(dec!(100), Currency::USD);

        let result = inr.checked_add(&usd);
        assert!(matches!(result, Err(MoneyError::CurrencyMismatch(_, _))));
    }


    #[test]
    fn test_is_positive_excludes_zero() {
        assert!(!Money::zero(Currency::INR).is_positive());
        assert!(Money::new(dec!(0.01), Currency::INR).is_positive());
        assert!(!Money::new(dec!(-1), Currency::INR).is_positive());
    }

    #[test]
    fn test_display_rounds_half_up() {
        let m = Money::new(dec!(10.125), Currency::INR);
        assert_eq!(m.to_string(), "₹10.13");
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!(" inr ".parse::<Currency>().unwrap(), Currency::INR);
        assert_eq!("XYZ".parse::<Currency>(), Err(MoneyError::UnknownCurrency("XYZ".into())));
        for currency in Currency::ALL {
            assert_eq!(currency.code().parse::<Currency>().unwrap(), *currency);
        }
    }

    #[test]
    fn test_rate_application() {
        let rate = Rate::from_percentage(dec!(18));
        let amount = Money::new(dec!(1000), Currency::INR);

        assert_eq!(rate.apply(&amount).amount(), dec!(180));
        assert_eq!(rate.as_decimal(), dec!(0.18));
        assert_eq!(Rate::from_percentage(dec!(12.50)).to_string(), "12.5%");
    }

    #[test]
    fn test_rate_is_clamped_and_never_overflows() {
        assert_eq!(Rate::from_percentage(dec!(250)).as_percentage(), dec!(100));
        assert_eq!(Rate::from_percentage(dec!(-5)).as_percentage(), Decimal::ZERO);

        let largest = Money::new(dec!(999999999999999.9999), Currency::INR);
        assert_eq!(Rate::from_percentage(dec!(100)).apply(&largest), largest);
        assert_eq!(Rate::from_percentage(dec!(18)).apply(&largest).amount(), dec!(180000000000000.0000));
    }
}
