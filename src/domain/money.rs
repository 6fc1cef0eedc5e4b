use crate::error::MoneyError;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// ISO 4217 alphabetic currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    pub fn new(code: &str) -> Result<Self, MoneyError> {
        let code = code.trim();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(MoneyError::InvalidCurrency(code.to_string()));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    pub fn code(&self) -> &str {
        &self.0
    }

    /// Number of decimal places between major and minor units.
    pub fn exponent(&self) -> u32 {
        match self.0.as_str() {
            "JPY" | "KRW" | "VND" | "CLP" | "ISK" | "UGX" | "XAF" | "XOF" => 0,
            "BHD" | "JOD" | "KWD" | "OMR" | "TND" => 3,
            _ => 2,
        }
    }
}

impl TryFrom<String> for Currency {
    type Error = MoneyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A non-negative monetary amount held as an integer count of the
/// currency's minor units.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    minor_units: u64,
    currency: Currency,
}

impl Money {
    pub fn from_minor(minor_units: u64, currency: Currency) -> Self {
        Self {
            minor_units,
            currency,
        }
    }

    pub fn zero(currency: Currency) -> Self {
        Self::from_minor(0, currency)
    }

    /// Parses an amount already expressed in minor units, e.g. `"100000"`
    /// PHP is 1,000.00 PHP. Only the canonical form is accepted so that
    /// [`Money::number`] reproduces the input exactly.
    pub fn parse_minor(amount: &str, currency: &str) -> Result<Self, MoneyError> {
        let currency = Currency::new(currency)?;
        let canonical = !amount.is_empty()
            && amount.bytes().all(|b| b.is_ascii_digit())
            && (amount == "0" || !amount.starts_with('0'));
        if !canonical {
            return Err(MoneyError::InvalidAmount(amount.to_string()));
        }
        let minor_units = amount.parse::<u64>().map_err(|_| MoneyError::Overflow)?;
        Ok(Self::from_minor(minor_units, currency))
    }

    /// Parses a decimal amount in major units, e.g. `"1000.50"`. Fails
    /// rather than rounds when the input carries more fractional digits
    /// than the currency has.
    pub fn parse_major(amount: &str, currency: &str) -> Result<Self, MoneyError> {
        let currency = Currency::new(currency)?;
        let invalid = || MoneyError::InvalidAmount(amount.to_string());

        let (whole, fraction) = match amount.split_once('.') {
            Some((w, f)) => (w, Some(f)),
            None => (amount, None),
        };
        let digits_only = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if !digits_only(whole) || !fraction.is_none_or(digits_only) {
            return Err(invalid());
        }

        let exponent = currency.exponent();
        let scale = fraction.map_or(0, str::len);
        if scale > exponent as usize {
            return Err(MoneyError::Precision {
                amount: amount.to_string(),
                exponent,
            });
        }

        let value = Decimal::from_str(amount).map_err(|_| MoneyError::Overflow)?;
        let minor_units = value
            .checked_mul(Decimal::from(10u64.pow(exponent)))
            .and_then(|scaled| scaled.to_u64())
            .ok_or(MoneyError::Overflow)?;
        Ok(Self::from_minor(minor_units, currency))
    }

    pub fn minor_units(&self) -> u64 {
        self.minor_units
    }

    /// Minor units rendered as a decimal string.
    pub fn number(&self) -> String {
        self.minor_units.to_string()
    }

    pub fn currency_code(&self) -> &str {
        self.currency.code()
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.minor_units == 0
    }

    /// The amount in major units, scaled to the currency exponent.
    pub fn to_decimal(&self) -> Decimal {
        Decimal::from_i128_with_scale(i128::from(self.minor_units), self.currency.exponent())
    }

    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.same_currency(other)?;
        let sum = self
            .minor_units
            .checked_add(other.minor_units)
            .ok_or(MoneyError::Overflow)?;
        Ok(Self::from_minor(sum, self.currency.clone()))
    }

    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.same_currency(other)?;
        let diff = self
            .minor_units
            .checked_sub(other.minor_units)
            .ok_or(MoneyError::Negative)?;
        Ok(Self::from_minor(diff, self.currency.clone()))
    }

    fn same_currency(&self, other: &Money) -> Result<(), MoneyError> {
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
        write!(f, "{} {}", self.to_decimal(), self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn php() -> Currency {
        Currency::new("PHP").unwrap()
    }

    #[test]
    fn test_minor_round_trip() {
        let money = Money::parse_minor("100000", "PHP").unwrap();
        assert_eq!(money.minor_units(), 100000);
        assert_eq!(money.number(), "100000");
        assert_eq!(money.currency_code(), "PHP");

        for input in ["0", "1", "42", "18446744073709551615"] {
            assert_eq!(Money::parse_minor(input, "USD").unwrap().number(), input);
        }
    }

    #[test]
    fn test_minor_rejects_non_canonical() {
        for input in ["", "-1", "+1", "007", "1.5", "1_000", " 1", "abc"] {
            assert!(
                matches!(
                    Money::parse_minor(input, "PHP"),
                    Err(MoneyError::InvalidAmount(_))
                ),
                "{input:?} should be rejected"
            );
        }
        assert_eq!(
            Money::parse_minor("18446744073709551616", "PHP"),
            Err(MoneyError::Overflow)
        );
    }

    #[test]
    fn test_major_parsing_scales_by_exponent() {
        let money = Money::parse_major("1000.50", "PHP").unwrap();
        assert_eq!(money.minor_units(), 100050);
        assert_eq!(money.to_decimal(), dec!(1000.50));
        assert_eq!(money.to_string(), "1000.50 PHP");

        assert_eq!(Money::parse_major("1500", "JPY").unwrap().minor_units(), 1500);
        assert_eq!(Money::parse_major("1.234", "KWD").unwrap().minor_units(), 1234);
        assert_eq!(Money::parse_major("7", "usd").unwrap().currency_code(), "USD");
    }

    #[test]
    fn test_major_fails_closed() {
        assert!(matches!(
            Money::parse_major("1.005", "PHP"),
            Err(MoneyError::Precision { exponent: 2, .. })
        ));
        assert!(matches!(
            Money::parse_major("1.5", "JPY"),
            Err(MoneyError::Precision { exponent: 0, .. })
        ));
        for input in ["", ".5", "5.", "-5", "1e3", "1,000", "1.2.3"] {
            assert!(Money::parse_major(input, "PHP").is_err(), "{input:?}");
        }
        assert!(matches!(
            Money::parse_major("10", "PESO"),
            Err(MoneyError::InvalidCurrency(_))
        ));
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = Money::from_minor(1000, php());
        let b = Money::from_minor(250, php());
        assert_eq!(a.checked_add(&b).unwrap().minor_units(), 1250);
        assert_eq!(a.checked_sub(&b).unwrap().minor_units(), 750);
        assert_eq!(b.checked_sub(&a), Err(MoneyError::Negative));

        let usd = Money::from_minor(1, Currency::new("USD").unwrap());
        assert!(matches!(
            a.checked_add(&usd),
            Err(MoneyError::CurrencyMismatch(_, _))
        ));
        assert_eq!(
            Money::from_minor(u64::MAX, php()).checked_add(&b),
            Err(MoneyError::Overflow)
        );
    }

    #[test]
    fn test_serde_rejects_bad_currency() {
        let json = r#"{"minor_units":10,"currency":"PHP"}"#;
        let money: Money = serde_json::from_str(json).unwrap();
        assert_eq!(money, Money::from_minor(10, php()));

        let bad = r#"{"minor_units":10,"currency":"PH"}"#;
        assert!(serde_json::from_str::<Money>(bad).is_err());
    }
}
