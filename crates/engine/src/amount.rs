use std::{fmt, str::FromStr};

use crate::EngineError;

/// Non-negative dollar amount represented as **integer cents**.
///
/// Amounts found in emails are compared through this type so that the
/// largest one can be picked without floating-point drift.
///
/// # Examples
///
/// ```rust
/// use engine::Amount;
///
/// let amount = Amount::new(1_234_56);
/// assert_eq!(amount.cents(), 123456);
/// assert_eq!(amount.to_string(), "$1234.56");
/// ```
///
/// Parsing accepts an optional `$` and `,` thousands separators:
///
/// ```rust
/// use engine::Amount;
///
/// assert_eq!("$1,234.56".parse::<Amount>().unwrap().cents(), 123456);
/// assert_eq!("12".parse::<Amount>().unwrap().cents(), 1200);
/// assert!("12.345".parse::<Amount>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Creates a new amount from integer cents.
    #[must_use]
    pub const fn new(cents: u64) -> Self {
        Self(cents)
    }

    /// Returns the raw value in cents.
    #[must_use]
    pub const fn cents(self) -> u64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dollars = self.0 / 100;
        let cents = self.0 % 100;
        write!(f, "${dollars}.{cents:02}")
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Amount> for u64 {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl FromStr for Amount {
    type Err = EngineError;

    /// Parses a decimal string into cents.
    ///
    /// Validation rules:
    /// - optional leading `$`, `,` is a thousands separator and is dropped
    /// - max 2 fractional digits (rejects `12.345`)
    /// - the dollar part may be empty when cents follow (`.50`)
    /// - rejects empty/invalid strings and negative values
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let empty = || EngineError::InvalidAmount("empty amount".to_string());
        let invalid = || EngineError::InvalidAmount("invalid amount".to_string());
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        let trimmed = s.trim();
        let rest = trimmed.strip_prefix('$').unwrap_or(trimmed).replace(',', "");
        if rest.is_empty() {
            return Err(empty());
        }

        let mut parts = rest.split('.');
        let dollars_str = parts.next().ok_or_else(invalid)?;
        let cents_str = parts.next();

        if parts.next().is_some() {
            return Err(invalid());
        }

        if !dollars_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        // `.50` is half a dollar; a bare `.` is not an amount.
        let dollars: u64 = match (dollars_str, cents_str) {
            ("", None | Some("")) => return Err(invalid()),
            ("", Some(_)) => 0,
            _ => dollars_str.parse().map_err(|_| overflow())?,
        };

        let cents: u64 = match cents_str {
            None | Some("") => 0,
            Some(frac) => {
                if !frac.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid());
                }
                match frac.len() {
                    1 => frac.parse::<u64>().map_err(|_| invalid())? * 10,
                    2 => frac.parse::<u64>().map_err(|_| invalid())?,
                    _ => return Err(EngineError::InvalidAmount("too many decimals".to_string())),
                }
            }
        };

        dollars
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .map(Amount)
            .ok_or_else(overflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_dollars() {
        assert_eq!(Amount::new(0).to_string(), "$0.00");
        assert_eq!(Amount::new(7).to_string(), "$0.07");
        assert_eq!(Amount::new(500).to_string(), "$5.00");
        assert_eq!(Amount::new(123_456).to_string(), "$1234.56");
    }

    #[test]
    fn parse_drops_thousands_separators() {
        assert_eq!("$1,234.56".parse::<Amount>().unwrap().cents(), 123_456);
        assert_eq!("$1,000,000.00".parse::<Amount>().unwrap().cents(), 100_000_000);
        assert_eq!(" 2.3 ".parse::<Amount>().unwrap().cents(), 230);
    }

    #[test]
    fn parse_accepts_missing_dollar_part() {
        assert_eq!("$.50".parse::<Amount>().unwrap().cents(), 50);
        assert_eq!("$,.05".parse::<Amount>().unwrap().cents(), 5);
        assert!(".".parse::<Amount>().is_err());
        assert!("$,".parse::<Amount>().is_err());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("".parse::<Amount>().is_err());
        assert!("$".parse::<Amount>().is_err());
        assert!("-1.00".parse::<Amount>().is_err());
        assert!("1.2.3".parse::<Amount>().is_err());
        assert!("12.345".parse::<Amount>().is_err());
        assert!("99999999999999999999.00".parse::<Amount>().is_err());
    }
}
