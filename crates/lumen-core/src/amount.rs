//! Native asset amounts.
//!
//! Amounts are held as an integer count of stroops and exchanged as decimal
//! strings with up to seven fractional digits, matching the ledger API.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::constants::{AMOUNT_DECIMALS, STROOPS_PER_LUMEN};
use crate::error::AmountError;

/// A non-negative amount of the native asset, in stroops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i64);

impl Amount {
    /// Zero stroops.
    pub const ZERO: Self = Self(0);

    /// Create an amount from a stroop count. Negative counts are rejected.
    pub fn from_stroops(stroops: i64) -> Result<Self, AmountError> {
        if stroops < 0 {
            return Err(AmountError::Negative);
        }
        Ok(Self(stroops))
    }

    /// Create an amount from whole lumens.
    pub fn from_lumens(lumens: i64) -> Result<Self, AmountError> {
        let stroops = lumens
            .checked_mul(STROOPS_PER_LUMEN)
            .ok_or(AmountError::Overflow)?;
        Self::from_stroops(stroops)
    }

    /// Raw stroop count.
    pub fn stroops(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Subtract, returning `None` if the result would be negative.
    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0
            .checked_sub(other.0)
            .filter(|v| *v >= 0)
            .map(Amount)
    }

    /// Subtract, clamping at zero.
    pub fn saturating_sub(self, other: Amount) -> Amount {
        self.checked_sub(other).unwrap_or(Amount::ZERO)
    }

    /// Decimal form without trailing fractional zeros (`"110"`, `"0.5"`).
    pub fn to_compact_string(&self) -> String {
        let full = self.to_string();
        let trimmed = full.trim_end_matches('0').trim_end_matches('.');
        trimmed.to_string()
    }
}

/// Seven-digit decimal form as reported by the ledger (`"18173.0000000"`).
impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / STROOPS_PER_LUMEN;
        let frac = self.0 % STROOPS_PER_LUMEN;
        write!(f, "{whole}.{frac:0width$}", width = AMOUNT_DECIMALS)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AmountError::Empty);
        }
        if s.starts_with('-') {
            return Err(AmountError::Negative);
        }
        let s = s.strip_prefix('+').unwrap_or(s);

        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(AmountError::InvalidFormat(s.to_string()));
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(AmountError::InvalidFormat(s.to_string()));
        }
        if frac.len() > AMOUNT_DECIMALS {
            return Err(AmountError::TooManyDecimals(s.to_string()));
        }

        let whole_value: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| AmountError::Overflow)?
        };
        let mut frac_value: i64 = 0;
        for (i, b) in frac.bytes().enumerate() {
            let digit = (b - b'0') as i64;
            frac_value += digit * 10i64.pow((AMOUNT_DECIMALS - 1 - i) as u32);
        }

        whole_value
            .checked_mul(STROOPS_PER_LUMEN)
            .and_then(|v| v.checked_add(frac_value))
            .map(Amount)
            .ok_or(AmountError::Overflow)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_whole_lumens() {
        let a: Amount = "110".parse().unwrap();
        assert_eq!(a.stroops(), 1_100_000_000);
    }

    #[test]
    fn parse_fractional() {
        assert_eq!("0.5".parse::<Amount>().unwrap().stroops(), 5_000_000);
        assert_eq!(".0000001".parse::<Amount>().unwrap().stroops(), 1);
        assert_eq!("18173.0000000".parse::<Amount>().unwrap(), Amount::from_lumens(18173).unwrap());
        assert_eq!("12.".parse::<Amount>().unwrap(), Amount::from_lumens(12).unwrap());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!("".parse::<Amount>(), Err(AmountError::Empty));
        assert_eq!("  ".parse::<Amount>(), Err(AmountError::Empty));
        assert_eq!("-1".parse::<Amount>(), Err(AmountError::Negative));
        assert!(matches!("abc".parse::<Amount>(), Err(AmountError::InvalidFormat(_))));
        assert!(matches!("1.2.3".parse::<Amount>(), Err(AmountError::InvalidFormat(_))));
        assert!(matches!(".".parse::<Amount>(), Err(AmountError::InvalidFormat(_))));
        assert!(matches!("1e5".parse::<Amount>(), Err(AmountError::InvalidFormat(_))));
    }

    #[test]
    fn parse_rejects_excess_precision() {
        assert!(matches!(
            "0.00000001".parse::<Amount>(),
            Err(AmountError::TooManyDecimals(_))
        ));
    }

    #[test]
    fn parse_overflow() {
        assert_eq!("9999999999999999999".parse::<Amount>(), Err(AmountError::Overflow));
        assert_eq!("922337203686".parse::<Amount>(), Err(AmountError::Overflow));
    }

    #[test]
    fn display_seven_decimals() {
        assert_eq!(Amount::from_lumens(18173).unwrap().to_string(), "18173.0000000");
        assert_eq!(Amount::from_stroops(1).unwrap().to_string(), "0.0000001");
    }

    #[test]
    fn compact_display() {
        assert_eq!(Amount::from_lumens(110).unwrap().to_compact_string(), "110");
        assert_eq!(Amount::from_stroops(5_000_000).unwrap().to_compact_string(), "0.5");
        assert_eq!(Amount::ZERO.to_compact_string(), "0");
    }

    #[test]
    fn checked_sub_never_negative() {
        let a = Amount::from_stroops(50).unwrap();
        let b = Amount::from_stroops(100).unwrap();
        assert_eq!(a.checked_sub(b), None);
        assert_eq!(b.checked_sub(a), Some(a));
        assert_eq!(a.saturating_sub(b), Amount::ZERO);
    }

    #[test]
    fn negative_stroops_rejected() {
        assert_eq!(Amount::from_stroops(-1), Err(AmountError::Negative));
    }

    #[test]
    fn serde_as_string() {
        let a = Amount::from_lumens(3).unwrap();
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, "\"3.0000000\"");
        let back: Amount = serde_json::from_str("\"3\"").unwrap();
        assert_eq!(back, a);
    }
}
