//! Token identifiers.
//!
//! On the wire and on disk an id is the canonical decimal string of an
//! unsigned 64-bit integer (`"1"`, `"2"`, ...). Internally it is a `u64` so
//! ordering is numeric, not lexicographic (`"10"` sorts after `"9"`).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Globally unique, monotonically assigned token identifier.
///
/// Ids are handed out by the ledger's allocator starting at 1 and are never
/// reused. `TokenId(0)` is the "nothing issued yet" counter value and never
/// names a real token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TokenId(u64);

impl TokenId {
    /// The counter value before any token exists.
    pub const ZERO: TokenId = TokenId(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// The id after this one, or `None` once the u64 space is exhausted.
    pub fn next(&self) -> Option<TokenId> {
        self.0.checked_add(1).map(TokenId)
    }

    /// Parse the canonical decimal form only.
    ///
    /// Clients name inputs by the exact string the ledger assigned, so
    /// `"01"`, `"+1"` and `" 1"` must not alias token `"1"`.
    pub fn parse_canonical(s: &str) -> Option<TokenId> {
        let bytes = s.as_bytes();
        if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
            return None;
        }
        if bytes.len() > 1 && bytes[0] == b'0' {
            return None;
        }
        s.parse::<u64>().ok().map(TokenId)
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for TokenId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TokenId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TokenId::parse_canonical(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid token id: {s:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_forms_parse() {
        assert_eq!(TokenId::parse_canonical("0"), Some(TokenId::ZERO));
        assert_eq!(TokenId::parse_canonical("1"), Some(TokenId::new(1)));
        assert_eq!(
            TokenId::parse_canonical("18446744073709551615"),
            Some(TokenId::new(u64::MAX))
        );
    }

    #[test]
    fn non_canonical_forms_rejected() {
        for s in ["", "01", "+1", "-1", " 1", "1 ", "1.0", "0x1", "18446744073709551616"] {
            assert_eq!(TokenId::parse_canonical(s), None, "{s:?} should not parse");
        }
    }

    #[test]
    fn ordering_is_numeric() {
        let nine = TokenId::parse_canonical("9").unwrap();
        let ten = TokenId::parse_canonical("10").unwrap();
        assert!(nine < ten);
    }

    #[test]
    fn next_saturates_at_u64_max() {
        assert_eq!(TokenId::ZERO.next(), Some(TokenId::new(1)));
        assert_eq!(TokenId::new(u64::MAX).next(), None);
    }

    #[test]
    fn serializes_as_decimal_string() {
        let json = serde_json::to_string(&TokenId::new(42)).unwrap();
        assert_eq!(json, "\"42\"");

        let back: TokenId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(back, TokenId::new(42));

        assert!(serde_json::from_str::<TokenId>("42").is_err());
        assert!(serde_json::from_str::<TokenId>("\"042\"").is_err());
    }
}
