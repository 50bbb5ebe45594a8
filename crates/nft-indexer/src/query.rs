use std::fmt;

use serde::{Deserialize, Serialize};

/// A validated Ethereum address, normalized to lowercase hex.
///
/// Cache keys and indexer lookups only ever see this type, so an ENS
/// name or unclassified raw string can never leak into either.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Parse a `0x`-prefixed 40-hex-digit address. `None` for anything else.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let digits = raw.strip_prefix("0x")?;
        if digits.len() == 40 && digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            Some(Self(raw.to_ascii_lowercase()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Classification of a raw user-entered query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryKind {
    /// Empty or whitespace-only input.
    Empty,
    /// Anything ending in `.eth`, regardless of what precedes it.
    EnsName(String),
    /// A syntactically valid hex address.
    HexAddress(Address),
    /// Neither empty, an ENS name, nor an address.
    Invalid,
}

/// Classify a raw query string into the closed set of query kinds.
pub fn classify(raw: &str) -> QueryKind {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return QueryKind::Empty;
    }
    if trimmed.ends_with(".eth") {
        return QueryKind::EnsName(trimmed.to_string());
    }
    match Address::parse(trimmed) {
        Some(addr) => QueryKind::HexAddress(addr),
        None => QueryKind::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_empty() {
        assert_eq!(classify(""), QueryKind::Empty);
        assert_eq!(classify("   "), QueryKind::Empty);
    }

    #[test]
    fn test_classify_ens() {
        assert_eq!(
            classify("vitalik.eth"),
            QueryKind::EnsName("vitalik.eth".to_string())
        );
        assert_eq!(
            classify("some.deeply.nested.name.eth"),
            QueryKind::EnsName("some.deeply.nested.name.eth".to_string())
        );
        // Suffix alone decides, no matter what precedes it.
        assert_eq!(
            classify("0xdac17f958d2ee523a2206206994597c13d831ec7.eth"),
            QueryKind::EnsName("0xdac17f958d2ee523a2206206994597c13d831ec7.eth".to_string())
        );
    }

    #[test]
    fn test_classify_hex_address() {
        let addr = "0xdAC17F958D2ee523a2206206994597C13D831ec7";
        match classify(addr) {
            QueryKind::HexAddress(a) => {
                assert_eq!(a.as_str(), "0xdac17f958d2ee523a2206206994597c13d831ec7");
            }
            other => panic!("expected HexAddress, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_invalid() {
        assert_eq!(classify("not an address"), QueryKind::Invalid);
        // 39 hex digits
        assert_eq!(
            classify("0xdac17f958d2ee523a2206206994597c13d831ec"),
            QueryKind::Invalid
        );
        // 41 hex digits
        assert_eq!(
            classify("0xdac17f958d2ee523a2206206994597c13d831ec77"),
            QueryKind::Invalid
        );
        // non-hex character
        assert_eq!(
            classify("0xzac17f958d2ee523a2206206994597c13d831ec7"),
            QueryKind::Invalid
        );
        // missing prefix
        assert_eq!(
            classify("dac17f958d2ee523a2206206994597c13d831ec7"),
            QueryKind::Invalid
        );
    }

    #[test]
    fn test_address_normalizes_case() {
        let upper = Address::parse("0xDAC17F958D2EE523A2206206994597C13D831EC7").unwrap();
        let lower = Address::parse("0xdac17f958d2ee523a2206206994597c13d831ec7").unwrap();
        assert_eq!(upper, lower);
        assert_eq!(upper.to_string(), lower.as_str());
    }
}
