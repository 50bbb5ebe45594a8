use serde::{Deserialize, Serialize};

/// Token-level metadata returned by the enrichment lookup.
///
/// Every field is optional; the indexing API omits what it does not
/// know about a contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_sparse() {
        let meta: TokenMeta = serde_json::from_str(r#"{"name": "CryptoPunks"}"#).unwrap();
        assert_eq!(meta.name.as_deref(), Some("CryptoPunks"));
        assert!(meta.symbol.is_none());
        assert!(meta.logo.is_none());
    }

    #[test]
    fn test_serialize_skips_absent_fields() {
        let meta = TokenMeta {
            symbol: Some("PUNK".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json, serde_json::json!({"symbol": "PUNK"}));
    }
}
