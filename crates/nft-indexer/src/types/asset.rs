use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::metadata::TokenMeta;

/// Image shown for an asset whose metadata carries no image URL.
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/200";

/// One token ownership record, in the indexing API's own field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedAsset {
    #[serde(rename = "contractAddress")]
    pub contract_address: String,

    #[serde(rename = "tokenId")]
    pub token_id: String,

    #[serde(default)]
    pub title: String,

    /// Arbitrary per-token metadata; the `image` entry, when present,
    /// is what the grid displays.
    #[serde(rename = "rawMetadata")]
    #[serde(default)]
    pub raw_metadata: Map<String, Value>,

    /// Token metadata merged in by the enrichment pass. Absent until
    /// enrichment runs, and stays absent when the lookup failed.
    #[serde(skip)]
    pub token_meta: Option<TokenMeta>,
}

impl OwnedAsset {
    /// A bare ownership record with no title or metadata.
    pub fn new(contract_address: impl Into<String>, token_id: impl Into<String>) -> Self {
        Self {
            contract_address: contract_address.into(),
            token_id: token_id.into(),
            title: String::new(),
            raw_metadata: Map::new(),
            token_meta: None,
        }
    }

    /// Display title, falling back to `"No Name"` for untitled assets.
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "No Name"
        } else {
            &self.title
        }
    }

    /// Image URL from the raw metadata, if any.
    pub fn image_url(&self) -> Option<&str> {
        self.raw_metadata.get("image").and_then(Value::as_str)
    }

    /// Merge enrichment metadata into this asset.
    ///
    /// Present metadata fields are overlaid onto the raw metadata map,
    /// winning any key collision; the typed record is kept alongside.
    pub fn merge_meta(&mut self, meta: TokenMeta) {
        if let Ok(Value::Object(fields)) = serde_json::to_value(&meta) {
            for (key, value) in fields {
                self.raw_metadata.insert(key, value);
            }
        }
        self.token_meta = Some(meta);
    }
}

/// Ordered ownership records for one resolved address.
///
/// Produced in two phases: unenriched straight from the ownership
/// lookup, then enriched once per-token metadata has been merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OwnershipResult {
    #[serde(rename = "ownedNfts")]
    #[serde(default)]
    pub owned_assets: Vec<OwnedAsset>,

    /// Whether the enrichment pass has completed.
    #[serde(default)]
    pub enriched: bool,
}

impl OwnershipResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn unenriched(owned_assets: Vec<OwnedAsset>) -> Self {
        Self {
            owned_assets,
            enriched: false,
        }
    }

    pub fn len(&self) -> usize {
        self.owned_assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owned_assets.is_empty()
    }
}
