use crate::types::asset::{OwnershipResult, PLACEHOLDER_IMAGE};

/// One renderable grid cell: title plus a guaranteed image URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridItem {
    pub title: String,
    pub image_url: String,
}

/// Pure display model for the asset grid. Rendering stays external;
/// this only applies the title and placeholder-image fallbacks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridModel {
    pub items: Vec<GridItem>,
    pub invalid_address: bool,
    pub enriched: bool,
}

impl GridModel {
    pub fn from_result(result: &OwnershipResult, invalid_address: bool) -> Self {
        let items = result
            .owned_assets
            .iter()
            .map(|asset| GridItem {
                title: asset.display_title().to_string(),
                image_url: asset
                    .image_url()
                    .unwrap_or(PLACEHOLDER_IMAGE)
                    .to_string(),
            })
            .collect();
        Self {
            items,
            invalid_address,
            enriched: result.enriched,
        }
    }
}
