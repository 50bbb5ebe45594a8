pub mod asset;
pub mod metadata;
