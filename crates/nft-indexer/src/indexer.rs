use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::ApiError;
use crate::query::Address;
use crate::types::asset::OwnedAsset;
use crate::types::metadata::TokenMeta;

/// Async seam over the hosted blockchain-indexing service.
#[async_trait]
pub trait IndexerApi: Send + Sync {
    /// Resolve an ENS name to an address. `Ok(None)` when the name
    /// does not resolve.
    async fn resolve_name(&self, name: &str) -> Result<Option<Address>, ApiError>;

    /// All ERC-721 assets owned by `owner`, in the API's order.
    async fn assets_for_owner(&self, owner: &Address) -> Result<Vec<OwnedAsset>, ApiError>;

    /// Token-level metadata for one contract.
    async fn token_metadata(&self, contract: &str, token_id: &str) -> Result<TokenMeta, ApiError>;
}

/// In-memory indexer for tests: preloaded names, holdings and metadata,
/// with call counters so tests can assert network behavior.
#[derive(Default)]
pub struct StaticIndexer {
    names: HashMap<String, Address>,
    holdings: HashMap<Address, Vec<OwnedAsset>>,
    metadata: HashMap<String, TokenMeta>,
    failing_metadata: HashSet<String>,
    failing_owners: HashSet<Address>,
    resolve_name_calls: AtomicUsize,
    assets_calls: AtomicUsize,
    metadata_calls: AtomicUsize,
}

impl StaticIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_name(&mut self, name: &str, addr: Address) {
        self.names.insert(name.to_string(), addr);
    }

    pub fn add_holdings(&mut self, owner: Address, assets: Vec<OwnedAsset>) {
        self.holdings.insert(owner, assets);
    }

    pub fn add_metadata(&mut self, contract: &str, meta: TokenMeta) {
        self.metadata.insert(contract.to_string(), meta);
    }

    /// Make every metadata lookup for `contract` fail.
    pub fn fail_metadata(&mut self, contract: &str) {
        self.failing_metadata.insert(contract.to_string());
    }

    /// Make the ownership lookup for `owner` fail.
    pub fn fail_owner(&mut self, owner: Address) {
        self.failing_owners.insert(owner);
    }

    pub fn resolve_name_calls(&self) -> usize {
        self.resolve_name_calls.load(Ordering::SeqCst)
    }

    pub fn assets_for_owner_calls(&self) -> usize {
        self.assets_calls.load(Ordering::SeqCst)
    }

    pub fn token_metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IndexerApi for StaticIndexer {
    async fn resolve_name(&self, name: &str) -> Result<Option<Address>, ApiError> {
        self.resolve_name_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.names.get(name).cloned())
    }

    async fn assets_for_owner(&self, owner: &Address) -> Result<Vec<OwnedAsset>, ApiError> {
        self.assets_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_owners.contains(owner) {
            return Err(ApiError::Rpc(format!("indexer unavailable for {owner}")));
        }
        Ok(self.holdings.get(owner).cloned().unwrap_or_default())
    }

    async fn token_metadata(&self, contract: &str, _token_id: &str) -> Result<TokenMeta, ApiError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_metadata.contains(contract) {
            return Err(ApiError::Rpc(format!("metadata unavailable for {contract}")));
        }
        Ok(self.metadata.get(contract).cloned().unwrap_or_default())
    }
}
