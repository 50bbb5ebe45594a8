use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::join_all;
use tokio::sync::Mutex;

use crate::cache::OwnerCache;
use crate::indexer::IndexerApi;
use crate::query::{classify, Address, QueryKind};
use crate::types::asset::OwnershipResult;

/// Transient user-visible failure events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// ENS lookup returned no address for the given name.
    EnsLookupFailed(String),
    /// The primary ownership lookup failed for the given address.
    OwnershipLookupFailed(String),
}

/// Surface the resolver publishes into: the current result set, the
/// inline invalid-address flag, and transient notices. The actual
/// rendering lives outside this crate.
pub trait ResolveSink {
    fn results(&mut self, result: &OwnershipResult);
    fn clear(&mut self);
    fn invalid_address(&mut self, show: bool);
    fn notice(&mut self, notice: Notice);
}

/// What a single resolution attempt amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Empty query: results cleared, nothing else happened.
    Cleared,
    /// Query is neither empty, an ENS name, nor an address.
    InvalidInput,
    /// The ENS name did not resolve to an address.
    EnsLookupFailed,
    /// Served from the cache with zero API calls.
    CacheHit,
    /// The primary ownership lookup failed. Distinct from an address
    /// that simply holds nothing, which resolves to an empty result.
    LookupFailed,
    /// A newer query started while this one was in flight; nothing
    /// was published or cached.
    Superseded,
    /// Fetch and enrichment completed and were published.
    Resolved,
}

/// Resolves free-form queries into published ownership results.
///
/// Owns the session cache and the no-op resubmission guard. Every
/// resolution attempt carries a monotonically increasing epoch; an
/// attempt whose epoch is no longer current when its network calls
/// complete publishes nothing and writes nothing, so a stale fetch
/// can never overtake a fresh one.
pub struct Resolver<A: IndexerApi> {
    api: A,
    cache: Mutex<OwnerCache>,
    last_address: Mutex<Option<Address>>,
    epoch: AtomicU64,
}

impl<A: IndexerApi> Resolver<A> {
    pub fn new(api: A) -> Self {
        Self::with_cache(api, OwnerCache::new())
    }

    /// Build a resolver around a pre-populated cache.
    pub fn with_cache(api: A, cache: OwnerCache) -> Self {
        Self {
            api,
            cache: Mutex::new(cache),
            last_address: Mutex::new(None),
            epoch: AtomicU64::new(0),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub async fn cached(&self, addr: &Address) -> Option<OwnershipResult> {
        self.cache.lock().await.get(addr).cloned()
    }

    pub async fn cache_len(&self) -> usize {
        self.cache.lock().await.len()
    }

    pub async fn seed_cache(&self, addr: Address, result: OwnershipResult) {
        self.cache.lock().await.seed(addr, result);
    }

    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
    }

    /// Clear display state and the resubmission guard, and invalidate
    /// any in-flight resolution. Called on wallet disconnect.
    pub async fn reset(&self, sink: &mut dyn ResolveSink) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        *self.last_address.lock().await = None;
        sink.invalid_address(false);
        sink.clear();
    }

    /// Resolve one query and publish its observable effects into `sink`.
    pub async fn resolve(&self, raw: &str, sink: &mut dyn ResolveSink) -> Outcome {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        sink.invalid_address(false);

        match classify(raw) {
            QueryKind::Empty => {
                sink.clear();
                Outcome::Cleared
            }
            QueryKind::Invalid => {
                sink.clear();
                sink.invalid_address(true);
                Outcome::InvalidInput
            }
            QueryKind::EnsName(name) => match self.api.resolve_name(&name).await {
                Ok(Some(addr)) => {
                    log::info!("resolved {name} to {addr}");
                    // The resolved address restarts classification; it
                    // can never classify as ENS again, so this does
                    // not recurse.
                    self.resolve_address(addr, epoch, sink).await
                }
                Ok(None) => {
                    log::warn!("ENS lookup for {name} returned nothing");
                    if !self.is_current(epoch) {
                        log::debug!("dropping stale ENS failure for {name}");
                        return Outcome::Superseded;
                    }
                    sink.notice(Notice::EnsLookupFailed(name));
                    sink.clear();
                    Outcome::EnsLookupFailed
                }
                Err(err) => {
                    log::warn!("ENS lookup for {name} failed: {err}");
                    if !self.is_current(epoch) {
                        log::debug!("dropping stale ENS failure for {name}");
                        return Outcome::Superseded;
                    }
                    sink.notice(Notice::EnsLookupFailed(name));
                    sink.clear();
                    Outcome::EnsLookupFailed
                }
            },
            QueryKind::HexAddress(addr) => self.resolve_address(addr, epoch, sink).await,
        }
    }

    async fn resolve_address(
        &self,
        addr: Address,
        epoch: u64,
        sink: &mut dyn ResolveSink,
    ) -> Outcome {
        let resubmission = {
            let mut last = self.last_address.lock().await;
            let resubmission = last.as_ref() == Some(&addr);
            *last = Some(addr.clone());
            resubmission
        };

        // Repeat lookups never go back to the network, whether the
        // same query was resubmitted as-is or the address was reached
        // again through a different spelling or ENS name.
        if let Some(cached) = self.cached(&addr).await {
            log::debug!(
                "cache hit for {addr}{}",
                if resubmission { " (resubmission)" } else { "" }
            );
            sink.results(&cached);
            return Outcome::CacheHit;
        }

        let assets = match self.api.assets_for_owner(&addr).await {
            Ok(assets) => assets,
            Err(err) => {
                log::warn!("ownership lookup for {addr} failed: {err}");
                // A stale failure must stay as silent as a stale
                // success: no notice, no clear.
                if !self.is_current(epoch) {
                    log::debug!("dropping stale lookup failure for {addr}");
                    return Outcome::Superseded;
                }
                sink.notice(Notice::OwnershipLookupFailed(addr.to_string()));
                sink.clear();
                return Outcome::LookupFailed;
            }
        };
        log::info!("fetched {} assets for {addr}", assets.len());

        if !self.is_current(epoch) {
            log::debug!("dropping stale ownership result for {addr}");
            return Outcome::Superseded;
        }

        // Intermediate render: base ownership rows before metadata lands.
        let mut result = OwnershipResult::unenriched(assets);
        sink.results(&result);

        let lookups = result
            .owned_assets
            .iter()
            .map(|asset| self.api.token_metadata(&asset.contract_address, &asset.token_id));
        let fetched = join_all(lookups).await;

        if !self.is_current(epoch) {
            log::debug!("dropping stale enrichment for {addr}");
            return Outcome::Superseded;
        }

        for (asset, meta) in result.owned_assets.iter_mut().zip(fetched) {
            match meta {
                Ok(meta) => asset.merge_meta(meta),
                // A failed lookup degrades that one asset to its base
                // fields; the rest of the enrichment proceeds.
                Err(err) => {
                    log::warn!("metadata lookup for {} failed: {err}", asset.contract_address)
                }
            }
        }
        result.enriched = true;

        let populated = self
            .cache
            .lock()
            .await
            .insert_if_absent(addr.clone(), result.clone());
        if !populated {
            log::debug!("cache already populated for {addr}");
        }

        sink.results(&result);
        Outcome::Resolved
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::SeqCst) == epoch
    }
}

/// One observable effect, in publish order.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Results(OwnershipResult),
    Cleared,
    InvalidAddress(bool),
    Notice(Notice),
}

/// Records the event sequence — the stand-in for the UI surface in
/// tests and in the high-level [`crate::fetch_grid`] helper.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every published result set, oldest first.
    pub fn published(&self) -> Vec<&OwnershipResult> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SinkEvent::Results(result) => Some(result),
                _ => None,
            })
            .collect()
    }

    /// The most recent published result, if any publish survived the
    /// last clear.
    pub fn last_results(&self) -> Option<&OwnershipResult> {
        for event in self.events.iter().rev() {
            match event {
                SinkEvent::Results(result) => return Some(result),
                SinkEvent::Cleared => return None,
                _ => {}
            }
        }
        None
    }

    pub fn notices(&self) -> Vec<&Notice> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SinkEvent::Notice(notice) => Some(notice),
                _ => None,
            })
            .collect()
    }

    /// Final state of the invalid-address flag.
    pub fn invalid_address(&self) -> bool {
        self.events
            .iter()
            .rev()
            .find_map(|event| match event {
                SinkEvent::InvalidAddress(show) => Some(*show),
                _ => None,
            })
            .unwrap_or(false)
    }
}

impl ResolveSink for RecordingSink {
    fn results(&mut self, result: &OwnershipResult) {
        self.events.push(SinkEvent::Results(result.clone()));
    }

    fn clear(&mut self) {
        self.events.push(SinkEvent::Cleared);
    }

    fn invalid_address(&mut self, show: bool) {
        self.events.push(SinkEvent::InvalidAddress(show));
    }

    fn notice(&mut self, notice: Notice) {
        self.events.push(SinkEvent::Notice(notice));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::StaticIndexer;
    use crate::types::asset::OwnedAsset;

    const OWNER: &str = "0xdac17f958d2ee523a2206206994597c13d831ec7";

    fn owner() -> Address {
        Address::parse(OWNER).unwrap()
    }

    #[tokio::test]
    async fn test_seeded_cache_short_circuits() {
        let indexer = StaticIndexer::new();
        let resolver = Resolver::new(indexer);
        let seeded = OwnershipResult {
            owned_assets: vec![OwnedAsset::new("0xaaa", "1")],
            enriched: true,
        };
        resolver.seed_cache(owner(), seeded.clone()).await;

        let mut sink = RecordingSink::new();
        let outcome = resolver.resolve(OWNER, &mut sink).await;

        assert_eq!(outcome, Outcome::CacheHit);
        assert_eq!(sink.last_results(), Some(&seeded));
        assert_eq!(resolver.api().assets_for_owner_calls(), 0);
    }

    #[tokio::test]
    async fn test_reset_clears_guard_and_display() {
        let mut indexer = StaticIndexer::new();
        indexer.add_holdings(owner(), vec![OwnedAsset::new("0xaaa", "1")]);
        let resolver = Resolver::new(indexer);

        let mut sink = RecordingSink::new();
        resolver.resolve(OWNER, &mut sink).await;
        resolver.reset(&mut sink).await;

        assert_eq!(sink.events.last(), Some(&SinkEvent::Cleared));
        assert!(!sink.invalid_address());
        // The cache survives a disconnect; only display state resets.
        assert_eq!(resolver.cache_len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_resolution_is_superseded() {
        use std::time::Duration;

        use async_trait::async_trait;

        use crate::error::ApiError;
        use crate::types::metadata::TokenMeta;

        /// Indexer whose metadata lookups take a configurable time.
        struct SlowIndexer {
            delay: Duration,
            inner: StaticIndexer,
        }

        #[async_trait]
        impl IndexerApi for SlowIndexer {
            async fn resolve_name(&self, name: &str) -> Result<Option<Address>, ApiError> {
                self.inner.resolve_name(name).await
            }

            async fn assets_for_owner(&self, addr: &Address) -> Result<Vec<OwnedAsset>, ApiError> {
                self.inner.assets_for_owner(addr).await
            }

            async fn token_metadata(
                &self,
                contract: &str,
                token_id: &str,
            ) -> Result<TokenMeta, ApiError> {
                tokio::time::sleep(self.delay).await;
                self.inner.token_metadata(contract, token_id).await
            }
        }

        let first = owner();
        let second = Address::parse("0x00000000000000000000000000000000000000aa").unwrap();

        let mut inner = StaticIndexer::new();
        inner.add_holdings(first.clone(), vec![OwnedAsset::new("0xaaa", "1")]);
        inner.add_holdings(second.clone(), vec![OwnedAsset::new("0xbbb", "2")]);
        let resolver = Resolver::new(SlowIndexer {
            delay: Duration::from_millis(50),
            inner,
        });

        let mut stale_sink = RecordingSink::new();
        let mut fresh_sink = RecordingSink::new();

        // The second query starts while the first is still enriching.
        let stale = resolver.resolve(first.as_str(), &mut stale_sink);
        let fresh = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            resolver.resolve(second.as_str(), &mut fresh_sink).await
        };
        let (stale_outcome, fresh_outcome) = tokio::join!(stale, fresh);

        assert_eq!(stale_outcome, Outcome::Superseded);
        assert_eq!(fresh_outcome, Outcome::Resolved);

        // The stale attempt published only its intermediate render and
        // cached nothing.
        assert_eq!(stale_sink.published().len(), 1);
        assert!(!stale_sink.published()[0].enriched);
        assert!(resolver.cached(&first).await.is_none());
        assert!(resolver.cached(&second).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_lookup_failure_is_superseded() {
        use std::time::Duration;

        use async_trait::async_trait;

        use crate::error::ApiError;
        use crate::types::metadata::TokenMeta;

        /// Indexer whose ownership lookups take a configurable time.
        struct SlowOwnershipIndexer {
            delay: Duration,
            inner: StaticIndexer,
        }

        #[async_trait]
        impl IndexerApi for SlowOwnershipIndexer {
            async fn resolve_name(&self, name: &str) -> Result<Option<Address>, ApiError> {
                self.inner.resolve_name(name).await
            }

            async fn assets_for_owner(&self, addr: &Address) -> Result<Vec<OwnedAsset>, ApiError> {
                tokio::time::sleep(self.delay).await;
                self.inner.assets_for_owner(addr).await
            }

            async fn token_metadata(
                &self,
                contract: &str,
                token_id: &str,
            ) -> Result<TokenMeta, ApiError> {
                self.inner.token_metadata(contract, token_id).await
            }
        }

        let failing = owner();
        let healthy = Address::parse("0x00000000000000000000000000000000000000aa").unwrap();

        let mut inner = StaticIndexer::new();
        inner.fail_owner(failing.clone());
        inner.add_holdings(healthy.clone(), vec![OwnedAsset::new("0xbbb", "2")]);
        let resolver = Resolver::new(SlowOwnershipIndexer {
            delay: Duration::from_millis(50),
            inner,
        });

        let mut stale_sink = RecordingSink::new();
        let mut fresh_sink = RecordingSink::new();

        // The failing lookup for the first address completes after the
        // second query has taken over.
        let stale = resolver.resolve(failing.as_str(), &mut stale_sink);
        let fresh = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            resolver.resolve(healthy.as_str(), &mut fresh_sink).await
        };
        let (stale_outcome, fresh_outcome) = tokio::join!(stale, fresh);

        assert_eq!(stale_outcome, Outcome::Superseded);
        assert_eq!(fresh_outcome, Outcome::Resolved);

        // The stale failure stayed silent: no notice, no clear, no
        // publish to stomp on the fresh query's display.
        assert!(stale_sink.notices().is_empty());
        assert!(stale_sink.published().is_empty());
        assert!(!stale_sink.events.contains(&SinkEvent::Cleared));
        assert!(fresh_sink.last_results().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_ens_failure_is_superseded() {
        use std::time::Duration;

        use async_trait::async_trait;

        use crate::error::ApiError;
        use crate::types::metadata::TokenMeta;

        /// Indexer whose name lookups take a configurable time.
        struct SlowNameIndexer {
            delay: Duration,
            inner: StaticIndexer,
        }

        #[async_trait]
        impl IndexerApi for SlowNameIndexer {
            async fn resolve_name(&self, name: &str) -> Result<Option<Address>, ApiError> {
                tokio::time::sleep(self.delay).await;
                self.inner.resolve_name(name).await
            }

            async fn assets_for_owner(&self, addr: &Address) -> Result<Vec<OwnedAsset>, ApiError> {
                self.inner.assets_for_owner(addr).await
            }

            async fn token_metadata(
                &self,
                contract: &str,
                token_id: &str,
            ) -> Result<TokenMeta, ApiError> {
                self.inner.token_metadata(contract, token_id).await
            }
        }

        let mut inner = StaticIndexer::new();
        inner.add_holdings(owner(), vec![OwnedAsset::new("0xaaa", "1")]);
        let resolver = Resolver::new(SlowNameIndexer {
            delay: Duration::from_millis(50),
            inner,
        });

        let mut stale_sink = RecordingSink::new();
        let mut fresh_sink = RecordingSink::new();

        // The name never resolves, but by the time that is known the
        // address query has taken over.
        let stale = resolver.resolve("nonexistent12345.eth", &mut stale_sink);
        let fresh = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            resolver.resolve(OWNER, &mut fresh_sink).await
        };
        let (stale_outcome, fresh_outcome) = tokio::join!(stale, fresh);

        assert_eq!(stale_outcome, Outcome::Superseded);
        assert_eq!(fresh_outcome, Outcome::Resolved);

        assert!(stale_sink.notices().is_empty());
        assert!(!stale_sink.events.contains(&SinkEvent::Cleared));
        assert!(fresh_sink.last_results().is_some());
    }
}
