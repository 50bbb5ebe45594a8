pub mod alchemy;
pub mod cache;
pub mod ens;
pub mod error;
pub mod indexer;
pub mod query;
pub mod resolver;
pub mod session;
pub mod types;
pub mod view;

// Re-exports for convenience
pub use alchemy::AlchemyClient;
pub use cache::OwnerCache;
pub use error::ApiError;
pub use indexer::{IndexerApi, StaticIndexer};
pub use query::{classify, Address, QueryKind};
pub use resolver::{Notice, Outcome, RecordingSink, ResolveSink, Resolver, SinkEvent};
pub use types::asset::{OwnedAsset, OwnershipResult, PLACEHOLDER_IMAGE};
pub use types::metadata::TokenMeta;
pub use view::{GridItem, GridModel};

/// High-level convenience: resolve one query and return the final
/// grid model, with the invalid-address flag already applied.
pub async fn fetch_grid<A: IndexerApi>(resolver: &Resolver<A>, query: &str) -> GridModel {
    let mut sink = RecordingSink::new();
    let outcome = resolver.resolve(query, &mut sink).await;
    let invalid = matches!(outcome, Outcome::InvalidInput);
    match sink.last_results() {
        Some(result) => GridModel::from_result(result, invalid),
        None => GridModel {
            invalid_address: invalid,
            ..Default::default()
        },
    }
}
