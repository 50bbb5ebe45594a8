use tokio::sync::watch;

use crate::indexer::IndexerApi;
use crate::resolver::{ResolveSink, Resolver};

/// Drive a resolver from the wallet session's connected account.
///
/// The session provider publishes the current account as an observable
/// value: `Some(address)` while connected, `None` after a disconnect.
/// Every new `Some` is treated as a fresh top-level query; a `None`
/// clears the displayed results and the resubmission guard. Returns
/// once the session provider goes away (sender dropped).
pub async fn watch_session<A: IndexerApi>(
    mut account: watch::Receiver<Option<String>>,
    resolver: &Resolver<A>,
    sink: &mut dyn ResolveSink,
) {
    loop {
        let current = account.borrow_and_update().clone();
        match current {
            Some(addr) => {
                log::info!("session account changed: {addr}");
                resolver.resolve(&addr, sink).await;
            }
            None => {
                log::info!("session disconnected");
                resolver.reset(sink).await;
            }
        }
        if account.changed().await.is_err() {
            return;
        }
    }
}
