//! Scheduled update passes

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tracing::error;

use crate::catalog::builder::CatalogBuilder;
use crate::catalog::types::Catalog;
use crate::host::{RepoHost, RepoRef};
use crate::server::AppState;
use crate::store::Store;

pub struct Updater {
    host: Arc<dyn RepoHost>,
    repos: Vec<RepoRef>,
    concurrency: usize,
    store: Arc<Store>,
}

impl Updater {
    pub fn new(
        host: Arc<dyn RepoHost>,
        repos: Vec<RepoRef>,
        concurrency: usize,
        store: Arc<Store>,
    ) -> Self {
        Self {
            host,
            repos,
            concurrency,
            store,
        }
    }

    /// Runs one resolution pass and persists the result.
    ///
    /// Persistence failures are logged but do not discard the pass; the
    /// fresh catalog is returned either way so in-memory serving stays
    /// current.
    pub async fn run_pass(&self) -> Arc<Catalog> {
        let builder = CatalogBuilder::new(self.host.as_ref(), self.concurrency);
        let catalog = builder.build(&self.repos).await;
        if let Err(e) = self.store.publish(&catalog) {
            error!("Failed to persist catalog snapshot: {}", e);
        }
        Arc::new(catalog)
    }

    /// Runs passes forever, the first immediately and then one per interval.
    /// A pass that overruns the interval delays the next tick instead of
    /// bursting to catch up.
    pub async fn run_loop(self, state: Arc<AppState>, interval_secs: u64) {
        let mut interval = time::interval(Duration::from_secs(interval_secs.max(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let catalog = self.run_pass().await;
            state.replace_catalog(catalog).await;
        }
    }
}
