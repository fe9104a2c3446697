//! Whole-pass orchestration
//!
//! Resolves every configured repository with bounded concurrency and
//! assembles the results into a [`Catalog`]. A failing repository is logged
//! and omitted; it never aborts the pass.

use std::collections::BTreeMap;

use chrono::Utc;
use futures::StreamExt;
use futures::stream;
use tracing::{error, info};

use crate::catalog::feed::build_feed;
use crate::catalog::resolver::resolve_repository;
use crate::catalog::types::{Catalog, RepoDetail};
use crate::host::{RepoHost, RepoRef};

pub struct CatalogBuilder<'a> {
    host: &'a dyn RepoHost,
    concurrency: usize,
}

impl<'a> CatalogBuilder<'a> {
    pub fn new(host: &'a dyn RepoHost, concurrency: usize) -> Self {
        Self {
            host,
            concurrency: concurrency.max(1),
        }
    }

    /// Runs one full pass and returns the resulting catalog.
    pub async fn build(&self, repos: &[RepoRef]) -> Catalog {
        info!("Resolving {} repositories", repos.len());

        let resolved: Vec<Option<(String, RepoDetail)>> = stream::iter(repos)
            .map(|repo| async move {
                match resolve_repository(self.host, repo).await {
                    Ok(detail) => Some((detail.name.clone(), detail)),
                    Err(e) => {
                        error!("Skipping {}: {}", repo, e);
                        None
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .boxed()
            .collect()
            .await;

        let details: BTreeMap<String, RepoDetail> = resolved.into_iter().flatten().collect();
        let feed = build_feed(&details);

        info!(
            "Pass finished: {} of {} repositories resolved, feed digest {}",
            details.len(),
            repos.len(),
            feed.digest_hex()
        );

        Catalog {
            generated_at: Utc::now(),
            details,
            feed,
        }
    }
}
