//! HTTP serving layer
//!
//! Serves the last completed catalog pass: the aggregate feed document, its
//! digest, and per-version download redirects. A background task refreshes
//! the snapshot on a fixed cadence; request handlers only ever read the
//! current snapshot and never wait on a running pass.

pub mod routes;
pub mod update;

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::routing::get;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::catalog::types::Catalog;
use crate::config::Config;
use crate::host::RepoHost;
use crate::host::github::GithubHost;
use crate::store::Store;

/// Shared handler state: the catalog snapshot currently being served.
pub struct AppState {
    catalog: RwLock<Option<Arc<Catalog>>>,
}

impl AppState {
    pub fn new(initial: Option<Catalog>) -> Self {
        Self {
            catalog: RwLock::new(initial.map(Arc::new)),
        }
    }

    /// The snapshot to serve, or `None` before the first completed pass.
    pub async fn catalog(&self) -> Option<Arc<Catalog>> {
        self.catalog.read().await.clone()
    }

    pub async fn replace_catalog(&self, catalog: Arc<Catalog>) {
        *self.catalog.write().await = Some(catalog);
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/repo/addons.xml", get(routes::feed_document))
        .route("/repo/addons.xml.md5", get(routes::feed_digest))
        .route("/repo/{addon_id}/{file}", get(routes::download))
        .with_state(state)
}

/// Binds the HTTP server and runs it alongside the update loop.
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let token = config
        .feed
        .github_token
        .clone()
        .context("No hosting-platform token configured")?;

    let store = Arc::new(Store::open(&config.store.path)?);
    let initial = match store.load() {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("Ignoring unreadable snapshot: {}", e);
            None
        }
    };
    if initial.is_some() {
        info!("Serving the persisted snapshot until the first pass completes");
    }
    let state = Arc::new(AppState::new(initial));

    let host: Arc<dyn RepoHost> = Arc::new(GithubHost::new(&config.feed.api_url, &token));
    let updater = update::Updater::new(
        host,
        config.feed.repos.clone(),
        config.update.concurrency,
        store,
    );
    tokio::spawn(updater.run_loop(state.clone(), config.update.interval_secs));

    let app = router(state).layer(TraceLayer::new_for_http());
    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    info!("Serving addon feed on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
