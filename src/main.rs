use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use addon_feed::catalog::builder::CatalogBuilder;
use addon_feed::config::Config;
use addon_feed::host::RepoHost;
use addon_feed::host::github::GithubHost;
use addon_feed::server::update::Updater;
use addon_feed::store::Store;

#[derive(Parser)]
#[command(name = "addon-feed")]
#[command(version, about = "Serves GitHub-hosted addon repositories as an installable feed")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "addon-feed.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server and the periodic update loop (default)
    Serve,
    /// Run a single update pass, persist the snapshot, and exit
    Update,
    /// Run a single pass and print the feed document without persisting it
    Dump,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(&cli.config)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => runtime.block_on(addon_feed::server::run_server(config)),
        Command::Update => runtime.block_on(run_update(config)),
        Command::Dump => runtime.block_on(run_dump(config)),
    }
}

/// One-shot variant of the update loop, for cron-style deployments.
async fn run_update(config: Config) -> anyhow::Result<()> {
    let token = config
        .feed
        .github_token
        .clone()
        .context("No hosting-platform token configured")?;
    let store = Arc::new(Store::open(&config.store.path)?);
    let host: Arc<dyn RepoHost> = Arc::new(GithubHost::new(&config.feed.api_url, &token));
    let updater = Updater::new(
        host,
        config.feed.repos.clone(),
        config.update.concurrency,
        store,
    );

    let catalog = updater.run_pass().await;
    println!(
        "Resolved {} repositories, feed digest {}",
        catalog.details.len(),
        catalog.feed.digest_hex()
    );
    Ok(())
}

async fn run_dump(config: Config) -> anyhow::Result<()> {
    let token = config
        .feed
        .github_token
        .clone()
        .context("No hosting-platform token configured")?;
    let host = GithubHost::new(&config.feed.api_url, &token);
    let builder = CatalogBuilder::new(&host, config.update.concurrency);

    let catalog = builder.build(&config.feed.repos).await;
    print!("{}", catalog.feed.document);
    Ok(())
}
