//! Aggregates GitHub-hosted addon repositories into an installable addon
//! feed. A periodic pass resolves each configured repository into version,
//! download, and manifest details, materializes one release artifact per
//! version, and assembles the aggregate `addons.xml` document served over
//! HTTP together with its MD5 digest.

pub mod catalog;
pub mod config;
pub mod host;
pub mod server;
pub mod store;
