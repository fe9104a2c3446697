//! Repository-detail resolution and artifact materialization
//!
//! This module turns the configured hosting-platform repositories into an
//! installable addon feed: per-repository detail records, guaranteed release
//! artifacts, and the aggregate feed document with its digest.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Builder   │────▶│  Resolver   │────▶│  Artifact   │
//! │  (fan-out)  │     │ (one repo)  │     │ (find/make) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                   │                   │
//!        ▼                   ▼                   ▼
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │    Feed     │     │   Version   │     │   Repack    │
//! │ (assembly)  │     │ (selection) │     │ (normalize) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`builder`]: Bounded-concurrency pass over all repositories
//! - [`resolver`]: Resolution of one repository into a detail record
//! - [`artifact`]: Find-or-create release artifacts, uploading rebuilt zips
//! - [`repack`]: Source-archive normalization
//! - [`feed`]: Aggregate feed document assembly and digest
//! - [`version`]: Version-tag parsing and newest-stable selection
//! - [`types`]: `RepoDetail`, `Feed`, and `Catalog` values
//! - [`error`]: Error types for resolution, artifacts, and repackaging

pub mod artifact;
pub mod builder;
pub mod error;
pub mod feed;
pub mod repack;
pub mod resolver;
pub mod types;
pub mod version;
