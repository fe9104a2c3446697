//! Find-or-create resolution of downloadable release artifacts
//!
//! Every version tag gets a hosting-platform release, and every release gets
//! a `{name}.zip` asset. When the asset is missing, the source archive is
//! downloaded, normalized, and uploaded once; later passes find it by name
//! and reuse it.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::catalog::error::ArtifactError;
use crate::catalog::repack::normalize_archive;
use crate::catalog::version::extract_version;
use crate::host::error::HostError;
use crate::host::{Release, RepoHost, RepoRef, TagRef};

pub struct ArtifactResolver<'a> {
    host: &'a dyn RepoHost,
    repo: &'a RepoRef,
    /// Repository name as reported by the hosting platform; used both as the
    /// asset stem and as the top-level directory of rebuilt archives.
    name: String,
}

impl<'a> ArtifactResolver<'a> {
    pub fn new(host: &'a dyn RepoHost, repo: &'a RepoRef, name: &str) -> Self {
        Self {
            host,
            repo,
            name: name.to_string(),
        }
    }

    fn asset_name(&self) -> String {
        format!("{}.zip", self.name)
    }

    /// Guarantees a release exists for every version in `tags`.
    ///
    /// Existing releases are matched by the version extracted from their tag
    /// name, first match winning; versions without one get a release created
    /// from their tag.
    pub async fn ensure_releases(
        &self,
        tags: &BTreeMap<String, TagRef>,
    ) -> Result<BTreeMap<String, Release>, HostError> {
        let mut releases: BTreeMap<String, Release> = BTreeMap::new();
        for release in self.host.list_releases(self.repo).await? {
            let Some(version) = extract_version(&release.tag_name) else {
                continue;
            };
            releases.entry(version).or_insert(release);
        }

        for (version, tag) in tags {
            if !releases.contains_key(version) {
                warn!("Creating release for {}:{}", self.repo, tag.name);
                let created = self.host.create_release(self.repo, &tag.name).await?;
                releases.insert(version.clone(), created);
            }
        }
        Ok(releases)
    }

    /// Returns the download URL for one version, building the asset if the
    /// release does not carry it yet. Failures are logged with the source
    /// archive URL and collapse to `None` so the rest of the repository still
    /// resolves.
    pub async fn resolve(&self, version: &str, tag: &TagRef, release: &Release) -> Option<String> {
        match self.find_or_build(tag, release).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(
                    "No download for {} {} ({}): {}",
                    self.repo, version, tag.zipball_url, e
                );
                None
            }
        }
    }

    async fn find_or_build(&self, tag: &TagRef, release: &Release) -> Result<String, ArtifactError> {
        let asset_name = self.asset_name();
        let assets = self.host.list_assets(self.repo, release).await?;
        if let Some(asset) = assets.into_iter().find(|asset| asset.name == asset_name) {
            return Ok(asset.download_url);
        }

        info!(
            "Building {} for {} from {}",
            asset_name, self.repo, tag.zipball_url
        );
        let archive = self.host.download_archive(&tag.zipball_url).await?;
        let top_level = self.name.clone();
        let repacked =
            tokio::task::spawn_blocking(move || normalize_archive(&archive, &top_level)).await??;
        let asset = self
            .host
            .upload_asset(self.repo, release, &asset_name, repacked)
            .await?;
        Ok(asset.download_url)
    }
}
