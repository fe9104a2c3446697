//! Per-repository resolution
//!
//! Turns one tracked repository into a [`RepoDetail`]: discovers version
//! tags, guarantees releases and artifacts exist for them, and fetches the
//! addon manifest for the newest stable version.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::{debug, warn};

use crate::catalog::artifact::ArtifactResolver;
use crate::catalog::error::ResolveError;
use crate::catalog::types::RepoDetail;
use crate::catalog::version::{extract_version, newest_stable};
use crate::host::{RepoFile, RepoHost, RepoRef, TagRef};

/// Addon descriptor expected at the root of every tracked repository.
pub const MANIFEST_FILE: &str = "addon.xml";

/// Resolves one repository into a detail record.
///
/// Metadata, tag, release, and manifest failures abort the repository;
/// per-version artifact failures only cost the affected download entry.
pub async fn resolve_repository(
    host: &dyn RepoHost,
    repo: &RepoRef,
) -> Result<RepoDetail, ResolveError> {
    let info = host.repo_info(repo).await.map_err(ResolveError::Metadata)?;
    let mut detail = RepoDetail::new(info);

    let mut version_tags: BTreeMap<String, TagRef> = BTreeMap::new();
    for tag in host.list_tags(repo).await.map_err(ResolveError::Tags)? {
        let Some(version) = extract_version(&tag.name) else {
            continue;
        };
        if version_tags.contains_key(&version) {
            debug!("Ignoring duplicate tag {} for {} {}", tag.name, repo, version);
            continue;
        }
        version_tags.insert(version, tag);
    }
    detail.versions = version_tags
        .iter()
        .map(|(version, tag)| (version.clone(), tag.name.clone()))
        .collect();

    let artifacts = ArtifactResolver::new(host, repo, &detail.name);
    let releases = artifacts
        .ensure_releases(&version_tags)
        .await
        .map_err(ResolveError::Releases)?;

    detail.newest_version = newest_stable(version_tags.keys().map(String::as_str));
    if let Some(version) = detail.newest_version.clone() {
        if let Some(tag) = version_tags.get(&version) {
            detail.newest_tag = Some(tag.name.clone());
            let file = host
                .file_contents(repo, MANIFEST_FILE, &tag.name)
                .await
                .map_err(ResolveError::Manifest)?;
            detail.manifest = Some(decode_manifest(&file, repo, &tag.name));
        }
    }

    for (version, tag) in &version_tags {
        let Some(release) = releases.get(version) else {
            continue;
        };
        if let Some(url) = artifacts.resolve(version, tag, release).await {
            detail.downloads.insert(version.clone(), url);
        }
    }

    Ok(detail)
}

/// Decodes fetched manifest contents, tolerating unexpected encodings by
/// falling back to the raw payload.
fn decode_manifest(file: &RepoFile, repo: &RepoRef, tag: &str) -> String {
    match file.encoding.as_deref() {
        Some("base64") => {
            let compact: String = file
                .content
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            match BASE64.decode(&compact) {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) => {
                    warn!("Failed to decode manifest for {}:{}: {}", repo, tag, e);
                    file.content.clone()
                }
            }
        }
        None => file.content.clone(),
        Some(other) => {
            warn!(
                "Unexpected encoding {:?} for {}:{} {}",
                other, repo, tag, MANIFEST_FILE
            );
            file.content.clone()
        }
    }
}
