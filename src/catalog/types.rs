//! Data model shared by the resolution pipeline, the store, and the server

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::host::RepoInfo;

/// Everything known about one tracked repository after a resolution pass.
///
/// This is a plain value: it carries no handles back to the hosting platform
/// and serializes as-is for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoDetail {
    pub name: String,
    pub description: String,
    pub homepage: String,
    pub owner: String,
    /// Version string to the tag it was extracted from.
    pub versions: BTreeMap<String, String>,
    /// Version string to the artifact download URL.
    pub downloads: BTreeMap<String, String>,
    pub newest_version: Option<String>,
    pub newest_tag: Option<String>,
    /// Decoded addon manifest for the newest stable version.
    pub manifest: Option<String>,
}

impl RepoDetail {
    pub fn new(info: RepoInfo) -> Self {
        Self {
            name: info.name,
            description: info.description,
            homepage: info.homepage,
            owner: info.owner,
            versions: BTreeMap::new(),
            downloads: BTreeMap::new(),
            newest_version: None,
            newest_tag: None,
            manifest: None,
        }
    }

    /// Looks up the download URL for a version; `latest` resolves to the
    /// newest stable version at call time.
    pub fn download_for(&self, version: &str) -> Option<&str> {
        let version = if version == "latest" {
            self.newest_version.as_deref()?
        } else {
            version
        };
        self.downloads.get(version).map(String::as_str)
    }
}

/// The aggregate feed document and its digest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub document: String,
    #[serde(with = "hex::serde")]
    pub digest: Vec<u8>,
}

impl Feed {
    pub fn digest_hex(&self) -> String {
        hex::encode(&self.digest)
    }
}

/// One complete pass over the configured repositories.
///
/// Details are keyed by repository name, so iteration order is the
/// alphabetical order the feed was assembled in.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub generated_at: DateTime<Utc>,
    pub details: BTreeMap<String, RepoDetail>,
    pub feed: Feed,
}

impl Catalog {
    pub fn download_url(&self, name: &str, version: &str) -> Option<&str> {
        self.details.get(name)?.download_for(version)
    }
}
