//! Hosting-platform access for tracked addon repositories
//!
//! Everything the engine needs from a source-control host goes through the
//! [`RepoHost`] trait: repository metadata, tags, releases, release assets,
//! file contents at a revision, and raw source archives. `github` provides
//! the production implementation against the GitHub REST API.

pub mod error;
pub mod github;

use std::fmt;
use std::sync::LazyLock;

#[cfg(test)]
use mockall::automock;
use regex::Regex;

use crate::host::error::HostError;

/// Matches `github.com/owner/repo`, tolerating an `https://` prefix, the
/// SSH-style `github.com:` separator, a `.git` suffix, and a trailing slash.
static REPO_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"github\.com[/:]([^/\s]+)/([^/\s]+?)(?:\.git)?/?$")
        .expect("repository URL pattern is valid")
});

/// Identity of a tracked repository on its hosting platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    /// Parses a configured repository URL into an owner/name pair.
    /// Returns `None` if the URL does not look like a repository address.
    pub fn parse(url: &str) -> Option<Self> {
        let captures = REPO_URL_RE.captures(url)?;
        Some(Self {
            owner: captures[1].to_string(),
            name: captures[2].to_string(),
        })
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Repository metadata as reported by the hosting platform.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RepoInfo {
    pub name: String,
    pub description: String,
    pub homepage: String,
    pub owner: String,
}

/// A tag plus the URL of its source archive.
#[derive(Debug, Clone, PartialEq)]
pub struct TagRef {
    pub name: String,
    pub zipball_url: String,
}

/// A hosting-platform release attached to a tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Release {
    pub id: u64,
    pub tag_name: String,
    pub upload_url: String,
}

/// A named binary attached to a release.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseAsset {
    pub name: String,
    pub download_url: String,
}

/// File contents at a revision. `encoding` is the transfer encoding the
/// platform applied to `content` (`base64` on GitHub); `None` means the
/// content is already plain text.
#[derive(Debug, Clone, PartialEq)]
pub struct RepoFile {
    pub content: String,
    pub encoding: Option<String>,
}

/// Capability set the engine requires from a hosting API.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait RepoHost: Send + Sync {
    /// Fetches repository metadata (name, description, homepage, owner).
    async fn repo_info(&self, repo: &RepoRef) -> Result<RepoInfo, HostError>;

    /// Lists all tags of the repository.
    async fn list_tags(&self, repo: &RepoRef) -> Result<Vec<TagRef>, HostError>;

    /// Lists all releases of the repository.
    async fn list_releases(&self, repo: &RepoRef) -> Result<Vec<Release>, HostError>;

    /// Creates a release for an existing tag.
    ///
    /// Not idempotent on the remote side; callers must check
    /// [`list_releases`](Self::list_releases) first.
    async fn create_release(&self, repo: &RepoRef, tag: &str) -> Result<Release, HostError>;

    /// Lists the assets attached to a release.
    async fn list_assets(
        &self,
        repo: &RepoRef,
        release: &Release,
    ) -> Result<Vec<ReleaseAsset>, HostError>;

    /// Uploads `content` as a new release asset named `name`.
    async fn upload_asset(
        &self,
        repo: &RepoRef,
        release: &Release,
        name: &str,
        content: Vec<u8>,
    ) -> Result<ReleaseAsset, HostError>;

    /// Fetches the contents of a single file at a revision.
    ///
    /// # Arguments
    /// * `path` - File path relative to the repository root
    /// * `reference` - Tag (or other ref) naming the revision
    async fn file_contents(
        &self,
        repo: &RepoRef,
        path: &str,
        reference: &str,
    ) -> Result<RepoFile, HostError>;

    /// Downloads a source archive by URL (a tag's zipball).
    async fn download_archive(&self, url: &str) -> Result<Vec<u8>, HostError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://github.com/alelec/plugin.video.example", "alelec", "plugin.video.example")]
    #[case("https://github.com/alelec/plugin.video.example.git", "alelec", "plugin.video.example")]
    #[case("https://github.com/alelec/repo/", "alelec", "repo")]
    #[case("git@github.com:alelec/repo.git", "alelec", "repo")]
    #[case("github.com/alelec/repo", "alelec", "repo")]
    fn parse_accepts_repository_urls(
        #[case] url: &str,
        #[case] owner: &str,
        #[case] name: &str,
    ) {
        let repo = RepoRef::parse(url).unwrap();
        assert_eq!(repo.owner, owner);
        assert_eq!(repo.name, name);
    }

    #[rstest]
    #[case("https://github.com/only-owner")]
    #[case("https://example.com/owner/repo")]
    #[case("https://github.com/owner/repo/tree/main")]
    #[case("not a url")]
    fn parse_rejects_non_repository_urls(#[case] url: &str) {
        assert_eq!(RepoRef::parse(url), None);
    }

    #[test]
    fn repo_ref_displays_as_owner_slash_name() {
        let repo = RepoRef {
            owner: "alelec".to_string(),
            name: "repo".to_string(),
        };
        assert_eq!(repo.to_string(), "alelec/repo");
    }
}
