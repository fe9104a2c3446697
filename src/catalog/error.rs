use thiserror::Error;

use crate::host::error::HostError;

/// Failures while normalizing a source archive into an installable zip.
#[derive(Debug, Error)]
pub enum RepackError {
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Failures while finding or creating a downloadable release artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error("Repackaging failed: {0}")]
    Repack(#[from] RepackError),

    #[error("Repackaging task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Failures while resolving one repository, tagged with the step that failed.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Metadata fetch failed: {0}")]
    Metadata(#[source] HostError),

    #[error("Tag listing failed: {0}")]
    Tags(#[source] HostError),

    #[error("Release bookkeeping failed: {0}")]
    Releases(#[source] HostError),

    #[error("Manifest retrieval failed: {0}")]
    Manifest(#[source] HostError),
}
