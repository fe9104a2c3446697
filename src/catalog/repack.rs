//! Source-archive normalization
//!
//! Hosting platforms serve source snapshots under a generated top-level
//! directory such as `owner-repo-abc1234/`. Installable addon zips must
//! instead carry the addon id as their single top-level directory, with
//! dot-prefixed entries stripped out.

use std::fs::File;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use walkdir::{DirEntry, WalkDir};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::catalog::error::RepackError;

/// Rebuilds `source` as a fresh archive rooted at `top_level`.
///
/// A single top-level directory in the source is renamed to `top_level`;
/// anything else is wrapped under it. Dot-prefixed files and directories are
/// dropped, while directories left without visible entries are preserved as
/// explicit directory entries. The scratch space is removed on every exit
/// path.
pub fn normalize_archive(source: &[u8], top_level: &str) -> Result<Vec<u8>, RepackError> {
    let scratch = TempDir::new()?;
    let extract_root = scratch.path().join("contents");

    let mut archive = ZipArchive::new(Cursor::new(source))?;
    archive.extract(&extract_root)?;

    let entries: Vec<PathBuf> = std::fs::read_dir(&extract_root)?
        .map(|entry| entry.map(|found| found.path()))
        .collect::<Result<_, _>>()?;

    let content_root = match entries.as_slice() {
        [only] if only.is_dir() => {
            let renamed = extract_root.join(top_level);
            if *only != renamed {
                std::fs::rename(only, &renamed)?;
            }
            renamed
        }
        _ => extract_root,
    };

    zip_directory(&content_root, top_level)
}

fn zip_directory(root: &Path, prefix: &str) -> Result<Vec<u8>, RepackError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

    for entry in walker {
        let entry = entry?;
        let archive_path = entry_archive_path(root, entry.path(), prefix);

        if entry.file_type().is_dir() {
            if !has_visible_children(entry.path())? {
                writer.add_directory(archive_path, options)?;
            }
        } else {
            writer.start_file(archive_path, options)?;
            let mut file = File::open(entry.path())?;
            io::copy(&mut file, &mut writer)?;
        }
    }

    Ok(writer.finish()?.into_inner())
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn has_visible_children(dir: &Path) -> Result<bool, RepackError> {
    for entry in std::fs::read_dir(dir)? {
        if !entry?.file_name().to_string_lossy().starts_with('.') {
            return Ok(true);
        }
    }
    Ok(false)
}

fn entry_archive_path(root: &Path, path: &Path, prefix: &str) -> String {
    let relative = path
        .strip_prefix(root)
        .expect("walk entries live under the walk root");
    let mut parts = vec![prefix.to_string()];
    parts.extend(
        relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}
