//! GitHub API mock endpoints and archive fixtures

use std::io::{Cursor, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::json;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Mounts the repository metadata endpoint.
pub async fn mock_repo_info(server: &mut ServerGuard, owner: &str, name: &str) -> Mock {
    server
        .mock("GET", format!("/repos/{owner}/{name}").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "name": name,
                "description": "Example addon",
                "homepage": "https://example.com",
                "owner": {"login": owner},
            })
            .to_string(),
        )
        .create_async()
        .await
}

/// Mounts the tag listing with `(tag_name, zipball_url)` entries.
pub async fn mock_tags(
    server: &mut ServerGuard,
    owner: &str,
    name: &str,
    tags: &[(&str, &str)],
) -> Mock {
    let items: Vec<serde_json::Value> = tags
        .iter()
        .map(|(tag, url)| json!({"name": tag, "zipball_url": url}))
        .collect();
    server
        .mock("GET", format!("/repos/{owner}/{name}/tags").as_str())
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(serde_json::Value::Array(items).to_string())
        .create_async()
        .await
}

/// Mounts the release listing with `(id, tag_name, upload_url)` entries.
pub async fn mock_releases(
    server: &mut ServerGuard,
    owner: &str,
    name: &str,
    releases: &[(u64, &str, &str)],
) -> Mock {
    let items: Vec<serde_json::Value> = releases
        .iter()
        .map(|(id, tag, upload_url)| json!({"id": id, "tag_name": tag, "upload_url": upload_url}))
        .collect();
    server
        .mock("GET", format!("/repos/{owner}/{name}/releases").as_str())
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(serde_json::Value::Array(items).to_string())
        .create_async()
        .await
}

/// Mounts the asset listing of one release with `(name, download_url)`
/// entries.
pub async fn mock_release_assets(
    server: &mut ServerGuard,
    owner: &str,
    name: &str,
    release_id: u64,
    assets: &[(&str, &str)],
) -> Mock {
    let items: Vec<serde_json::Value> = assets
        .iter()
        .map(|(asset, url)| json!({"name": asset, "browser_download_url": url}))
        .collect();
    server
        .mock(
            "GET",
            format!("/repos/{owner}/{name}/releases/{release_id}/assets").as_str(),
        )
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(serde_json::Value::Array(items).to_string())
        .create_async()
        .await
}

/// Mounts the release creation endpoint for one expected tag.
pub async fn mock_create_release(
    server: &mut ServerGuard,
    owner: &str,
    name: &str,
    tag: &str,
    id: u64,
    upload_url: &str,
) -> Mock {
    server
        .mock("POST", format!("/repos/{owner}/{name}/releases").as_str())
        .match_body(Matcher::Json(json!({"tag_name": tag})))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(json!({"id": id, "tag_name": tag, "upload_url": upload_url}).to_string())
        .create_async()
        .await
}

/// Mounts the contents endpoint serving `manifest` base64-encoded at the
/// given ref, the way GitHub transfers file contents.
pub async fn mock_manifest(
    server: &mut ServerGuard,
    owner: &str,
    name: &str,
    reference: &str,
    manifest: &str,
) -> Mock {
    server
        .mock(
            "GET",
            format!("/repos/{owner}/{name}/contents/addon.xml").as_str(),
        )
        .match_query(Matcher::UrlEncoded("ref".into(), reference.into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"content": BASE64.encode(manifest), "encoding": "base64"}).to_string(),
        )
        .create_async()
        .await
}

/// Builds a zip archive shaped like a GitHub source zipball: every entry
/// lives under a commit-specific top-level folder.
pub fn github_zipball(top_folder: &str, files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    writer
        .add_directory(format!("{top_folder}/"), options)
        .unwrap();
    for (path, contents) in files {
        writer
            .start_file(format!("{top_folder}/{path}"), options)
            .unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
