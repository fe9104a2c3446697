//! Request handlers for the feed routes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};

use crate::server::AppState;

pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    let Some(catalog) = state.catalog().await else {
        return "No catalog published yet\n".into_response();
    };
    let mut body = format!(
        "addon-feed serving {} repositories, last updated {}\n\n",
        catalog.details.len(),
        catalog.generated_at.to_rfc3339(),
    );
    for detail in catalog.details.values() {
        body.push_str(&detail.name);
        if let Some(version) = &detail.newest_version {
            body.push(' ');
            body.push_str(version);
        }
        body.push('\n');
    }
    body.into_response()
}

pub async fn feed_document(State(state): State<Arc<AppState>>) -> Response {
    match state.catalog().await {
        Some(catalog) => (
            [(header::CONTENT_TYPE, "application/xml")],
            catalog.feed.document.clone(),
        )
            .into_response(),
        None => unavailable(),
    }
}

pub async fn feed_digest(State(state): State<Arc<AppState>>) -> Response {
    match state.catalog().await {
        Some(catalog) => catalog.feed.digest_hex().into_response(),
        None => unavailable(),
    }
}

/// Redirects `{addon_id}/{addon_id}-{version}.zip` to the release artifact.
/// The version `latest` resolves to the newest stable version at request
/// time.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path((addon_id, file)): Path<(String, String)>,
) -> Response {
    let Some(catalog) = state.catalog().await else {
        return unavailable();
    };
    let Some(version) = parse_artifact_name(&addon_id, &file) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match catalog.download_url(&addon_id, version) {
        Some(url) => Redirect::temporary(url).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Extracts the version from an artifact file name. The file must be named
/// `{addon_id}-{version}.zip`; anything else is rejected.
fn parse_artifact_name<'a>(addon_id: &str, file: &'a str) -> Option<&'a str> {
    let stem = file.strip_suffix(".zip")?;
    let version = stem.strip_prefix(addon_id)?.strip_prefix('-')?;
    (!version.is_empty()).then_some(version)
}

fn unavailable() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, "No catalog available yet\n").into_response()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use axum::Router;
    use axum::body::Body;
    use axum::http::{HeaderMap, Request};
    use chrono::Utc;
    use rstest::rstest;
    use tower::util::ServiceExt;

    use super::*;
    use crate::catalog::feed::build_feed;
    use crate::catalog::types::{Catalog, RepoDetail};
    use crate::host::RepoInfo;
    use crate::server::router;

    fn sample_catalog() -> Catalog {
        let mut detail = RepoDetail::new(RepoInfo {
            name: "plugin.video.example".to_string(),
            owner: "alice".to_string(),
            ..RepoInfo::default()
        });
        detail.newest_version = Some("1.2.0".to_string());
        detail.downloads.insert(
            "1.0.0".to_string(),
            "https://dl.example.com/v1.0.0.zip".to_string(),
        );
        detail.downloads.insert(
            "1.2.0".to_string(),
            "https://dl.example.com/v1.2.0.zip".to_string(),
        );
        detail.manifest = Some("<addon id=\"plugin.video.example\"/>".to_string());

        let mut details = BTreeMap::new();
        details.insert(detail.name.clone(), detail);
        let feed = build_feed(&details);
        Catalog {
            generated_at: Utc::now(),
            details,
            feed,
        }
    }

    fn ready_router() -> Router {
        router(Arc::new(AppState::new(Some(sample_catalog()))))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, HeaderMap, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn feed_routes_report_unavailable_before_the_first_pass() {
        for uri in [
            "/repo/addons.xml",
            "/repo/addons.xml.md5",
            "/repo/plugin.video.example/plugin.video.example-1.0.0.zip",
        ] {
            let app = router(Arc::new(AppState::new(None)));
            let (status, _, body) = get(app, uri).await;
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{uri}");
            assert_eq!(body, "No catalog available yet\n", "{uri}");
        }
    }

    #[tokio::test]
    async fn the_index_shows_a_placeholder_before_the_first_pass() {
        let app = router(Arc::new(AppState::new(None)));
        let (status, _, body) = get(app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "No catalog published yet\n");
    }

    #[tokio::test]
    async fn the_index_lists_every_addon_with_its_newest_version() {
        let (status, _, body) = get(ready_router(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("1 repositories"), "{body}");
        assert!(body.contains("plugin.video.example 1.2.0"), "{body}");
    }

    #[tokio::test]
    async fn the_feed_document_is_served_as_xml() {
        let expected = sample_catalog().feed.document;
        let (status, headers, body) = get(ready_router(), "/repo/addons.xml").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/xml");
        assert_eq!(body, expected);
    }

    #[tokio::test]
    async fn the_digest_route_serves_the_hex_fingerprint() {
        let expected = sample_catalog().feed.digest_hex();
        let (status, _, body) = get(ready_router(), "/repo/addons.xml.md5").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, expected);
    }

    #[tokio::test]
    async fn downloads_redirect_to_the_release_artifact() {
        let (status, headers, _) = get(
            ready_router(),
            "/repo/plugin.video.example/plugin.video.example-1.0.0.zip",
        )
        .await;
        assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            headers[header::LOCATION],
            "https://dl.example.com/v1.0.0.zip"
        );
    }

    #[tokio::test]
    async fn latest_redirects_to_the_newest_stable_version() {
        let (status, headers, _) = get(
            ready_router(),
            "/repo/plugin.video.example/plugin.video.example-latest.zip",
        )
        .await;
        assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            headers[header::LOCATION],
            "https://dl.example.com/v1.2.0.zip"
        );
    }

    #[tokio::test]
    async fn unknown_artifacts_are_not_found() {
        for uri in [
            // Repository that is not in the catalog.
            "/repo/plugin.video.other/plugin.video.other-1.0.0.zip",
            // Version that was never published.
            "/repo/plugin.video.example/plugin.video.example-9.9.9.zip",
            // File name prefix does not match the addon id.
            "/repo/plugin.video.example/other-1.0.0.zip",
        ] {
            let (status, _, _) = get(ready_router(), uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        }
    }

    #[rstest]
    #[case("plugin.video.example", "plugin.video.example-1.0.0.zip", Some("1.0.0"))]
    #[case("plugin.video.example", "plugin.video.example-latest.zip", Some("latest"))]
    #[case("a", "a-1.0.0-rc.1.zip", Some("1.0.0-rc.1"))]
    #[case("a", "a-1.0.0+build.5.zip", Some("1.0.0+build.5"))]
    #[case("a", "b-1.0.0.zip", None)]
    #[case("a", "a-1.0.0.tar.gz", None)]
    #[case("a", "a-.zip", None)]
    #[case("a", "a.zip", None)]
    fn artifact_names_parse_into_versions(
        #[case] addon_id: &str,
        #[case] file: &str,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(parse_artifact_name(addon_id, file), expected);
    }
}
