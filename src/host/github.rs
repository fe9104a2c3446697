//! GitHub REST API implementation of the hosting-client trait

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::warn;

use crate::config::{API_MAX_RETRIES, API_RETRY_DELAY_MS, HTTP_TIMEOUT_SECS};
use crate::host::error::HostError;
use crate::host::{Release, ReleaseAsset, RepoFile, RepoHost, RepoInfo, RepoRef, TagRef};

/// Default base URL for the GitHub API
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Page size for paginated listings
const PER_PAGE: u32 = 100;

/// Response from the GitHub repository endpoint
#[derive(Debug, Deserialize)]
struct RepoResponse {
    name: String,
    description: Option<String>,
    homepage: Option<String>,
    owner: OwnerResponse,
}

#[derive(Debug, Deserialize)]
struct OwnerResponse {
    login: String,
}

/// Response from the GitHub tags endpoint
#[derive(Debug, Deserialize)]
struct TagResponse {
    name: String,
    zipball_url: String,
}

/// Response from the GitHub releases endpoints
#[derive(Debug, Deserialize)]
struct ReleaseResponse {
    id: u64,
    tag_name: String,
    upload_url: String,
}

/// Response from the GitHub release-assets endpoints
#[derive(Debug, Deserialize)]
struct AssetResponse {
    name: String,
    browser_download_url: String,
}

/// Response from the GitHub contents endpoint
#[derive(Debug, Deserialize)]
struct ContentsResponse {
    content: String,
    encoding: String,
}

/// Hosting client for the GitHub REST API (v3).
pub struct GithubHost {
    client: reqwest::Client,
    base_url: String,
    retry_delay: Duration,
}

impl GithubHost {
    /// Creates a new GithubHost against a custom base URL.
    pub fn new(base_url: &str, token: &str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .expect("Failed to create authorization header");
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        Self {
            client: reqwest::Client::builder()
                .user_agent("addon-feed")
                .default_headers(headers)
                .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.to_string(),
            retry_delay: Duration::from_millis(API_RETRY_DELAY_MS),
        }
    }

    #[cfg(test)]
    fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Sends a request, retrying transient failures (connection errors, 5xx,
    /// 429) up to `API_MAX_RETRIES` attempts with a linearly growing delay.
    async fn send_with_retry(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, HostError> {
        let mut attempt: u32 = 1;
        loop {
            let Some(next) = request.try_clone() else {
                return Ok(request.send().await?);
            };

            match next.send().await {
                Ok(response) => {
                    let status = response.status();
                    let transient =
                        status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS;
                    if !transient || attempt >= API_MAX_RETRIES {
                        return Ok(response);
                    }
                    warn!(
                        "Attempt {}/{} for {} returned {}, retrying",
                        attempt,
                        API_MAX_RETRIES,
                        response.url(),
                        status
                    );
                }
                Err(e) => {
                    if attempt >= API_MAX_RETRIES {
                        return Err(e.into());
                    }
                    warn!(
                        "Attempt {}/{} failed: {}, retrying",
                        attempt, API_MAX_RETRIES, e
                    );
                }
            }

            sleep(self.retry_delay * attempt).await;
            attempt += 1;
        }
    }

    /// Maps error statuses to the taxonomy; passes successful responses through.
    fn check_status(
        response: reqwest::Response,
        resource: &str,
    ) -> Result<reqwest::Response, HostError> {
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(HostError::NotFound(resource.to_string()));
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(HostError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !status.is_success() {
            warn!("GitHub API returned status {} for {}", status, resource);
            return Err(HostError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        Ok(response)
    }

    fn parse_json_error(url: &str, e: reqwest::Error) -> HostError {
        warn!("Failed to parse GitHub response from {}: {}", url, e);
        HostError::InvalidResponse(e.to_string())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, HostError> {
        let response = self.send_with_retry(self.client.get(url)).await?;
        let response = Self::check_status(response, url)?;
        response
            .json()
            .await
            .map_err(|e| Self::parse_json_error(url, e))
    }

    /// Fetches every page of a list endpoint, stopping at the first short page.
    async fn get_paginated<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>, HostError> {
        let mut items = Vec::new();
        let mut page: u32 = 1;

        loop {
            let request = self
                .client
                .get(url)
                .query(&[("per_page", PER_PAGE), ("page", page)]);
            let response = self.send_with_retry(request).await?;
            let response = Self::check_status(response, url)?;
            let batch: Vec<T> = response
                .json()
                .await
                .map_err(|e| Self::parse_json_error(url, e))?;

            let count = batch.len();
            items.extend(batch);

            if count < PER_PAGE as usize {
                return Ok(items);
            }
            page += 1;
        }
    }
}

#[async_trait::async_trait]
impl RepoHost for GithubHost {
    async fn repo_info(&self, repo: &RepoRef) -> Result<RepoInfo, HostError> {
        let url = format!("{}/repos/{}/{}", self.base_url, repo.owner, repo.name);
        let body: RepoResponse = self.get_json(&url).await?;

        Ok(RepoInfo {
            name: body.name,
            description: body.description.unwrap_or_default(),
            homepage: body.homepage.unwrap_or_default(),
            owner: body.owner.login,
        })
    }

    async fn list_tags(&self, repo: &RepoRef) -> Result<Vec<TagRef>, HostError> {
        let url = format!("{}/repos/{}/{}/tags", self.base_url, repo.owner, repo.name);
        let tags: Vec<TagResponse> = self.get_paginated(&url).await?;

        Ok(tags
            .into_iter()
            .map(|t| TagRef {
                name: t.name,
                zipball_url: t.zipball_url,
            })
            .collect())
    }

    async fn list_releases(&self, repo: &RepoRef) -> Result<Vec<Release>, HostError> {
        let url = format!(
            "{}/repos/{}/{}/releases",
            self.base_url, repo.owner, repo.name
        );
        let releases: Vec<ReleaseResponse> = self.get_paginated(&url).await?;

        Ok(releases
            .into_iter()
            .map(|r| Release {
                id: r.id,
                tag_name: r.tag_name,
                upload_url: r.upload_url,
            })
            .collect())
    }

    async fn create_release(&self, repo: &RepoRef, tag: &str) -> Result<Release, HostError> {
        let url = format!(
            "{}/repos/{}/{}/releases",
            self.base_url, repo.owner, repo.name
        );

        // Deliberately not retried: a lost response would make a second
        // attempt collide with the release created by the first.
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "tag_name": tag }))
            .send()
            .await?;
        let response = Self::check_status(response, &url)?;
        let body: ReleaseResponse = response
            .json()
            .await
            .map_err(|e| Self::parse_json_error(&url, e))?;

        Ok(Release {
            id: body.id,
            tag_name: body.tag_name,
            upload_url: body.upload_url,
        })
    }

    async fn list_assets(
        &self,
        repo: &RepoRef,
        release: &Release,
    ) -> Result<Vec<ReleaseAsset>, HostError> {
        let url = format!(
            "{}/repos/{}/{}/releases/{}/assets",
            self.base_url, repo.owner, repo.name, release.id
        );
        let assets: Vec<AssetResponse> = self.get_paginated(&url).await?;

        Ok(assets
            .into_iter()
            .map(|a| ReleaseAsset {
                name: a.name,
                download_url: a.browser_download_url,
            })
            .collect())
    }

    async fn upload_asset(
        &self,
        _repo: &RepoRef,
        release: &Release,
        name: &str,
        content: Vec<u8>,
    ) -> Result<ReleaseAsset, HostError> {
        // The upload URL arrives as a URI template ending in {?name,label}.
        let upload_url = match release.upload_url.split_once('{') {
            Some((prefix, _)) => prefix,
            None => release.upload_url.as_str(),
        };

        let response = self
            .client
            .post(upload_url)
            .query(&[("name", name)])
            .header(CONTENT_TYPE, "application/zip")
            .body(content)
            .send()
            .await?;
        let response = Self::check_status(response, upload_url)?;
        let body: AssetResponse = response
            .json()
            .await
            .map_err(|e| Self::parse_json_error(upload_url, e))?;

        Ok(ReleaseAsset {
            name: body.name,
            download_url: body.browser_download_url,
        })
    }

    async fn file_contents(
        &self,
        repo: &RepoRef,
        path: &str,
        reference: &str,
    ) -> Result<RepoFile, HostError> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.base_url, repo.owner, repo.name, path
        );
        let request = self.client.get(&url).query(&[("ref", reference)]);
        let response = self.send_with_retry(request).await?;
        let response = Self::check_status(response, &url)?;
        let body: ContentsResponse = response
            .json()
            .await
            .map_err(|e| Self::parse_json_error(&url, e))?;

        Ok(RepoFile {
            content: body.content,
            encoding: Some(body.encoding),
        })
    }

    async fn download_archive(&self, url: &str) -> Result<Vec<u8>, HostError> {
        let response = self.send_with_retry(self.client.get(url)).await?;
        let response = Self::check_status(response, url)?;
        Ok(response.bytes().await?.to_vec())
    }
}
