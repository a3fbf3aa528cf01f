//! GitHub REST client covering the endpoints the publisher needs.

use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};

use super::{FileCommit, FileWrite, HostError, PagesStatus, PutOutcome, RepoCreation, RepoHost};
use crate::config::GitHubConfig;

const USER_AGENT: &str = "pagesmith";
const API_VERSION: &str = "2022-11-28";

/// GitHub client authenticated with a bearer token.
pub struct GitHubClient {
    client: Client,
    token: String,
    api_base: String,
}

/// Subset of the repository object returned on creation.
#[derive(Debug, Deserialize)]
struct CreatedRepo {
    full_name: String,
}

#[derive(Debug, Serialize)]
struct CreateRepoRequest<'a> {
    name: &'a str,
    description: String,
    private: bool,
    auto_init: bool,
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    sha: Option<String>,
}

/// Contents API write response; only the commit is of interest.
#[derive(Debug, Deserialize)]
struct PutContentResponse {
    commit: Option<CommitRef>,
}

#[derive(Debug, Deserialize)]
struct CommitRef {
    sha: Option<String>,
}

#[derive(Debug, Serialize)]
struct PutContentRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PagesInfo {
    html_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct PagesSource<'a> {
    branch: &'a str,
    path: &'a str,
}

#[derive(Debug, Serialize)]
struct EnablePagesRequest<'a> {
    source: PagesSource<'a>,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig) -> Self {
        Self {
            client: Client::new(),
            token: config.token.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        }
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header("User-Agent", USER_AGENT)
    }

    fn contents_url(&self, repo: &str, path: &str) -> String {
        format!(
            "{}/repos/{}/contents/{}",
            self.api_base,
            repo,
            encode_path(path)
        )
    }

    fn pages_endpoint(&self, repo: &str) -> String {
        format!("{}/repos/{}/pages", self.api_base, repo)
    }
}

/// Blob sha from a contents API read. Directory listings come back as arrays
/// and carry no single sha.
fn entry_sha(body: &str) -> Option<String> {
    match serde_json::from_str::<ContentEntry>(body) {
        Ok(entry) => entry.sha,
        Err(e) => {
            tracing::debug!("Could not decode contents entry, treating as absent: {}", e);
            None
        }
    }
}

/// Commit sha from a contents API write response body.
fn commit_sha(body: &str) -> Option<String> {
    match serde_json::from_str::<PutContentResponse>(body) {
        Ok(parsed) => parsed.commit.and_then(|c| c.sha),
        Err(e) => {
            tracing::debug!("Could not decode contents write response: {}", e);
            None
        }
    }
}

/// Percent-encode each path segment, keeping the separators.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl RepoHost for GitHubClient {
    async fn create_repo(&self, name: &str) -> Result<RepoCreation, HostError> {
        let body = CreateRepoRequest {
            name,
            description: format!("Generated project: {}", name),
            private: false,
            auto_init: true,
        };
        let resp = self
            .authed(self.client.post(format!("{}/user/repos", self.api_base)))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        match status {
            StatusCode::CREATED => {
                let repo: CreatedRepo = serde_json::from_str(&text)
                    .map_err(|e| HostError::InvalidResponse(format!("repository body: {}", e)))?;
                tracing::info!(repo = %repo.full_name, "Repository created");
                Ok(RepoCreation::Created {
                    full_name: repo.full_name,
                })
            }
            StatusCode::UNPROCESSABLE_ENTITY => {
                tracing::info!(name, "Repository already exists");
                Ok(RepoCreation::AlreadyExists)
            }
            StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => Err(HostError::PermissionDenied {
                status: status.as_u16(),
                body: text,
            }),
            _ => Err(HostError::status("create repository", status.as_u16(), text)),
        }
    }

    async fn file_sha(
        &self,
        repo: &str,
        path: &str,
        branch: &str,
    ) -> Result<Option<String>, HostError> {
        let resp = self
            .authed(self.client.get(self.contents_url(repo, path)))
            .query(&[("ref", branch)])
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::OK {
            let text = resp.text().await?;
            return Ok(entry_sha(&text));
        }
        if status != StatusCode::NOT_FOUND {
            tracing::warn!(
                repo,
                path,
                status = status.as_u16(),
                "Unexpected status probing file, treating as absent"
            );
        }
        Ok(None)
    }

    async fn put_file(&self, repo: &str, write: FileWrite<'_>) -> Result<FileCommit, HostError> {
        let body = PutContentRequest {
            message: write.message,
            content: base64::engine::general_purpose::STANDARD.encode(write.content),
            branch: write.branch,
            sha: write.sha,
        };
        let resp = self
            .authed(self.client.put(self.contents_url(repo, write.path)))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let outcome = match status {
            StatusCode::CREATED => PutOutcome::Created,
            StatusCode::OK => PutOutcome::Updated,
            _ => {
                let text = resp.text().await.unwrap_or_default();
                return Err(HostError::status("upload file", status.as_u16(), text));
            }
        };
        let text = resp.text().await?;
        Ok(FileCommit {
            outcome,
            commit_sha: commit_sha(&text),
        })
    }

    async fn pages_status(&self, repo: &str) -> Result<PagesStatus, HostError> {
        let resp = self
            .authed(self.client.get(self.pages_endpoint(repo)))
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(PagesStatus::NotEnabled);
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(HostError::status("read pages status", status.as_u16(), text));
        }
        let info: PagesInfo = resp
            .json()
            .await
            .map_err(|e| HostError::InvalidResponse(format!("pages body: {}", e)))?;
        Ok(PagesStatus::Enabled {
            html_url: info.html_url,
        })
    }

    async fn enable_pages(&self, repo: &str, branch: &str, path: &str) -> Result<(), HostError> {
        let body = EnablePagesRequest {
            source: PagesSource { branch, path },
        };
        let resp = self
            .authed(self.client.post(self.pages_endpoint(repo)))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let text = resp.text().await.unwrap_or_default();
        // 409: a concurrent run already enabled pages.
        if status == StatusCode::CONFLICT {
            tracing::info!(repo, "Pages already enabled");
            return Ok(());
        }
        Err(HostError::status("enable pages", status.as_u16(), text))
    }

    async fn trigger_pages_build(&self, repo: &str) -> Result<(), HostError> {
        let resp = self
            .authed(
                self.client
                    .post(format!("{}/builds", self.pages_endpoint(repo))),
            )
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            let text = resp.text().await.unwrap_or_default();
            Err(HostError::status("trigger pages build", status.as_u16(), text))
        }
    }

    fn repo_url(&self, full_name: &str) -> String {
        format!("https://github.com/{}", full_name)
    }
}
