//! Repository host abstraction.
//!
//! The publish orchestrator talks to a [`RepoHost`]: create a repository, write
//! files through the contents API, and turn on static hosting. [`GitHubClient`]
//! is the production implementation; tests use in-memory fakes.

mod client;
mod error;

pub use client::GitHubClient;
pub use error::HostError;

use async_trait::async_trait;
use serde::Serialize;

/// Result of a repository creation attempt that did not fail outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoCreation {
    /// Fresh repository with its `owner/name`.
    Created { full_name: String },
    /// The name is taken (422); the caller reuses it.
    AlreadyExists,
}

/// Whether a file write created or replaced the remote file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PutOutcome {
    Created,
    Updated,
}

/// Static-hosting state for a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagesStatus {
    Enabled { html_url: Option<String> },
    NotEnabled,
}

/// A successful file write and the commit that recorded it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileCommit {
    pub outcome: PutOutcome,
    /// Sha of the commit created by the write, when the host reports one.
    pub commit_sha: Option<String>,
}

/// One file write through the contents API.
#[derive(Debug, Clone)]
pub struct FileWrite<'a> {
    pub path: &'a str,
    pub content: &'a [u8],
    pub branch: &'a str,
    pub message: &'a str,
    /// Current version marker; required to update an existing file.
    pub sha: Option<&'a str>,
}

#[async_trait]
pub trait RepoHost: Send + Sync {
    /// Create a public repository named `name` under the authenticated account.
    async fn create_repo(&self, name: &str) -> Result<RepoCreation, HostError>;

    /// Version marker of `path` on `branch`, or `None` when it does not exist.
    async fn file_sha(
        &self,
        repo: &str,
        path: &str,
        branch: &str,
    ) -> Result<Option<String>, HostError>;

    /// Create or update one file.
    async fn put_file(&self, repo: &str, write: FileWrite<'_>) -> Result<FileCommit, HostError>;

    async fn pages_status(&self, repo: &str) -> Result<PagesStatus, HostError>;

    /// Serve `path` of `branch` as the site root.
    async fn enable_pages(&self, repo: &str, branch: &str, path: &str) -> Result<(), HostError>;

    async fn trigger_pages_build(&self, repo: &str) -> Result<(), HostError>;

    /// Browser URL of a repository.
    fn repo_url(&self, full_name: &str) -> String;

    /// Probe for the current version marker, then write with it when present.
    async fn upload(
        &self,
        repo: &str,
        path: &str,
        content: &[u8],
        branch: &str,
        message: &str,
    ) -> Result<FileCommit, HostError> {
        let sha = self.file_sha(repo, path, branch).await?;
        if let Some(sha) = &sha {
            tracing::debug!(path, sha = %sha, "Existing file found, updating");
        }
        self.put_file(
            repo,
            FileWrite {
                path,
                content,
                branch,
                message,
                sha: sha.as_deref(),
            },
        )
        .await
    }
}

/// Public hosting URL for `owner/name`.
///
/// User sites (`owner.github.io`) are served from the domain root.
pub fn pages_url(full_name: &str) -> String {
    let (owner, name) = full_name.split_once('/').unwrap_or(("", full_name));
    let owner = owner.to_lowercase();
    let user_site = format!("{owner}.github.io");
    if name.eq_ignore_ascii_case(&user_site) {
        format!("https://{user_site}")
    } else {
        format!("https://{user_site}/{name}")
    }
}
