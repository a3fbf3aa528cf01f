//! Local task directories.
//!
//! Every task gets a directory under the configured data dir that mirrors what
//! was received and produced:
//!
//! ```text
//! {data_dir}/{task}/
//!   request.json        raw inbound brief
//!   attachments/        decoded data-URI attachments
//!   site/               generated files, written before upload
//!   publish.json        summary of the last run
//! ```

use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::task::Attachment;

pub const REQUEST_FILE: &str = "request.json";
pub const SUMMARY_FILE: &str = "publish.json";
pub const ATTACHMENTS_DIR: &str = "attachments";
pub const SITE_DIR: &str = "site";

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("refusing unsafe path {0:?}")]
    UnsafePath(String),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {0}: {1}")]
    Serialize(&'static str, #[source] serde_json::Error),
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> WorkspaceError + '_ {
    move |source| WorkspaceError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Sanitize a path component to prevent path traversal.
/// Keeps only the final segment and strips traversal sequences and NULs.
pub fn sanitize_path_component(s: &str) -> String {
    let filename = s.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(s);

    filename
        .replace("..", "")
        .replace('\0', "")
        .trim()
        .to_string()
}

/// Validate a generated filename as a relative path that stays inside its root.
fn relative_file_path(name: &str) -> Result<PathBuf, WorkspaceError> {
    let path = Path::new(name);
    let safe = !name.trim().is_empty()
        && !name.contains('\0')
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if safe {
        Ok(path.to_path_buf())
    } else {
        Err(WorkspaceError::UnsafePath(name.to_string()))
    }
}

/// Directory for `task` under `data_dir`.
///
/// The task name must already be a plain path component: names that
/// sanitizing would alter are rejected, so two tasks never share a directory.
pub fn task_dir(data_dir: &Path, task: &str) -> Result<PathBuf, WorkspaceError> {
    if task.is_empty() || task == "." || sanitize_path_component(task) != task {
        return Err(WorkspaceError::UnsafePath(task.to_string()));
    }
    Ok(data_dir.join(task))
}

/// Locate a previously stored file for `GET /files/:task/:name`.
///
/// Generated files shadow attachments with the same name.
pub async fn find_served_file(data_dir: &Path, task: &str, name: &str) -> Option<PathBuf> {
    let dir = task_dir(data_dir, task).ok()?;
    let name = sanitize_path_component(name);
    if name.is_empty() {
        return None;
    }
    for sub in [SITE_DIR, ATTACHMENTS_DIR] {
        let candidate = dir.join(sub).join(&name);
        if tokio::fs::metadata(&candidate)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
        {
            return Some(candidate);
        }
    }
    None
}

/// Read back the mirrored inbound request for `task`, if one was stored.
pub async fn load_request(
    data_dir: &Path,
    task: &str,
) -> Result<Option<serde_json::Value>, WorkspaceError> {
    let path = task_dir(data_dir, task)?.join(REQUEST_FILE);
    let contents = match tokio::fs::read_to_string(&path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_err(&path)(e)),
    };
    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|e| WorkspaceError::Serialize(REQUEST_FILE, e))
}

/// Handle to one task's local directory.
#[derive(Debug, Clone)]
pub struct TaskWorkspace {
    root: PathBuf,
}

impl TaskWorkspace {
    /// Create (or reopen) the directory for `task`.
    pub async fn open(data_dir: &Path, task: &str) -> Result<Self, WorkspaceError> {
        let root = task_dir(data_dir, task)?;
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(io_err(&root))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn site_dir(&self) -> PathBuf {
        self.root.join(SITE_DIR)
    }

    /// Store the raw inbound request, pretty-printed.
    pub async fn mirror_request(&self, raw: &serde_json::Value) -> Result<PathBuf, WorkspaceError> {
        let path = self.root.join(REQUEST_FILE);
        let contents = serde_json::to_string_pretty(raw)
            .map_err(|e| WorkspaceError::Serialize(REQUEST_FILE, e))?;
        tokio::fs::write(&path, contents)
            .await
            .map_err(io_err(&path))?;
        tracing::debug!(path = %path.display(), "Mirrored inbound request");
        Ok(path)
    }

    /// Decode and store data-URI attachments.
    ///
    /// Plain URLs are not fetched. A bad attachment is logged and skipped; it
    /// never fails the task.
    pub async fn save_attachments(&self, attachments: &[Attachment]) -> Vec<PathBuf> {
        let mut saved = Vec::new();
        if attachments.is_empty() {
            return saved;
        }

        let dir = self.root.join(ATTACHMENTS_DIR);
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            tracing::warn!(dir = %dir.display(), "Failed to create attachments dir: {}", e);
            return saved;
        }

        for attachment in attachments {
            let name = sanitize_path_component(&attachment.name);
            if name.is_empty() {
                tracing::warn!(name = %attachment.name, "Skipping attachment with unusable name");
                continue;
            }
            let Some(decoded) = attachment.decode_data_uri() else {
                tracing::info!(name = %name, "Attachment is not a base64 data URI, not stored");
                continue;
            };
            let path = dir.join(&name);
            match tokio::fs::write(&path, &decoded.data).await {
                Ok(()) => {
                    tracing::info!(
                        path = %path.display(),
                        mime = %decoded.mime,
                        bytes = decoded.data.len(),
                        "Saved attachment"
                    );
                    saved.push(path);
                }
                Err(e) => tracing::warn!(name = %name, "Error saving attachment: {}", e),
            }
        }
        saved
    }

    /// Write a generated file into `site/`, creating parent directories.
    pub async fn write_file(&self, filename: &str, content: &str) -> Result<PathBuf, WorkspaceError> {
        let path = self.site_dir().join(relative_file_path(filename)?);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(io_err(parent))?;
        }
        tokio::fs::write(&path, content)
            .await
            .map_err(io_err(&path))?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "Wrote generated file");
        Ok(path)
    }

    /// Record a run summary next to the request.
    pub async fn write_summary<T: Serialize>(&self, summary: &T) -> Result<PathBuf, WorkspaceError> {
        let path = self.root.join(SUMMARY_FILE);
        let contents = serde_json::to_string_pretty(summary)
            .map_err(|e| WorkspaceError::Serialize(SUMMARY_FILE, e))?;
        tokio::fs::write(&path, contents)
            .await
            .map_err(io_err(&path))?;
        Ok(path)
    }
}
