//! Publish orchestrator.
//!
//! One run turns a [`TaskBrief`] into files in a repository:
//!
//! ```text
//! AcquireRepo → GenerateBrief → per file: Generate → Extract → Write → Upload
//!             → HtmlFallback → EnsurePages → TriggerBuild → Summarize → Notify
//! ```
//!
//! Every stage returns a `Result`; the first fatal error stops the run and is
//! reported together with the files already uploaded. Nothing is retried and
//! nothing is rolled back. Pages activation, the build trigger and the
//! evaluation callback are best effort.

mod error;
pub mod notify;
pub mod prompts;

#[cfg(test)]
pub(crate) mod testing;

pub use error::PublishError;
pub use notify::{EvaluationNotifier, EvaluationPayload, HttpNotifier, TaskDetails};

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::github::{self, FileCommit, PagesStatus, RepoCreation, RepoHost};
use crate::llm::TextGenerator;
use crate::task::{
    extract, fenced_block, resolve_checks, AcquisitionMode, GeneratedFile, TaskBrief,
};
use crate::workspace::TaskWorkspace;

/// Filename used for the HTML fallback.
pub const INDEX_HTML: &str = "index.html";

/// Repository the run publishes into.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RepositoryInfo {
    pub name: String,
    pub full_name: String,
    pub url: String,
    pub pages_url: String,
    /// False when the repository already existed or was supplied by the caller.
    pub created: bool,
}

/// Outcome of one publish run.
#[derive(Debug, Clone, Serialize)]
pub struct PublishResult {
    pub run_id: Uuid,
    pub task: String,
    pub round: u32,
    pub repository: Option<RepositoryInfo>,
    /// Distinct files uploaded, in upload order.
    pub files_created: Vec<String>,
    /// Commit recorded by the last successful upload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// A fatal error plus whatever was published before it.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct PublishFailure {
    pub error: PublishError,
    pub partial: PublishResult,
}

/// Static settings for the orchestrator.
#[derive(Debug, Clone)]
pub struct PublishSettings {
    /// Account assumed to own reused repositories.
    pub owner: String,
    /// Branch files are committed to and served from.
    pub branch: String,
    /// Root of the local task mirror.
    pub data_dir: PathBuf,
}

/// Mutable state accumulated while a run progresses.
#[derive(Debug, Default)]
struct RunState {
    repository: Option<RepositoryInfo>,
    files: Vec<String>,
    commit_sha: Option<String>,
}

impl RunState {
    fn has_file(&self, filename: &str) -> bool {
        self.files.iter().any(|f| f == filename)
    }

    fn record_upload(&mut self, filename: String, commit: FileCommit) {
        if commit.commit_sha.is_some() {
            self.commit_sha = commit.commit_sha;
        }
        self.files.push(filename);
    }
}

pub struct Publisher {
    generator: Arc<dyn TextGenerator>,
    host: Arc<dyn RepoHost>,
    notifier: Arc<dyn EvaluationNotifier>,
    settings: PublishSettings,
}

impl Publisher {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        host: Arc<dyn RepoHost>,
        notifier: Arc<dyn EvaluationNotifier>,
        settings: PublishSettings,
    ) -> Self {
        Self {
            generator,
            host,
            notifier,
            settings,
        }
    }

    pub fn settings(&self) -> &PublishSettings {
        &self.settings
    }

    /// Run the whole pipeline for one brief.
    ///
    /// `raw` is the inbound JSON exactly as received; it is mirrored to disk.
    pub async fn publish(
        &self,
        brief: &TaskBrief,
        raw: &serde_json::Value,
    ) -> Result<PublishResult, PublishFailure> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "publish",
            task = %brief.task,
            round = brief.round,
            run_id = %run_id
        );
        self.publish_inner(run_id, brief, raw).instrument(span).await
    }

    async fn publish_inner(
        &self,
        run_id: Uuid,
        brief: &TaskBrief,
        raw: &serde_json::Value,
    ) -> Result<PublishResult, PublishFailure> {
        let started_at = Utc::now();
        let mut state = RunState::default();
        tracing::info!(model = self.generator.model(), "Starting publish run");

        let (ws, outcome) = match self.prepare_workspace(brief, raw).await {
            Ok(ws) => {
                let outcome = self.run(brief, &ws, &mut state).await;
                (Some(ws), outcome)
            }
            Err(e) => (None, Err(e)),
        };

        let result = PublishResult {
            run_id,
            task: brief.task.clone(),
            round: brief.round,
            repository: state.repository,
            files_created: state.files,
            commit_sha: state.commit_sha,
            success: outcome.is_ok(),
            error: outcome.as_ref().err().map(|e| e.to_string()),
            started_at,
            finished_at: Utc::now(),
        };

        if let Some(ws) = &ws {
            if let Err(e) = ws.write_summary(&result).await {
                tracing::warn!("Failed to write run summary: {}", e);
            }
        }

        match outcome {
            Ok(()) => {
                tracing::info!(files = ?result.files_created, "Publish run completed");
                self.notify_evaluation(brief, &result).await;
                Ok(result)
            }
            Err(error) => {
                tracing::error!(
                    files = ?result.files_created,
                    "Publish run aborted: {}",
                    error
                );
                Err(PublishFailure {
                    error,
                    partial: result,
                })
            }
        }
    }

    async fn prepare_workspace(
        &self,
        brief: &TaskBrief,
        raw: &serde_json::Value,
    ) -> Result<TaskWorkspace, PublishError> {
        let ws = TaskWorkspace::open(&self.settings.data_dir, &brief.task).await?;
        ws.mirror_request(raw).await?;
        let saved = ws.save_attachments(&brief.attachments).await;
        if !saved.is_empty() {
            tracing::info!(count = saved.len(), "Stored attachments");
        }
        Ok(ws)
    }

    async fn run(
        &self,
        brief: &TaskBrief,
        ws: &TaskWorkspace,
        state: &mut RunState,
    ) -> Result<(), PublishError> {
        let repo = self.acquire_repo(brief).await?;
        let full_name = repo.full_name.clone();
        state.repository = Some(repo);

        tracing::info!("Generating from brief");
        let primary = self.generator.generate(&brief.brief).await?;

        for resolved in resolve_checks(&brief.checks) {
            let Some(filename) = resolved.filename else {
                tracing::warn!(check = %resolved.source_check, "No filename in check, skipping");
                continue;
            };
            if state.has_file(&filename) {
                tracing::info!(
                    check = %resolved.source_check,
                    filename = %filename,
                    "File already produced in this run, skipping"
                );
                continue;
            }

            tracing::info!(check = %resolved.source_check, filename = %filename, "Creating file");
            let prompt = prompts::file_prompt(&filename, &brief.brief, &resolved.source_check);
            let response = self.generator.generate(&prompt).await?;
            let file = GeneratedFile::new(filename, extract(&response, None));
            let commit = self.write_and_upload(ws, &full_name, &file).await?;
            state.record_upload(file.filename, commit);
        }

        if !state.has_file(INDEX_HTML) {
            match fenced_block(&primary, Some("html")) {
                Some(html) if !html.is_empty() => {
                    tracing::info!("Publishing HTML block from brief response as index.html");
                    let file = GeneratedFile::new(INDEX_HTML, html);
                    let commit = self.write_and_upload(ws, &full_name, &file).await?;
                    state.record_upload(file.filename, commit);
                }
                _ => tracing::info!("Brief response has no HTML block, no index.html fallback"),
            }
        }

        self.ensure_pages(&full_name).await;
        self.trigger_build(&full_name).await;
        Ok(())
    }

    /// Create-or-reuse, driven by the brief's round.
    async fn acquire_repo(&self, brief: &TaskBrief) -> Result<RepositoryInfo, PublishError> {
        let (full_name, created) = match brief.acquisition_mode(&self.settings.owner) {
            AcquisitionMode::Create => {
                tracing::info!("Creating repository");
                match self.host.create_repo(&brief.task).await {
                    Ok(RepoCreation::Created { full_name }) => (full_name, true),
                    Ok(RepoCreation::AlreadyExists) => {
                        let full_name = format!("{}/{}", self.settings.owner, brief.task);
                        tracing::info!(repo = %full_name, "Repository exists, proceeding with updates");
                        (full_name, false)
                    }
                    Err(crate::github::HostError::PermissionDenied { status, body }) => {
                        let repo = format!("{}/{}", self.settings.owner, brief.task);
                        tracing::error!(
                            status,
                            "Token lacks repository creation permissions; grant the \"repo\" scope \
                             or create the repository manually"
                        );
                        return Err(PublishError::PermissionDenied {
                            action_required: format!(
                                "Create repository manually: {} (or grant the token \"repo\" scope)",
                                repo
                            ),
                            repo,
                            detail: body,
                        });
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            AcquisitionMode::Reuse(full_name) => {
                tracing::info!(repo = %full_name, "Using existing repository");
                (full_name, false)
            }
        };

        Ok(RepositoryInfo {
            name: brief.task.clone(),
            url: self.host.repo_url(&full_name),
            pages_url: github::pages_url(&full_name),
            full_name,
            created,
        })
    }

    async fn write_and_upload(
        &self,
        ws: &TaskWorkspace,
        repo: &str,
        file: &GeneratedFile,
    ) -> Result<FileCommit, PublishError> {
        ws.write_file(&file.filename, &file.content).await?;
        let commit = self
            .host
            .upload(
                repo,
                &file.filename,
                file.content.as_bytes(),
                &self.settings.branch,
                &prompts::commit_message(&file.filename),
            )
            .await?;
        tracing::info!(
            filename = %file.filename,
            outcome = ?commit.outcome,
            commit = ?commit.commit_sha,
            bytes = file.content.len(),
            "Uploaded file"
        );
        Ok(commit)
    }

    /// Enable pages unless the probe says they already are. Best effort.
    async fn ensure_pages(&self, repo: &str) {
        match self.host.pages_status(repo).await {
            Ok(PagesStatus::Enabled { html_url }) => {
                tracing::info!(html_url = ?html_url, "Pages already enabled");
            }
            Ok(PagesStatus::NotEnabled) => {
                tracing::info!("Pages not enabled, enabling now");
                if let Err(e) = self
                    .host
                    .enable_pages(repo, &self.settings.branch, "/")
                    .await
                {
                    tracing::warn!("Error enabling pages: {}", e);
                }
            }
            Err(e) => tracing::warn!("Error checking pages status: {}", e),
        }
    }

    /// Ask for a fresh pages build. Best effort.
    async fn trigger_build(&self, repo: &str) {
        if let Err(e) = self.host.trigger_pages_build(repo).await {
            tracing::warn!("Error triggering pages build: {}", e);
        }
    }

    /// Post the result to the brief's evaluation URL. Best effort.
    async fn notify_evaluation(&self, brief: &TaskBrief, result: &PublishResult) {
        let Some(repo) = &result.repository else {
            return;
        };
        let payload = EvaluationPayload {
            task_details: TaskDetails {
                email: brief.email.clone(),
                task: brief.task.clone(),
                round: brief.round,
                status: if result.success { "completed" } else { "failed" }.to_string(),
                repo_full_name: repo.full_name.clone(),
                repo_url: repo.url.clone(),
                pages_url: repo.pages_url.clone(),
                commit_sha: result.commit_sha.clone(),
                files_created: result.files_created.clone(),
            },
            nonce: brief.nonce.clone(),
        };
        match self.notifier.notify(&brief.evaluation_url, &payload).await {
            Ok(()) => tracing::info!("Evaluation endpoint notified"),
            Err(e) => tracing::warn!("Failed to notify evaluation endpoint: {}", e),
        }
    }
}
