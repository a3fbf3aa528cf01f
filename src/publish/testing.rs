//! In-memory collaborators for orchestrator and API tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{EvaluationNotifier, EvaluationPayload, PublishSettings, Publisher};
use crate::github::{
    FileCommit, FileWrite, HostError, PagesStatus, PutOutcome, RepoCreation, RepoHost,
};
use crate::llm::{LlmError, TextGenerator};

type Responder = dyn Fn(&str) -> Result<String, LlmError> + Send + Sync;

/// Filename a prompt asks for, when it is a per-file prompt.
fn requested_file(prompt: &str) -> Option<String> {
    if prompt.starts_with("Create a professional README.md") {
        return Some("README.md".to_string());
    }
    let rest = prompt.split_once("content for ")?.1;
    Some(rest.split_once(" based")?.0.to_string())
}

/// Generator that answers per-file prompts with a fenced block wrapped in prose.
pub struct FakeGenerator {
    responder: Box<Responder>,
    prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn new(
        responder: impl Fn(&str) -> Result<String, LlmError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Brief prompts get prose; file prompts get `content for {file}` in a fence.
    pub fn fenced() -> Self {
        Self::with_brief_response("A plan for the project, no code yet.")
    }

    pub fn with_brief_response(brief_response: &str) -> Self {
        let brief_response = brief_response.to_string();
        Self::new(move |prompt| match requested_file(prompt) {
            Some(file) => Ok(format!(
                "Sure! Here it is:\n```\ncontent for {file}\n```\nLet me know if you need more."
            )),
            None => Ok(brief_response.clone()),
        })
    }

    /// Fails on the per-file prompt for `filename`.
    pub fn failing_on(filename: &str) -> Self {
        let filename = filename.to_string();
        Self::new(move |prompt| match requested_file(prompt) {
            Some(file) if file == filename => Err(LlmError::from_status(503, "overloaded")),
            Some(file) => Ok(format!("```\ncontent for {file}\n```")),
            None => Ok("plan".to_string()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        (self.responder)(prompt)
    }

    fn model(&self) -> &str {
        "fake-model"
    }
}

#[derive(Debug, Clone, Copy)]
pub enum CreateBehavior {
    Created,
    Exists,
    Forbidden,
    Fail,
}

#[derive(Debug, Clone)]
struct StoredFile {
    content: String,
    sha: String,
}

/// Repository host that keeps files in memory and records every call.
///
/// The n-th successful write gets blob sha `sha-n` and commit sha `commit-n`.
pub struct FakeHost {
    create: CreateBehavior,
    pages_enabled: Mutex<bool>,
    failing_pages: bool,
    files: Mutex<HashMap<(String, String), StoredFile>>,
    calls: Mutex<Vec<String>>,
    outcomes: Mutex<Vec<(String, PutOutcome)>>,
    next_sha: Mutex<u64>,
}

impl FakeHost {
    pub fn new(create: CreateBehavior) -> Self {
        Self {
            create,
            pages_enabled: Mutex::new(false),
            failing_pages: false,
            files: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            outcomes: Mutex::new(Vec::new()),
            next_sha: Mutex::new(0),
        }
    }

    pub fn with_pages_enabled(self) -> Self {
        *self.pages_enabled.lock().unwrap() = true;
        self
    }

    /// Pages probe, activation and build trigger all fail.
    pub fn with_failing_pages(mut self) -> Self {
        self.failing_pages = true;
        self
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    /// Number of recorded calls equal to `call`.
    pub fn count(&self, call: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == call)
            .count()
    }

    pub fn content(&self, repo: &str, path: &str) -> Option<String> {
        self.files
            .lock()
            .unwrap()
            .get(&(repo.to_string(), path.to_string()))
            .map(|f| f.content.clone())
    }

    /// Put outcomes for `path`, in order, as lowercase strings.
    pub fn outcomes(&self, path: &str) -> Vec<&'static str> {
        self.outcomes
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, o)| match o {
                PutOutcome::Created => "created",
                PutOutcome::Updated => "updated",
            })
            .collect()
    }
}

#[async_trait]
impl RepoHost for FakeHost {
    async fn create_repo(&self, name: &str) -> Result<RepoCreation, HostError> {
        self.record("create");
        match self.create {
            CreateBehavior::Created => Ok(RepoCreation::Created {
                full_name: format!("octo/{name}"),
            }),
            CreateBehavior::Exists => Ok(RepoCreation::AlreadyExists),
            CreateBehavior::Forbidden => Err(HostError::PermissionDenied {
                status: 403,
                body: "Resource not accessible by personal access token".to_string(),
            }),
            CreateBehavior::Fail => Err(HostError::status("create repository", 500, "boom")),
        }
    }

    async fn file_sha(
        &self,
        repo: &str,
        path: &str,
        _branch: &str,
    ) -> Result<Option<String>, HostError> {
        self.record(format!("probe:{path}"));
        Ok(self
            .files
            .lock()
            .unwrap()
            .get(&(repo.to_string(), path.to_string()))
            .map(|f| f.sha.clone()))
    }

    async fn put_file(&self, repo: &str, write: FileWrite<'_>) -> Result<FileCommit, HostError> {
        self.record(format!("put:{}", write.path));
        let key = (repo.to_string(), write.path.to_string());
        let mut files = self.files.lock().unwrap();

        let outcome = match (files.get(&key), write.sha) {
            (None, None) => PutOutcome::Created,
            (Some(existing), Some(sha)) if existing.sha == sha => PutOutcome::Updated,
            // Same rule as the real API: overwriting needs the current sha.
            _ => {
                return Err(HostError::status(
                    "upload file",
                    422,
                    "\"sha\" wasn't supplied or does not match",
                ))
            }
        };

        let mut next = self.next_sha.lock().unwrap();
        *next += 1;
        files.insert(
            key,
            StoredFile {
                content: String::from_utf8_lossy(write.content).into_owned(),
                sha: format!("sha-{}", *next),
            },
        );
        self.outcomes
            .lock()
            .unwrap()
            .push((write.path.to_string(), outcome));
        Ok(FileCommit {
            outcome,
            commit_sha: Some(format!("commit-{}", *next)),
        })
    }

    async fn pages_status(&self, _repo: &str) -> Result<PagesStatus, HostError> {
        self.record("pages_status");
        if self.failing_pages {
            return Err(HostError::status("read pages status", 500, "down"));
        }
        if *self.pages_enabled.lock().unwrap() {
            Ok(PagesStatus::Enabled { html_url: None })
        } else {
            Ok(PagesStatus::NotEnabled)
        }
    }

    async fn enable_pages(&self, _repo: &str, _branch: &str, _path: &str) -> Result<(), HostError> {
        self.record("enable_pages");
        if self.failing_pages {
            return Err(HostError::status("enable pages", 500, "down"));
        }
        *self.pages_enabled.lock().unwrap() = true;
        Ok(())
    }

    async fn trigger_pages_build(&self, _repo: &str) -> Result<(), HostError> {
        self.record("build");
        if self.failing_pages {
            return Err(HostError::status("trigger pages build", 500, "down"));
        }
        Ok(())
    }

    fn repo_url(&self, full_name: &str) -> String {
        format!("https://github.com/{full_name}")
    }
}

/// Notifier that remembers what it was asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    fail: bool,
    sent: Mutex<Vec<(String, EvaluationPayload)>>,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<(String, EvaluationPayload)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EvaluationNotifier for RecordingNotifier {
    async fn notify(&self, url: &str, payload: &EvaluationPayload) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("evaluation endpoint unreachable");
        }
        self.sent
            .lock()
            .unwrap()
            .push((url.to_string(), payload.clone()));
        Ok(())
    }
}

/// Publisher wired to the given fakes, owner `octo`, branch `main`.
pub fn publisher(
    generator: &Arc<FakeGenerator>,
    host: &Arc<FakeHost>,
    notifier: &Arc<RecordingNotifier>,
    data_dir: &Path,
) -> Publisher {
    Publisher::new(
        generator.clone(),
        host.clone(),
        notifier.clone(),
        PublishSettings {
            owner: "octo".to_string(),
            branch: "main".to_string(),
            data_dir: data_dir.to_path_buf(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_reads_sha_then_updates() {
        let host = FakeHost::new(CreateBehavior::Created);

        let first = host
            .upload("octo/site", "index.html", b"v1", "main", "Add index")
            .await
            .unwrap();
        let second = host
            .upload("octo/site", "index.html", b"v2", "main", "Update index")
            .await
            .unwrap();

        assert_eq!(first.outcome, PutOutcome::Created);
        assert_eq!(second.outcome, PutOutcome::Updated);
        assert_eq!(first.commit_sha.as_deref(), Some("commit-1"));
        assert_eq!(second.commit_sha.as_deref(), Some("commit-2"));
        assert_eq!(host.content("octo/site", "index.html").as_deref(), Some("v2"));
        assert_eq!(host.count("probe:index.html"), 2);
    }

    #[tokio::test]
    async fn test_blind_put_over_existing_file_conflicts() {
        let host = FakeHost::new(CreateBehavior::Created);
        host.upload("octo/site", "a.txt", b"v1", "main", "Add")
            .await
            .unwrap();

        let err = host
            .put_file(
                "octo/site",
                FileWrite {
                    path: "a.txt",
                    content: b"v2",
                    branch: "main",
                    message: "Overwrite",
                    sha: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HostError::Status { status: 422, .. }));
    }

    #[test]
    fn test_requested_file_parsing() {
        assert_eq!(
            requested_file(&super::super::prompts::file_prompt("LICENSE", "b", "c")).as_deref(),
            Some("LICENSE")
        );
        assert_eq!(
            requested_file(&super::super::prompts::file_prompt("README.md", "b", "c")).as_deref(),
            Some("README.md")
        );
        assert_eq!(requested_file("Create a captcha solver page."), None);
    }
}
