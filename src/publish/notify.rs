//! Evaluation callback.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

/// What the evaluator learns about a finished run.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TaskDetails {
    pub email: String,
    pub task: String,
    pub round: u32,
    pub status: String,
    pub repo_full_name: String,
    pub repo_url: String,
    pub pages_url: String,
    /// Commit the evaluator should grade.
    pub commit_sha: Option<String>,
    pub files_created: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EvaluationPayload {
    pub task_details: TaskDetails,
    pub nonce: String,
}

#[async_trait]
pub trait EvaluationNotifier: Send + Sync {
    async fn notify(&self, url: &str, payload: &EvaluationPayload) -> anyhow::Result<()>;
}

/// Posts the payload as JSON with a bounded timeout.
pub struct HttpNotifier {
    client: reqwest::Client,
}

impl HttpNotifier {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl EvaluationNotifier for HttpNotifier {
    async fn notify(&self, url: &str, payload: &EvaluationPayload) -> anyhow::Result<()> {
        let resp = self.client.post(url).json(payload).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("Evaluation endpoint returned {}: {}", status, text);
        }
        Ok(())
    }
}
