use thiserror::Error;

use crate::github::HostError;
use crate::llm::LlmError;
use crate::workspace::WorkspaceError;

/// Fatal failure of one publish run.
///
/// Best-effort steps (pages activation, build trigger, evaluation callback)
/// never produce one of these; they are logged and the run continues.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The credential cannot create repositories.
    #[error("Repository creation failed - insufficient token permissions")]
    PermissionDenied {
        repo: String,
        action_required: String,
        detail: String,
    },

    #[error("text generation failed: {0}")]
    Generation(#[from] LlmError),

    #[error("repository host error: {0}")]
    Host(#[from] HostError),

    #[error("local workspace error: {0}")]
    Workspace(#[from] WorkspaceError),
}

impl PublishError {
    /// True for failures of an external collaborator (model or host).
    pub fn is_upstream(&self) -> bool {
        matches!(self, PublishError::Generation(_) | PublishError::Host(_))
    }
}
