//! Inbound task briefs and their attachments.

use base64::Engine;
use serde::{Deserialize, Serialize};

/// One unit of work submitted to `POST /task`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskBrief {
    pub email: String,
    pub secret: String,
    /// Human label, also used verbatim as the repository name.
    pub task: String,
    /// `1` creates the repository; any other round reuses it.
    pub round: u32,
    /// Opaque token echoed back to the evaluation callback.
    pub nonce: String,
    /// Instruction handed verbatim to the text model.
    pub brief: String,
    #[serde(default)]
    pub checks: Vec<String>,
    pub evaluation_url: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// `owner/name` of the repository to update in later rounds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_full_name: Option<String>,
}

/// How the orchestrator obtains its target repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionMode {
    /// Create the repository, reusing it when it already exists.
    Create,
    /// Use this `owner/name` without checking that it exists.
    Reuse(String),
}

impl TaskBrief {
    /// Pick the acquisition mode for this brief's round.
    pub fn acquisition_mode(&self, default_owner: &str) -> AcquisitionMode {
        if self.round == 1 {
            AcquisitionMode::Create
        } else {
            let full_name = self
                .repo_full_name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| format!("{}/{}", default_owner, self.task));
            AcquisitionMode::Reuse(full_name)
        }
    }
}

/// A named blob referenced by URL or inline data URI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

/// Decoded `data:` URI payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub data: Vec<u8>,
}

impl Attachment {
    /// Decode the attachment if its URL is a base64 `data:` URI.
    ///
    /// Returns `None` for plain URLs and for malformed payloads.
    pub fn decode_data_uri(&self) -> Option<DataUri> {
        let rest = self.url.strip_prefix("data:")?;
        let (meta, payload) = rest.split_once(',')?;
        let mime = meta.strip_suffix(";base64")?;
        let data = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .ok()?;
        Some(DataUri {
            mime: if mime.is_empty() {
                "application/octet-stream".to_string()
            } else {
                mime.to_string()
            },
            data,
        })
    }
}
