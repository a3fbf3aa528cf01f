//! Task module - inbound briefs plus the pure file-inference engine.
//!
//! - `brief`: the request payload and attachment decoding
//! - `resolver`: maps a free-text check to the file it names
//! - `extract`: isolates the file payload inside a model response
//!
//! Nothing in here performs I/O; the publish orchestrator drives it.

pub mod brief;
pub mod extract;
pub mod resolver;

pub use brief::{AcquisitionMode, Attachment, DataUri, TaskBrief};
pub use extract::{extract, fenced_block, fenced_blocks, FencedBlock};
pub use resolver::{resolve, resolve_checks, resolve_with_rule, ResolveRule, ResolvedFile};

/// A file produced for publishing: target name and extracted payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub filename: String,
    pub content: String,
}

impl GeneratedFile {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}
