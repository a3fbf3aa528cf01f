//! # Pagesmith
//!
//! A small service that turns task briefs into published GitHub Pages sites.
//!
//! ## Task Flow
//! 1. Receive a brief via `POST /task` and check its shared secret
//! 2. Resolve each check string to the file it talks about
//! 3. Ask Gemini for every file and extract the fenced code
//! 4. Commit the files to a repository and enable Pages
//! 5. Report the result, with the last commit sha, to the brief's evaluation URL
//!
//! ## Modules
//! - `api`: HTTP surface
//! - `task`: brief types, check resolution and code extraction
//! - `llm`: text generation backends
//! - `github`: repository host client
//! - `publish`: the orchestrator tying it together
//! - `workspace`: per-task local mirror

pub mod api;
pub mod config;
pub mod github;
pub mod llm;
pub mod publish;
pub mod task;
pub mod workspace;

pub use config::Config;
