//! HTTP API.
//!
//! ## Endpoints
//!
//! - `GET /` - Liveness string
//! - `GET /api/health` - Health check
//! - `POST /task` - Submit a task brief and publish it
//! - `GET /files/:task/:name` - Fetch a generated file or stored attachment
//! - `GET /view/:task` - HTML summary of a stored task

mod auth;
mod error;
mod files;
mod routes;
pub mod types;
mod view;

pub use error::ApiError;
pub use routes::{router, serve, AppState};
