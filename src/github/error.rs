use thiserror::Error;

/// Failure talking to the repository host.
#[derive(Debug, Error)]
pub enum HostError {
    /// The credential lacks the scope for this operation.
    #[error("permission denied ({status}): {body}")]
    PermissionDenied { status: u16, body: String },

    /// Any other non-success response.
    #[error("{operation} failed with status {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("request to repository host failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response from repository host: {0}")]
    InvalidResponse(String),
}

impl HostError {
    pub fn status(operation: &'static str, status: u16, body: impl Into<String>) -> Self {
        HostError::Status {
            operation,
            status,
            body: body.into(),
        }
    }
}
