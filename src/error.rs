#[derive(Debug, thiserror::Error)]
pub enum PollerError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Failed to start download: {0}")]
    StartFailure(String),

    #[error("Job failed: {0}")]
    Poll(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Artifact download failed: {0}")]
    Artifact(String),
}

impl From<reqwest::Error> for PollerError {
    fn from(err: reqwest::Error) -> Self {
        PollerError::Network(err.to_string())
    }
}
