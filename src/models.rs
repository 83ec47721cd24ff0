use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const STATUS_DONE: &str = "done";
pub const STATUS_ERROR: &str = "error";

/// Body of `POST /start_download`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub symbol: String,
    pub timeframe: String,
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartResponse {
    #[serde(default)]
    pub job_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

/// Client-side projection of a server job, as returned by `GET /progress/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub progress: Option<f64>,
    /// Usually a string, but any JSON value is accepted so that odd error bodies still fail the job.
    #[serde(default)]
    pub error: Option<Value>,
}

/// What a single status response means for the poll loop.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusKind {
    Failed(String),
    Done,
    InProgress,
}

impl JobStatus {
    pub fn progress_or_zero(&self) -> f64 {
        self.progress.unwrap_or(0.0)
    }

    pub fn status_label(&self) -> &str {
        self.status.as_deref().unwrap_or("unknown")
    }

    /// `null`, `false` and `""` count as no error.
    fn error_message(&self) -> Option<String> {
        match self.error.as_ref()? {
            Value::Null | Value::Bool(false) => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// An error field wins over any status value; unrecognized statuses are in progress.
    pub fn kind(&self) -> StatusKind {
        if let Some(err) = self.error_message() {
            return StatusKind::Failed(err);
        }
        match self.status.as_deref() {
            Some(STATUS_DONE) => StatusKind::Done,
            Some(STATUS_ERROR) => StatusKind::Failed("unknown".to_string()),
            _ => StatusKind::InProgress,
        }
    }

    pub fn status_line(&self) -> String {
        format!("Status: {} — {}%", self.status_label(), self.progress_or_zero())
    }
}
