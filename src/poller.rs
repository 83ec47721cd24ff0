use crate::client::JobClient;
use crate::error::PollerError;
use crate::form::{FormState, FILL_ALL_FIELDS};
use crate::models::{JobStatus, StatusKind};
use crate::view::JobView;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

const CANCELLED_TEXT: &str = "Cancelled by user";
const NETWORK_ERROR_TEXT: &str = "Network error";

/// Client-observed lifecycle of the tracked job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Submitting,
    Polling,
    Done,
    Error,
    Cancelled,
    NetworkError,
}

impl SessionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionPhase::Done | SessionPhase::Error | SessionPhase::Cancelled | SessionPhase::NetworkError
        )
    }
}

/// How a poll loop ended.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Done { download_url: String },
    Failed(String),
    Cancelled,
    NetworkError(String),
}

impl JobOutcome {
    fn phase(&self) -> SessionPhase {
        match self {
            JobOutcome::Done { .. } => SessionPhase::Done,
            JobOutcome::Failed(_) => SessionPhase::Error,
            JobOutcome::Cancelled => SessionPhase::Cancelled,
            JobOutcome::NetworkError(_) => SessionPhase::NetworkError,
        }
    }

    /// Download URL on success; `Cancelled` maps to `Ok(None)`.
    pub fn into_result(self) -> Result<Option<String>, PollerError> {
        match self {
            JobOutcome::Done { download_url } => Ok(Some(download_url)),
            JobOutcome::Cancelled => Ok(None),
            JobOutcome::Failed(msg) => Err(PollerError::Poll(msg)),
            JobOutcome::NetworkError(msg) => Err(PollerError::Network(msg)),
        }
    }
}

/// Cancels the job currently tracked by a [`JobPoller`].
///
/// Each tracked job owns a fresh [`CancellationToken`]. Cancelling it makes the poll loop exit
/// at once: a sleep in progress is interrupted and a request in flight is dropped without its
/// response being rendered. The server is never notified. The handle is `Clone + Send`, so it
/// can be moved into a signal listener while the loop runs.
#[derive(Clone, Default)]
pub struct CancelHandle {
    current: Arc<Mutex<Option<CancellationToken>>>,
}

impl CancelHandle {
    /// Returns false when no job is tracked.
    pub fn cancel(&self) -> bool {
        let slot = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Starts tracking a new job, cancelling whatever was tracked before.
    fn track(&self) -> CancellationToken {
        let mut slot = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.take() {
            previous.cancel();
        }
        let token = CancellationToken::new();
        *slot = Some(token.clone());
        token
    }

    fn current_or_track(&self) -> CancellationToken {
        let existing = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        existing.unwrap_or_else(|| self.track())
    }

    fn release(&self) {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

/// One poller session: the form, the tracked job and the view it renders into.
pub struct JobPoller<V: JobView> {
    client: JobClient,
    view: V,
    form: FormState,
    poll_interval: Duration,
    phase: SessionPhase,
    job_id: Option<String>,
    cancel: CancelHandle,
}

impl<V: JobView> JobPoller<V> {
    pub fn new(client: JobClient, view: V, poll_interval: Duration) -> Self {
        Self {
            client,
            view,
            form: FormState::default(),
            poll_interval,
            phase: SessionPhase::Idle,
            job_id: None,
            cancel: CancelHandle::default(),
        }
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormState {
        &mut self.form
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn current_job(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn cancel(&self) -> bool {
        self.cancel.cancel()
    }

    pub fn clear_form(&mut self) {
        self.form.clear();
        self.view.clear_fields();
    }

    /// Validates the form and creates a job on the server.
    ///
    /// Any job tracked before is cancelled first. On failure the form is re-enabled and nothing
    /// is tracked.
    pub async fn submit(&mut self) -> Result<String, PollerError> {
        let request = match self.form.to_request() {
            Ok(request) => request,
            Err(err) => {
                self.view.alert(FILL_ALL_FIELDS);
                return Err(err);
            }
        };

        self.cancel.cancel();
        self.cancel.release();
        self.job_id = None;
        self.phase = SessionPhase::Submitting;

        self.view.set_form_enabled(false);
        self.view.set_progress_visible(true);
        self.view.hide_download_link();
        self.view.set_cancel_visible(true);
        self.view.set_busy(true);

        tracing::info!(
            symbol = %request.symbol,
            timeframe = %request.timeframe,
            start = %request.start,
            end = %request.end,
            "Submitting download"
        );

        match self.client.start_download(&request).await {
            Ok(job_id) => {
                self.cancel.track();
                self.view.set_job_id(&job_id);
                self.job_id = Some(job_id.clone());
                self.phase = SessionPhase::Polling;
                tracing::info!(job_id = %job_id, "Job started");
                Ok(job_id)
            }
            Err(err) => {
                let message = match &err {
                    PollerError::StartFailure(msg) => msg.clone(),
                    other => other.to_string(),
                };
                tracing::warn!(error = %err, "Job not started");
                self.view.alert(&message);
                self.view.set_form_enabled(true);
                self.view.set_progress_visible(false);
                self.view.set_busy(false);
                self.view.set_cancel_visible(false);
                self.phase = SessionPhase::Idle;
                Err(err)
            }
        }
    }

    /// Polls `job_id` until a terminal outcome. Never retries.
    pub async fn poll(&mut self, job_id: &str) -> JobOutcome {
        let token = self.cancel.current_or_track();
        self.job_id = Some(job_id.to_string());
        self.phase = SessionPhase::Polling;

        let outcome = loop {
            if token.is_cancelled() {
                break JobOutcome::Cancelled;
            }

            let fetched = tokio::select! {
                biased;
                _ = token.cancelled() => break JobOutcome::Cancelled,
                fetched = self.client.fetch_status(job_id) => fetched,
            };

            let status = match fetched {
                Ok(status) => status,
                Err(err) => {
                    tracing::warn!(job_id, error = %err, "Progress request failed");
                    self.view.set_status_text(NETWORK_ERROR_TEXT);
                    break JobOutcome::NetworkError(err.to_string());
                }
            };

            tracing::debug!(
                job_id,
                status = status.status_label(),
                progress = status.progress_or_zero(),
                "Job status"
            );

            match status.kind() {
                StatusKind::Failed(msg) => {
                    self.view.set_status_text(&format!("Error: {}", msg));
                    break JobOutcome::Failed(msg);
                }
                StatusKind::Done => {
                    self.render_progress(&status);
                    let download_url = self.client.download_url(job_id);
                    self.view.show_download_link(&download_url);
                    break JobOutcome::Done { download_url };
                }
                StatusKind::InProgress => self.render_progress(&status),
            }

            let cancelled = tokio::select! {
                _ = token.cancelled() => true,
                _ = tokio::time::sleep(self.poll_interval) => false,
            };
            if cancelled {
                break JobOutcome::Cancelled;
            }
        };

        self.finish(job_id, &outcome);
        outcome
    }

    /// Submit followed by poll.
    pub async fn run(&mut self) -> Result<JobOutcome, PollerError> {
        let job_id = self.submit().await?;
        Ok(self.poll(&job_id).await)
    }

    fn render_progress(&mut self, status: &JobStatus) {
        self.view.set_progress(status.progress_or_zero());
        self.view.set_status_text(&status.status_line());
    }

    fn finish(&mut self, job_id: &str, outcome: &JobOutcome) {
        if *outcome == JobOutcome::Cancelled {
            self.view.set_status_text(CANCELLED_TEXT);
        }
        self.view.set_busy(false);
        self.view.set_form_enabled(true);
        self.view.set_cancel_visible(false);
        self.cancel.release();
        self.phase = outcome.phase();

        match outcome {
            JobOutcome::Done { download_url } => {
                tracing::info!(job_id, url = %download_url, "Job finished")
            }
            JobOutcome::Failed(msg) => tracing::warn!(job_id, error = %msg, "Job failed"),
            JobOutcome::Cancelled => tracing::info!(job_id, "Polling cancelled"),
            JobOutcome::NetworkError(msg) => tracing::warn!(job_id, error = %msg, "Polling aborted"),
        }
    }
}
