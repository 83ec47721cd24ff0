use crate::error::PollerError;
use crate::models::{DownloadRequest, ErrorBody, JobStatus, StartResponse};
use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, Response, StatusCode};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

const START_FALLBACK: &str = "Failed to start";

/// HTTP side of the job protocol: `/start_download`, `/progress/{id}` and `/download/{id}`.
#[derive(Clone)]
pub struct JobClient {
    client: Client,
    base_url: String,
}

impl JobClient {
    pub fn new(base_url: &str, proxy: Option<&str>) -> Result<Self> {
        let mut client_builder = Client::builder();

        if let Some(proxy_url) = proxy {
            client_builder = client_builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }

        let client = client_builder
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn download_url(&self, job_id: &str) -> String {
        format!("{}/download/{}", self.base_url, job_id)
    }

    fn progress_url(&self, job_id: &str) -> String {
        format!("{}/progress/{}", self.base_url, job_id)
    }

    /// Creates a job and returns its server-assigned id.
    pub async fn start_download(&self, request: &DownloadRequest) -> Result<String, PollerError> {
        let response = self
            .client
            .post(format!("{}/start_download", self.base_url))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| START_FALLBACK.to_string());
            tracing::warn!(status = status.as_u16(), error = %message, "start_download rejected");
            return Err(PollerError::StartFailure(message));
        }

        serde_json::from_str::<StartResponse>(&body)
            .ok()
            .and_then(|r| r.job_id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| PollerError::StartFailure(START_FALLBACK.to_string()))
    }

    /// One status fetch. The HTTP status code is not inspected: a 404 carries `{"error": ...}`
    /// which the caller treats as a job failure.
    pub async fn fetch_status(&self, job_id: &str) -> Result<JobStatus, PollerError> {
        let response = self.client.get(self.progress_url(job_id)).send().await?;
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| PollerError::Network(format!("malformed progress response: {}", e)))
    }

    /// Fetches the finished CSV into `output_dir`, returning the written path.
    ///
    /// The body goes to `<name>.part` first; the partial file is removed when the transfer fails
    /// or `cancel` fires.
    pub async fn save_artifact(
        &self,
        job_id: &str,
        output_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        if !output_dir.exists() {
            fs::create_dir_all(output_dir)?;
        }

        let mut response = self
            .client
            .get(self.download_url(job_id))
            .send()
            .await
            .context("GET request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| status.to_string());
            return Err(PollerError::Artifact(message).into());
        }

        let file_name = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(attachment_file_name)
            .unwrap_or_else(|| format!("{}.csv", job_id));

        let output_path = output_dir.join(&file_name);
        let partial_path = output_dir.join(format!("{}.part", file_name));

        let pb = match response.content_length() {
            Some(total) => {
                let pb = ProgressBar::new(total);
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template("{msg:30} {bar:40} {bytes}/{total_bytes} ({bytes_per_sec})")
                        .map_err(|e| anyhow!("Invalid progress template: {}", e))?
                        .progress_chars("=>-"),
                );
                pb
            }
            None => ProgressBar::new_spinner(),
        };
        pb.set_message(file_name.clone());

        let downloaded = match write_body(&mut response, &partial_path, &pb, cancel).await {
            Ok(n) => n,
            Err(e) => {
                pb.abandon_with_message("Failed");
                if let Err(rm) = fs::remove_file(&partial_path) {
                    tracing::warn!(path = %partial_path.display(), error = %rm, "could not remove partial file");
                }
                return Err(e);
            }
        };

        fs::rename(&partial_path, &output_path).context("Failed to rename completed file")?;
        pb.finish_with_message("Saved");

        tracing::info!(job_id, path = %output_path.display(), bytes = downloaded, "artifact saved");
        Ok(output_path)
    }
}

async fn write_body(
    response: &mut Response,
    partial_path: &Path,
    pb: &ProgressBar,
    cancel: &CancellationToken,
) -> Result<u64> {
    let mut file = fs::File::create(partial_path).context("Failed to open output file")?;

    let mut downloaded = 0u64;
    loop {
        let chunk = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(PollerError::Artifact("cancelled by user".to_string()).into());
            }
            chunk = response.chunk() => chunk?,
        };
        let Some(chunk) = chunk else { break };
        file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }
    file.flush()?;

    Ok(downloaded)
}

/// Extracts the bare file name from a `Content-Disposition: attachment; filename=...` header.
fn attachment_file_name(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"'))
        .and_then(|name| Path::new(name).file_name())
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}
