//! HTTP implementation of [`AnalysisWorker`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::{debug, info, warn};

use super::error::WorkerError;
use super::types::{ResultEntry, ResultsResponse, StartRequest};
use super::AnalysisWorker;
use crate::config::WorkerConfig;
use crate::models::AnalysisKind;

/// Maximum length for error bodies carried in [`WorkerError::Status`].
const MAX_ERROR_BODY_LENGTH: usize = 200;

fn truncate_body(body: &str) -> String {
    if body.len() > MAX_ERROR_BODY_LENGTH {
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated)", &body[..end])
    } else {
        body.to_string()
    }
}

/// Talks to the analysis worker over HTTP with bounded timeouts.
#[derive(Debug, Clone)]
pub struct HttpWorkerClient {
    client: Client,
    base_url: String,
}

impl HttpWorkerClient {
    pub fn new(config: &WorkerConfig) -> Result<Self, WorkerError> {
        Self::with_timeouts(
            &config.base_url,
            Duration::from_secs(config.connect_timeout_secs),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn with_timeouts(
        base_url: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, WorkerError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(|e| WorkerError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn check_status(response: Response) -> Result<Response, WorkerError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(WorkerError::Status {
            status: status.as_u16(),
            body: truncate_body(&body),
        })
    }
}

#[async_trait]
impl AnalysisWorker for HttpWorkerClient {
    async fn request_start(&self, request: &StartRequest) -> Result<(), WorkerError> {
        let url = self.url("analyze");
        debug!("Requesting analysis start for document {} at {}", request.document_id, url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(WorkerError::Transport)?;

        Self::check_status(response).await?;

        info!(
            "Analysis accepted by worker for document {} type {}",
            request.document_id, request.analysis_type
        );
        Ok(())
    }

    async fn request_results(
        &self,
        document_id: &str,
        kind: AnalysisKind,
    ) -> Result<Vec<ResultEntry>, WorkerError> {
        let url = self.url(&format!("results/{}/{}", document_id, kind));
        debug!("Fetching analysis results from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(WorkerError::Transport)?;
        let response = Self::check_status(response).await?;

        let body = response.bytes().await.map_err(WorkerError::Transport)?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        let parsed: ResultsResponse =
            serde_json::from_slice(&body).map_err(|e| WorkerError::Decode(e.to_string()))?;
        Ok(parsed.into_entries())
    }

    async fn health(&self) -> bool {
        match self.client.get(self.url("health")).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!("Analysis worker health check failed: {}", e);
                false
            }
        }
    }
}
