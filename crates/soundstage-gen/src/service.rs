//! The generation-service abstraction and its HTTP implementation.

use crate::error::{GenError, GenResult};
use crate::types::{GenerationRequest, GenerationStatus, GenerationSubmission};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

/// A backend that turns prompts into audio tracks.
///
/// Implementations: [`HttpGenerationService`] over the real HTTP
/// interface, and [`crate::MockGenerationService`] for the no-backend
/// path.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Submit a generation job.
    async fn submit(&self, request: &GenerationRequest) -> GenResult<GenerationSubmission>;

    /// Poll one job's status.
    async fn status(&self, generation_id: &str) -> GenResult<GenerationStatus>;

    /// URL serving a finished track's WAV bytes, for the clip loader.
    fn track_url(&self, track_id: &str) -> String;

    /// Fetch a finished track's WAV bytes directly.
    async fn track_bytes(&self, track_id: &str) -> GenResult<Vec<u8>>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Client for the HTTP generation service.
pub struct HttpGenerationService {
    base_url: String,
    client: reqwest::Client,
}

impl HttpGenerationService {
    /// `base_url` without a trailing slash, e.g. `http://localhost:4000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn error_for(response: reqwest::Response) -> GenError {
        let status = response.status();
        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|b| b.error)
            .unwrap_or_else(|| status.to_string());
        GenError::Service(message)
    }
}

#[async_trait]
impl GenerationService for HttpGenerationService {
    async fn submit(&self, request: &GenerationRequest) -> GenResult<GenerationSubmission> {
        info!(prompt = %request.prompt, duration = request.clamped_duration(), "submitting generation");
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }
        Ok(response.json().await?)
    }

    async fn status(&self, generation_id: &str) -> GenResult<GenerationStatus> {
        debug!(generation_id, "polling generation status");
        let response = self
            .client
            .get(format!(
                "{}/api/generate/status/{generation_id}",
                self.base_url
            ))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }
        Ok(response.json().await?)
    }

    fn track_url(&self, track_id: &str) -> String {
        format!("{}/api/track/{track_id}", self.base_url)
    }

    async fn track_bytes(&self, track_id: &str) -> GenResult<Vec<u8>> {
        let response = self.client.get(self.track_url(track_id)).send().await?;
        if !response.status().is_success() {
            return Err(GenError::NotFound(format!(
                "track '{track_id}': HTTP {}",
                response.status()
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }
}
