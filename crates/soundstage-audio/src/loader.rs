//! Clip loader — fetches remote audio into decoded in-memory buffers.

use crate::clip::AudioClip;
use soundstage_core::{Result, SoundStageError};
use tracing::debug;

/// Loading state of one track entry.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    /// A load is in flight; the entry has no buffer yet.
    Loading,
    /// The clip is decoded and ready to schedule.
    Loaded,
    /// The last load failed; all audio resources were released.
    Error(String),
}

/// Fetches and decodes remote audio resources.
pub struct ClipLoader {
    client: reqwest::Client,
}

impl ClipLoader {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Fetch the raw bytes behind a URL. Non-success statuses are load
    /// errors, not panics.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        debug!(url, "fetching clip");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SoundStageError::Load(format!("fetch {url}: {e}")))?;
        if !response.status().is_success() {
            return Err(SoundStageError::Load(format!(
                "fetch {url}: HTTP {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| SoundStageError::Load(format!("fetch {url}: {e}")))?;
        Ok(bytes.to_vec())
    }

    /// Decode fetched bytes into a clip.
    pub fn decode(bytes: &[u8]) -> Result<AudioClip> {
        AudioClip::decode_wav(bytes)
    }
}

impl Default for ClipLoader {
    fn default() -> Self {
        Self::new()
    }
}
