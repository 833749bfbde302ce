//! Wire types for the generation service.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Shortest clip the service will render, in seconds.
pub const MIN_DURATION: u32 = 4;
/// Longest clip the service will render, in seconds.
pub const MAX_DURATION: u32 = 30;
/// Duration used when the caller does not specify one.
pub const DEFAULT_DURATION: u32 = 8;

fn default_duration() -> u32 {
    DEFAULT_DURATION
}

/// Parameters of one generation request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default)]
    pub instrument: String,
    #[serde(default)]
    pub genre: String,
    /// Requested length in seconds; clamped to [4, 30].
    #[serde(default = "default_duration")]
    pub duration: u32,
    /// Existing track to extend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_track_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation: Option<bool>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            instrument: String::new(),
            genre: String::new(),
            duration: DEFAULT_DURATION,
            input_track_id: None,
            continuation: None,
        }
    }

    /// Duration clamped into the service's accepted range.
    pub fn clamped_duration(&self) -> u32 {
        self.duration.clamp(MIN_DURATION, MAX_DURATION)
    }
}

/// Lifecycle state of a generation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationState {
    Starting,
    Processing,
    Complete,
    Failed,
}

/// Response to a submission: a poll-able job id, or — on the
/// synchronous/mock path — an already-complete track.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSubmission {
    pub generation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<GenerationState>,
}

impl GenerationSubmission {
    /// Whether the result is already available without polling.
    pub fn is_complete(&self) -> bool {
        self.status == Some(GenerationState::Complete) && self.track_id.is_some()
    }
}

/// One poll of a generation job's status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationStatus {
    pub status: GenerationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// UI-facing record of one generation attempt. Updated only from
/// submission results and polled statuses; the playback engine never
/// touches it except to receive the resulting track id for loading.
#[derive(Debug, Clone)]
pub struct GenerationRecord {
    pub id: String,
    pub status: GenerationState,
    pub progress: Option<f32>,
    pub track_id: Option<String>,
    pub error: Option<String>,
    pub request: GenerationRequest,
    pub created_at: SystemTime,
}

impl GenerationRecord {
    pub fn new(id: impl Into<String>, request: GenerationRequest) -> Self {
        Self {
            id: id.into(),
            status: GenerationState::Starting,
            progress: None,
            track_id: None,
            error: None,
            request,
            created_at: SystemTime::now(),
        }
    }

    /// Fold one polled status into the record.
    pub fn apply(&mut self, status: &GenerationStatus) {
        self.status = status.status;
        if status.progress.is_some() {
            self.progress = status.progress;
        }
        if status.track_id.is_some() {
            self.track_id = status.track_id.clone();
        }
        if status.error.is_some() {
            self.error = status.error.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&GenerationState::Processing).unwrap(),
            "\"processing\""
        );
        let parsed: GenerationState = serde_json::from_str("\"complete\"").unwrap();
        assert_eq!(parsed, GenerationState::Complete);
    }

    #[test]
    fn duration_defaults_and_clamps() {
        let parsed: GenerationRequest =
            serde_json::from_str(r#"{"prompt":"warm pads"}"#).unwrap();
        assert_eq!(parsed.duration, 8);

        let mut request = GenerationRequest::new("drums");
        request.duration = 2;
        assert_eq!(request.clamped_duration(), 4);
        request.duration = 99;
        assert_eq!(request.clamped_duration(), 30);
        request.duration = 12;
        assert_eq!(request.clamped_duration(), 12);
    }

    #[test]
    fn status_wire_field_names_are_camel_case() {
        let status: GenerationStatus = serde_json::from_str(
            r#"{"status":"complete","progress":1.0,"trackId":"track-7"}"#,
        )
        .unwrap();
        assert_eq!(status.status, GenerationState::Complete);
        assert_eq!(status.track_id.as_deref(), Some("track-7"));
        assert!(status.error.is_none());
    }

    #[test]
    fn record_applies_track_id_once_at_complete() {
        let mut record = GenerationRecord::new("g1", GenerationRequest::new("bass line"));
        record.apply(&GenerationStatus {
            status: GenerationState::Processing,
            progress: Some(0.5),
            track_id: None,
            error: None,
        });
        assert_eq!(record.status, GenerationState::Processing);
        assert!(record.track_id.is_none());

        record.apply(&GenerationStatus {
            status: GenerationState::Complete,
            progress: Some(1.0),
            track_id: Some("track-1".into()),
            error: None,
        });
        assert_eq!(record.status, GenerationState::Complete);
        assert_eq!(record.track_id.as_deref(), Some("track-1"));
    }
}
