//! In-process mock generation service — the no-backend path.
//!
//! Renders a sine-wave WAV per request so the rest of the stack (loader,
//! engine, UI) can run without a generation backend. In immediate mode a
//! submission completes synchronously; in staged mode the job walks
//! `starting → processing → complete` across status polls.

use crate::error::{GenError, GenResult};
use crate::service::GenerationService;
use crate::types::{
    GenerationRequest, GenerationState, GenerationStatus, GenerationSubmission,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

const MOCK_SAMPLE_RATE: u32 = 22050;
const MOCK_AMPLITUDE: f64 = 0.2;

/// Frequency stand-in for an instrument. Later keywords take precedence,
/// so "bass drum" renders at the drum pitch.
fn instrument_frequency(instrument: &str) -> f64 {
    if instrument.contains("drum") {
        60.0
    } else if instrument.contains("piano") {
        330.0
    } else if instrument.contains("bass") {
        110.0
    } else {
        440.0
    }
}

fn render_sine_wav(request: &GenerationRequest) -> GenResult<Vec<u8>> {
    let frequency = instrument_frequency(&request.instrument);
    let seconds = request.clamped_duration();
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: MOCK_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut bytes = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut bytes, spec)
            .map_err(|e| GenError::Encode(e.to_string()))?;
        for i in 0..(seconds * MOCK_SAMPLE_RATE) as usize {
            let t = i as f64 / MOCK_SAMPLE_RATE as f64;
            let v = (2.0 * std::f64::consts::PI * frequency * t).sin() * MOCK_AMPLITUDE;
            writer
                .write_sample((v * i16::MAX as f64) as i16)
                .map_err(|e| GenError::Encode(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| GenError::Encode(e.to_string()))?;
    }
    Ok(bytes.into_inner())
}

struct MockJob {
    request: GenerationRequest,
    polls: u32,
    track_id: Option<String>,
}

/// Generation service that never leaves the process.
pub struct MockGenerationService {
    stages: u32,
    fail_with: Option<String>,
    next_id: AtomicU64,
    tracks: Mutex<HashMap<String, Vec<u8>>>,
    jobs: Mutex<HashMap<String, MockJob>>,
}

impl MockGenerationService {
    /// Immediate mode: submissions complete synchronously, no polling
    /// needed.
    pub fn new() -> Self {
        Self {
            stages: 0,
            fail_with: None,
            next_id: AtomicU64::new(0),
            tracks: Mutex::new(HashMap::new()),
            jobs: Mutex::new(HashMap::new()),
        }
    }

    /// Staged mode: submissions return only an id; `status` takes
    /// `stages` polls to reach `complete`.
    pub fn with_stages(stages: u32) -> Self {
        Self {
            stages: stages.max(1),
            ..Self::new()
        }
    }

    /// Every job reports `failed` with the given message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            stages: 1,
            fail_with: Some(message.into()),
            ..Self::new()
        }
    }

    fn fresh_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn render_track(&self, request: &GenerationRequest) -> GenResult<String> {
        let track_id = self.fresh_id("track");
        let bytes = render_sine_wav(request)?;
        self.tracks.lock().insert(track_id.clone(), bytes);
        info!(track_id, "mock track rendered");
        Ok(track_id)
    }
}

impl Default for MockGenerationService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationService for MockGenerationService {
    async fn submit(&self, request: &GenerationRequest) -> GenResult<GenerationSubmission> {
        let generation_id = self.fresh_id("gen");
        if self.stages == 0 {
            let track_id = self.render_track(request)?;
            return Ok(GenerationSubmission {
                generation_id,
                track_id: Some(track_id),
                status: Some(GenerationState::Complete),
            });
        }
        self.jobs.lock().insert(
            generation_id.clone(),
            MockJob {
                request: request.clone(),
                polls: 0,
                track_id: None,
            },
        );
        Ok(GenerationSubmission {
            generation_id,
            track_id: None,
            status: None,
        })
    }

    async fn status(&self, generation_id: &str) -> GenResult<GenerationStatus> {
        if let Some(message) = &self.fail_with {
            return Ok(GenerationStatus {
                status: GenerationState::Failed,
                progress: None,
                track_id: None,
                error: Some(message.clone()),
            });
        }

        let request = {
            let mut jobs = self.jobs.lock();
            let job = jobs.get_mut(generation_id).ok_or_else(|| {
                GenError::NotFound(format!("generation '{generation_id}'"))
            })?;
            job.polls += 1;
            if job.polls < self.stages {
                let state = if job.polls == 1 {
                    GenerationState::Starting
                } else {
                    GenerationState::Processing
                };
                return Ok(GenerationStatus {
                    status: state,
                    progress: Some(job.polls as f32 / self.stages as f32),
                    track_id: None,
                    error: None,
                });
            }
            if let Some(track_id) = &job.track_id {
                // Already completed; the track id was handed out once at
                // the completing poll.
                return Ok(GenerationStatus {
                    status: GenerationState::Complete,
                    progress: Some(1.0),
                    track_id: Some(track_id.clone()),
                    error: None,
                });
            }
            job.request.clone()
        };

        let track_id = self.render_track(&request)?;
        self.jobs
            .lock()
            .get_mut(generation_id)
            .ok_or_else(|| GenError::NotFound(format!("generation '{generation_id}'")))?
            .track_id = Some(track_id.clone());
        Ok(GenerationStatus {
            status: GenerationState::Complete,
            progress: Some(1.0),
            track_id: Some(track_id),
            error: None,
        })
    }

    fn track_url(&self, track_id: &str) -> String {
        format!("mock://track/{track_id}")
    }

    async fn track_bytes(&self, track_id: &str) -> GenResult<Vec<u8>> {
        self.tracks
            .lock()
            .get(track_id)
            .cloned()
            .ok_or_else(|| GenError::NotFound(format!("track '{track_id}'")))
    }
}
