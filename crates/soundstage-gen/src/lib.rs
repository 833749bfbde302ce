//! SoundStage Gen - Generation-service client
//!
//! Consumes the external text-to-audio generation interface:
//! - `POST /api/generate` → job id (or immediate completion)
//! - `GET /api/generate/status/:id` → poll-able status
//! - `GET /api/track/:id` → WAV bytes for the clip loader
//!
//! Includes an in-process mock mirroring the service's no-backend mode.

pub mod error;
pub mod mock;
pub mod poll;
pub mod service;
pub mod types;

pub use error::{GenError, GenResult};
pub use mock::MockGenerationService;
pub use poll::{poll_generation, INITIAL_DELAY, POLL_INTERVAL};
pub use service::{GenerationService, HttpGenerationService};
pub use types::{
    GenerationRecord, GenerationRequest, GenerationState, GenerationStatus,
    GenerationSubmission, DEFAULT_DURATION, MAX_DURATION, MIN_DURATION,
};
