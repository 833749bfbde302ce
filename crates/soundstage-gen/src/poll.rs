//! Polling driver for asynchronous generation jobs.

use crate::error::{GenError, GenResult};
use crate::service::GenerationService;
use crate::types::{GenerationState, GenerationStatus};
use std::time::Duration;
use tracing::{debug, warn};

/// Delay before the first status poll.
pub const INITIAL_DELAY: Duration = Duration::from_secs(1);
/// Interval between subsequent polls (the service asks for ≥ 1 s).
pub const POLL_INTERVAL: Duration = Duration::from_millis(1500);

/// Poll a job until it completes or fails, pushing every observed status
/// to `on_update` (for the UI's generation record).
///
/// Returns the completing status, or an error when the job fails or a
/// poll itself errors — terminal for this attempt only; resubmitting the
/// same parameters retries.
pub async fn poll_generation(
    service: &dyn GenerationService,
    generation_id: &str,
    mut on_update: impl FnMut(&GenerationStatus) + Send,
) -> GenResult<GenerationStatus> {
    tokio::time::sleep(INITIAL_DELAY).await;
    loop {
        let status = service.status(generation_id).await?;
        on_update(&status);
        match status.status {
            GenerationState::Complete => {
                debug!(generation_id, "generation complete");
                return Ok(status);
            }
            GenerationState::Failed => {
                let message = status
                    .error
                    .clone()
                    .unwrap_or_else(|| "generation failed".to_string());
                warn!(generation_id, error = %message, "generation failed");
                return Err(GenError::Failed(message));
            }
            GenerationState::Starting | GenerationState::Processing => {
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockGenerationService;
    use crate::types::{GenerationRecord, GenerationRequest};

    #[tokio::test(start_paused = true)]
    async fn polls_until_complete_and_updates_record() {
        let service = MockGenerationService::with_stages(3);
        let request = GenerationRequest::new("arp sequence");
        let submission = service.submit(&request).await.unwrap();

        let mut record = GenerationRecord::new(&submission.generation_id, request);
        let mut seen = Vec::new();
        let final_status = poll_generation(&service, &submission.generation_id, |status| {
            seen.push(status.status);
            record.apply(status);
        })
        .await
        .unwrap();

        assert_eq!(
            seen,
            vec![
                GenerationState::Starting,
                GenerationState::Processing,
                GenerationState::Complete
            ]
        );
        assert_eq!(record.status, GenerationState::Complete);
        assert_eq!(record.track_id, final_status.track_id);
        assert!(record.track_id.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_job_is_terminal_for_that_attempt() {
        let service = MockGenerationService::failing("no capacity");
        let submission = service.submit(&GenerationRequest::new("x")).await.unwrap();

        let mut record = GenerationRecord::new(&submission.generation_id, GenerationRequest::new("x"));
        let err = poll_generation(&service, &submission.generation_id, |status| {
            record.apply(status);
        })
        .await
        .unwrap_err();

        assert!(matches!(err, GenError::Failed(_)));
        assert_eq!(record.status, GenerationState::Failed);
        assert_eq!(record.error.as_deref(), Some("no capacity"));
    }
}
