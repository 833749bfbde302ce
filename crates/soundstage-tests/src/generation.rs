//! Integration tests for the generation → load → playback pipeline.

use parking_lot::Mutex;
use soundstage_audio::{Engine, LoadState, Mixer, NullSink, TrackOptions};
use soundstage_gen::{
    poll_generation, GenerationRequest, GenerationService, GenerationState,
    MockGenerationService,
};
use std::sync::Arc;

fn test_engine() -> Engine {
    let mixer = Arc::new(Mutex::new(Mixer::new()));
    Engine::with_sink(mixer, Box::new(NullSink::new()))
}

#[tokio::test]
async fn mock_generation_is_immediately_playable() {
    let service = MockGenerationService::new();
    let mut request = GenerationRequest::new("four on the floor");
    request.instrument = "drums".into();
    request.duration = 8;

    let submission = service.submit(&request).await.unwrap();
    assert_eq!(submission.status, Some(GenerationState::Complete));
    let track_id = submission.track_id.unwrap();

    let mut engine = test_engine();
    let bytes = service.track_bytes(&track_id).await.unwrap();
    let clip = engine
        .load_track_bytes(&track_id, &bytes, TrackOptions::default())
        .unwrap();
    assert!((clip.duration_seconds() - 8.0).abs() < 0.01);
    assert_eq!(engine.track_status(&track_id), Some(LoadState::Loaded));

    engine.play().unwrap();
    assert!(engine.is_playing());
    engine.stop();
}

#[tokio::test(start_paused = true)]
async fn async_generation_polls_through_to_a_loadable_track() {
    let service = MockGenerationService::with_stages(3);
    let request = GenerationRequest::new("walking bass");
    let submission = service.submit(&request).await.unwrap();
    assert!(submission.track_id.is_none());

    let mut transitions = Vec::new();
    let status = poll_generation(&service, &submission.generation_id, |status| {
        transitions.push((status.status, status.track_id.clone()));
    })
    .await
    .unwrap();

    // trackId appears exactly once, at complete.
    let with_track: Vec<_> = transitions.iter().filter(|(_, t)| t.is_some()).collect();
    assert_eq!(with_track.len(), 1);
    assert_eq!(with_track[0].0, GenerationState::Complete);

    let bytes = service.track_bytes(&status.track_id.unwrap()).await.unwrap();
    let mut engine = test_engine();
    engine
        .load_track_bytes("generated", &bytes, TrackOptions::default())
        .unwrap();
    assert!(engine.get_longest_duration() > 0.0);
}

#[tokio::test(start_paused = true)]
async fn failed_generation_leaves_the_player_intact() {
    let mut engine = test_engine();
    engine
        .load_track_bytes(
            "existing",
            &{
                let service = MockGenerationService::new();
                let submission = service
                    .submit(&GenerationRequest::new("pad"))
                    .await
                    .unwrap();
                service
                    .track_bytes(&submission.track_id.unwrap())
                    .await
                    .unwrap()
            },
            TrackOptions::default(),
        )
        .unwrap();

    let failing = MockGenerationService::failing("gpu on fire");
    let submission = failing.submit(&GenerationRequest::new("y")).await.unwrap();
    let err = poll_generation(&failing, &submission.generation_id, |_| {})
        .await
        .unwrap_err();
    assert!(err.to_string().contains("gpu on fire"));

    // The existing mix is untouched.
    assert_eq!(engine.track_status("existing"), Some(LoadState::Loaded));
    engine.play().unwrap();
    assert!(engine.is_playing());
    engine.stop();
}
