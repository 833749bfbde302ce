//! SoundStage - Multitrack audio workstation demo
//!
//! Loads WAV files given as arguments as tracks, or generates a short
//! mock arrangement when run without arguments, then plays the mix.

use anyhow::{Context, Result};
use soundstage_audio::{Engine, TrackOptions};
use soundstage_gen::{GenerationRequest, GenerationService, MockGenerationService};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("SoundStage starting...");

    let mut engine = Engine::with_default_output();
    let paths: Vec<String> = std::env::args().skip(1).collect();

    if paths.is_empty() {
        generate_demo_tracks(&mut engine).await?;
    } else {
        for path in &paths {
            let bytes =
                std::fs::read(path).with_context(|| format!("reading {path}"))?;
            let clip = engine.load_track_bytes(path, &bytes, TrackOptions::default())?;
            info!(track = %path, duration = clip.duration_seconds(), "loaded");
        }
    }

    let duration = engine.get_longest_duration();
    info!(duration, "starting playback");

    let _position_printer = engine.observe_position(|position| {
        print!("\rposition: {position:6.2}s");
        let _ = std::io::Write::flush(&mut std::io::stdout());
    });

    engine.play()?;
    tokio::time::sleep(Duration::from_secs_f64(duration)).await;
    engine.stop();
    println!();
    info!(position = engine.get_position(), "playback finished");

    Ok(())
}

/// Generate a small arrangement through the mock service.
async fn generate_demo_tracks(engine: &mut Engine) -> Result<()> {
    let service = MockGenerationService::new();
    for (name, instrument) in [("drums", "drums"), ("bass", "bass"), ("lead", "piano")] {
        let mut request = GenerationRequest::new(format!("demo {name}"));
        request.instrument = instrument.to_string();
        request.duration = 8;

        let submission = service.submit(&request).await?;
        let track_id = submission
            .track_id
            .context("mock submission did not complete")?;
        let bytes = service.track_bytes(&track_id).await?;
        engine.load_track_bytes(name, &bytes, TrackOptions::default())?;
        info!(track = name, instrument, "generated");
    }
    // Keep the lead quieter than the rhythm section.
    engine.set_track_volume("lead", 0.6);
    Ok(())
}
