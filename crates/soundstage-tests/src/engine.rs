//! Integration tests for the playback engine over a recording sink.

use parking_lot::Mutex;
use soundstage_audio::{Engine, Mixer, NullSink, TrackOptions};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

fn wav_bytes(seconds: f64) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut bytes = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut bytes, spec).unwrap();
        for i in 0..(seconds * 8000.0) as usize {
            let t = i as f64 / 8000.0;
            let v = (2.0 * std::f64::consts::PI * 220.0 * t).sin() * 0.3;
            writer.write_sample((v * 32767.0) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    bytes.into_inner()
}

fn test_engine() -> Engine {
    let mixer = Arc::new(Mutex::new(Mixer::new()));
    Engine::with_sink(mixer, Box::new(NullSink::new()))
}

/// End-to-end transport scenario: two tracks, play, seek, stop, with
/// wall-clock timing and generous jitter tolerance.
#[tokio::test]
async fn two_track_transport_scenario() {
    let mut engine = test_engine();
    engine
        .load_track_bytes("a", &wav_bytes(3.0), TrackOptions::default())
        .unwrap();
    engine
        .load_track_bytes("b", &wav_bytes(5.0), TrackOptions::default())
        .unwrap();
    assert!((engine.get_longest_duration() - 5.0).abs() < 0.01);

    engine.play().unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    let position = engine.get_position();
    assert!(
        (position - 0.3).abs() < 0.15,
        "expected ~0.3s after 300ms, got {position}"
    );

    engine.seek(4.0);
    let position = engine.get_position();
    assert!(
        (position - 4.0).abs() < 0.05,
        "expected ~4.0 right after seek, got {position}"
    );

    engine.stop();
    let frozen = engine.get_position();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(engine.get_position(), frozen);
    assert!((frozen - 4.0).abs() < 0.2);
}

#[tokio::test]
async fn observer_receives_updates_only_while_playing() {
    let mut engine = test_engine();
    engine
        .load_track_bytes("a", &wav_bytes(3.0), TrackOptions::default())
        .unwrap();

    let samples: Arc<Mutex<Vec<f64>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&samples);
    let _subscription = engine.observe_position(move |position| {
        sink.lock().push(position);
    });

    engine.play().unwrap();
    tokio::time::sleep(Duration::from_millis(350)).await;
    engine.stop();
    let after_stop = samples.lock().len();
    assert!(after_stop >= 2, "expected periodic samples, got {after_stop}");

    // Samples are non-decreasing while playing.
    let snapshot = samples.lock().clone();
    assert!(snapshot.windows(2).all(|w| w[1] >= w[0]));

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(samples.lock().len(), after_stop);
}

#[tokio::test]
async fn mix_controls_are_independent_of_transport() {
    let mut engine = test_engine();
    engine
        .load_track_bytes("a", &wav_bytes(2.0), TrackOptions::default())
        .unwrap();

    // Valid while stopped...
    engine.set_track_volume("a", 0.4);
    engine.set_track_mute("a", true);
    engine.set_track_solo("a", true);
    assert!((engine.get_track_volume("a") - 0.4).abs() < 1e-6);

    // ...and while playing, without touching any voice.
    engine.play().unwrap();
    engine.set_track_mute("a", false);
    engine.set_master_volume(0.7);
    assert!((engine.get_master_volume() - 0.7).abs() < 1e-6);
    engine.stop();
}
