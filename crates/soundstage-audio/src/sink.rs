//! Playback sinks — the seam between the scheduler and the audio device.
//!
//! The scheduler never renders audio itself; it issues non-blocking
//! scheduling requests (start/stop/flush) against a [`PlaybackSink`]. The
//! real implementation, [`CpalSink`], owns a lazy cpal output stream fed
//! through a SPSC ring buffer by a render thread. The render thread
//! drains its command channel once per block, so every start/stop issued
//! in one scheduler pass lands on the same block boundary and the tracks
//! stay phase-aligned.

use crate::clip::AudioClip;
use crate::mixer::Mixer;
use crate::ring_buffer::RingBuffer;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use soundstage_core::{Result, SoundStageError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Frames rendered per block.
const BLOCK_FRAMES: usize = 512;

/// A destination that plays scheduled clips.
pub trait PlaybackSink: Send {
    /// One-time bring-up of the audio device. Idempotent and safe to call
    /// redundantly; must complete before any scheduling call is honored.
    fn activate(&mut self) -> Result<()>;

    /// Schedule a voice for `track_id` starting at `offset_seconds` into
    /// the clip, replacing any running voice for that id.
    fn start_clip(&mut self, track_id: &str, clip: Arc<AudioClip>, offset_seconds: f64);

    /// Stop the voice for `track_id`, if any.
    fn stop_clip(&mut self, track_id: &str);

    /// Stop every voice.
    fn stop_all(&mut self);

    /// Drop any audio rendered ahead of the device.
    fn flush(&mut self);
}

enum SinkCommand {
    Start {
        track_id: String,
        clip: Arc<AudioClip>,
        offset_seconds: f64,
    },
    Stop {
        track_id: String,
    },
    StopAll,
}

/// Playback sink backed by the system's default cpal output device.
pub struct CpalSink {
    mixer: Arc<Mutex<Mixer>>,
    commands: Option<Sender<SinkCommand>>,
    ring: Option<Arc<RingBuffer>>,
    shutdown: Arc<AtomicBool>,
    render_thread: Option<std::thread::JoinHandle<()>>,
}

impl CpalSink {
    /// Create an inactive sink sharing the engine's mixer state.
    pub fn new(mixer: Arc<Mutex<Mixer>>) -> Self {
        Self {
            mixer,
            commands: None,
            ring: None,
            shutdown: Arc::new(AtomicBool::new(false)),
            render_thread: None,
        }
    }
}

impl PlaybackSink for CpalSink {
    fn activate(&mut self) -> Result<()> {
        if self.commands.is_some() {
            return Ok(());
        }

        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded();
        let (ready_tx, ready_rx) = std::sync::mpsc::sync_channel(1);
        let mixer = Arc::clone(&self.mixer);
        let shutdown = Arc::clone(&self.shutdown);

        // The cpal stream lives on this thread for its whole lifetime;
        // the same thread runs the render loop that feeds the ring
        // buffer the stream's callback drains.
        let handle = std::thread::Builder::new()
            .name("soundstage-render".into())
            .spawn(move || {
                let (stream, ring, sample_rate, channels) = match build_output_stream() {
                    Ok(parts) => parts,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                if let Err(e) = stream.play() {
                    let _ = ready_tx.send(Err(SoundStageError::Audio(format!(
                        "failed to start output stream: {e}"
                    ))));
                    return;
                }
                let _ = ready_tx.send(Ok(Arc::clone(&ring)));
                info!(sample_rate, channels, "audio output active");

                render_loop(cmd_rx, ring, mixer, sample_rate, channels, shutdown);
                drop(stream);
            })
            .map_err(|e| SoundStageError::Audio(format!("failed to spawn render thread: {e}")))?;

        match ready_rx.recv() {
            Ok(Ok(ring)) => {
                self.ring = Some(ring);
                self.commands = Some(cmd_tx);
                self.render_thread = Some(handle);
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => Err(SoundStageError::Audio(
                "render thread exited during activation".into(),
            )),
        }
    }

    fn start_clip(&mut self, track_id: &str, clip: Arc<AudioClip>, offset_seconds: f64) {
        if let Some(commands) = &self.commands {
            let _ = commands.send(SinkCommand::Start {
                track_id: track_id.to_string(),
                clip,
                offset_seconds,
            });
        }
    }

    fn stop_clip(&mut self, track_id: &str) {
        if let Some(commands) = &self.commands {
            let _ = commands.send(SinkCommand::Stop {
                track_id: track_id.to_string(),
            });
        }
    }

    fn stop_all(&mut self) {
        if let Some(commands) = &self.commands {
            let _ = commands.send(SinkCommand::StopAll);
        }
    }

    fn flush(&mut self) {
        if let Some(ring) = &self.ring {
            ring.clear();
        }
    }
}

impl Drop for CpalSink {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        self.commands = None;
        if let Some(handle) = self.render_thread.take() {
            let _ = handle.join();
        }
    }
}

type StreamParts = (cpal::Stream, Arc<RingBuffer>, u32, u16);

fn build_output_stream() -> Result<StreamParts> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| SoundStageError::Audio("no output device available".into()))?;
    let config = device
        .default_output_config()
        .map_err(|e| SoundStageError::Audio(format!("no output config: {e}")))?;

    let sample_rate = config.sample_rate().0;
    let channels = config.channels();
    // ~200ms of buffered audio between render thread and callback.
    let ring = Arc::new(RingBuffer::new(
        sample_rate as usize / 5 * channels as usize,
    ));
    let callback_ring = Arc::clone(&ring);

    let stream = device
        .build_output_stream(
            &config.into(),
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let read = callback_ring.read(data);
                // Underrun: pad with silence rather than replaying stale
                // samples.
                for sample in data[read..].iter_mut() {
                    *sample = 0.0;
                }
            },
            |e| warn!("output stream error: {e}"),
            None,
        )
        .map_err(|e| SoundStageError::Audio(format!("failed to build output stream: {e}")))?;

    Ok((stream, ring, sample_rate, channels))
}

/// A clip being rendered: a shared buffer plus a fractional read cursor.
struct Voice {
    clip: Arc<AudioClip>,
    cursor: f64,
    step: f64,
}

fn render_loop(
    commands: Receiver<SinkCommand>,
    ring: Arc<RingBuffer>,
    mixer: Arc<Mutex<Mixer>>,
    sample_rate: u32,
    channels: u16,
    shutdown: Arc<AtomicBool>,
) {
    let mut voices: HashMap<String, Voice> = HashMap::new();
    let mut block = vec![0.0f32; BLOCK_FRAMES * channels as usize];

    while !shutdown.load(Ordering::Acquire) {
        // One drain per block: every command issued in a single scheduler
        // pass takes effect at the same block boundary.
        for command in commands.try_iter() {
            match command {
                SinkCommand::Start {
                    track_id,
                    clip,
                    offset_seconds,
                } => {
                    let step = clip.sample_rate() as f64 / sample_rate as f64;
                    let cursor = offset_seconds * clip.sample_rate() as f64;
                    debug!(track_id, offset_seconds, "voice (re)started");
                    voices.insert(track_id, Voice { clip, cursor, step });
                }
                SinkCommand::Stop { track_id } => {
                    voices.remove(&track_id);
                }
                SinkCommand::StopAll => voices.clear(),
            }
        }

        if ring.available_write() < block.len() {
            std::thread::sleep(Duration::from_millis(1));
            continue;
        }

        render_block(&mut block, &mut voices, &mixer, channels);
        ring.write(&block);
        voices.retain(|_, v| v.cursor < v.clip.frame_count() as f64);
    }
}

fn render_block(
    block: &mut [f32],
    voices: &mut HashMap<String, Voice>,
    mixer: &Arc<Mutex<Mixer>>,
    channels: u16,
) {
    block.fill(0.0);
    let mixer = mixer.lock();
    let master = mixer.master_volume();

    for (track_id, voice) in voices.iter_mut() {
        let gain = mixer.track_gain(track_id) * master;
        let frames = voice.clip.frame_count();

        for out_frame in 0..BLOCK_FRAMES {
            let pos = voice.cursor + out_frame as f64 * voice.step;
            let base = pos.floor() as usize;
            if base >= frames {
                break;
            }
            let frac = (pos - base as f64) as f32;

            for ch in 0..channels {
                // Mono clips fan out to every output channel; the clip's
                // last channel covers any extra outputs.
                let a = voice.clip.frame(base, ch);
                let b = voice.clip.frame(base + 1, ch);
                let sample = (a + (b - a) * frac) * gain;
                block[out_frame * channels as usize + ch as usize] += sample;
            }
        }

        voice.cursor += BLOCK_FRAMES as f64 * voice.step;
    }
}

/// A sink that records scheduling calls instead of playing audio.
///
/// Used by tests to assert scheduler behavior without an output device.
#[derive(Default)]
pub struct NullSink {
    events: Arc<Mutex<Vec<SinkEvent>>>,
    activations: usize,
}

/// One recorded scheduling call.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Start { track_id: String, offset: f64 },
    Stop { track_id: String },
    StopAll,
    Flush,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the recorded events.
    pub fn events(&self) -> Arc<Mutex<Vec<SinkEvent>>> {
        Arc::clone(&self.events)
    }

    pub fn activations(&self) -> usize {
        self.activations
    }
}

impl PlaybackSink for NullSink {
    fn activate(&mut self) -> Result<()> {
        self.activations += 1;
        Ok(())
    }

    fn start_clip(&mut self, track_id: &str, _clip: Arc<AudioClip>, offset_seconds: f64) {
        self.events.lock().push(SinkEvent::Start {
            track_id: track_id.to_string(),
            offset: offset_seconds,
        });
    }

    fn stop_clip(&mut self, track_id: &str) {
        self.events.lock().push(SinkEvent::Stop {
            track_id: track_id.to_string(),
        });
    }

    fn stop_all(&mut self) {
        self.events.lock().push(SinkEvent::StopAll);
    }

    fn flush(&mut self) {
        self.events.lock().push(SinkEvent::Flush);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mixer::TrackStrip;

    fn test_clip(frames: usize, value: f32) -> Arc<AudioClip> {
        Arc::new(AudioClip::from_samples(vec![value; frames], 1, 48000).unwrap())
    }

    #[test]
    fn render_applies_track_and_master_gain() {
        let mixer = Arc::new(Mutex::new(Mixer::new()));
        {
            let mut m = mixer.lock();
            m.add_strip("a", TrackStrip::new(0.5, false, false));
            m.set_master_volume(0.5);
        }
        let mut voices = HashMap::new();
        voices.insert(
            "a".to_string(),
            Voice {
                clip: test_clip(BLOCK_FRAMES * 2, 1.0),
                cursor: 0.0,
                step: 1.0,
            },
        );

        let mut block = vec![0.0f32; BLOCK_FRAMES * 2];
        render_block(&mut block, &mut voices, &mixer, 2);
        assert!((block[0] - 0.25).abs() < 1e-6);
        assert!((block[1] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn render_skips_inaudible_tracks() {
        let mixer = Arc::new(Mutex::new(Mixer::new()));
        {
            let mut m = mixer.lock();
            m.add_strip("a", TrackStrip::default());
            m.add_strip("b", TrackStrip::default());
            m.set_solo("b", true);
        }
        let mut voices = HashMap::new();
        voices.insert(
            "a".to_string(),
            Voice {
                clip: test_clip(BLOCK_FRAMES, 1.0),
                cursor: 0.0,
                step: 1.0,
            },
        );

        let mut block = vec![0.0f32; BLOCK_FRAMES * 2];
        render_block(&mut block, &mut voices, &mixer, 2);
        assert!(block.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn voice_past_end_renders_silence() {
        let mixer = Arc::new(Mutex::new(Mixer::new()));
        mixer.lock().add_strip("a", TrackStrip::default());
        let mut voices = HashMap::new();
        voices.insert(
            "a".to_string(),
            Voice {
                clip: test_clip(64, 1.0),
                cursor: 64.0,
                step: 1.0,
            },
        );

        let mut block = vec![0.0f32; BLOCK_FRAMES * 2];
        render_block(&mut block, &mut voices, &mixer, 2);
        assert!(block.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn null_sink_records_scheduling() {
        let mut sink = NullSink::new();
        sink.activate().unwrap();
        sink.activate().unwrap();
        assert_eq!(sink.activations(), 2);

        sink.start_clip("a", test_clip(8, 0.0), 1.5);
        sink.stop_clip("a");
        sink.stop_all();
        let events = sink.events();
        let events = events.lock();
        assert_eq!(
            *events,
            vec![
                SinkEvent::Start {
                    track_id: "a".into(),
                    offset: 1.5
                },
                SinkEvent::Stop {
                    track_id: "a".into()
                },
                SinkEvent::StopAll,
            ]
        );
    }
}
