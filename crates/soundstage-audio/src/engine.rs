//! The playback engine: one owned instance holding the transport clock,
//! the track-entry map, the mixer, and the playback sink.
//!
//! All transport and track mutation funnels through this type; the UI
//! layer and the position reporter only ever read. Transport operations
//! take `&mut self`, so callers are serialized by construction.

use crate::clip::AudioClip;
use crate::loader::{ClipLoader, LoadState};
use crate::mixer::{Mixer, TrackStrip};
use crate::reporter::{PositionReporter, PositionSubscription};
use crate::sink::{CpalSink, PlaybackSink};
use crate::transport::Transport;
use parking_lot::Mutex;
use soundstage_core::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Initial mix settings for a track being loaded.
#[derive(Debug, Clone, Copy)]
pub struct TrackOptions {
    pub volume: f32,
    pub mute: bool,
    pub solo: bool,
}

impl Default for TrackOptions {
    fn default() -> Self {
        Self {
            volume: 1.0,
            mute: false,
            solo: false,
        }
    }
}

/// One live track: at most one entry exists per track id.
struct TrackEntry {
    status: LoadState,
    clip: Option<Arc<AudioClip>>,
}

/// The multitrack playback engine.
///
/// Construct one per UI session and drop it on teardown; there is no
/// global engine state.
pub struct Engine {
    transport: Arc<Mutex<Transport>>,
    mixer: Arc<Mutex<Mixer>>,
    tracks: HashMap<String, TrackEntry>,
    sink: Box<dyn PlaybackSink>,
    loader: ClipLoader,
    reporter: PositionReporter,
}

impl Engine {
    /// Engine playing through the system's default output device.
    pub fn with_default_output() -> Self {
        let mixer = Arc::new(Mutex::new(Mixer::new()));
        let sink = Box::new(CpalSink::new(Arc::clone(&mixer)));
        Self::with_sink(mixer, sink)
    }

    /// Engine over an explicit sink. The sink must share `mixer` if it
    /// applies gains itself.
    pub fn with_sink(mixer: Arc<Mutex<Mixer>>, sink: Box<dyn PlaybackSink>) -> Self {
        Self {
            transport: Arc::new(Mutex::new(Transport::new())),
            mixer,
            tracks: HashMap::new(),
            sink,
            loader: ClipLoader::new(),
            reporter: PositionReporter::new(),
        }
    }

    // ----- loading -----

    /// Fetch, decode, and install a track. Replacing, never additive: any
    /// live entry for `track_id` is fully released before the new one is
    /// installed. Loads hold `&mut self` for their whole duration, so two
    /// loads for one id cannot interleave and a stale result can never
    /// land over a newer one; an abandoned load leaves at worst a
    /// `Loading` entry that the next load replaces.
    ///
    /// Known limitation: a track that finishes loading while the
    /// transport is already playing is not auto-started; it joins the
    /// mix at the next `play()` or `seek()`.
    pub async fn load_track(
        &mut self,
        track_id: &str,
        url: &str,
        options: TrackOptions,
    ) -> Result<Arc<AudioClip>> {
        self.sink.activate()?;
        self.begin_load(track_id, options);
        let result = match self.loader.fetch(url).await {
            Ok(bytes) => ClipLoader::decode(&bytes),
            Err(e) => Err(e),
        };
        self.finish_load(track_id, result)
    }

    /// Install a track from bytes already in hand (mock generation,
    /// local files, tests). Same replace/release contract as
    /// [`Engine::load_track`].
    pub fn load_track_bytes(
        &mut self,
        track_id: &str,
        bytes: &[u8],
        options: TrackOptions,
    ) -> Result<Arc<AudioClip>> {
        self.sink.activate()?;
        self.begin_load(track_id, options);
        let result = ClipLoader::decode(bytes);
        self.finish_load(track_id, result)
    }

    fn begin_load(&mut self, track_id: &str, options: TrackOptions) {
        if self.tracks.contains_key(track_id) {
            self.sink.stop_clip(track_id);
            debug!(track_id, "replacing existing track entry");
        }
        self.tracks.insert(
            track_id.to_string(),
            TrackEntry {
                status: LoadState::Loading,
                clip: None,
            },
        );
        self.mixer.lock().add_strip(
            track_id,
            TrackStrip::new(options.volume, options.mute, options.solo),
        );
    }

    fn finish_load(&mut self, track_id: &str, result: Result<AudioClip>) -> Result<Arc<AudioClip>> {
        match result {
            Ok(clip) => {
                let clip = Arc::new(clip);
                self.tracks.insert(
                    track_id.to_string(),
                    TrackEntry {
                        status: LoadState::Loaded,
                        clip: Some(Arc::clone(&clip)),
                    },
                );
                info!(
                    track_id,
                    duration = clip.duration_seconds(),
                    "track loaded"
                );
                Ok(clip)
            }
            Err(e) => {
                self.tracks.insert(
                    track_id.to_string(),
                    TrackEntry {
                        status: LoadState::Error(e.to_string()),
                        clip: None,
                    },
                );
                self.mixer.lock().remove_strip(track_id);
                warn!(track_id, error = %e, "track load failed");
                Err(e)
            }
        }
    }

    /// Stop and release a track. No-op for unknown ids.
    pub fn unload_track(&mut self, track_id: &str) {
        if self.tracks.remove(track_id).is_some() {
            self.sink.stop_clip(track_id);
            self.mixer.lock().remove_strip(track_id);
            info!(track_id, "track unloaded");
        }
    }

    pub fn track_status(&self, track_id: &str) -> Option<LoadState> {
        self.tracks.get(track_id).map(|e| e.status.clone())
    }

    /// Duration of one track's clip; 0.0 when unknown or not loaded.
    pub fn track_duration(&self, track_id: &str) -> f64 {
        self.tracks
            .get(track_id)
            .and_then(|e| e.clip.as_ref())
            .map(|c| c.duration_seconds())
            .unwrap_or(0.0)
    }

    /// Longest loaded clip duration — sizes the visible timeline.
    pub fn get_longest_duration(&self) -> f64 {
        self.tracks
            .values()
            .filter_map(|e| e.clip.as_ref())
            .map(|c| c.duration_seconds())
            .fold(0.0, f64::max)
    }

    // ----- mixing -----

    pub fn set_track_volume(&mut self, track_id: &str, volume: f32) {
        self.mixer.lock().set_volume(track_id, volume);
    }

    pub fn set_track_mute(&mut self, track_id: &str, mute: bool) {
        self.mixer.lock().set_mute(track_id, mute);
    }

    pub fn set_track_solo(&mut self, track_id: &str, solo: bool) {
        self.mixer.lock().set_solo(track_id, solo);
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        self.mixer.lock().set_master_volume(volume);
    }

    pub fn get_master_volume(&self) -> f32 {
        self.mixer.lock().master_volume()
    }

    pub fn get_track_volume(&self, track_id: &str) -> f32 {
        self.mixer
            .lock()
            .strip(track_id)
            .map(|s| s.volume())
            .unwrap_or(0.0)
    }

    // ----- transport -----

    /// Start playback: every loaded track's voice is scheduled against
    /// one shared epoch at the current position. No-op while already
    /// playing, so repeated calls cannot double-start voices.
    pub fn play(&mut self) -> Result<()> {
        if self.transport.lock().is_playing() {
            return Ok(());
        }
        self.sink.activate()?;

        let now = Instant::now();
        let position = {
            let mut transport = self.transport.lock();
            transport.start_at(now);
            transport.position_at(now)
        };

        // One synchronous pass; unloaded or failed tracks are skipped and
        // are not retroactively started when they finish loading.
        for (track_id, entry) in &self.tracks {
            if let Some(clip) = &entry.clip {
                self.sink.start_clip(track_id, Arc::clone(clip), position);
            }
        }

        self.reporter.start(Arc::clone(&self.transport));
        info!(position, "transport playing");
        Ok(())
    }

    /// Freeze the clock and halt every voice. Idempotent: stopping while
    /// already stopped touches neither the sink nor the reporter.
    pub fn stop(&mut self) {
        let (was_playing, position) = {
            let mut transport = self.transport.lock();
            let was_playing = transport.is_playing();
            transport.stop();
            (was_playing, transport.position())
        };
        if !was_playing {
            return;
        }

        self.sink.stop_all();
        self.sink.flush();
        self.reporter.stop();
        // Final push so the UI is not left with a stale last sample.
        self.reporter.notify(position);
        info!(position, "transport stopped");
    }

    /// Move the playhead. While playing, every loaded voice is stopped
    /// and immediately restarted at the new offset against the fresh
    /// epoch, keeping all tracks phase-aligned; while stopped, the
    /// position is only recorded for the next play.
    pub fn seek(&mut self, position: f64) {
        let now = Instant::now();
        let (playing, position) = {
            let mut transport = self.transport.lock();
            transport.seek_at(position, now);
            (transport.is_playing(), transport.position_at(now))
        };

        if playing {
            self.sink.flush();
            for (track_id, entry) in &self.tracks {
                if let Some(clip) = &entry.clip {
                    self.sink.start_clip(track_id, Arc::clone(clip), position);
                }
            }
        }
        debug!(position, playing, "seek");
    }

    /// Seek to zero, leaving the play/stop state unchanged.
    pub fn rewind(&mut self) {
        self.seek(0.0);
    }

    /// Alias for [`Engine::seek`] matching the UI-facing surface.
    pub fn set_position(&mut self, position: f64) {
        self.seek(position);
    }

    /// Current transport position, computed from the clock — never from
    /// the reporter's last sample.
    pub fn get_position(&self) -> f64 {
        self.transport.lock().position()
    }

    pub fn is_playing(&self) -> bool {
        self.transport.lock().is_playing()
    }

    /// Register a position observer fed every 100 ms while playing.
    /// Dropping the subscription unregisters it.
    pub fn observe_position(
        &mut self,
        observer: impl Fn(f64) + Send + 'static,
    ) -> PositionSubscription {
        self.reporter.subscribe(observer)
    }
}
