//! Audio mixer — per-track gain/mute/solo strips into a master gain.
//!
//! Strips are keyed by track id and mutated synchronously by UI actions;
//! changes take effect on the next render block with no dependency on the
//! transport. The mixer never starts or stops a voice.

use std::collections::HashMap;

/// Linear volume [0,1] converted to decibels. Zero maps to -inf.
pub fn gain_to_db(gain: f32) -> f32 {
    if gain <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * gain.log10()
    }
}

/// Decibels back to linear gain.
pub fn db_to_gain(db: f32) -> f32 {
    if db == f32::NEG_INFINITY {
        0.0
    } else {
        10.0f32.powf(db / 20.0)
    }
}

fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

/// Per-track signal-path state. Volume is stored as a logarithmic gain.
#[derive(Debug, Clone)]
pub struct TrackStrip {
    gain_db: f32,
    pub muted: bool,
    pub solo: bool,
}

impl TrackStrip {
    pub fn new(volume: f32, muted: bool, solo: bool) -> Self {
        Self {
            gain_db: gain_to_db(clamp_volume(volume)),
            muted,
            solo,
        }
    }

    /// Linear volume in [0,1].
    pub fn volume(&self) -> f32 {
        db_to_gain(self.gain_db)
    }

    /// Set the linear volume. Out-of-range input is clamped, never
    /// rejected.
    pub fn set_volume(&mut self, volume: f32) {
        self.gain_db = gain_to_db(clamp_volume(volume));
    }
}

impl Default for TrackStrip {
    fn default() -> Self {
        Self::new(1.0, false, false)
    }
}

/// Mixer state: one strip per track plus the master bus gain.
///
/// The master bus carries volume only — no mute/solo.
pub struct Mixer {
    strips: HashMap<String, TrackStrip>,
    master_db: f32,
}

impl Mixer {
    pub fn new() -> Self {
        Self {
            strips: HashMap::new(),
            master_db: 0.0,
        }
    }

    /// Install a strip for a track, replacing any existing one.
    pub fn add_strip(&mut self, track_id: &str, strip: TrackStrip) {
        self.strips.insert(track_id.to_string(), strip);
    }

    /// Remove a track's strip. No-op for unknown ids.
    pub fn remove_strip(&mut self, track_id: &str) {
        self.strips.remove(track_id);
    }

    pub fn strip(&self, track_id: &str) -> Option<&TrackStrip> {
        self.strips.get(track_id)
    }

    pub fn set_volume(&mut self, track_id: &str, volume: f32) {
        if let Some(strip) = self.strips.get_mut(track_id) {
            strip.set_volume(volume);
        }
    }

    pub fn set_mute(&mut self, track_id: &str, muted: bool) {
        if let Some(strip) = self.strips.get_mut(track_id) {
            strip.muted = muted;
        }
    }

    pub fn set_solo(&mut self, track_id: &str, solo: bool) {
        if let Some(strip) = self.strips.get_mut(track_id) {
            strip.solo = solo;
        }
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_db = gain_to_db(clamp_volume(volume));
    }

    pub fn master_volume(&self) -> f32 {
        db_to_gain(self.master_db)
    }

    /// Check if any strip is soloed.
    pub fn any_solo(&self) -> bool {
        self.strips.values().any(|s| s.solo)
    }

    /// Whether a track is audible under the standard console solo
    /// contract: muted tracks are silent, and engaging solo anywhere
    /// silences every non-solo track.
    pub fn is_audible(&self, track_id: &str) -> bool {
        match self.strips.get(track_id) {
            Some(strip) => !strip.muted && (!self.any_solo() || strip.solo),
            None => false,
        }
    }

    /// Effective linear gain for a track (pre-master). Zero when the
    /// track is inaudible or unknown.
    pub fn track_gain(&self, track_id: &str) -> f32 {
        if !self.is_audible(track_id) {
            return 0.0;
        }
        self.strips
            .get(track_id)
            .map(|s| s.volume())
            .unwrap_or(0.0)
    }
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}
