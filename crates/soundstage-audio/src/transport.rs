//! Transport clock — the authoritative playback position.
//!
//! The position is either a frozen scalar (stopped) or a linear function
//! of wall-clock time since a play epoch (playing). Every consumer — the
//! UI position display, seeks, the scheduler — derives the same position
//! from this one state, however often it polls.

use std::time::Instant;

/// Transport state: stopped at a position, or playing since an epoch.
#[derive(Debug, Clone, Copy)]
pub enum Transport {
    /// Playback is halted; the position is frozen.
    Stopped { position: f64 },
    /// Playback is running; position = `pos_at_epoch + (now - epoch)`.
    Playing { epoch: Instant, pos_at_epoch: f64 },
}

impl Transport {
    /// A transport stopped at position zero.
    pub fn new() -> Self {
        Self::Stopped { position: 0.0 }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing { .. })
    }

    /// Playback position in seconds at the given instant. Never negative.
    pub fn position_at(&self, now: Instant) -> f64 {
        match *self {
            Self::Stopped { position } => position,
            Self::Playing {
                epoch,
                pos_at_epoch,
            } => {
                let elapsed = now.saturating_duration_since(epoch).as_secs_f64();
                (pos_at_epoch + elapsed).max(0.0)
            }
        }
    }

    /// Playback position in seconds right now.
    pub fn position(&self) -> f64 {
        self.position_at(Instant::now())
    }

    /// Move the playhead. Out-of-range input (negative, NaN) is clamped to
    /// zero rather than rejected — transport controls must never wedge
    /// playback. While playing this re-anchors the epoch at `now`, so the
    /// seek takes effect without a stop/start round trip; the scheduler
    /// must pair it with a voice restart or audio and displayed position
    /// drift apart.
    pub fn seek_at(&mut self, position: f64, now: Instant) {
        let position = clamp_position(position);
        match self {
            Self::Stopped { position: pos } => *pos = position,
            Self::Playing {
                epoch,
                pos_at_epoch,
            } => {
                *pos_at_epoch = position;
                *epoch = now;
            }
        }
    }

    /// Stopped → Playing, capturing `now` as the epoch. No-op if already
    /// playing.
    pub fn start_at(&mut self, now: Instant) {
        if let Self::Stopped { position } = *self {
            *self = Self::Playing {
                epoch: now,
                pos_at_epoch: position,
            };
        }
    }

    /// Playing → Stopped, freezing the position computed at `now`. No-op
    /// if already stopped.
    pub fn stop_at(&mut self, now: Instant) {
        if self.is_playing() {
            *self = Self::Stopped {
                position: self.position_at(now),
            };
        }
    }

    pub fn seek(&mut self, position: f64) {
        self.seek_at(position, Instant::now());
    }

    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    pub fn stop(&mut self) {
        self.stop_at(Instant::now());
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

/// Clamp a position to a finite value ≥ 0. NaN maps to zero.
pub fn clamp_position(position: f64) -> f64 {
    if position.is_finite() {
        position.max(0.0)
    } else {
        0.0
    }
}
