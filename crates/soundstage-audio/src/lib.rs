//! SoundStage Audio - Playback and transport engine
//!
//! The core of the workstation: sample-accurate multitrack playback
//! against a shared transport clock.
//!
//! Architecture:
//! - `Transport`: the authoritative playback position, frozen or a linear
//!   function of wall-clock time since a play epoch
//! - `Mixer`: per-track volume/mute/solo strips into a master gain
//! - `AudioClip` / `ClipLoader`: decoded in-memory buffers, fetched over
//!   HTTP and decoded from WAV
//! - `PlaybackSink` / `CpalSink`: scheduling seam to the audio device —
//!   render thread, SPSC ring buffer, device callback
//! - `Engine`: the scheduler orchestrating all of the above
//! - `PositionReporter`: 100 ms position relay for the UI

pub mod clip;
pub mod engine;
pub mod loader;
pub mod mixer;
pub mod reporter;
pub mod ring_buffer;
pub mod sink;
pub mod transport;

pub use clip::AudioClip;
pub use engine::{Engine, TrackOptions};
pub use loader::{ClipLoader, LoadState};
pub use mixer::{Mixer, TrackStrip};
pub use reporter::{PositionReporter, PositionSubscription};
pub use ring_buffer::RingBuffer;
pub use sink::{CpalSink, NullSink, PlaybackSink, SinkEvent};
pub use transport::Transport;
