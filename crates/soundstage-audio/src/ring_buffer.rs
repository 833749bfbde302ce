//! Lock-free single-producer single-consumer ring buffer for real-time
//! audio.
//!
//! The render thread is the producer and the device callback is the
//! consumer. Samples are stored as `AtomicU32` bit patterns so both sides
//! can touch the buffer through a shared reference; the acquire/release
//! pair on the positions orders the sample writes.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

/// A SPSC ring buffer for f32 audio samples.
pub struct RingBuffer {
    buffer: Box<[AtomicU32]>,
    capacity: usize,
    read_pos: AtomicUsize,
    write_pos: AtomicUsize,
}

impl RingBuffer {
    /// Create a new ring buffer with the given capacity (in samples).
    pub fn new(capacity: usize) -> Self {
        // One extra slot distinguishes full from empty.
        let actual_cap = capacity + 1;
        let buffer: Vec<AtomicU32> = (0..actual_cap).map(|_| AtomicU32::new(0)).collect();
        Self {
            buffer: buffer.into_boxed_slice(),
            capacity: actual_cap,
            read_pos: AtomicUsize::new(0),
            write_pos: AtomicUsize::new(0),
        }
    }

    /// Number of samples available for reading.
    pub fn available_read(&self) -> usize {
        let w = self.write_pos.load(Ordering::Acquire);
        let r = self.read_pos.load(Ordering::Acquire);
        if w >= r {
            w - r
        } else {
            self.capacity - r + w
        }
    }

    /// Number of samples that can be written.
    pub fn available_write(&self) -> usize {
        self.capacity - 1 - self.available_read()
    }

    /// Write samples into the buffer. Returns the number actually written.
    pub fn write(&self, data: &[f32]) -> usize {
        let count = data.len().min(self.available_write());
        if count == 0 {
            return 0;
        }

        let w = self.write_pos.load(Ordering::Relaxed);
        for (i, &sample) in data[..count].iter().enumerate() {
            let idx = (w + i) % self.capacity;
            self.buffer[idx].store(sample.to_bits(), Ordering::Relaxed);
        }

        let new_w = (w + count) % self.capacity;
        self.write_pos.store(new_w, Ordering::Release);
        count
    }

    /// Read samples from the buffer. Returns the number actually read.
    pub fn read(&self, output: &mut [f32]) -> usize {
        let count = output.len().min(self.available_read());
        if count == 0 {
            return 0;
        }

        let r = self.read_pos.load(Ordering::Relaxed);
        for (i, out) in output[..count].iter_mut().enumerate() {
            let idx = (r + i) % self.capacity;
            *out = f32::from_bits(self.buffer[idx].load(Ordering::Relaxed));
        }

        let new_r = (r + count) % self.capacity;
        self.read_pos.store(new_r, Ordering::Release);
        count
    }

    /// Discard everything buffered so far.
    pub fn clear(&self) {
        self.read_pos
            .store(self.write_pos.load(Ordering::Acquire), Ordering::Release);
    }
}
