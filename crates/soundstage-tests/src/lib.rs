//! Integration test crate for SoundStage.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on multiple soundstage crates to verify they work together.

#[cfg(test)]
mod engine;

#[cfg(test)]
mod generation;
