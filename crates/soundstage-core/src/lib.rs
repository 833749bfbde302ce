//! SoundStage Core - Foundation types for the multitrack audio workstation
//!
//! This crate provides the types shared across the workspace:
//! - The error taxonomy and `Result` alias

pub mod error;

pub use error::{Result, SoundStageError};
