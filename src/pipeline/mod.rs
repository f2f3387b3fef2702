//! Sequence rendering and playback
//!
//! - Assembler: render events and stitch them into one crossfaded buffer
//! - Orchestrator: pick a strategy for the backend and drive playback

pub mod assembler;
pub mod orchestrator;

pub use assembler::{assemble, mix_hands, render_event, AssemblerConfig};
pub use orchestrator::{Orchestrator, PlaybackConfig, PlaybackState, Strategy};
