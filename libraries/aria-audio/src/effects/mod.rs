//! Audio effects
//!
//! All effects operate on interleaved stereo f32 samples in [-1.0, 1.0].

pub mod chain;
pub mod eq;

pub use chain::{AudioEffect, EffectChain};
pub use eq::{BandFilter, EqBand, FilterType};
