//! Aria Audio
//!
//! The equalizer graph that sits between the decoder and the output sink.
//!
//! # Architecture
//!
//! - **Effects**: `AudioEffect` trait and `EffectChain` (in-order processing)
//! - **Bands**: `EqBand` (fixed frequency, mutable gain and Q) and the biquad
//!   `BandFilter` that realizes one band
//! - **Graph**: `EqualizerGraph` owns the settings and hands out `FilterStage`s.
//!   Every gain change or track change builds a fresh stage; the renderer swaps
//!   it in without touching its source connection. Stages carry a generation and
//!   only the newest one may be attached.
//!
//! # Example
//!
//! ```rust
//! use aria_audio::EqualizerGraph;
//!
//! let mut graph = EqualizerGraph::new();
//! graph.set_gain(0, 4.5).unwrap();
//!
//! let mut stage = graph.rebuild();
//! let mut buffer = vec![0.25f32; 512];
//! stage.process(&mut buffer, 44_100);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod effects;
pub mod error;
pub mod graph;

pub use effects::eq::{MAX_GAIN_DB, MIN_GAIN_DB};
pub use effects::{AudioEffect, BandFilter, EffectChain, EqBand, FilterType};
pub use error::{AudioError, Result};
pub use graph::{
    EqualizerGraph, EqualizerSettings, FilterStage, RebuildTicket, DEFAULT_BAND_FREQUENCIES,
    DEFAULT_BAND_Q,
};
