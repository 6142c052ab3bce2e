//! Aria Core
//!
//! Platform-agnostic core types, seam traits, and error handling for Aria.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track` (the track descriptor handed over by the catalog
//!   layer), its persisted projection `MinimalTrack`, and `ScrobbleReport`
//! - **Seam Traits**: `KeyValueStore` (durable storage) and `ScrobbleSink`
//!   (listening-history reporting)
//! - **Error Handling**: Unified `AriaError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use aria_core::types::{AlbumRef, ArtistRef, Track};
//!
//! let track = Track::new(
//!     "t1",
//!     "Blue in Green",
//!     ArtistRef::new("a1", "Miles Davis"),
//!     AlbumRef::new("al1", "Kind of Blue"),
//!     337_000,
//! );
//!
//! let minimal = track.minimal();
//! assert_eq!(minimal.id, track.id);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod storage;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{AriaError, Result};
pub use storage::{KeyValueStore, MemoryStore};
pub use traits::ScrobbleSink;

pub use types::{
    AlbumRef, ArtistRef, MinimalAlbumRef, MinimalArtistRef, MinimalTrack, ScrobbleReport,
    ScrobbleType, Track, TrackId,
};
