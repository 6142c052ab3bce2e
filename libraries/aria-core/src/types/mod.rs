mod ids;
mod scrobble;
mod track;

pub use ids::TrackId;
pub use scrobble::{ScrobbleReport, ScrobbleType};
pub use track::{
    AlbumRef, ArtistRef, MinimalAlbumRef, MinimalArtistRef, MinimalTrack, Track, MAX_USER_RATING,
};
