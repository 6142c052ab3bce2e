/// Track descriptor domain types
use crate::error::{AriaError, Result};
use crate::types::TrackId;
use serde::de::{self, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

/// Highest value accepted for `Track::user_rating`
pub const MAX_USER_RATING: u8 = 5;

/// Artist reference carried by a track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistRef {
    /// Artist identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Artist image (display only, not persisted)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ArtistRef {
    /// Create an artist reference without an image
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image_url: None,
        }
    }
}

/// Album reference carried by a track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumRef {
    /// Album identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Album cover (display only, not persisted)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Release year (display only, not persisted)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_year: Option<u16>,
}

impl AlbumRef {
    /// Create an album reference without image or year
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image_url: None,
            release_year: None,
        }
    }
}

/// Playable track descriptor
///
/// Resolved by the catalog/search layer and handed to the queue as-is.
/// Identity is `id`, but queue operations address tracks by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Catalog identifier
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Performing artist
    pub artist: ArtistRef,

    /// Album the track belongs to
    pub album: AlbumRef,

    /// Stream locator; a track without one fails to load
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playable_url: Option<String>,

    /// Cover art for now-playing surfaces
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork_url: Option<String>,

    /// Track length in milliseconds (> 0)
    #[serde(deserialize_with = "positive_duration_ms")]
    pub duration_ms: u64,

    /// Set once the listener moved past this track; never cleared within a queue lifetime
    #[serde(default)]
    pub played: bool,

    /// Per-user rating (0-5)
    #[serde(
        default,
        deserialize_with = "bounded_rating",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_rating: Option<u8>,

    /// Per-user favorite flag
    #[serde(default)]
    pub favorite: bool,
}

impl Track {
    /// Create a track with the required fields only
    pub fn new(
        id: impl Into<TrackId>,
        title: impl Into<String>,
        artist: ArtistRef,
        album: AlbumRef,
        duration_ms: u64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist,
            album,
            playable_url: None,
            artwork_url: None,
            duration_ms,
            played: false,
            user_rating: None,
            favorite: false,
        }
    }

    /// Builder-style setter for the stream locator
    #[must_use]
    pub fn with_playable_url(mut self, url: impl Into<String>) -> Self {
        self.playable_url = Some(url.into());
        self
    }

    /// Builder-style setter for the cover art
    #[must_use]
    pub fn with_artwork_url(mut self, url: impl Into<String>) -> Self {
        self.artwork_url = Some(url.into());
        self
    }

    /// Get the track duration as a Duration
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Set the user rating, rejecting values above `MAX_USER_RATING`
    pub fn set_rating(&mut self, rating: Option<u8>) -> Result<()> {
        if let Some(value) = rating {
            if value > MAX_USER_RATING {
                return Err(AriaError::invalid_input(format!(
                    "rating {} outside 0..={}",
                    value, MAX_USER_RATING
                )));
            }
        }
        self.user_rating = rating;
        Ok(())
    }

    /// Project to the persisted form
    pub fn minimal(&self) -> MinimalTrack {
        MinimalTrack {
            id: self.id.clone(),
            title: self.title.clone(),
            artist: MinimalArtistRef {
                id: self.artist.id.clone(),
                name: self.artist.name.clone(),
            },
            album: MinimalAlbumRef {
                id: self.album.id.clone(),
                name: self.album.name.clone(),
            },
            playable_url: self.playable_url.clone(),
            artwork_url: self.artwork_url.clone(),
            duration_ms: self.duration_ms,
            played: self.played,
            user_rating: self.user_rating,
            favorite: self.favorite,
        }
    }
}

/// Artist fields kept in the persisted queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinimalArtistRef {
    /// Artist identifier
    pub id: String,
    /// Display name
    pub name: String,
}

/// Album fields kept in the persisted queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinimalAlbumRef {
    /// Album identifier
    pub id: String,
    /// Display name
    pub name: String,
}

/// Persisted projection of a `Track`
///
/// Drops image URLs and the release year so large queues stay small on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinimalTrack {
    /// Catalog identifier
    pub id: TrackId,
    /// Track title
    pub title: String,
    /// Artist id and name
    pub artist: MinimalArtistRef,
    /// Album id and name
    pub album: MinimalAlbumRef,
    /// Stream locator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playable_url: Option<String>,
    /// Cover art
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork_url: Option<String>,
    /// Track length in milliseconds
    #[serde(deserialize_with = "positive_duration_ms")]
    pub duration_ms: u64,
    /// Played flag
    #[serde(default)]
    pub played: bool,
    /// Per-user rating
    #[serde(
        default,
        deserialize_with = "bounded_rating",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_rating: Option<u8>,
    /// Per-user favorite flag
    #[serde(default)]
    pub favorite: bool,
}

impl MinimalTrack {
    /// Rebuild a descriptor; display-only fields come back empty
    pub fn into_track(self) -> Track {
        Track {
            id: self.id,
            title: self.title,
            artist: ArtistRef::new(self.artist.id, self.artist.name),
            album: AlbumRef::new(self.album.id, self.album.name),
            playable_url: self.playable_url,
            artwork_url: self.artwork_url,
            duration_ms: self.duration_ms,
            played: self.played,
            user_rating: self.user_rating,
            favorite: self.favorite,
        }
    }
}

impl From<&Track> for MinimalTrack {
    fn from(track: &Track) -> Self {
        track.minimal()
    }
}

fn positive_duration_ms<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = u64::deserialize(deserializer)?;
    if value == 0 {
        return Err(de::Error::invalid_value(
            Unexpected::Unsigned(0),
            &"a duration above zero",
        ));
    }
    Ok(value)
}

fn bounded_rating<'de, D>(deserializer: D) -> std::result::Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<u8>::deserialize(deserializer)? {
        Some(rating) if rating > MAX_USER_RATING => Err(de::Error::invalid_value(
            Unexpected::Unsigned(u64::from(rating)),
            &"a rating between 0 and 5",
        )),
        rating => Ok(rating),
    }
}
