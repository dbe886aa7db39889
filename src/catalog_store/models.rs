//! Catalog entities and their wire representations.
//!
//! Wire field names are camelCase to match the web client's contract.

use serde::{Deserialize, Serialize};

/// Song entity as stored in the catalog.
///
/// The like count is not part of the stored song: it is derived from the
/// per-user liked-song sets at read time (see `ResolvedSong`).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub image_url: String,
    pub audio_url: String,
    /// Duration in seconds.
    pub duration: u32,
    /// Unix timestamp of catalog insertion.
    #[serde(rename = "createdAt")]
    pub created: i64,
    pub album_id: Option<String>,
}

/// Album entity.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub image_url: String,
    pub release_year: Option<i32>,
}

/// Song with its derived like count, as served to clients.
#[derive(Clone, Debug, Serialize)]
pub struct ResolvedSong {
    #[serde(flatten)]
    pub song: Song,
    pub likes: u64,
}

/// Album with its songs, as served to clients.
#[derive(Clone, Debug, Serialize)]
pub struct ResolvedAlbum {
    #[serde(flatten)]
    pub album: Album,
    pub songs: Vec<ResolvedSong>,
}
