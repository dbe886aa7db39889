//! CatalogStore trait definition.

use super::models::{Album, Song};
use anyhow::Result;

/// Trait for catalog storage backends.
///
/// The server and the recommender only see this interface, so tests can
/// substitute an in-memory implementation.
pub trait CatalogStore: Send + Sync {
    /// Get a song by id.
    fn get_song(&self, id: &str) -> Result<Option<Song>>;

    /// Check if a song exists without materializing it.
    fn song_exists(&self, id: &str) -> Result<bool>;

    /// Get every song, newest first.
    fn get_all_songs(&self) -> Result<Vec<Song>>;

    /// Get the songs matching the given ids. Unknown ids are silently
    /// dropped; the result order is unspecified.
    fn get_songs_by_ids(&self, ids: &[String]) -> Result<Vec<Song>>;

    /// Sample up to `count` songs uniformly at random, without replacement,
    /// skipping the excluded ids. Returns fewer than `count` songs when the
    /// eligible pool is smaller.
    fn sample_songs(&self, count: usize, exclude: &[String]) -> Result<Vec<Song>>;

    /// Get the `limit` most recently added songs, newest first.
    fn get_newest_songs(&self, limit: usize) -> Result<Vec<Song>>;

    /// Number of songs in the catalog.
    fn get_songs_count(&self) -> usize;

    /// Get an album by id.
    fn get_album(&self, id: &str) -> Result<Option<Album>>;

    /// Get every album.
    fn get_all_albums(&self) -> Result<Vec<Album>>;

    /// Get an album's songs in insertion order.
    fn get_album_songs(&self, album_id: &str) -> Result<Vec<Song>>;

    /// Insert a song into the catalog.
    fn insert_song(&self, song: &Song) -> Result<()>;

    /// Insert an album into the catalog.
    fn insert_album(&self, album: &Album) -> Result<()>;

    /// Delete a song by id.
    fn delete_song(&self, id: &str) -> Result<()>;
}
