use super::user_models::{AuthToken, AuthTokenValue, UserRole};
use super::user_store::UserStore;
use crate::catalog_store::{CatalogStore, ResolvedSong, Song};
use anyhow::bail;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("User not found")]
    UserNotFound,

    #[error("Song not found")]
    SongNotFound,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Outcome of a like/unlike toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeToggle {
    pub liked: bool,
    pub likes: u64,
}

/// Composes the catalog and user stores for everything that touches a user's
/// library: the like toggle, liked-song listings, like-count resolution and
/// the session-token lookups the auth extractor needs.
///
/// The like count is never stored: it is the cardinality of the song's
/// membership across all liked sets, so membership and count cannot drift
/// apart and the count cannot go negative.
pub struct UserManager {
    catalog_store: Arc<dyn CatalogStore>,
    user_store: Arc<dyn UserStore>,
}

impl UserManager {
    pub fn new(catalog_store: Arc<dyn CatalogStore>, user_store: Arc<dyn UserStore>) -> Self {
        Self {
            catalog_store,
            user_store,
        }
    }

    pub fn add_user<T: AsRef<str>>(&self, external_id: T) -> anyhow::Result<usize> {
        let external_id = external_id.as_ref();
        if external_id.is_empty() {
            bail!("The user external id cannot be empty.");
        }
        if self.user_store.get_user_id(external_id)?.is_some() {
            bail!("User external id already exists.");
        }
        self.user_store.create_user(external_id)
    }

    pub fn toggle_song_like(
        &self,
        user_id: usize,
        song_id: &str,
    ) -> Result<LikeToggle, LibraryError> {
        if !self.user_store.user_exists(user_id)? {
            return Err(LibraryError::UserNotFound);
        }
        if !self.catalog_store.song_exists(song_id)? {
            return Err(LibraryError::SongNotFound);
        }

        let was_liked = self.user_store.is_song_liked(user_id, song_id)?;
        self.user_store
            .set_song_liked(user_id, song_id, !was_liked)?;
        let likes = self.user_store.count_song_likes(song_id)?;

        Ok(LikeToggle {
            liked: !was_liked,
            likes,
        })
    }

    pub fn is_song_liked(&self, user_id: usize, song_id: &str) -> Result<bool, LibraryError> {
        if !self.user_store.user_exists(user_id)? {
            return Err(LibraryError::UserNotFound);
        }
        Ok(self.user_store.is_song_liked(user_id, song_id)?)
    }

    /// The user's liked songs in insertion order, with like counts attached.
    /// Ids pointing at songs no longer in the catalog drop out.
    pub fn get_liked_songs(&self, user_id: usize) -> Result<Vec<ResolvedSong>, LibraryError> {
        if !self.user_store.user_exists(user_id)? {
            return Err(LibraryError::UserNotFound);
        }
        let liked_ids = self.user_store.get_liked_song_ids(user_id)?;
        let songs = self.catalog_store.get_songs_by_ids(&liked_ids)?;
        let mut by_id: HashMap<String, Song> =
            songs.into_iter().map(|s| (s.id.clone(), s)).collect();
        let ordered: Vec<Song> = liked_ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect();
        Ok(self.resolve_songs(ordered)?)
    }

    /// Attaches like counts to songs in one batched store query.
    pub fn resolve_songs(&self, songs: Vec<Song>) -> anyhow::Result<Vec<ResolvedSong>> {
        let ids: Vec<String> = songs.iter().map(|s| s.id.clone()).collect();
        let counts = self.user_store.count_likes_for_songs(&ids)?;
        Ok(songs
            .into_iter()
            .map(|song| {
                let likes = counts.get(&song.id).copied().unwrap_or(0);
                ResolvedSong { song, likes }
            })
            .collect())
    }

    pub fn get_auth_token(&self, value: &AuthTokenValue) -> anyhow::Result<Option<AuthToken>> {
        self.user_store.get_user_auth_token(value)
    }

    pub fn update_auth_token_last_used(&self, value: &AuthTokenValue) -> anyhow::Result<()> {
        self.user_store
            .update_user_auth_token_last_used_timestamp(value)
    }

    pub fn get_user_roles(&self, user_id: usize) -> anyhow::Result<Vec<UserRole>> {
        self.user_store.get_user_roles(user_id)
    }
}
