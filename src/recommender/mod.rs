//! Made-for-you recommendations.
//!
//! Composes the user's liked-song set, the full catalog, and one gateway
//! completion into a set of exactly `RECOMMENDATION_SIZE` songs. Every
//! gateway or parsing failure degrades to uniform random sampling; the only
//! error a caller ever sees is an unknown user.

use crate::catalog_store::{CatalogStore, ResolvedSong, Song};
use crate::gateway::{GenerationOptions, TextGateway};
use crate::user::UserStore;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

pub const RECOMMENDATION_SIZE: usize = 4;

#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("User not found")]
    UserNotFound,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

lazy_static! {
    // Models tend to wrap JSON answers in ```json fences despite being told
    // not to; strip the fences (with or without a language tag) before
    // parsing.
    static ref CODE_FENCE: Regex = Regex::new(r"```[a-zA-Z]*\n?").unwrap();
}

#[derive(Serialize)]
struct LikedSongInfo<'a> {
    title: &'a str,
    artist: &'a str,
}

#[derive(Serialize)]
struct CandidateSongInfo<'a> {
    id: &'a str,
    title: &'a str,
    artist: &'a str,
}

pub struct Recommender {
    catalog_store: Arc<dyn CatalogStore>,
    user_store: Arc<dyn UserStore>,
    gateway: Arc<dyn TextGateway>,
    options: GenerationOptions,
}

impl Recommender {
    pub fn new(
        catalog_store: Arc<dyn CatalogStore>,
        user_store: Arc<dyn UserStore>,
        gateway: Arc<dyn TextGateway>,
    ) -> Self {
        Self {
            catalog_store,
            user_store,
            gateway,
            options: GenerationOptions::default(),
        }
    }

    /// Returns `min(RECOMMENDATION_SIZE, catalog size)` songs the user has
    /// not liked. Fails only when the user does not exist.
    pub async fn made_for_you(&self, user_id: usize) -> Result<Vec<ResolvedSong>, RecommendError> {
        if !self.user_store.user_exists(user_id)? {
            return Err(RecommendError::UserNotFound);
        }

        let liked_ids = self.user_store.get_liked_song_ids(user_id)?;
        let liked_songs = self.catalog_store.get_songs_by_ids(&liked_ids)?;

        // Nothing to infer taste from: serve a plain random sample.
        if liked_songs.is_empty() {
            let songs = self
                .catalog_store
                .sample_songs(RECOMMENDATION_SIZE, &liked_ids)?;
            return Ok(self.attach_likes(songs)?);
        }

        let candidates = self.catalog_store.get_all_songs()?;
        let prompt = build_prompt(&liked_songs, &candidates);

        let raw = match self.gateway.complete(&prompt, &self.options).await {
            Ok(text) => text,
            Err(err) => {
                warn!(
                    gateway = self.gateway.name(),
                    error = %err,
                    "Gateway call failed, serving random sample instead"
                );
                let songs = self
                    .catalog_store
                    .sample_songs(RECOMMENDATION_SIZE, &liked_ids)?;
                return Ok(self.attach_likes(songs)?);
            }
        };

        let recommended_ids = match parse_song_ids(&raw) {
            Some(ids) => ids,
            None => {
                warn!(
                    response_len = raw.len(),
                    "Gateway response is not a JSON array of song ids, serving random sample instead"
                );
                let songs = self
                    .catalog_store
                    .sample_songs(RECOMMENDATION_SIZE, &liked_ids)?;
                return Ok(self.attach_likes(songs)?);
            }
        };

        debug!(ids = ?recommended_ids, "Gateway recommended song ids");

        // Unknown ids drop out here; liked ids are filtered even though the
        // prompt forbids them, so the result can never overlap the liked set.
        let liked_set: HashSet<&str> = liked_ids.iter().map(String::as_str).collect();
        let mut songs = self.catalog_store.get_songs_by_ids(&recommended_ids)?;
        songs.retain(|song| !liked_set.contains(song.id.as_str()));

        if songs.len() < RECOMMENDATION_SIZE {
            let exclude: Vec<String> = songs
                .iter()
                .map(|song| song.id.clone())
                .chain(liked_ids.iter().cloned())
                .collect();
            let backfill = self
                .catalog_store
                .sample_songs(RECOMMENDATION_SIZE - songs.len(), &exclude)?;
            songs.extend(backfill);
        }

        songs.truncate(RECOMMENDATION_SIZE);
        Ok(self.attach_likes(songs)?)
    }

    fn attach_likes(&self, songs: Vec<Song>) -> anyhow::Result<Vec<ResolvedSong>> {
        let ids: Vec<String> = songs.iter().map(|song| song.id.clone()).collect();
        let counts = self.user_store.count_likes_for_songs(&ids)?;
        Ok(songs
            .into_iter()
            .map(|song| {
                let likes = counts.get(&song.id).copied().unwrap_or(0);
                ResolvedSong { song, likes }
            })
            .collect())
    }
}

/// Builds the recommendation prompt. Liked songs are listed without ids so
/// the model cannot answer by echoing a known identifier.
fn build_prompt(liked: &[Song], candidates: &[Song]) -> String {
    let liked_info: Vec<LikedSongInfo> = liked
        .iter()
        .map(|song| LikedSongInfo {
            title: &song.title,
            artist: &song.artist,
        })
        .collect();
    let candidate_info: Vec<CandidateSongInfo> = candidates
        .iter()
        .map(|song| CandidateSongInfo {
            id: &song.id,
            title: &song.title,
            artist: &song.artist,
        })
        .collect();

    format!(
        "You are a music recommendation expert. Based on the user's liked songs, \
recommend {size} songs from the available songs list that they would enjoy.

User's Liked Songs:
{liked}

Available Songs (choose from these):
{candidates}

Instructions:
1. Analyze the user's music taste based on their liked songs
2. Select exactly {size} songs from the available songs list that match their preferences
3. Consider artist similarity, genre, and musical style
4. DO NOT recommend songs that are already in the user's liked songs
5. Return ONLY a JSON array of song ids (nothing else)

Example format: [\"id1\", \"id2\", \"id3\", \"id4\"]

Your response (JSON array only):",
        size = RECOMMENDATION_SIZE,
        liked = serde_json::to_string_pretty(&liked_info).unwrap_or_default(),
        candidates = serde_json::to_string_pretty(&candidate_info).unwrap_or_default(),
    )
}

/// Strips optional code-fence markup and parses the completion as a JSON
/// array of song id strings. Returns None on any deviation.
fn parse_song_ids(raw: &str) -> Option<Vec<String>> {
    let cleaned = CODE_FENCE.replace_all(raw, "");
    serde_json::from_str(cleaned.trim()).ok()
}
