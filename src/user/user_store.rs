use super::user_models::{AuthToken, AuthTokenValue, UserRole};
use anyhow::Result;
use std::collections::HashMap;

pub trait UserStore: Send + Sync {
    /// Creates a new user tied to an identity-provider subject and returns
    /// the user id.
    fn create_user(&self, external_id: &str) -> Result<usize>;

    /// Returns the user id for the given identity-provider subject.
    /// Returns Ok(None) if the user does not exist.
    fn get_user_id(&self, external_id: &str) -> Result<Option<usize>>;

    /// Returns whether a user with the given id exists.
    fn user_exists(&self, user_id: usize) -> Result<bool>;

    /// Returns the user's liked song ids in insertion order.
    fn get_liked_song_ids(&self, user_id: usize) -> Result<Vec<String>>;

    /// Returns whether the song is in the user's liked set.
    fn is_song_liked(&self, user_id: usize, song_id: &str) -> Result<bool>;

    /// Adds or removes a song from the user's liked set. Both directions are
    /// idempotent: liking an already-liked song or unliking an absent one is
    /// a no-op.
    fn set_song_liked(&self, user_id: usize, song_id: &str, liked: bool) -> Result<()>;

    /// Number of users whose liked set contains the song.
    fn count_song_likes(&self, song_id: &str) -> Result<u64>;

    /// Like counts for the given songs in one query. Songs nobody liked are
    /// absent from the map.
    fn count_likes_for_songs(&self, song_ids: &[String]) -> Result<HashMap<String, u64>>;

    /// Returns all roles assigned to a user.
    fn get_user_roles(&self, user_id: usize) -> Result<Vec<UserRole>>;

    /// Assigns a role to a user.
    fn add_user_role(&self, user_id: usize, role: UserRole) -> Result<()>;

    /// Returns a user's session token given its value.
    /// Returns Ok(None) if the token does not exist.
    fn get_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Adds a new session token.
    fn add_user_auth_token(&self, token: AuthToken) -> Result<()>;

    /// Updates a token's last-used timestamp.
    fn update_user_auth_token_last_used_timestamp(&self, token: &AuthTokenValue) -> Result<()>;

    /// Deletes a session token, returning it if it existed.
    fn delete_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;
}
