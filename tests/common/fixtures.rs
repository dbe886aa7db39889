//! Test fixture creation for catalog and user databases.

use super::constants::*;
use anyhow::Result;
use std::path::Path;
use tunebox_server::catalog_store::{Album, CatalogStore, Song, SqliteCatalogStore};
use tunebox_server::user::{AuthToken, AuthTokenValue, SqliteUserStore, UserRole, UserStore};

/// Pre-provisioned users with their session tokens.
pub struct TestUsers {
    pub user_id: usize,
    pub user_token: String,
    pub admin_id: usize,
    pub admin_token: String,
}

fn fixture_song(index: usize) -> Song {
    let album_id = if index <= 4 { ALBUM_1_ID } else { ALBUM_2_ID };
    Song {
        id: song_id(index),
        title: format!("Track {:02}", index),
        artist: format!("Artist {}", (index % 3) + 1),
        image_url: format!("https://cdn.example.com/images/{}.jpg", song_id(index)),
        audio_url: format!("https://cdn.example.com/audio/{}.mp3", song_id(index)),
        duration: 150 + (index as u32) * 10,
        created: 1700000000 + index as i64,
        album_id: Some(album_id.to_string()),
    }
}

/// Creates a catalog database with 2 albums and `SONG_COUNT` songs.
pub fn create_test_catalog(db_path: &Path) -> Result<SqliteCatalogStore> {
    let store = SqliteCatalogStore::new(db_path)?;

    store.insert_album(&Album {
        id: ALBUM_1_ID.to_string(),
        title: ALBUM_1_TITLE.to_string(),
        artist: "Artist 1".to_string(),
        image_url: "https://cdn.example.com/images/A1.jpg".to_string(),
        release_year: Some(2022),
    })?;
    store.insert_album(&Album {
        id: ALBUM_2_ID.to_string(),
        title: ALBUM_2_TITLE.to_string(),
        artist: "Artist 2".to_string(),
        image_url: "https://cdn.example.com/images/A2.jpg".to_string(),
        release_year: Some(2024),
    })?;

    for index in 1..=SONG_COUNT {
        store.insert_song(&fixture_song(index))?;
    }

    Ok(store)
}

/// Creates a user database with a regular and an admin user, both holding a
/// valid session token.
pub fn create_test_users(db_path: &Path) -> Result<(SqliteUserStore, TestUsers)> {
    let store = SqliteUserStore::new(db_path)?;

    let user_id = create_user_with_role(&store, TEST_USER_EXTERNAL_ID, UserRole::Regular)?;
    let user_token = provision_token(&store, user_id)?;

    let admin_id = create_user_with_role(&store, ADMIN_USER_EXTERNAL_ID, UserRole::Admin)?;
    let admin_token = provision_token(&store, admin_id)?;

    Ok((
        store,
        TestUsers {
            user_id,
            user_token,
            admin_id,
            admin_token,
        },
    ))
}

pub fn create_user_with_role(
    store: &SqliteUserStore,
    external_id: &str,
    role: UserRole,
) -> Result<usize> {
    let user_id = store.create_user(external_id)?;
    store.add_user_role(user_id, role)?;
    Ok(user_id)
}

/// Stores a session token for the user, as the identity-provider sync would.
pub fn provision_token(store: &SqliteUserStore, user_id: usize) -> Result<String> {
    let token = AuthToken {
        user_id,
        value: AuthTokenValue::generate(),
        created: 1700000000,
        last_used: None,
    };
    store.add_user_auth_token(token.clone())?;
    Ok(token.value.0)
}
