//! SQLite-backed catalog store.

use super::models::{Album, Song};
use super::schema::{ALBUMS_TABLE, SONGS_TABLE, VERSIONED_SCHEMAS};
use super::trait_def::CatalogStore;
use crate::sqlite_persistence::open_versioned_db;
use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, Connection, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

const SONG_COLUMNS: &str = "id, title, artist, image_url, audio_url, duration_secs, created, album_id";
const ALBUM_COLUMNS: &str = "id, title, artist, image_url, release_year";

fn song_from_row(row: &Row) -> rusqlite::Result<Song> {
    Ok(Song {
        id: row.get(0)?,
        title: row.get(1)?,
        artist: row.get(2)?,
        image_url: row.get(3)?,
        audio_url: row.get(4)?,
        duration: row.get(5)?,
        created: row.get(6)?,
        album_id: row.get(7)?,
    })
}

fn album_from_row(row: &Row) -> rusqlite::Result<Album> {
    Ok(Album {
        id: row.get(0)?,
        title: row.get(1)?,
        artist: row.get(2)?,
        image_url: row.get(3)?,
        release_year: row.get(4)?,
    })
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

#[derive(Clone)]
pub struct SqliteCatalogStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCatalogStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = open_versioned_db(db_path.as_ref(), VERSIONED_SCHEMAS)
            .with_context(|| format!("Failed to open catalog db at {:?}", db_path.as_ref()))?;
        Ok(SqliteCatalogStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn get_song(&self, id: &str) -> Result<Option<Song>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} WHERE id = ?1",
            SONG_COLUMNS, SONGS_TABLE.name
        ))?;
        let mut rows = stmt.query_map(params![id], song_from_row)?;
        rows.next().transpose().map_err(Into::into)
    }

    fn song_exists(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE id = ?1", SONGS_TABLE.name),
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn get_all_songs(&self) -> Result<Vec<Song>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} ORDER BY created DESC, id",
            SONG_COLUMNS, SONGS_TABLE.name
        ))?;
        let songs = stmt
            .query_map([], song_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(songs)
    }

    fn get_songs_by_ids(&self, ids: &[String]) -> Result<Vec<Song>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} WHERE id IN ({})",
            SONG_COLUMNS,
            SONGS_TABLE.name,
            placeholders(ids.len())
        ))?;
        let songs = stmt
            .query_map(params_from_iter(ids.iter()), song_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(songs)
    }

    fn sample_songs(&self, count: usize, exclude: &[String]) -> Result<Vec<Song>> {
        let conn = self.conn.lock().unwrap();
        let sql = if exclude.is_empty() {
            format!(
                "SELECT {} FROM {} ORDER BY RANDOM() LIMIT {}",
                SONG_COLUMNS, SONGS_TABLE.name, count
            )
        } else {
            format!(
                "SELECT {} FROM {} WHERE id NOT IN ({}) ORDER BY RANDOM() LIMIT {}",
                SONG_COLUMNS,
                SONGS_TABLE.name,
                placeholders(exclude.len()),
                count
            )
        };
        let mut stmt = conn.prepare(&sql)?;
        let songs = stmt
            .query_map(params_from_iter(exclude.iter()), song_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(songs)
    }

    fn get_newest_songs(&self, limit: usize) -> Result<Vec<Song>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} ORDER BY created DESC, id LIMIT {}",
            SONG_COLUMNS, SONGS_TABLE.name, limit
        ))?;
        let songs = stmt
            .query_map([], song_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(songs)
    }

    fn get_songs_count(&self) -> usize {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", SONGS_TABLE.name),
            [],
            |row| row.get::<_, i64>(0),
        )
        .map(|count| count as usize)
        .unwrap_or(0)
    }

    fn get_album(&self, id: &str) -> Result<Option<Album>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} WHERE id = ?1",
            ALBUM_COLUMNS, ALBUMS_TABLE.name
        ))?;
        let mut rows = stmt.query_map(params![id], album_from_row)?;
        rows.next().transpose().map_err(Into::into)
    }

    fn get_all_albums(&self) -> Result<Vec<Album>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} ORDER BY title",
            ALBUM_COLUMNS, ALBUMS_TABLE.name
        ))?;
        let albums = stmt
            .query_map([], album_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(albums)
    }

    fn get_album_songs(&self, album_id: &str) -> Result<Vec<Song>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} WHERE album_id = ?1 ORDER BY created, id",
            SONG_COLUMNS, SONGS_TABLE.name
        ))?;
        let songs = stmt
            .query_map(params![album_id], song_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(songs)
    }

    fn insert_song(&self, song: &Song) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {} ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                SONGS_TABLE.name, SONG_COLUMNS
            ),
            params![
                song.id,
                song.title,
                song.artist,
                song.image_url,
                song.audio_url,
                song.duration,
                song.created,
                song.album_id,
            ],
        )
        .with_context(|| format!("Failed to insert song {}", song.id))?;
        Ok(())
    }

    fn insert_album(&self, album: &Album) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {} ({}) VALUES (?1, ?2, ?3, ?4, ?5)",
                ALBUMS_TABLE.name, ALBUM_COLUMNS
            ),
            params![
                album.id,
                album.title,
                album.artist,
                album.image_url,
                album.release_year,
            ],
        )
        .with_context(|| format!("Failed to insert album {}", album.id))?;
        Ok(())
    }

    fn delete_song(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", SONGS_TABLE.name),
            params![id],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_song(id: &str, created: i64) -> Song {
        Song {
            id: id.to_string(),
            title: format!("Song {}", id),
            artist: "Test Artist".to_string(),
            image_url: format!("https://cdn.example.com/i/{}.jpg", id),
            audio_url: format!("https://cdn.example.com/a/{}.mp3", id),
            duration: 200,
            created,
            album_id: None,
        }
    }

    fn store_with_songs(count: usize) -> (TempDir, SqliteCatalogStore) {
        let dir = TempDir::new().unwrap();
        let store = SqliteCatalogStore::new(dir.path().join("catalog.db")).unwrap();
        for i in 0..count {
            store
                .insert_song(&test_song(&format!("S{}", i + 1), 1000 + i as i64))
                .unwrap();
        }
        (dir, store)
    }

    #[test]
    fn all_songs_newest_first() {
        let (_dir, store) = store_with_songs(3);
        let songs = store.get_all_songs().unwrap();
        let ids: Vec<&str> = songs.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["S3", "S2", "S1"]);
    }

    #[test]
    fn newest_songs_respects_limit() {
        let (_dir, store) = store_with_songs(5);
        let songs = store.get_newest_songs(2).unwrap();
        let ids: Vec<&str> = songs.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["S5", "S4"]);
    }

    #[test]
    fn songs_by_ids_drops_unknown() {
        let (_dir, store) = store_with_songs(3);
        let songs = store
            .get_songs_by_ids(&["S1".to_string(), "nope".to_string(), "S3".to_string()])
            .unwrap();
        let mut ids: Vec<String> = songs.into_iter().map(|s| s.id).collect();
        ids.sort();
        assert_eq!(ids, vec!["S1", "S3"]);
    }

    #[test]
    fn sample_without_replacement() {
        let (_dir, store) = store_with_songs(6);
        let songs = store.sample_songs(4, &[]).unwrap();
        assert_eq!(songs.len(), 4);
        let mut ids: Vec<String> = songs.into_iter().map(|s| s.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn sample_returns_fewer_when_catalog_small() {
        let (_dir, store) = store_with_songs(2);
        let songs = store.sample_songs(4, &[]).unwrap();
        assert_eq!(songs.len(), 2);
    }

    #[test]
    fn sample_honors_exclusions() {
        let (_dir, store) = store_with_songs(5);
        let exclude = vec!["S1".to_string(), "S2".to_string(), "S3".to_string()];
        for _ in 0..10 {
            let songs = store.sample_songs(4, &exclude).unwrap();
            assert_eq!(songs.len(), 2);
            for song in &songs {
                assert!(!exclude.contains(&song.id));
            }
        }
    }

    #[test]
    fn album_songs_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = SqliteCatalogStore::new(dir.path().join("catalog.db")).unwrap();
        store
            .insert_album(&Album {
                id: "A1".to_string(),
                title: "First Album".to_string(),
                artist: "Test Artist".to_string(),
                image_url: "https://cdn.example.com/i/A1.jpg".to_string(),
                release_year: Some(2021),
            })
            .unwrap();
        let mut song = test_song("S1", 1000);
        song.album_id = Some("A1".to_string());
        store.insert_song(&song).unwrap();
        store.insert_song(&test_song("S2", 1001)).unwrap();

        let songs = store.get_album_songs("A1").unwrap();
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].id, "S1");
        assert!(store.get_album("A1").unwrap().is_some());
        assert!(store.get_album("A2").unwrap().is_none());
    }

    #[test]
    fn delete_song_removes_it() {
        let (_dir, store) = store_with_songs(2);
        store.delete_song("S1").unwrap();
        assert!(store.get_song("S1").unwrap().is_none());
        assert_eq!(store.get_songs_count(), 1);
    }
}
