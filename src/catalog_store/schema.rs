//! Catalog database schema.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};

/// V 0
const ALBUMS_TABLE_V_0: Table = Table {
    name: "albums",
    columns: &[
        sqlite_column!(
            "id",
            SqlType::Text,
            is_primary_key = true,
            non_null = true,
            is_unique = true
        ),
        sqlite_column!("title", SqlType::Text, non_null = true),
        sqlite_column!("artist", SqlType::Text, non_null = true),
        sqlite_column!("image_url", SqlType::Text, non_null = true),
        sqlite_column!("release_year", SqlType::Integer),
    ],
    unique_constraints: &[],
    indices: &[],
};

const SONGS_TABLE_V_0: Table = Table {
    name: "songs",
    columns: &[
        sqlite_column!(
            "id",
            SqlType::Text,
            is_primary_key = true,
            non_null = true,
            is_unique = true
        ),
        sqlite_column!("title", SqlType::Text, non_null = true),
        sqlite_column!("artist", SqlType::Text, non_null = true),
        sqlite_column!("image_url", SqlType::Text, non_null = true),
        sqlite_column!("audio_url", SqlType::Text, non_null = true),
        sqlite_column!("duration_secs", SqlType::Integer, non_null = true),
        sqlite_column!(
            "created",
            SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "album_id",
            SqlType::Text,
            foreign_key = Some(&ForeignKey {
                foreign_table: "albums",
                foreign_column: "id",
                cascade_delete: false,
            })
        ),
    ],
    unique_constraints: &[],
    indices: &[
        ("idx_songs_created", "created"),
        ("idx_songs_album_id", "album_id"),
    ],
};

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[ALBUMS_TABLE_V_0, SONGS_TABLE_V_0],
    migration: None,
}];

pub(super) const ALBUMS_TABLE: &Table = &ALBUMS_TABLE_V_0;
pub(super) const SONGS_TABLE: &Table = &SONGS_TABLE_V_0;
