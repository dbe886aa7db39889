use super::user_models::{AuthToken, AuthTokenValue, UserRole};
use super::user_store::UserStore;
use crate::sqlite_column;
use crate::sqlite_persistence::{
    open_versioned_db, Column, ForeignKey, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};
use anyhow::{bail, Context, Result};
use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// V 0
const USER_TABLE_V_0: Table = Table {
    name: "user",
    columns: &[
        sqlite_column!(
            "id",
            SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!(
            "external_id",
            SqlType::Text,
            non_null = true,
            is_unique = true
        ),
        sqlite_column!(
            "created",
            SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[],
    indices: &[("idx_user_external_id", "external_id")],
};

const LIKED_SONG_TABLE_V_0: Table = Table {
    name: "liked_song",
    columns: &[
        sqlite_column!(
            "id",
            SqlType::Integer,
            is_primary_key = true,
            non_null = true,
            is_unique = true
        ),
        sqlite_column!(
            "user_id",
            SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "user",
                foreign_column: "id",
                cascade_delete: true,
            })
        ),
        sqlite_column!("song_id", SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[&["user_id", "song_id"]],
    indices: &[("idx_liked_song_song_id", "song_id")],
};

const USER_ROLE_TABLE_V_0: Table = Table {
    name: "user_role",
    columns: &[
        sqlite_column!(
            "user_id",
            SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "user",
                foreign_column: "id",
                cascade_delete: true,
            })
        ),
        sqlite_column!("role", SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[&["user_id", "role"]],
    indices: &[("idx_user_role_user_id", "user_id")],
};

const AUTH_TOKEN_TABLE_V_0: Table = Table {
    name: "auth_token",
    columns: &[
        sqlite_column!(
            "user_id",
            SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "user",
                foreign_column: "id",
                cascade_delete: true,
            })
        ),
        sqlite_column!("value", SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created",
            SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_used", SqlType::Integer),
    ],
    unique_constraints: &[],
    indices: &[("idx_auth_token_value", "value")],
};

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        USER_TABLE_V_0,
        LIKED_SONG_TABLE_V_0,
        USER_ROLE_TABLE_V_0,
        AUTH_TOKEN_TABLE_V_0,
    ],
    migration: None,
}];

#[derive(Clone)]
pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = open_versioned_db(db_path.as_ref(), VERSIONED_SCHEMAS)
            .with_context(|| format!("Failed to open user db at {:?}", db_path.as_ref()))?;
        Ok(SqliteUserStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl UserStore for SqliteUserStore {
    fn create_user(&self, external_id: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {} (external_id) VALUES (?1)",
                USER_TABLE_V_0.name
            ),
            params![external_id],
        )
        .with_context(|| format!("Failed to create user {}", external_id))?;
        Ok(conn.last_insert_rowid() as usize)
    }

    fn get_user_id(&self, external_id: &str) -> Result<Option<usize>> {
        let conn = self.conn.lock().unwrap();
        let id: Option<i64> = conn
            .query_row(
                &format!(
                    "SELECT id FROM {} WHERE external_id = ?1",
                    USER_TABLE_V_0.name
                ),
                params![external_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.map(|id| id as usize))
    }

    fn user_exists(&self, user_id: usize) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE id = ?1", USER_TABLE_V_0.name),
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn get_liked_song_ids(&self, user_id: usize) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT song_id FROM {} WHERE user_id = ?1 ORDER BY id",
            LIKED_SONG_TABLE_V_0.name
        ))?;
        let ids = stmt
            .query_map(params![user_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    fn is_song_liked(&self, user_id: usize, song_id: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE user_id = ?1 AND song_id = ?2",
                LIKED_SONG_TABLE_V_0.name
            ),
            params![user_id, song_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn set_song_liked(&self, user_id: usize, song_id: &str, liked: bool) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        if liked {
            // OR IGNORE keeps concurrent double-likes from erroring out; the
            // unique constraint guarantees at most one row per (user, song).
            conn.execute(
                &format!(
                    "INSERT OR IGNORE INTO {} (user_id, song_id) VALUES (?1, ?2)",
                    LIKED_SONG_TABLE_V_0.name
                ),
                params![user_id, song_id],
            )?;
        } else {
            conn.execute(
                &format!(
                    "DELETE FROM {} WHERE user_id = ?1 AND song_id = ?2",
                    LIKED_SONG_TABLE_V_0.name
                ),
                params![user_id, song_id],
            )?;
        }
        Ok(())
    }

    fn count_song_likes(&self, song_id: &str) -> Result<u64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE song_id = ?1",
                LIKED_SONG_TABLE_V_0.name
            ),
            params![song_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_likes_for_songs(&self, song_ids: &[String]) -> Result<HashMap<String, u64>> {
        if song_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let conn = self.conn.lock().unwrap();
        let placeholders = vec!["?"; song_ids.len()].join(", ");
        let mut stmt = conn.prepare(&format!(
            "SELECT song_id, COUNT(*) FROM {} WHERE song_id IN ({}) GROUP BY song_id",
            LIKED_SONG_TABLE_V_0.name, placeholders
        ))?;
        let counts = stmt
            .query_map(params_from_iter(song_ids.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(counts)
    }

    fn get_user_roles(&self, user_id: usize) -> Result<Vec<UserRole>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT role FROM {} WHERE user_id = ?1",
            USER_ROLE_TABLE_V_0.name
        ))?;
        let roles = stmt
            .query_map(params![user_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .filter_map(|s| UserRole::from_str(&s))
            .collect();
        Ok(roles)
    }

    fn add_user_role(&self, user_id: usize, role: UserRole) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT OR IGNORE INTO {} (user_id, role) VALUES (?1, ?2)",
                USER_ROLE_TABLE_V_0.name
            ),
            params![user_id, role.as_str()],
        )?;
        Ok(())
    }

    fn get_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let conn = self.conn.lock().unwrap();
        let auth_token = conn
            .query_row(
                &format!(
                    "SELECT user_id, value, created, last_used FROM {} WHERE value = ?1",
                    AUTH_TOKEN_TABLE_V_0.name
                ),
                params![token.0],
                |row| {
                    Ok(AuthToken {
                        user_id: row.get::<_, i64>(0)? as usize,
                        value: AuthTokenValue(row.get(1)?),
                        created: row.get(2)?,
                        last_used: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(auth_token)
    }

    fn add_user_auth_token(&self, token: AuthToken) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let inserted = conn.execute(
            &format!(
                "INSERT OR IGNORE INTO {} (user_id, value, created, last_used) VALUES (?1, ?2, ?3, ?4)",
                AUTH_TOKEN_TABLE_V_0.name
            ),
            params![token.user_id, token.value.0, token.created, token.last_used],
        )?;
        if inserted == 0 {
            bail!("Auth token already exists");
        }
        Ok(())
    }

    fn update_user_auth_token_last_used_timestamp(&self, token: &AuthTokenValue) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "UPDATE {} SET last_used = ?1 WHERE value = ?2",
                AUTH_TOKEN_TABLE_V_0.name
            ),
            params![Utc::now().timestamp(), token.0],
        )?;
        Ok(())
    }

    fn delete_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let existing = self.get_user_auth_token(token)?;
        if existing.is_some() {
            let conn = self.conn.lock().unwrap();
            conn.execute(
                &format!("DELETE FROM {} WHERE value = ?1", AUTH_TOKEN_TABLE_V_0.name),
                params![token.0],
            )?;
        }
        Ok(existing)
    }
}
