//! Fixture data shared across e2e tests.

pub const SONG_COUNT: usize = 8;

pub const ALBUM_1_ID: &str = "A1";
pub const ALBUM_1_TITLE: &str = "Night Drive";
pub const ALBUM_2_ID: &str = "A2";
pub const ALBUM_2_TITLE: &str = "Morning Light";

pub const TEST_USER_EXTERNAL_ID: &str = "provider|test-user";
pub const ADMIN_USER_EXTERNAL_ID: &str = "provider|admin-user";

pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;

/// Fixture song ids are "S1".."S8"; songs S1..S4 belong to album A1, the
/// rest to A2.
pub fn song_id(index: usize) -> String {
    format!("S{}", index)
}
