//! E2E tests for the catalog song and album endpoints.

mod common;

use common::client::song_ids;
use common::constants::*;
use common::{TestClient, TestServer};
use reqwest::StatusCode;
use std::collections::HashSet;

#[tokio::test]
async fn featured_returns_six_distinct_catalog_songs() {
    let server = TestServer::spawn_default().await;
    let client = TestClient::new(&server.base_url);

    let songs = client.get_json("/v1/songs/featured").await;
    let ids = song_ids(&songs);
    assert_eq!(ids.len(), 6);

    let distinct: HashSet<&String> = ids.iter().collect();
    assert_eq!(distinct.len(), 6);
    for id in &ids {
        assert!(id.starts_with('S'), "unexpected song id {}", id);
    }
}

#[tokio::test]
async fn trending_and_popular_return_four_songs() {
    let server = TestServer::spawn_default().await;
    let client = TestClient::new(&server.base_url);

    for path in ["/v1/songs/trending", "/v1/songs/popular"] {
        let songs = client.get_json(path).await;
        assert_eq!(song_ids(&songs).len(), 4, "path {}", path);
    }
}

#[tokio::test]
async fn new_releases_are_newest_first() {
    let server = TestServer::spawn_default().await;
    let client = TestClient::new(&server.base_url);

    let songs = client.get_json("/v1/songs/new-releases").await;
    let ids = song_ids(&songs);
    assert_eq!(ids, vec!["S8", "S7", "S6", "S5", "S4", "S3"]);
}

#[tokio::test]
async fn full_listing_requires_admin() {
    let server = TestServer::spawn_default().await;

    let anonymous = TestClient::new(&server.base_url);
    let response = anonymous.get("/v1/songs").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let regular = TestClient::with_token(&server.base_url, &server.users.user_token);
    let response = regular.get("/v1/songs").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let admin = TestClient::with_token(&server.base_url, &server.users.admin_token);
    let songs = admin.get_json("/v1/songs").await;
    let ids = song_ids(&songs);
    assert_eq!(ids.len(), SONG_COUNT);
    assert_eq!(ids[0], "S8");
    assert_eq!(ids[SONG_COUNT - 1], "S1");
}

#[tokio::test]
async fn album_listing_and_detail() {
    let server = TestServer::spawn_default().await;
    let client = TestClient::new(&server.base_url);

    let albums = client.get_json("/v1/albums").await;
    let titles: Vec<&str> = albums
        .as_array()
        .unwrap()
        .iter()
        .map(|album| album["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec![ALBUM_2_TITLE, ALBUM_1_TITLE]);

    let album = client.get_json(&format!("/v1/albums/{}", ALBUM_1_ID)).await;
    assert_eq!(album["title"], ALBUM_1_TITLE);
    let ids = song_ids(&album["songs"]);
    assert_eq!(ids, vec!["S1", "S2", "S3", "S4"]);

    let response = client.get("/v1/albums/does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn songs_carry_the_wire_shape() {
    let server = TestServer::spawn_default().await;
    let client = TestClient::new(&server.base_url);

    let songs = client.get_json("/v1/songs/new-releases").await;
    let song = &songs.as_array().unwrap()[0];
    for field in [
        "id", "title", "artist", "imageUrl", "audioUrl", "duration", "likes", "createdAt",
        "albumId",
    ] {
        assert!(song.get(field).is_some(), "missing field {}", field);
    }
}

#[tokio::test]
async fn stats_endpoint_reports_uptime() {
    let server = TestServer::spawn_default().await;
    let client = TestClient::new(&server.base_url);

    let stats = client.get_json("/").await;
    assert!(stats["uptime"].as_str().unwrap().contains('d'));
    assert!(stats["hash"].is_string());
}
