//! Thin HTTP client wrapper for e2e tests.

use reqwest::{Response, StatusCode};
use serde_json::Value;

pub struct TestClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl TestClient {
    /// Anonymous client.
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
            token: None,
        }
    }

    /// Client sending the given session token in the Authorization header.
    pub fn with_token(base_url: &str, token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
            token: Some(token.to_string()),
        }
    }

    pub async fn get(&self, path: &str) -> Response {
        let mut request = self.client.get(format!("{}{}", self.base_url, path));
        if let Some(token) = &self.token {
            request = request.header("Authorization", token);
        }
        request.send().await.expect("GET request failed")
    }

    pub async fn post(&self, path: &str) -> Response {
        let mut request = self.client.post(format!("{}{}", self.base_url, path));
        if let Some(token) = &self.token {
            request = request.header("Authorization", token);
        }
        request.send().await.expect("POST request failed")
    }

    /// GETs the path, asserts a 200, and parses the body as JSON.
    pub async fn get_json(&self, path: &str) -> Value {
        let response = self.get(path).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {}", path);
        response.json().await.expect("Response body is not JSON")
    }

    /// POSTs to the path, asserts a 200, and parses the body as JSON.
    pub async fn post_json(&self, path: &str) -> Value {
        let response = self.post(path).await;
        assert_eq!(response.status(), StatusCode::OK, "POST {}", path);
        response.json().await.expect("Response body is not JSON")
    }
}

/// Collects the "id" field of every object in a JSON array.
pub fn song_ids(songs: &Value) -> Vec<String> {
    songs
        .as_array()
        .expect("Expected a JSON array")
        .iter()
        .map(|song| song["id"].as_str().expect("Song without id").to_string())
        .collect()
}
