//! Test server lifecycle management.
//!
//! Each test gets an isolated server on a random port with its own catalog
//! and user databases and a scripted gateway. Dropping the server shuts it
//! down and cleans up the temp resources.

use super::constants::*;
use super::fixtures::{create_test_catalog, create_test_users, TestUsers};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tunebox_server::gateway::{GatewayError, GenerationOptions, TextGateway};
use tunebox_server::server::server::make_app;
use tunebox_server::server::{RequestsLoggingLevel, ServerConfig};
use tunebox_server::{SqliteCatalogStore, SqliteUserStore};

/// Gateway fake that serves queued replies in order. When the queue runs
/// dry it fails like an unreachable endpoint, which exercises the same
/// fallback path a network error would.
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<Result<String, GatewayError>>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
        }
    }

    pub fn replying_text(reply: &str) -> Arc<Self> {
        let gateway = Self::new();
        gateway.push(Ok(reply.to_string()));
        Arc::new(gateway)
    }

    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn push(&self, reply: Result<String, GatewayError>) {
        self.replies.lock().unwrap().push_back(reply);
    }
}

#[async_trait]
impl TextGateway for ScriptedGateway {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        _prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, GatewayError> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::Connection("no scripted reply".to_string())))
    }
}

/// Test server instance with isolated catalog and database.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345").
    pub base_url: String,

    /// The port the server is listening on.
    pub port: u16,

    /// Stores for direct database access in tests.
    pub catalog_store: Arc<SqliteCatalogStore>,
    pub user_store: Arc<SqliteUserStore>,

    /// Pre-provisioned users and their tokens.
    pub users: TestUsers,

    // Private fields - keep resources alive until drop
    _temp_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port, with the given gateway
    /// behind the recommender.
    pub async fn spawn(gateway: Arc<dyn TextGateway>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let catalog_store = Arc::new(
            create_test_catalog(&temp_dir.path().join("catalog.db"))
                .expect("Failed to create test catalog"),
        );
        let (user_store, users) = create_test_users(&temp_dir.path().join("user.db"))
            .expect("Failed to create test users");
        let user_store = Arc::new(user_store);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            frontend_dir_path: None,
        };

        let app = make_app(
            config,
            catalog_store.clone(),
            user_store.clone(),
            gateway,
        )
        .expect("Failed to build app");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            catalog_store,
            user_store,
            users,
            _temp_dir: temp_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Spawns a server whose gateway always fails, for tests that never
    /// reach the recommendation path.
    pub async fn spawn_default() -> Self {
        Self::spawn(ScriptedGateway::unreachable()).await
    }

    /// Waits for the server to become ready by polling the stats endpoint.
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => {
                    return;
                }
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
