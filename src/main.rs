use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tunebox_server::gateway::{GeminiGateway, DEFAULT_ENDPOINT, DEFAULT_MODEL};
use tunebox_server::{
    run_server, CatalogStore, RequestsLoggingLevel, SqliteCatalogStore, SqliteUserStore,
};

/// Environment variable holding the gateway credential. Read once at startup.
const GATEWAY_API_KEY_ENV: &str = "GEMINI_API_KEY";

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite catalog database file.
    #[clap(value_parser = parse_path)]
    pub catalog_db: PathBuf,

    /// Path to the SQLite database file to use for user storage.
    #[clap(value_parser = parse_path)]
    pub user_store_file_path: PathBuf,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Base URL of the generative-language gateway.
    #[clap(long, default_value = DEFAULT_ENDPOINT)]
    pub gateway_url: String,

    /// Model requested from the gateway.
    #[clap(long, default_value = DEFAULT_MODEL)]
    pub gateway_model: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    info!(
        "Opening SQLite catalog database at {:?}...",
        cli_args.catalog_db
    );
    let catalog_store = Arc::new(SqliteCatalogStore::new(&cli_args.catalog_db)?);
    info!("Catalog holds {} songs", catalog_store.get_songs_count());

    let user_store = Arc::new(SqliteUserStore::new(&cli_args.user_store_file_path)?);

    let api_key = std::env::var(GATEWAY_API_KEY_ENV).unwrap_or_default();
    if api_key.is_empty() {
        warn!(
            "{} is not set: made-for-you will serve random samples only",
            GATEWAY_API_KEY_ENV
        );
    }
    let gateway = Arc::new(GeminiGateway::new(
        cli_args.gateway_url,
        cli_args.gateway_model,
        api_key,
    ));

    info!("Ready to serve at port {}!", cli_args.port);
    run_server(
        catalog_store,
        user_store,
        gateway,
        cli_args.logging_level,
        cli_args.port,
        cli_args.frontend_dir_path,
    )
    .await
}
