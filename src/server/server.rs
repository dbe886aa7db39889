use anyhow::Result;
use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use tracing::error;

use crate::catalog_store::{CatalogStore, ResolvedAlbum, Song};
use crate::gateway::TextGateway;
use crate::recommender::{RecommendError, Recommender};
use crate::user::{LibraryError, UserManager, UserStore};
use tower_http::services::ServeDir;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use super::session::Session;
use super::{log_requests, state::*, RequestsLoggingLevel, ServerConfig};

const FEATURED_COUNT: usize = 6;
const TRENDING_COUNT: usize = 4;
const NEW_RELEASES_COUNT: usize = 6;
const POPULAR_COUNT: usize = 4;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub session_token: Option<String>,
}

#[derive(Serialize)]
struct ErrorMessage {
    message: String,
}

#[derive(Serialize)]
struct LikeToggleResponse {
    message: String,
    #[serde(rename = "isLiked")]
    is_liked: bool,
    likes: u64,
}

#[derive(Serialize)]
struct IsLikedResponse {
    #[serde(rename = "isLiked")]
    is_liked: bool,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

fn internal_error(err: anyhow::Error) -> Response {
    // Detail stays in the server log, the client gets a generic message.
    error!("Internal error serving request: {:#}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorMessage {
            message: "Internal server error".to_string(),
        }),
    )
        .into_response()
}

fn not_found(message: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorMessage {
            message: message.to_string(),
        }),
    )
        .into_response()
}

fn library_error_response(err: LibraryError) -> Response {
    match err {
        LibraryError::UserNotFound => not_found("User not found"),
        LibraryError::SongNotFound => not_found("Song not found"),
        LibraryError::Internal(err) => internal_error(err),
    }
}

fn resolve_and_serve(state: &ServerState, songs: Vec<Song>) -> Response {
    match state.user_manager.lock().unwrap().resolve_songs(songs) {
        Ok(resolved) => Json(resolved).into_response(),
        Err(err) => internal_error(err),
    }
}

fn serve_sampled_songs(state: &ServerState, count: usize) -> Response {
    match state.catalog_store.sample_songs(count, &[]) {
        Ok(songs) => resolve_and_serve(state, songs),
        Err(err) => internal_error(err),
    }
}

async fn home(session: Option<Session>, State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        session_token: session.map(|s| s.token),
    };
    Json(stats)
}

async fn get_all_songs(session: Session, State(state): State<ServerState>) -> Response {
    if !session.is_admin() {
        return StatusCode::FORBIDDEN.into_response();
    }
    match state.catalog_store.get_all_songs() {
        Ok(songs) => resolve_and_serve(&state, songs),
        Err(err) => internal_error(err),
    }
}

async fn get_featured_songs(State(state): State<ServerState>) -> Response {
    serve_sampled_songs(&state, FEATURED_COUNT)
}

async fn get_trending_songs(State(state): State<ServerState>) -> Response {
    serve_sampled_songs(&state, TRENDING_COUNT)
}

async fn get_popular_songs(State(state): State<ServerState>) -> Response {
    serve_sampled_songs(&state, POPULAR_COUNT)
}

async fn get_new_releases_songs(State(state): State<ServerState>) -> Response {
    match state.catalog_store.get_newest_songs(NEW_RELEASES_COUNT) {
        Ok(songs) => resolve_and_serve(&state, songs),
        Err(err) => internal_error(err),
    }
}

async fn get_made_for_you_songs(session: Session, State(state): State<ServerState>) -> Response {
    match state.recommender.made_for_you(session.user_id).await {
        Ok(songs) => Json(songs).into_response(),
        Err(RecommendError::UserNotFound) => not_found("User not found"),
        Err(RecommendError::Internal(err)) => internal_error(err),
    }
}

async fn toggle_like_song(
    session: Session,
    State(state): State<ServerState>,
    Path(song_id): Path<String>,
) -> Response {
    let result = state
        .user_manager
        .lock()
        .unwrap()
        .toggle_song_like(session.user_id, &song_id);
    match result {
        Ok(toggle) => Json(LikeToggleResponse {
            message: if toggle.liked {
                "Song liked".to_string()
            } else {
                "Song unliked".to_string()
            },
            is_liked: toggle.liked,
            likes: toggle.likes,
        })
        .into_response(),
        Err(err) => library_error_response(err),
    }
}

async fn get_liked_songs(session: Session, State(state): State<ServerState>) -> Response {
    let result = state
        .user_manager
        .lock()
        .unwrap()
        .get_liked_songs(session.user_id);
    match result {
        Ok(songs) => Json(songs).into_response(),
        Err(err) => library_error_response(err),
    }
}

async fn check_if_liked(
    session: Session,
    State(state): State<ServerState>,
    Path(song_id): Path<String>,
) -> Response {
    let result = state
        .user_manager
        .lock()
        .unwrap()
        .is_song_liked(session.user_id, &song_id);
    match result {
        Ok(is_liked) => Json(IsLikedResponse { is_liked }).into_response(),
        Err(err) => library_error_response(err),
    }
}

async fn get_all_albums(State(state): State<ServerState>) -> Response {
    match state.catalog_store.get_all_albums() {
        Ok(albums) => Json(albums).into_response(),
        Err(err) => internal_error(err),
    }
}

async fn get_album(State(state): State<ServerState>, Path(id): Path<String>) -> Response {
    let album = match state.catalog_store.get_album(&id) {
        Ok(Some(album)) => album,
        Ok(None) => return not_found("Album not found"),
        Err(err) => return internal_error(err),
    };
    let songs = match state.catalog_store.get_album_songs(&id) {
        Ok(songs) => songs,
        Err(err) => return internal_error(err),
    };
    match state.user_manager.lock().unwrap().resolve_songs(songs) {
        Ok(resolved) => Json(ResolvedAlbum {
            album,
            songs: resolved,
        })
        .into_response(),
        Err(err) => internal_error(err),
    }
}

impl ServerState {
    fn new(
        config: ServerConfig,
        catalog_store: Arc<dyn CatalogStore>,
        user_manager: UserManager,
        recommender: Recommender,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            catalog_store,
            user_manager: Arc::new(Mutex::new(user_manager)),
            recommender: Arc::new(recommender),
            hash: env!("GIT_HASH").to_string(),
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    catalog_store: Arc<dyn CatalogStore>,
    user_store: Arc<dyn UserStore>,
    gateway: Arc<dyn TextGateway>,
) -> Result<Router> {
    let user_manager = UserManager::new(catalog_store.clone(), user_store.clone());
    let recommender = Recommender::new(catalog_store.clone(), user_store, gateway);
    let state = ServerState::new(config.clone(), catalog_store, user_manager, recommender);

    let song_routes: Router = Router::new()
        .route("/", get(get_all_songs))
        .route("/featured", get(get_featured_songs))
        .route("/trending", get(get_trending_songs))
        .route("/new-releases", get(get_new_releases_songs))
        .route("/popular", get(get_popular_songs))
        .route("/made-for-you", get(get_made_for_you_songs))
        .route("/like/{song_id}", post(toggle_like_song))
        .route("/liked", get(get_liked_songs))
        .route("/liked/{song_id}", get(check_if_liked))
        .with_state(state.clone());

    let album_routes: Router = Router::new()
        .route("/", get(get_all_albums))
        .route("/{id}", get(get_album))
        .with_state(state.clone());

    let home_router: Router = match &config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    let mut app: Router = home_router
        .nest("/v1/songs", song_routes)
        .nest("/v1/albums", album_routes);

    app = app.layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

pub async fn run_server(
    catalog_store: Arc<dyn CatalogStore>,
    user_store: Arc<dyn UserStore>,
    gateway: Arc<dyn TextGateway>,
    requests_logging_level: RequestsLoggingLevel,
    port: u16,
    frontend_dir_path: Option<String>,
) -> Result<()> {
    let config = ServerConfig {
        port,
        requests_logging_level,
        frontend_dir_path,
    };
    let app = make_app(config, catalog_store, user_store, gateway)?;

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;

    Ok(axum::serve(listener, app).await?)
}
