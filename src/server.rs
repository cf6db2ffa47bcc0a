use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, warn};
use uuid::Uuid;

use crate::{
    capabilities::{GenrePhrase, SongCandidate},
    errors::{MixerError, Result},
    orchestrator::{MoodMixer, Recommendation},
};

#[derive(Clone)]
struct AppState {
    mixer: Arc<MoodMixer>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub mood: String,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub request_id: Uuid,
    pub mood: String,
    pub genre: GenrePhrase,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub songs: Vec<SongView>,
}

#[derive(Debug, Serialize)]
pub struct SongView {
    pub title: String,
    pub video_id: String,
    pub thumbnail_url: String,
    pub watch_url: String,
}

impl From<SongCandidate> for SongView {
    fn from(song: SongCandidate) -> Self {
        let watch_url = song.watch_url();
        Self {
            title: song.title,
            video_id: song.video_id,
            thumbnail_url: song.thumbnail_url,
            watch_url,
        }
    }
}

impl From<Recommendation> for RecommendResponse {
    fn from(value: Recommendation) -> Self {
        let status = if value.songs.is_degraded() {
            "degraded"
        } else {
            "ok"
        };
        let reason = value.songs.reason().map(str::to_string);

        Self {
            request_id: value.request_id,
            mood: value.mood,
            genre: value.genre,
            status,
            reason,
            songs: value
                .songs
                .into_songs()
                .into_iter()
                .map(SongView::from)
                .collect(),
        }
    }
}

pub fn make_app(mixer: Arc<MoodMixer>) -> Router {
    let state = AppState { mixer };

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/recommend", post(recommend_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_server(addr: SocketAddr, mixer: Arc<MoodMixer>) -> Result<()> {
    let app = make_app(mixer);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(target: "api", %addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| MixerError::other(format!("HTTP server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(target: "api", error = ?err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!(target: "api", "shutdown signal received");
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn recommend_handler(
    State(state): State<AppState>,
    Json(request): Json<RecommendRequest>,
) -> std::result::Result<Json<RecommendResponse>, ApiError> {
    let recommendation = state.mixer.recommend(&request.mood).await?;
    Ok(Json(recommendation.into()))
}

pub struct ApiError(MixerError);

impl From<MixerError> for ApiError {
    fn from(value: MixerError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            MixerError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            err if err.is_upstream() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(target: "api", error = %self.0.chain(), "recommendation failed");
        } else {
            warn!(target: "api", error = %self.0, "rejected request");
        }

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
