//! Web router using Axum
//!
//! Stateless routing: every handler delegates to the checker or the store
//! and serializes JSON. Request bodies are decoded permissively — an
//! absent or malformed JSON body becomes the payload default, never a 400.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use modwatch_core::{check_safety, taxonomy, FocusSnapshot, ModerationStore, StatsSnapshot};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::assets;
use crate::channel;

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ModerationStore>,
    /// Static dashboard bundle, served as-is.
    pub dashboard_dir: PathBuf,
    /// Extension assets, served through the containment check.
    pub extension_dir: PathBuf,
}

/// Create the web router
pub fn create_router(state: AppState) -> Router {
    // Extension and dashboard pages call in from their own origins.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(healthcheck))
        .route("/test", get(test_probe))
        .route("/moderate", post(moderate))
        .route("/moderation/keywords", get(moderation_keywords))
        .route("/stats", get(stats))
        .route("/flagged", get(flagged))
        .route("/focus/start", post(focus_start))
        .route("/focus/stop", post(focus_stop))
        .route("/focus/status", get(focus_status))
        .route("/ws", get(channel::ws_handler))
        .route("/extension/{*resource}", get(assets::extension_asset))
        .nest_service("/dashboard", ServeDir::new(&state.dashboard_dir))
        .layer(cors)
        .with_state(state)
}

/// Decode a body leniently: absent or malformed JSON becomes `T::default()`.
fn lenient_json<T: Default + DeserializeOwned>(body: &Bytes) -> T {
    serde_json::from_slice(body).unwrap_or_default()
}

/// Basic liveness probe.
async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({"status": "ok", "message": "Backend is running"}))
}

/// Legacy helper used by the extension popup.
async fn test_probe() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

#[derive(Debug, Default, Deserialize)]
struct ModeratePayload {
    #[serde(default)]
    text: String,
    #[serde(default)]
    user: Option<String>,
}

/// Keyword-based moderation endpoint used by the extension and the chat.
async fn moderate(State(state): State<AppState>, body: Bytes) -> Response {
    let payload: ModeratePayload = lenient_json(&body);

    let result = match check_safety(&payload.text) {
        Ok(result) => result,
        Err(err) => {
            tracing::warn!(error = %err, "Safety checker unavailable");
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"error": err.to_string()})),
            )
                .into_response();
        }
    };

    let user = payload.user.unwrap_or_default();
    let user = if user.is_empty() { "api" } else { user.as_str() };

    if result.flagged {
        state
            .store
            .record_flagged(user, &payload.text, result.categories.clone());
    }
    state.store.record_message(user, result.flagged);

    Json(result).into_response()
}

/// Expose the keyword list so the extension can stay in sync.
async fn moderation_keywords() -> Json<serde_json::Value> {
    Json(json!({"keywords": taxonomy::all_keywords()}))
}

/// Aggregate stats for the dashboard.
async fn stats(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.store.stats_snapshot())
}

/// Recently flagged messages, oldest first.
async fn flagged(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({"messages": state.store.flagged_messages()}))
}

#[derive(Debug, Default, Deserialize)]
struct FocusPayload {
    #[serde(default)]
    blocked_sites: Option<Vec<String>>,
    /// Older clients send `sites` instead.
    #[serde(default)]
    sites: Option<Vec<String>>,
}

/// Begin focus mode and track blocked sites.
async fn focus_start(State(state): State<AppState>, body: Bytes) -> Json<FocusSnapshot> {
    let payload: FocusPayload = lenient_json(&body);
    let sites = payload.blocked_sites.or(payload.sites).unwrap_or_default();
    Json(state.store.focus_start(&sites))
}

/// Stop focus mode and accumulate total focus time.
async fn focus_stop(State(state): State<AppState>) -> Json<FocusSnapshot> {
    Json(state.store.focus_stop())
}

/// Return the current focus snapshot.
async fn focus_status(State(state): State<AppState>) -> Json<FocusSnapshot> {
    Json(state.store.focus_snapshot())
}
