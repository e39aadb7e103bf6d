//! HTTP JSON API.
//!
//! Provides [`router`] (used directly by tests) and [`serve`], which wires up
//! the database, town directory, extraction client, and controller into a
//! running axum server.
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `POST /api/chat` | one conversation turn |
//! | `POST /api/publish` | persist a complete draft |
//! | `GET /api/search?q=&town=&limit=` | keyword search |
//! | `GET /health` | liveness plus database stats |

use std::sync::{Arc, Mutex};

use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::config::RoamConfig;
use crate::conversation::{Controller, Conversation, Turn};
use crate::draft::EventDraft;
use crate::events::{PublishError, PublishedEvent};
use crate::extraction::llm::LlmExtractor;
use crate::extraction::ExtractionClient;
use crate::timezone::{parse_zone, TownDirectory};

/// Shared state behind every handler.
pub struct AppState<C> {
    pub controller: Controller<C>,
    pub db: Arc<Mutex<Connection>>,
    pub search_limit: usize,
}

/// JSON error body: `{"error": ..., "details": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: String,
    details: Option<serde_json::Value>,
}

impl ApiError {
    fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details: None,
        }
    }

    fn internal(err: impl std::fmt::Display) -> Self {
        tracing::error!(error = %err, "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = serde_json::json!({ "error": self.error });
        if let Some(details) = self.details {
            body["details"] = details;
        }
        (self.status, Json(body)).into_response()
    }
}

impl From<PublishError> for ApiError {
    fn from(err: PublishError) -> Self {
        match err {
            PublishError::Validation { missing } => Self {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                error: "event is missing mandatory fields".to_string(),
                details: Some(serde_json::json!({ "missing": missing })),
            },
            other => Self::internal(other),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub conversation: Option<Conversation>,
}

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub draft: EventDraft,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub town: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<PublishedEvent>,
}

pub fn router<C: ExtractionClient + 'static>(state: Arc<AppState<C>>) -> Router {
    Router::new()
        .route("/health", get(health::<C>))
        .route("/api/chat", post(chat::<C>))
        .route("/api/publish", post(publish::<C>))
        .route("/api/search", get(search::<C>))
        .with_state(state)
}

async fn health<C: ExtractionClient + 'static>(
    State(state): State<Arc<AppState<C>>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let report = with_db(&state, |conn| crate::db::check_database_health(conn)).await?;
    Ok(Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "database": report,
    })))
}

async fn chat<C: ExtractionClient + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<Turn>, ApiError> {
    if request.text.trim().is_empty() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "missing user input"));
    }
    let conversation = request.conversation.unwrap_or_default();

    tracing::info!(state = %conversation.state, text_len = request.text.len(), "chat turn");
    let turn = state.controller.turn(&conversation, &request.text).await;
    tracing::info!(kind = turn.response.kind(), next_state = %turn.conversation.state, "chat turn done");

    Ok(Json(turn))
}

async fn publish<C: ExtractionClient + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Json(request): Json<PublishRequest>,
) -> Result<(StatusCode, Json<PublishedEvent>), ApiError> {
    let towns = state.controller.towns().clone();
    let db = Arc::clone(&state.db);

    let event = tokio::task::spawn_blocking(move || {
        let mut conn = db
            .lock()
            .map_err(|e| ApiError::internal(format!("db lock poisoned: {e}")))?;
        crate::events::publish(&mut conn, &request.draft, &towns).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::internal(format!("db task failed: {e}")))??;

    Ok((StatusCode::CREATED, Json(event)))
}

async fn search<C: ExtractionClient + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Some(query) = params.q.filter(|q| !q.trim().is_empty()) else {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "query parameter q is required"));
    };
    let limit = params.limit.unwrap_or(state.search_limit).clamp(1, 100);
    let town = params.town;

    let results = with_db(&state, move |conn| {
        crate::events::search_events(conn, &query, town.as_deref(), limit)
    })
    .await?;

    Ok(Json(SearchResponse { results }))
}

/// Run a read-only closure against the shared connection on the blocking pool.
async fn with_db<C, T, F>(state: &AppState<C>, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> anyhow::Result<T> + Send + 'static,
{
    let db = Arc::clone(&state.db);
    tokio::task::spawn_blocking(move || {
        let conn = db
            .lock()
            .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
        f(&conn)
    })
    .await
    .map_err(|e| ApiError::internal(format!("db task failed: {e}")))?
    .map_err(ApiError::internal)
}

/// Shared setup: open DB, load towns, build the extraction client and controller.
fn setup_state(config: &RoamConfig) -> Result<AppState<LlmExtractor>> {
    let db_path = config.resolved_db_path();
    let conn = crate::db::open_database(&db_path)?;
    tracing::info!(db = %db_path.display(), "database ready");

    let default_zone = parse_zone(&config.towns.default_timezone)?;
    let towns = TownDirectory::load(&conn, default_zone)?;

    let extractor = LlmExtractor::new(&config.extraction)?;
    tracing::info!(endpoint = %config.extraction.endpoint, model = %config.extraction.model, "extraction client ready");

    let controller = Controller::new(extractor, towns, config.conversation.clone());

    Ok(AppState {
        controller,
        db: Arc::new(Mutex::new(conn)),
        search_limit: config.search.default_limit,
    })
}

/// Start the HTTP server and run until ctrl-c.
pub async fn serve(config: RoamConfig) -> Result<()> {
    let bind_addr = config.bind_addr();
    tracing::info!(addr = %bind_addr, "starting Roam server");

    let state = Arc::new(setup_state(&config)?);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "listening at http://{bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down server");
        })
        .await?;

    Ok(())
}
